extern crate bip_igdp;

use std::net::UdpSocket;
use std::time::{Duration, Instant};

use bip_igdp::Gateway;

// Maps a udp port on the gateway to a local socket and prints what arrives for a minute.
fn main() {
    let mut gateway = Gateway::new();
    if let Err(error) = gateway.setup() {
        println!("Gateway Setup Failed: {}", error);
        return;
    }

    let external_ip = match gateway.external_ip() {
        Ok(ip) => ip,
        Err(error) => {
            println!("External IP Lookup Failed: {}", error);
            return;
        }
    };

    let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    let port = socket.local_addr().unwrap().port();

    if let Err(error) = gateway.add_port_mapping(port, port) {
        println!("Port Mapping Failed: {}", error);
        return;
    }
    println!("Listening On {}:{}", external_ip, port);

    let deadline = Instant::now() + Duration::from_secs(60);
    let mut buffer = [0u8; 1500];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining == Duration::from_secs(0) {
            break;
        }
        socket.set_read_timeout(Some(remaining)).unwrap();

        if let Ok((bytes_read, from)) = socket.recv_from(&mut buffer) {
            println!("From: {}", from);
            println!("{}", String::from_utf8_lossy(&buffer[..bytes_read]));
        }
    }
}
