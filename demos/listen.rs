extern crate bip_igdp;

use std::net::UdpSocket;
use std::time::{Duration, Instant};

use bip_igdp::Gateway;

const LISTEN_PORT: u16 = 1234;

// Looks up the external ip and prints what arrives on a local port for a minute,
// without mapping it, to see how long the gateway keeps an outbound binding open.
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

    let socket = match UdpSocket::bind(("0.0.0.0", LISTEN_PORT)) {
        Ok(socket) => socket,
        Err(error) => {
            println!("Failed To Bind Port {}: {}", LISTEN_PORT, error);
            return;
        }
    };
    println!("Listening On {}:{}", external_ip, LISTEN_PORT);

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
