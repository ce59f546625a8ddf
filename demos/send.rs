use std::env;
use std::net::UdpSocket;

// Sends a single udp message to the address given on the command line.
fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("Specify Address And Port To Send To");
        return;
    }

    let message = if args.len() > 2 {
        args[2..].join(" ")
    } else {
        "Hello".to_string()
    };

    let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
    socket.send_to(message.as_bytes(), &args[1][..]).unwrap();

    println!("Sent {:?} To {}", message, args[1]);
}
