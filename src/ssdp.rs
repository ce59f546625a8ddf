//! Gateway discovery over SSDP.

use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use regex::Regex;

use crate::error::{GatewayError, GatewayErrorKind, GatewayResult};

// http://upnp.org/specs/arch/UPnP-arch-DeviceArchitecture-v1.0-20080424.pdf

/// Multicast address every SSDP participant listens on.
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// Search target asking only WAN IP connection services to respond.
pub const WAN_IP_SEARCH_TARGET: &str = "urn:schemas-upnp-org:service:WANIPConnection:1";

/// M-SEARCH request sent to discover a gateway.
pub const SEARCH_REQUEST: &str = "M-SEARCH * HTTP/1.1\r
HOST: 239.255.255.250:1900\r
ST: urn:schemas-upnp-org:service:WANIPConnection:1\r
MAN: \"ssdp:discover\"\r
MX: 3\r
\r
";

lazy_static! {
    // Case Insensitive Match For The Location Header Of A Search Response
    static ref LOCATION_REGEX: Regex = Regex::new(r"(?im)^[ \t]*LOCATION[ \t]*:[ \t]*([^\r\n]*?)[ \t]*\r?$")
        .expect("bip_igdp: Location Pattern Failed To Compile");
}

// Replies larger than this are truncated, gateway replies are a few hundred bytes
const MAX_REPLY_LEN: usize = 1024;

/// Send a single search request from the given local ip and wait at most
/// timeout for one reply, returning the device description url it points to.
///
/// This is a blocking operation, nothing is retried. A zero timeout only picks
/// up a reply that is already waiting.
pub fn discover(local_ip: IpAddr, ssdp_addr: &str, timeout: Duration) -> GatewayResult<String> {
    let remote_addr = resolve(ssdp_addr)?;
    let local_addr = SocketAddr::new(local_ip, 0);

    let udp_sock = UdpSocket::bind(local_addr)?;
    // Sockets reject a zero read timeout
    if timeout == Duration::from_secs(0) {
        udp_sock.set_nonblocking(true)?;
    } else {
        udp_sock.set_read_timeout(Some(timeout))?;
    }
    udp_sock.send_to(SEARCH_REQUEST.as_bytes(), remote_addr)?;

    let mut reply_buf = [0u8; MAX_REPLY_LEN];
    let (bytes_read, from_addr) = udp_sock.recv_from(&mut reply_buf).map_err(|error| {
        match error.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => GatewayErrorKind::Timeout.into(),
            _ => GatewayError::from(error)
        }
    })?;

    let reply = String::from_utf8_lossy(&reply_buf[..bytes_read]);
    trace!("bip_igdp: Search Reply From {}: {:?}", from_addr, reply);

    let location = parse_location(&reply).ok_or_else(|| GatewayError::from(GatewayErrorKind::InvalidResponse{
        details: "Search Reply Did Not Contain A LOCATION Header".to_string()
    }))?;
    debug!("bip_igdp: Gateway {} Advertised Description At {}", from_addr, location);

    Ok(location)
}

fn resolve(addr: &str) -> GatewayResult<SocketAddr> {
    addr.to_socket_addrs().ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| GatewayErrorKind::AddressResolution{ addr: addr.to_string() }.into())
}

/// Pull the value of the LOCATION header out of a search reply.
///
/// If the header appears more than once the last occurrence wins.
pub fn parse_location(reply: &str) -> Option<String> {
    LOCATION_REGEX.captures_iter(reply)
        .filter_map(|captures| captures.get(1))
        .last()
        .map(|value| value.as_str().to_string())
}
