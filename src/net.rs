use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use crate::error::{GatewayErrorKind, GatewayResult};

// Connecting a udp socket sends nothing, it only asks the os for a route.
const ROUTE_PROBE_V4: &str = "8.8.8.8:53";
const ROUTE_PROBE_V6: &str = "[2001:4860:4860::8888]:53";

/// Get the unspecified ipv4 socket address.
pub fn default_route_v4() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0)
}

/// Get the unspecified ipv6 socket address.
pub fn default_route_v6() -> SocketAddr {
    SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0)
}

/// Determine the address the host uses for outbound traffic.
///
/// Ipv4 is preferred, ipv6 is only tried if no ipv4 route exists.
pub fn local_ip() -> GatewayResult<IpAddr> {
    outbound_ip(default_route_v4(), ROUTE_PROBE_V4)
        .or_else(|| outbound_ip(default_route_v6(), ROUTE_PROBE_V6))
        .ok_or_else(|| GatewayErrorKind::NoLocalIp.into())
}

fn outbound_ip(bind: SocketAddr, probe: &str) -> Option<IpAddr> {
    let socket = UdpSocket::bind(bind).ok()?;
    socket.connect(probe).ok()?;

    let ip = socket.local_addr().ok()?.ip();
    if ip.is_unspecified() {
        None
    } else {
        Some(ip)
    }
}
