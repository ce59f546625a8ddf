use std::net::IpAddr;
use std::time::Duration;

use crate::ssdp;

/// Default time to wait for a search reply.
const DEFAULT_SEARCH_TIMEOUT_MILLIS: u64 = 1000;

/// Default bound on http connects, reads and writes.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Echo service used to learn our external ip when no gateway can tell us.
pub const DEFAULT_EXTERNAL_IP_URL: &str = "http://myexternalip.com/raw";

/// Stores information for initializing a `Gateway`.
#[derive(Clone, Debug)]
pub struct GatewayBuilder {
    local_ip:        Option<IpAddr>,
    ssdp_addr:       String,
    search_timeout:  Duration,
    http_timeout:    Option<Duration>,
    external_ip_url: String
}

impl GatewayBuilder {
    /// Create a new GatewayBuilder.
    pub fn new() -> GatewayBuilder {
        GatewayBuilder{ local_ip: None,
            ssdp_addr: ssdp::SSDP_MULTICAST_ADDR.to_string(),
            search_timeout: Duration::from_millis(DEFAULT_SEARCH_TIMEOUT_MILLIS),
            http_timeout: Some(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)),
            external_ip_url: DEFAULT_EXTERNAL_IP_URL.to_string()
        }
    }

    /// Local ip to search from and to map ports to.
    ///
    /// If not set, the address used for outbound traffic is looked up during setup.
    pub fn local_ip(mut self, ip: IpAddr) -> GatewayBuilder {
        self.local_ip = Some(ip);

        self
    }

    /// Address the search request is sent to.
    ///
    /// Only the destination changes, the request still names the standard
    /// multicast address as its host.
    pub fn ssdp_addr(mut self, addr: &str) -> GatewayBuilder {
        self.ssdp_addr = addr.to_string();

        self
    }

    /// How long to wait for a reply to the search request.
    ///
    /// A zero timeout does not wait, discovery then fails with `Timeout` unless
    /// a reply has already arrived.
    pub fn search_timeout(mut self, timeout: Duration) -> GatewayBuilder {
        self.search_timeout = timeout;

        self
    }

    /// Bound on every http connect, read and write, None to never time out.
    pub fn http_timeout(mut self, timeout: Option<Duration>) -> GatewayBuilder {
        self.http_timeout = timeout;

        self
    }

    /// Plain text echo service queried when no control endpoint was resolved.
    pub fn external_ip_url(mut self, url: &str) -> GatewayBuilder {
        self.external_ip_url = url.to_string();

        self
    }

    pub fn get_local_ip(&self) -> Option<IpAddr> {
        self.local_ip
    }

    pub fn get_ssdp_addr(&self) -> &str {
        &self.ssdp_addr
    }

    pub fn get_search_timeout(&self) -> Duration {
        self.search_timeout
    }

    pub fn get_http_timeout(&self) -> Option<Duration> {
        self.http_timeout
    }

    pub fn get_external_ip_url(&self) -> &str {
        &self.external_ip_url
    }
}

impl Default for GatewayBuilder {
    fn default() -> GatewayBuilder {
        GatewayBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    use super::GatewayBuilder;

    #[test]
    fn positive_builder_defaults() {
        let builder = GatewayBuilder::new();

        assert_eq!(builder.get_local_ip(), None);
        assert_eq!(builder.get_ssdp_addr(), "239.255.255.250:1900");
        assert_eq!(builder.get_search_timeout(), Duration::from_secs(1));
        assert_eq!(builder.get_http_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(builder.get_external_ip_url(), "http://myexternalip.com/raw");
    }

    #[test]
    fn positive_builder_overrides() {
        let local_ip = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        let builder = GatewayBuilder::new()
            .local_ip(local_ip)
            .ssdp_addr("127.0.0.1:1900")
            .search_timeout(Duration::from_millis(250))
            .http_timeout(None)
            .external_ip_url("http://127.0.0.1:8080/ip");

        assert_eq!(builder.get_local_ip(), Some(local_ip));
        assert_eq!(builder.get_ssdp_addr(), "127.0.0.1:1900");
        assert_eq!(builder.get_search_timeout(), Duration::from_millis(250));
        assert_eq!(builder.get_http_timeout(), None);
        assert_eq!(builder.get_external_ip_url(), "http://127.0.0.1:8080/ip");
    }
}
