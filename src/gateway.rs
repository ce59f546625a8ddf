use std::net::IpAddr;

use crate::builder::GatewayBuilder;
use crate::description;
use crate::error::{GatewayError, GatewayErrorKind, GatewayResult};
use crate::http::{HttpRequest, HttpTransport, TcpTransport};
use crate::net;
use crate::soap;
use crate::ssdp;

const GET_EXTERNAL_IP_ACTION: &str = "GetExternalIPAddress";
const EXTERNAL_IP_ELEMENT:    &str = "NewExternalIPAddress";
const ADD_PORT_MAPPING_ACTION: &str = "AddPortMapping";

/// Protocol of every port mapping this client creates.
pub const MAPPING_PROTOCOL: &str = "UDP";

/// Description attached to every port mapping this client creates.
pub const MAPPING_DESCRIPTION: &str = "bip_igdp";

/// Lease duration of every port mapping, zero asks the gateway for a permanent mapping.
pub const MAPPING_LEASE_DURATION: u32 = 0;

/// Control endpoint of the gateway's WAN connection service.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ControlPoint {
    /// No WAN connection service was found (or setup has not run).
    Unresolved,
    /// Service type used as the SOAP action namespace, and the control path.
    Resolved {
        schema:      String,
        control_url: String
    }
}

impl ControlPoint {
    pub fn is_resolved(&self) -> bool {
        match self {
            ControlPoint::Unresolved     => false,
            ControlPoint::Resolved{ .. } => true
        }
    }

    pub fn schema(&self) -> Option<&str> {
        match self {
            ControlPoint::Unresolved             => None,
            ControlPoint::Resolved{ schema, .. } => Some(schema.as_str())
        }
    }

    pub fn control_url(&self) -> Option<&str> {
        match self {
            ControlPoint::Unresolved                  => None,
            ControlPoint::Resolved{ control_url, .. } => Some(control_url.as_str())
        }
    }
}

impl Default for ControlPoint {
    fn default() -> ControlPoint {
        ControlPoint::Unresolved
    }
}

/// Everything learned about the gateway during setup.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct GatewayState {
    local_ip:    Option<IpAddr>,
    location:    Option<String>,
    base_url:    Option<String>,
    control:     ControlPoint,
    external_ip: Option<String>
}

impl GatewayState {
    /// Local ip port mappings point at.
    pub fn local_ip(&self) -> Option<IpAddr> {
        self.local_ip
    }

    /// Device description url advertised by the gateway.
    pub fn location(&self) -> Option<&str> {
        self.location.as_ref().map(|location| &**location)
    }

    /// Base url that relative control paths are resolved against.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_ref().map(|base_url| &**base_url)
    }

    pub fn control(&self) -> &ControlPoint {
        &self.control
    }

    /// External ip from the last successful lookup, not refreshed automatically.
    pub fn external_ip(&self) -> Option<&str> {
        self.external_ip.as_ref().map(|external_ip| &**external_ip)
    }

    /// Schema and absolute control url, if a control endpoint was resolved.
    pub fn control_endpoint(&self) -> Option<(String, String)> {
        match self.control {
            ControlPoint::Unresolved => None,
            ControlPoint::Resolved{ ref schema, ref control_url } => {
                let url = if control_url.starts_with("http://") || control_url.starts_with("https://") {
                    control_url.clone()
                } else {
                    let base_url = self.base_url().unwrap_or("");

                    if control_url.starts_with('/') {
                        format!("{}{}", base_url, control_url)
                    } else {
                        format!("{}/{}", base_url, control_url)
                    }
                };

                Some((schema.clone(), url))
            }
        }
    }
}

//----------------------------------------------------------------------------//

/// Session with a single internet gateway device.
///
/// Call `setup` first, it discovers the gateway and resolves its control
/// endpoint. Every operation blocks until it completes, fails, or times out.
/// Operations are not retried.
pub struct Gateway<T = TcpTransport> {
    builder:   GatewayBuilder,
    transport: T,
    state:     GatewayState
}

impl Gateway<TcpTransport> {
    /// Create a new Gateway with the default configuration.
    pub fn new() -> Gateway<TcpTransport> {
        Gateway::with_builder(GatewayBuilder::new())
    }

    /// Create a new Gateway that talks http over tcp.
    pub fn with_builder(builder: GatewayBuilder) -> Gateway<TcpTransport> {
        let transport = TcpTransport::new(builder.get_http_timeout());

        Gateway::with_transport(builder, transport)
    }
}

impl<T> Gateway<T> where T: HttpTransport {
    /// Create a new Gateway on top of the given transport.
    pub fn with_transport(builder: GatewayBuilder, transport: T) -> Gateway<T> {
        Gateway{ builder: builder, transport: transport, state: GatewayState::default() }
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Discover the gateway and resolve its WAN connection control endpoint.
    ///
    /// Finding a gateway without a WAN connection service is not an error,
    /// external ip lookups then go through the echo service and port mapping
    /// fails with `NoControlEndpoint`. State is only replaced on success.
    pub fn setup(&mut self) -> GatewayResult<()> {
        let local_ip = self.local_ip()?;
        let location = ssdp::discover(local_ip, self.builder.get_ssdp_addr(), self.builder.get_search_timeout())?;

        self.resolve_from(local_ip, location)
    }

    /// Resolve the control endpoint from an already known description url.
    pub fn resolve(&mut self, location: &str) -> GatewayResult<()> {
        let local_ip = self.local_ip()?;

        self.resolve_from(local_ip, location.to_string())
    }

    fn resolve_from(&mut self, local_ip: IpAddr, location: String) -> GatewayResult<()> {
        let description = description::fetch(&self.transport, &location)?;
        let base_url = match description.base_url {
            Some(base_url) => base_url,
            None           => description::origin_of(&location)?
        };

        match description.control {
            ControlPoint::Resolved{ ref schema, ref control_url } => {
                debug!("bip_igdp: Resolved {} Control Endpoint At {}{}", schema, base_url, control_url);
            },
            ControlPoint::Unresolved => {
                warn!("bip_igdp: Gateway At {} Has No WAN Connection Service", location);
            }
        }

        self.state = GatewayState{ local_ip: Some(local_ip),
            location: Some(location),
            base_url: Some(base_url),
            control: description.control,
            external_ip: None
        };

        Ok(())
    }

    fn local_ip(&self) -> GatewayResult<IpAddr> {
        match self.builder.get_local_ip().or(self.state.local_ip) {
            Some(local_ip) => Ok(local_ip),
            None           => net::local_ip()
        }
    }

    /// Ask the gateway for our external ip, caching the result.
    ///
    /// Without a resolved control endpoint the configured echo service is
    /// queried instead and its trimmed body is taken as the ip.
    pub fn external_ip(&mut self) -> GatewayResult<String> {
        let external_ip = match self.state.control_endpoint() {
            Some((schema, control_url)) => self.query_external_ip(&schema, &control_url)?,
            None                        => self.echo_external_ip()?
        };

        self.state.external_ip = Some(external_ip.clone());

        Ok(external_ip)
    }

    fn query_external_ip(&self, schema: &str, control_url: &str) -> GatewayResult<String> {
        let action_xml = soap::action_body(schema, GET_EXTERNAL_IP_ACTION, &[]);
        let mut scanner = soap::invoke_xml(&self.transport, control_url, schema, GET_EXTERNAL_IP_ACTION, &action_xml)?;

        while scanner.next() {
            if scanner.current() == Some(EXTERNAL_IP_ELEMENT) {
                if let Some(text) = scanner.read_text() {
                    return Ok(text.trim().to_string());
                }
                break;
            }
        }

        match scanner.into_error() {
            Some(error) => Err(GatewayError::from(error)),
            None        => Err(GatewayErrorKind::NoResultElement{ element: EXTERNAL_IP_ELEMENT }.into())
        }
    }

    fn echo_external_ip(&self) -> GatewayResult<String> {
        warn!("bip_igdp: No Control Endpoint, Asking {} For External IP", self.builder.get_external_ip_url());

        let request = HttpRequest::get(self.builder.get_external_ip_url())
            .with_header("Connection", "close");
        let response = self.transport.execute(request)?.ensure_ok()?;

        Ok(response.body_text().trim().to_string())
    }

    /// Ask the gateway to forward udp traffic on external_port to internal_port
    /// on our local ip, permanently and from any remote host.
    ///
    /// On success the raw response body is returned unvalidated.
    pub fn add_port_mapping(&self, internal_port: u16, external_port: u16) -> GatewayResult<String> {
        let (schema, control_url) = self.state.control_endpoint()
            .ok_or_else(|| GatewayError::from(GatewayErrorKind::NoControlEndpoint))?;
        let local_ip = self.state.local_ip
            .ok_or_else(|| GatewayError::from(GatewayErrorKind::NoLocalIp))?;

        let action_xml = port_mapping_body(&schema, internal_port, external_port, local_ip);
        let response = soap::invoke(&self.transport, &control_url, &schema, ADD_PORT_MAPPING_ACTION, &action_xml)?;

        debug!("bip_igdp: Mapped External Port {} To {}:{}", external_port, local_ip, internal_port);

        Ok(response.body_text())
    }
}

fn port_mapping_body(schema: &str, internal_port: u16, external_port: u16, local_ip: IpAddr) -> String {
    let external_port = external_port.to_string();
    let internal_port = internal_port.to_string();
    let local_ip = local_ip.to_string();
    let lease_duration = MAPPING_LEASE_DURATION.to_string();

    soap::action_body(schema, ADD_PORT_MAPPING_ACTION, &[
        ("NewRemoteHost", ""),
        ("NewExternalPort", &external_port),
        ("NewProtocol", MAPPING_PROTOCOL),
        ("NewInternalPort", &internal_port),
        ("NewInternalClient", &local_ip),
        ("NewEnabled", "1"),
        ("NewPortMappingDescription", MAPPING_DESCRIPTION),
        ("NewLeaseDuration", &lease_duration)
    ])
}
