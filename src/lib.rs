//! Client for the Internet Gateway Device Protocol.
//!
//! Discovers a UPnP gateway on the local network over SSDP, resolves the control
//! endpoint of its WAN connection service from the device description, and
//! sends it SOAP actions to learn our external ip and to forward udp ports to
//! this host.
//!
//! ```no_run
//! extern crate bip_igdp;
//!
//! use bip_igdp::Gateway;
//!
//! fn main() {
//!     let mut gateway = Gateway::new();
//!     gateway.setup().unwrap();
//!
//!     let external_ip = gateway.external_ip().unwrap();
//!     gateway.add_port_mapping(6881, 6881).unwrap();
//!
//!     println!("Reachable At {}:6881", external_ip);
//! }
//! ```

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate regex;
extern crate url;
extern crate xml;

mod builder;
mod gateway;
mod net;
mod scanner;

pub mod description;
pub mod http;
pub mod soap;
pub mod ssdp;

/// Errors produced while talking to a gateway.
pub mod error;

pub use crate::builder::{GatewayBuilder, DEFAULT_EXTERNAL_IP_URL};
pub use crate::error::{GatewayError, GatewayErrorKind, GatewayResult, GatewayResultExt};
pub use crate::gateway::{ControlPoint, Gateway, GatewayState, MAPPING_DESCRIPTION, MAPPING_LEASE_DURATION, MAPPING_PROTOCOL};
pub use crate::http::{HttpRequest, HttpResponse, HttpTransport, Method, TcpTransport};
pub use crate::net::local_ip;
