//! Device description retrieval.

use std::io::{Cursor, Read};

use url::Url;

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::ControlPoint;
use crate::http::{HttpRequest, HttpTransport};
use crate::scanner::XmlScanner;

/// Suffix shared by the WANIPConnection:1 and WANPPPConnection:1 service types.
const WAN_CONNECTION_SUFFIX: &str = "Connection:1";

/// Entry of a device description service list.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ServiceDescriptor {
    pub service_type:  String,
    pub service_id:    String,
    pub control_url:   String,
    pub event_sub_url: String,
    pub scpd_url:      String
}

impl ServiceDescriptor {
    /// Build a descriptor from the (name, text) pairs of a service element.
    pub fn from_fields(fields: Vec<(String, String)>) -> ServiceDescriptor {
        let mut service = ServiceDescriptor::default();

        for (name, value) in fields {
            let value = value.trim().to_string();

            match name.as_str() {
                "serviceType" => service.service_type = value,
                "serviceId"   => service.service_id = value,
                "controlURL"  => service.control_url = value,
                "eventSubURL" => service.event_sub_url = value,
                "SCPDURL"     => service.scpd_url = value,
                _             => ()
            }
        }

        service
    }

    /// Whether this is a WAN IP or WAN PPP connection service.
    pub fn is_wan_connection(&self) -> bool {
        self.service_type.ends_with(WAN_CONNECTION_SUFFIX)
    }
}

/// What was learned from a device description.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DeviceDescription {
    /// Base url without a trailing slash, None if the document had no URLBase.
    pub base_url: Option<String>,
    /// First WAN connection service found, in document order.
    pub control:  ControlPoint
}

/// Fetch and scan the device description at location.
pub fn fetch<T>(transport: &T, location: &str) -> GatewayResult<DeviceDescription>
    where T: HttpTransport + ?Sized {
    let request = HttpRequest::get(location)
        .with_header("Connection", "keep-alive");
    let response = transport.execute(request)?.ensure_ok()?;

    scan(XmlScanner::new(Cursor::new(response.into_body())))
}

/// Scan a description document for its URLBase and first WAN connection service.
///
/// Scanning stops at the first matching service. A document without one is
/// not an error, the returned control point is simply unresolved.
pub fn scan<R>(mut scanner: XmlScanner<R>) -> GatewayResult<DeviceDescription>
    where R: Read {
    let mut base_url = None;
    let mut control = ControlPoint::Unresolved;

    while scanner.next() {
        match scanner.current() {
            Some("URLBase") => {
                if let Some(text) = scanner.read_text() {
                    base_url = Some(text.trim().trim_end_matches('/').to_string());
                }
            },
            Some("service") => {
                let service = ServiceDescriptor::from_fields(scanner.read_children());

                if service.is_wan_connection() {
                    control = ControlPoint::Resolved {
                        schema: service.service_type,
                        control_url: service.control_url
                    };
                    break;
                }
            },
            _ => ()
        }
    }

    match scanner.into_error() {
        Some(error) => Err(GatewayError::from(error)),
        None        => Ok(DeviceDescription{ base_url: base_url, control: control })
    }
}

/// Scheme, host and port of the description url, used when URLBase is absent.
pub fn origin_of(location: &str) -> GatewayResult<String> {
    let url = Url::parse(location)?;

    Ok(url.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::ServiceDescriptor;
    use crate::gateway::ControlPoint;
    use crate::scanner::XmlScanner;

    const DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <URLBase>http://10.0.0.1:1234/</URLBase>
  <device>
    <deviceType>urn:schemas-upnp-org:device:InternetGatewayDevice:1</deviceType>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:Layer3Forwarding:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:L3Forwarding1</serviceId>
        <controlURL>/ctl/L3F</controlURL>
        <eventSubURL>/evt/L3F</eventSubURL>
        <SCPDURL>/L3F.xml</SCPDURL>
      </service>
    </serviceList>
    <deviceList>
      <device>
        <serviceList>
          <service>
            <serviceType>urn:schemas-upnp-org:service:WANIPConnection:1</serviceType>
            <serviceId>urn:upnp-org:serviceId:WANIPConn1</serviceId>
            <controlURL>/ctl/IPConn</controlURL>
            <eventSubURL>/evt/IPConn</eventSubURL>
            <SCPDURL>/WANIPCn.xml</SCPDURL>
          </service>
          <service>
            <serviceType>urn:schemas-upnp-org:service:WANPPPConnection:1</serviceType>
            <serviceId>urn:upnp-org:serviceId:WANPPPConn1</serviceId>
            <controlURL>/ctl/PPPConn</controlURL>
            <eventSubURL>/evt/PPPConn</eventSubURL>
            <SCPDURL>/WANPPPCn.xml</SCPDURL>
          </service>
        </serviceList>
      </device>
    </deviceList>
  </device>
</root>"#;

    #[test]
    fn positive_scan_first_matching_service() {
        let description = super::scan(XmlScanner::new(Cursor::new(DESCRIPTION))).unwrap();

        assert_eq!(description.base_url, Some("http://10.0.0.1:1234".to_string()));
        assert_eq!(description.control, ControlPoint::Resolved {
            schema: "urn:schemas-upnp-org:service:WANIPConnection:1".to_string(),
            control_url: "/ctl/IPConn".to_string()
        });
    }

    #[test]
    fn positive_scan_without_wan_service() {
        let xml = "<root><serviceList><service><serviceType>urn:schemas-upnp-org:service:Layer3Forwarding:1</serviceType>\
            <controlURL>/ctl/L3F</controlURL></service></serviceList></root>";

        let description = super::scan(XmlScanner::new(Cursor::new(xml))).unwrap();

        assert_eq!(description.base_url, None);
        assert_eq!(description.control, ControlPoint::Unresolved);
    }

    #[test]
    fn negative_scan_malformed_document() {
        let xml = "<root><URLBase>http://10.0.0.1/</URLBase><serviceList>";

        assert!(super::scan(XmlScanner::new(Cursor::new(xml))).is_err());
    }

    #[test]
    fn positive_descriptor_from_fields() {
        let service = ServiceDescriptor::from_fields(vec![
            ("serviceType".to_string(), "\n urn:schemas-upnp-org:service:WANPPPConnection:1 ".to_string()),
            ("serviceId".to_string(), "urn:upnp-org:serviceId:WANPPPConn1".to_string()),
            ("controlURL".to_string(), "/ctl/PPPConn".to_string()),
            ("eventSubURL".to_string(), "/evt/PPPConn".to_string()),
            ("SCPDURL".to_string(), "/WANPPPCn.xml".to_string()),
            ("unknown".to_string(), "ignored".to_string())
        ]);

        assert!(service.is_wan_connection());
        assert_eq!(service.service_type, "urn:schemas-upnp-org:service:WANPPPConnection:1");
        assert_eq!(service.scpd_url, "/WANPPPCn.xml");
        assert_eq!(service.event_sub_url, "/evt/PPPConn");
    }

    #[test]
    fn negative_descriptor_other_connection_versions() {
        let service = ServiceDescriptor{ service_type: "urn:schemas-upnp-org:service:WANIPConnection:2".to_string(),
            ..ServiceDescriptor::default() };

        assert!(!service.is_wan_connection());
    }

    #[test]
    fn positive_origin_of_location() {
        assert_eq!(super::origin_of("http://192.168.1.1:5000/rootDesc.xml").unwrap(), "http://192.168.1.1:5000");
        assert_eq!(super::origin_of("http://192.168.1.1/rootDesc.xml").unwrap(), "http://192.168.1.1");
    }
}
