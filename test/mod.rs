extern crate bip_igdp;

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{IpAddr, Ipv4Addr, TcpListener, UdpSocket};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use bip_igdp::{GatewayBuilder, GatewayResult, HttpRequest, HttpResponse, HttpTransport};


const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

const LOCATION:    &str = "http://10.0.0.1:1234/rootDesc.xml";
const CONTROL_URL: &str = "http://10.0.0.1:1234/ctl/IPConn";
const ECHO_URL:    &str = "http://echo.test/raw";

const WAN_IP_SCHEMA:  &str = "urn:schemas-upnp-org:service:WANIPConnection:1";
const WAN_PPP_SCHEMA: &str = "urn:schemas-upnp-org:service:WANPPPConnection:1";

const WAN_IP_DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <URLBase>http://10.0.0.1:1234/</URLBase>
  <device>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:Layer3Forwarding:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:L3Forwarding1</serviceId>
        <controlURL>/ctl/L3F</controlURL>
        <eventSubURL>/evt/L3F</eventSubURL>
        <SCPDURL>/L3F.xml</SCPDURL>
      </service>
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
</root>"#;

const WAN_PPP_DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:WANPPPConnection:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:WANPPPConn1</serviceId>
        <controlURL>/ctl/PPPConn</controlURL>
        <eventSubURL>/evt/PPPConn</eventSubURL>
        <SCPDURL>/WANPPPCn.xml</SCPDURL>
      </service>
    </serviceList>
  </device>
</root>"#;

const NO_WAN_DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <URLBase>http://10.0.0.1:1234/</URLBase>
  <device>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:Layer3Forwarding:1</serviceType>
        <controlURL>/ctl/L3F</controlURL>
      </service>
    </serviceList>
  </device>
</root>"#;

/// Transport that records requests and answers from a table of canned responses.
#[derive(Clone)]
struct MockTransport {
    inner: Arc<Mutex<InnerMockTransport>>
}

struct InnerMockTransport {
    responses: HashMap<String, HttpResponse>,
    requests:  Vec<HttpRequest>
}

impl MockTransport {
    pub fn new() -> MockTransport {
        MockTransport{ inner: Arc::new(Mutex::new(InnerMockTransport{
            responses: HashMap::new(), requests: Vec::new() })) }
    }

    pub fn respond(&self, url: &str, response: HttpResponse) {
        self.inner.lock().unwrap().responses.insert(url.to_string(), response);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.lock().unwrap().requests.clone()
    }
}

impl HttpTransport for MockTransport {
    fn execute(&self, request: HttpRequest) -> GatewayResult<HttpResponse> {
        let mut inner_lock = self.inner.lock().unwrap();
        inner_lock.requests.push(request.clone());

        match inner_lock.responses.get(request.url()) {
            Some(response) => Ok(response.clone()),
            None => Err(io::Error::new(io::ErrorKind::ConnectionRefused, "No Canned Response").into())
        }
    }
}

fn ok_response(body: &str) -> HttpResponse {
    HttpResponse::new(200, "OK", body)
}

fn local_builder() -> GatewayBuilder {
    GatewayBuilder::new()
        .local_ip(LOCALHOST)
        .external_ip_url(ECHO_URL)
}

/// Answer one search request with the given reply, returning the address to
/// search against and a handle yielding the raw request that was received.
fn spawn_ssdp_responder(reply: &'static str) -> (String, JoinHandle<Vec<u8>>) {
    let responder = UdpSocket::bind((LOCALHOST, 0)).unwrap();
    let ssdp_addr = responder.local_addr().unwrap().to_string();

    let handle = thread::spawn(move || {
        let mut buffer = [0u8; 1024];
        let (bytes_read, from) = responder.recv_from(&mut buffer).unwrap();

        responder.send_to(reply.as_bytes(), from).unwrap();
        buffer[..bytes_read].to_vec()
    });

    (ssdp_addr, handle)
}

/// Serve one http exchange with the given raw response, returning the address
/// to connect to and a handle yielding the raw request that was received.
fn spawn_http_responder(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind((LOCALHOST, 0)).unwrap();
    let http_addr = listener.local_addr().unwrap().to_string();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);

        let mut request = String::new();
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            request.push_str(&line);

            if line == "\r\n" || line.is_empty() {
                break;
            }
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("content-length:") {
                content_length = lower["content-length:".len()..].trim().parse().unwrap();
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();
        request.push_str(&String::from_utf8(body).unwrap());

        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).unwrap();

        request
    });

    (http_addr, handle)
}
