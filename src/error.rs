//! Errors for gateway discovery and control.

use std::io;

use xml::reader;

error_chain! {
    types {
        GatewayError, GatewayErrorKind, GatewayResultExt, GatewayResult;
    }

    foreign_links {
        Io(io::Error);
        Xml(reader::Error);
        Url(url::ParseError);
    }

    errors {
        NoLocalIp {
            description("No Local IP Address Could Be Determined")
            display("No Local IP Address Could Be Determined")
        }
        AddressResolution {
            addr: String
        } {
            description("Failed To Resolve A Socket Address")
            display("Failed To Resolve The Socket Address {}", addr)
        }
        Timeout {
            description("Timed Out Waiting For A Discovery Reply")
            display("Timed Out Waiting For A Discovery Reply")
        }
        HttpStatus {
            code:   u16,
            status: String,
            body:   String
        } {
            description("Gateway Responded With A Non 200 Status")
            display("{}", status)
        }
        NoControlEndpoint {
            description("No WAN Connection Control Endpoint Has Been Resolved")
            display("No WAN Connection Control Endpoint Has Been Resolved")
        }
        NoResultElement {
            element: &'static str
        } {
            description("Response Did Not Contain The Expected Result Element")
            display("Response Did Not Contain The Expected Result Element {}", element)
        }
        InvalidResponse {
            details: String
        } {
            description("Received A Malformed Response")
            display("Received A Malformed Response: {}", details)
        }
    }
}

impl GatewayError {
    /// Raw response body attached to an `HttpStatus` error.
    ///
    /// Gateways put their SOAP fault detail here.
    pub fn response_body(&self) -> Option<&str> {
        match self.kind() {
            GatewayErrorKind::HttpStatus { body, .. } => Some(body.as_str()),
            _ => None
        }
    }
}
