//! SOAP framing for gateway control actions.

use std::io::Cursor;

use xml::escape::{escape_str_attribute, escape_str_pcdata};

use crate::error::GatewayResult;
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::scanner::XmlScanner;

// {1} = Action Element
const SOAP_ENVELOPE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>
<SOAP-ENV:Envelope
 SOAP-ENV:encodingStyle=\"http://schemas.xmlsoap.org/soap/encoding/\"
 xmlns:SOAP-ENV=\"http://schemas.xmlsoap.org/soap/envelope/\"
 xmlns:SOAP-ENC=\"http://schemas.xmlsoap.org/soap/encoding/\"
 xmlns:xsi=\"http://www.w3.org/1999/XMLSchema-instance\"
 xmlns:xsd=\"http://www.w3.org/1999/XMLSchema\">
<SOAP-ENV:Body>
  {1}
</SOAP-ENV:Body>
</SOAP-ENV:Envelope>";

/// Wrap an action element in the SOAP 1.1 envelope expected by gateways.
///
/// The fragment is inserted as is, no well formedness checks are made.
pub fn envelope(action_xml: &str) -> String {
    SOAP_ENVELOPE.replace("{1}", action_xml)
}

/// Build the action element for the given schema with one child per parameter.
///
/// Parameter values are escaped, names are expected to be plain identifiers.
pub fn action_body(schema: &str, action: &str, params: &[(&str, &str)]) -> String {
    let mut body = format!("<m:{} xmlns:m=\"{}\">", action, escape_str_attribute(schema));

    for &(name, value) in params {
        body.push_str(&format!("\n<{0}>{1}</{0}>", name, escape_str_pcdata(value)));
    }
    if !params.is_empty() {
        body.push('\n');
    }

    body.push_str(&format!("</m:{}>", action));
    body
}

/// Value of the SOAPAction header for an action on the given schema.
pub fn soap_action_header(schema: &str, action: &str) -> String {
    format!("\"{}#{}\"", schema, action)
}

/// Post the enveloped action to the control url.
///
/// Any status other than 200 is returned as an `HttpStatus` error carrying the
/// raw response body, so the gateway's fault detail is not lost.
pub fn invoke<T>(transport: &T, control_url: &str, schema: &str, action: &str, action_xml: &str) -> GatewayResult<HttpResponse>
    where T: HttpTransport + ?Sized {
    let body = envelope(action_xml);
    let content_length = body.len().to_string();

    let request = HttpRequest::post(control_url, body)
        .with_header("SOAPAction", soap_action_header(schema, action))
        .with_header("Content-Type", "text/xml")
        .with_header("Connection", "Close")
        .with_header("Content-Length", content_length);

    transport.execute(request)?.ensure_ok()
}

/// Same as `invoke` but hands back a scanner over the response document.
pub fn invoke_xml<T>(transport: &T, control_url: &str, schema: &str, action: &str, action_xml: &str)
    -> GatewayResult<XmlScanner<Cursor<Vec<u8>>>> where T: HttpTransport + ?Sized {
    let response = invoke(transport, control_url, schema, action, action_xml)?;

    Ok(XmlScanner::new(Cursor::new(response.into_body())))
}
