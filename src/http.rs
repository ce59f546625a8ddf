//! Blocking HTTP/1.1 exchanges with the gateway.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use url::Url;

use crate::error::{GatewayError, GatewayErrorKind, GatewayResult};

/// Largest response body accepted from a peer, descriptions and soap replies are a few KiB.
pub const MAX_BODY_LEN: usize = 4 * 1024 * 1024;

/// Http methods used when talking to a gateway.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Method {
    Get,
    Post
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get  => "GET",
            Method::Post => "POST"
        }
    }
}

/// Request to be executed by some `HttpTransport`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HttpRequest {
    method:  Method,
    url:     String,
    headers: Vec<(String, String)>,
    body:    Vec<u8>
}

impl HttpRequest {
    /// Create a GET request with no headers.
    pub fn get(url: &str) -> HttpRequest {
        HttpRequest{ method: Method::Get, url: url.to_string(), headers: Vec::new(), body: Vec::new() }
    }

    /// Create a POST request carrying the given body.
    pub fn post<B>(url: &str, body: B) -> HttpRequest
        where B: Into<Vec<u8>> {
        HttpRequest{ method: Method::Post, url: url.to_string(), headers: Vec::new(), body: body.into() }
    }

    /// Append a header, headers are written in the order they were added.
    pub fn with_header<V>(mut self, name: &str, value: V) -> HttpRequest
        where V: Into<String> {
        self.headers.push((name.to_string(), value.into()));

        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case insensitive lookup of the first header with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Response returned from some `HttpTransport`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct HttpResponse {
    code:    u16,
    reason:  String,
    headers: Vec<(String, String)>,
    body:    Vec<u8>
}

impl HttpResponse {
    pub fn new<R, B>(code: u16, reason: R, body: B) -> HttpResponse
        where R: Into<String>, B: Into<Vec<u8>> {
        HttpResponse{ code: code, reason: reason.into(), headers: Vec::new(), body: body.into() }
    }

    pub fn with_header<V>(mut self, name: &str, value: V) -> HttpResponse
        where V: Into<String> {
        self.headers.push((name.to_string(), value.into()));

        self
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Status line without the http version, for example `200 OK`.
    pub fn status(&self) -> String {
        if self.reason.is_empty() {
            self.code.to_string()
        } else {
            format!("{} {}", self.code, self.reason)
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as utf-8, invalid sequences are replaced.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Turn any non 200 response into an `HttpStatus` error carrying the raw body.
    pub fn ensure_ok(self) -> GatewayResult<HttpResponse> {
        if self.code == 200 {
            Ok(self)
        } else {
            Err(GatewayErrorKind::HttpStatus {
                code: self.code,
                status: self.status(),
                body: self.body_text()
            }.into())
        }
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers.iter()
        .find(|&(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

//----------------------------------------------------------------------------//

/// Trait for executing http requests against a gateway.
pub trait HttpTransport {
    /// Execute the request, blocking until the full response has been read.
    fn execute(&self, request: HttpRequest) -> GatewayResult<HttpResponse>;
}

impl<'a, T> HttpTransport for &'a T where T: HttpTransport + ?Sized {
    fn execute(&self, request: HttpRequest) -> GatewayResult<HttpResponse> {
        (**self).execute(request)
    }
}

/// Transport that opens a new `TcpStream` for every request.
#[derive(Copy, Clone, Debug)]
pub struct TcpTransport {
    timeout: Option<Duration>
}

impl TcpTransport {
    /// Create a new TcpTransport.
    ///
    /// The timeout bounds connecting as well as every individual read and write,
    /// a value of None will block indefinitely on an unresponsive peer.
    pub fn new(timeout: Option<Duration>) -> TcpTransport {
        TcpTransport{ timeout: timeout }
    }
}

impl HttpTransport for TcpTransport {
    fn execute(&self, request: HttpRequest) -> GatewayResult<HttpResponse> {
        let url = Url::parse(request.url())?;
        let host = url.host_str().ok_or_else(|| GatewayError::from(
            GatewayErrorKind::AddressResolution{ addr: request.url().to_string() }
        ))?;
        let port = url.port_or_known_default().unwrap_or(80);

        let mut stream = connect(host, port, self.timeout)?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;

        write_request(&mut stream, &url, &request)?;
        let response = read_response(BufReader::new(stream))?;

        trace!("bip_igdp: {} {} Returned {}", request.method().as_str(), request.url(), response.status());

        Ok(response)
    }
}

fn connect(host: &str, port: u16, timeout: Option<Duration>) -> GatewayResult<TcpStream> {
    // Url hosts keep the brackets around ipv6 literals
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let resolution_error = || GatewayError::from(
        GatewayErrorKind::AddressResolution{ addr: format!("{}:{}", host, port) }
    );

    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()
        .map_err(|_| resolution_error())?
        .collect();

    let mut last_error = None;
    for addr in addrs {
        let result = match timeout {
            Some(duration) => TcpStream::connect_timeout(&addr, duration),
            None           => TcpStream::connect(addr)
        };

        match result {
            Ok(stream) => return Ok(stream),
            Err(error) => last_error = Some(error)
        }
    }

    Err(last_error.map(GatewayError::from).unwrap_or_else(resolution_error))
}

fn write_request<W>(writer: &mut W, url: &Url, request: &HttpRequest) -> io::Result<()>
    where W: Write {
    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }

    let mut host = url.host_str().unwrap_or_default().to_string();
    if let Some(port) = url.port() {
        host.push_str(&format!(":{}", port));
    }

    let mut head = format!("{} {} HTTP/1.1\r\nHost: {}\r\n", request.method().as_str(), path, host);
    for (name, value) in request.headers() {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    writer.write_all(head.as_bytes())?;
    writer.write_all(request.body())?;
    writer.flush()
}

/// Read a full response, the body may be framed by chunked encoding, a content
/// length, or the peer closing the connection.
pub fn read_response<R>(mut reader: R) -> GatewayResult<HttpResponse>
    where R: BufRead {
    let status_line = read_line(&mut reader)?.ok_or_else(|| invalid_response("Connection Closed Before Status Line"))?;
    let (code, reason) = parse_status_line(&status_line)?;

    let mut headers = Vec::new();
    loop {
        let line = read_line(&mut reader)?.ok_or_else(|| invalid_response("Connection Closed Before Headers Ended"))?;
        if line.is_empty() {
            break;
        }

        let mut name_value = line.splitn(2, ':');
        match (name_value.next(), name_value.next()) {
            (Some(name), Some(value)) => headers.push((name.trim().to_string(), value.trim().to_string())),
            _ => return Err(invalid_response(format!("Malformed Header Line {:?}", line)))
        }
    }

    let chunked = find_header(&headers, "Transfer-Encoding")
        .map(|value| value.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);
    let content_length = match find_header(&headers, "Content-Length") {
        Some(value) => Some(value.parse::<u64>().map_err(|_| invalid_response(format!("Bad Content-Length {:?}", value)))?),
        None        => None
    };

    let body = if chunked {
        read_chunked(&mut reader)?
    } else if let Some(length) = content_length {
        if length > MAX_BODY_LEN as u64 {
            return Err(body_too_large());
        }

        let mut body = Vec::new();
        reader.by_ref().take(length).read_to_end(&mut body)?;

        if (body.len() as u64) < length {
            return Err(invalid_response("Connection Closed Before Body Ended"));
        }
        body
    } else {
        let mut body = Vec::new();
        read_bounded(&mut reader, MAX_BODY_LEN as u64 + 1, &mut body)?;

        if body.len() > MAX_BODY_LEN {
            return Err(body_too_large());
        }
        body
    };

    Ok(HttpResponse{ code: code, reason: reason, headers: headers, body: body })
}

fn parse_status_line(line: &str) -> GatewayResult<(u16, String)> {
    let mut parts = line.splitn(3, ' ');

    if !parts.next().map(|version| version.starts_with("HTTP/")).unwrap_or(false) {
        return Err(invalid_response(format!("Malformed Status Line {:?}", line)));
    }
    let code = parts.next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| invalid_response(format!("Malformed Status Line {:?}", line)))?;
    let reason = parts.next().unwrap_or("").trim().to_string();

    Ok((code, reason))
}

fn read_chunked<R>(reader: &mut R) -> GatewayResult<Vec<u8>>
    where R: BufRead {
    let mut body = Vec::new();

    loop {
        let size_line = read_line(reader)?.ok_or_else(|| invalid_response("Connection Closed Before Chunk Size"))?;
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = u64::from_str_radix(size_hex, 16)
            .map_err(|_| invalid_response(format!("Bad Chunk Size {:?}", size_hex)))?;

        if size == 0 {
            // Trailers are discarded, a peer that closes early is tolerated
            while let Some(line) = read_line(reader)? {
                if line.is_empty() {
                    break;
                }
            }
            return Ok(body);
        }

        let remaining = (MAX_BODY_LEN - body.len()) as u64;
        if size > remaining {
            return Err(body_too_large());
        }

        let start = body.len();
        read_bounded(reader, size, &mut body)?;
        if ((body.len() - start) as u64) < size {
            return Err(invalid_response("Connection Closed Before Chunk Ended"));
        }
        read_line(reader)?;
    }
}

// Grows the body only as bytes actually arrive
fn read_bounded<R>(reader: &mut R, limit: u64, body: &mut Vec<u8>) -> io::Result<usize>
    where R: Read {
    reader.by_ref().take(limit).read_to_end(body)
}

fn body_too_large() -> GatewayError {
    invalid_response(format!("Response Body Exceeds {} Bytes", MAX_BODY_LEN))
}

fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
    where R: BufRead {
    let mut raw = Vec::new();

    if reader.read_until(b'\n', &mut raw)? == 0 {
        return Ok(None);
    }
    while raw.last() == Some(&b'\n') || raw.last() == Some(&b'\r') {
        raw.pop();
    }

    Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
}

fn invalid_response<D>(details: D) -> GatewayError
    where D: Into<String> {
    GatewayErrorKind::InvalidResponse{ details: details.into() }.into()
}
