//! SSDP (Simple Service Discovery Protocol) client
//!
//! Sends a single M-SEARCH to the UPnP multicast group and yields every
//! parseable response until the socket read times out.

use crate::error::{DiscoveryError, Result};
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::time::Duration;

const SSDP_MULTICAST_ADDR: &str = "239.255.255.250:1900";

/// SSDP response containing device information
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SsdpResponse {
    pub location: String,
    pub urn: String,
    pub usn: String,
    pub server: Option<String>,
}

/// SSDP client for device discovery
pub(crate) struct SsdpClient {
    socket: UdpSocket,
}

impl SsdpClient {
    /// Create a new SSDP client with the specified timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| network("bind UDP socket", e))?;

        socket
            .set_read_timeout(Some(timeout))
            .map_err(|e| network("set read timeout", e))?;

        socket
            .set_multicast_loop_v4(true)
            .map_err(|e| network("set multicast loop", e))?;

        Ok(Self { socket })
    }

    /// Send an M-SEARCH request and return an iterator of responses
    pub fn search(&self, search_target: &str) -> Result<SsdpResponseIterator<'_>> {
        let request = search_request(search_target);

        self.socket
            .send_to(request.as_bytes(), SSDP_MULTICAST_ADDR)
            .map_err(|e| network("send M-SEARCH", e))?;

        Ok(SsdpResponseIterator::new(&self.socket))
    }
}

fn network(action: &str, e: std::io::Error) -> DiscoveryError {
    DiscoveryError::NetworkError(format!("Failed to {}: {}", action, e))
}

fn search_request(search_target: &str) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         MX: 2\r\n\
         ST: {}\r\n\
         USER-AGENT: volume-ctrl/{} UPnP/1.0\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR,
        search_target,
        env!("CARGO_PKG_VERSION"),
    )
}

/// Iterator for SSDP responses
pub(crate) struct SsdpResponseIterator<'a> {
    socket: &'a UdpSocket,
    buffer: [u8; 2048],
    finished: bool,
}

impl<'a> SsdpResponseIterator<'a> {
    fn new(socket: &'a UdpSocket) -> Self {
        Self {
            socket,
            buffer: [0; 2048],
            finished: false,
        }
    }
}

impl<'a> Iterator for SsdpResponseIterator<'a> {
    type Item = Result<SsdpResponse>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.socket.recv_from(&mut self.buffer) {
                Ok((size, _)) => {
                    // Skip non UTF-8 and unparseable datagrams
                    let parsed = std::str::from_utf8(&self.buffer[..size])
                        .ok()
                        .and_then(parse_ssdp_response);
                    if let Some(response) = parsed {
                        return Some(Ok(response));
                    }
                }
                Err(e) => {
                    self.finished = true;
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) {
                        return None;
                    }
                    let err = DiscoveryError::NetworkError(format!("Socket error: {}", e));
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

/// Parse an SSDP response from HTTP text
fn parse_ssdp_response(response: &str) -> Option<SsdpResponse> {
    let mut location = None;
    let mut urn = None;
    let mut usn = None;
    let mut server = None;

    for line in response.lines() {
        let line = line.trim();

        if let Some(value) = extract_header_value(line, "LOCATION:") {
            location = Some(value);
        } else if let Some(value) = extract_header_value(line, "ST:") {
            urn = Some(value);
        } else if let Some(value) = extract_header_value(line, "USN:") {
            usn = Some(value);
        } else if let Some(value) = extract_header_value(line, "SERVER:") {
            server = Some(value);
        }
    }

    match (location, urn, usn) {
        (Some(location), Some(urn), Some(usn)) => Some(SsdpResponse {
            location,
            urn,
            usn,
            server,
        }),
        _ => None,
    }
}

/// Extract header value from a line like "HEADER: value"
fn extract_header_value(line: &str, header: &str) -> Option<String> {
    if line.len() > header.len()
        && line.is_char_boundary(header.len())
        && line[..header.len()].eq_ignore_ascii_case(header)
    {
        Some(line[header.len()..].trim().to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_format() {
        let request = search_request("ssdp:all");

        assert!(request.starts_with("M-SEARCH * HTTP/1.1\r\n"));
        assert!(request.contains("HOST: 239.255.255.250:1900\r\n"));
        assert!(request.contains("MAN: \"ssdp:discover\"\r\n"));
        assert!(request.contains("ST: ssdp:all\r\n"));
        assert!(request.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_parse_ssdp_response_valid() {
        let response = "HTTP/1.1 200 OK\r\n\
            CACHE-CONTROL: max-age=1800\r\n\
            LOCATION: http://192.168.1.40:8091/XD/BO5EBO5E-F00D-F00D-FEED-08DF1F0C1B5A.xml\r\n\
            ST: urn:schemas-upnp-org:service:RenderingControl:1\r\n\
            USN: uuid:BO5EBO5E-F00D-F00D-FEED-08DF1F0C1B5A::urn:schemas-upnp-org:service:RenderingControl:1\r\n\
            SERVER: Linux/4.1 UPnP/1.0 Bose/1.0\r\n\
            \r\n";

        let parsed = parse_ssdp_response(response).unwrap();

        assert_eq!(
            parsed.location,
            "http://192.168.1.40:8091/XD/BO5EBO5E-F00D-F00D-FEED-08DF1F0C1B5A.xml"
        );
        assert_eq!(parsed.urn, "urn:schemas-upnp-org:service:RenderingControl:1");
        assert!(parsed.usn.starts_with("uuid:BO5EBO5E"));
        assert_eq!(parsed.server.as_deref(), Some("Linux/4.1 UPnP/1.0 Bose/1.0"));
    }

    #[test]
    fn test_parse_ssdp_response_case_insensitive() {
        let response = "HTTP/1.1 200 OK\r\n\
            location: http://192.168.1.102:1400/xml/device_description.xml\r\n\
            st: upnp:rootdevice\r\n\
            usn: uuid:abc::upnp:rootdevice\r\n\
            \r\n";

        let parsed = parse_ssdp_response(response).unwrap();

        assert_eq!(parsed.location, "http://192.168.1.102:1400/xml/device_description.xml");
        assert_eq!(parsed.urn, "upnp:rootdevice");
        assert_eq!(parsed.server, None);
    }

    #[test]
    fn test_parse_ssdp_response_missing_fields() {
        let missing_location = "HTTP/1.1 200 OK\r\nST: upnp:rootdevice\r\nUSN: uuid:abc\r\n\r\n";
        assert!(parse_ssdp_response(missing_location).is_none());

        let missing_usn =
            "HTTP/1.1 200 OK\r\nLOCATION: http://a/b.xml\r\nST: upnp:rootdevice\r\n\r\n";
        assert!(parse_ssdp_response(missing_usn).is_none());

        assert!(parse_ssdp_response("").is_none());
        assert!(parse_ssdp_response("not an ssdp response\r\n").is_none());
    }

    #[test]
    fn test_extract_header_value() {
        assert_eq!(
            extract_header_value("LoCaTiOn:   http://example.com  ", "LOCATION:"),
            Some("http://example.com".to_string())
        );
        assert_eq!(extract_header_value("LOCATION: ", "LOCATION:"), Some("".to_string()));
        assert_eq!(extract_header_value("LOCATION:", "LOCATION:"), None);
        assert_eq!(extract_header_value("LOCATIONS: value", "LOCATION:"), None);
        assert_eq!(extract_header_value("ÜÜÜÜÜ: value", "LOCATION:"), None);
    }
}
