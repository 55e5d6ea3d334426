//! Private SOAP client for UPnP device communication
//!
//! This crate provides a minimal SOAP client for invoking actions on UPnP
//! control URLs. Transport failures are split into timeouts and other
//! network errors so callers can tell a switched-off device from a
//! misbehaving one.

mod error;

pub use error::SoapError;

use std::error::Error as _;
use std::io;
use std::time::Duration;
use xmltree::Element;

/// A minimal SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with default configuration
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(2), Duration::from_secs(2))
    }

    /// Create a SOAP client with explicit connect and read timeouts
    pub fn with_timeouts(connect: Duration, read: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect)
                .timeout_read(read)
                .build(),
        }
    }

    /// Invoke `action` on the service at `control_url` and return the
    /// `<{action}Response>` element.
    ///
    /// `payload` is the already-serialized argument list, e.g.
    /// `<InstanceID>0</InstanceID><Channel>Master</Channel>`.
    pub fn call(
        &self,
        control_url: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = format!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
                <s:Body>
                    <u:{action} xmlns:u="{service_uri}">
                        {payload}
                    </u:{action}>
                </s:Body>
            </s:Envelope>"#,
            action = action,
            service_uri = service_uri,
            payload = payload
        );

        let soap_action = format!("\"{}#{}\"", service_uri, action);

        let xml_text = match self
            .agent
            .post(control_url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body)
        {
            Ok(response) => response.into_string().map_err(read_error)?,
            // UPnP devices report faults with HTTP 500 and a SOAP Fault body
            Err(ureq::Error::Status(code, response)) => {
                let text = response
                    .into_string()
                    .map_err(|_| SoapError::Network(format!("HTTP {}", code)))?;
                let xml = Element::parse(text.as_bytes())
                    .map_err(|_| SoapError::Network(format!("HTTP {}", code)))?;
                return match self.extract_response(&xml, action) {
                    Err(SoapError::Fault(fault)) => Err(SoapError::Fault(fault)),
                    _ => Err(SoapError::Network(format!("HTTP {}", code))),
                };
            }
            Err(ureq::Error::Transport(transport)) => return Err(transport_error(transport)),
        };

        let xml = Element::parse(xml_text.as_bytes())
            .map_err(|e| SoapError::Parse(e.to_string()))?;

        // Extract response or handle SOAP fault
        self.extract_response(&xml, action)
    }

    fn extract_response(&self, xml: &Element, action: &str) -> Result<Element, SoapError> {
        let body = xml
            .get_child("Body")
            .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

        // Check for SOAP fault first
        if let Some(fault) = body.get_child("Fault") {
            let error_code = fault
                .get_child("detail")
                .and_then(|d| d.get_child("UPnPError").or_else(|| d.get_child("UpnPError")))
                .and_then(|e| e.get_child("errorCode"))
                .and_then(|c| c.get_text())
                .and_then(|t| t.trim().parse::<u16>().ok())
                .unwrap_or(500);
            return Err(SoapError::Fault(error_code));
        }

        let response_name = format!("{}Response", action);
        body.get_child(response_name.as_str())
            .cloned()
            .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn transport_error(transport: ureq::Transport) -> SoapError {
    let timed_out = transport
        .source()
        .and_then(|source| source.downcast_ref::<io::Error>())
        .map(is_timeout)
        .unwrap_or(false);

    if timed_out {
        SoapError::Timeout(transport.to_string())
    } else {
        SoapError::Network(transport.to_string())
    }
}

fn read_error(err: io::Error) -> SoapError {
    if is_timeout(&err) {
        SoapError::Timeout(err.to_string())
    } else {
        SoapError::Network(err.to_string())
    }
}
