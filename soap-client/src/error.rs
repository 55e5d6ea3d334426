//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP communication
#[derive(Debug, Error)]
pub enum SoapError {
    /// The device did not answer within the configured connect/read timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Network or HTTP communication error
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// SOAP fault returned by the server
    #[error("SOAP fault: error code {0}")]
    Fault(u16),
}

impl SoapError {
    /// True for failures that mean the device is no longer reachable.
    ///
    /// Callers holding a device reference should drop it and rediscover.
    pub fn is_device_gone(&self) -> bool {
        matches!(self, SoapError::Timeout(_) | SoapError::Network(_))
    }
}
