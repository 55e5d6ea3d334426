//! Error types for the volume pollers

use soap_client::SoapError;
use thiserror::Error;
use upnp_discovery::DiscoveryError;

#[derive(Debug, Error)]
pub enum PollError {
    /// The control session could not be set up from the device description
    #[error("Failed to open control session: {0}")]
    Session(#[from] DiscoveryError),

    /// The GetVolume call failed
    #[error("GetVolume failed: {0}")]
    Soap(#[from] SoapError),

    /// A blocking network task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PollError {
    /// True when the held device should be forgotten and rediscovered.
    pub fn is_device_gone(&self) -> bool {
        match self {
            PollError::Session(_) => true,
            PollError::Soap(e) => e.is_device_gone(),
            PollError::Task(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PollError>;
