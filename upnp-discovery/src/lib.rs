//! UPnP device discovery library
//!
//! Finds devices on the local network using SSDP and their UPnP device
//! descriptions, and narrows the results down with a vendor name filter.
//!
//! # Quick Start
//!
//! ```no_run
//! use upnp_discovery::{find_first, DeviceFilter, DiscoveryOptions};
//!
//! let filter = DeviceFilter::new("bose");
//! match find_first(&filter, &DiscoveryOptions::default()) {
//!     Some(device) => println!("Found {} at {}", device.name, device.ip_address),
//!     None => println!("nothing matched"),
//! }
//! ```

mod error;
mod ssdp;
pub mod device;
mod discovery;

pub use error::{DiscoveryError, Result};
pub use discovery::{fetch_description, DiscoveryIterator};

use std::time::Duration;

/// A device found on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Unique device identifier (UDN)
    pub id: String,
    /// Friendly name of the device
    pub name: String,
    pub manufacturer: String,
    /// Model name (e.g. "Bose Soundbar 700")
    pub model_name: String,
    /// URL of the device description document
    pub location: String,
    /// Host part of the description location
    pub ip_address: String,
    pub port: u16,
}

/// Events emitted during device discovery.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// A device answered the search and served a valid description
    Found(Device),
}

/// Case-insensitive vendor match against a device's identifying strings.
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    needle: String,
}

impl DeviceFilter {
    pub fn new(vendor: &str) -> Self {
        Self {
            needle: vendor.to_lowercase(),
        }
    }

    /// True if the vendor string is a substring of the manufacturer, model
    /// name or friendly name.
    pub fn matches(&self, device: &Device) -> bool {
        [&device.manufacturer, &device.model_name, &device.name]
            .iter()
            .any(|field| field.to_lowercase().contains(&self.needle))
    }

    /// First matching device of a discovery run.
    pub fn first_match<I>(&self, events: I) -> Option<Device>
    where
        I: IntoIterator<Item = DeviceEvent>,
    {
        events.into_iter().find_map(|event| match event {
            DeviceEvent::Found(device) if self.matches(&device) => Some(device),
            DeviceEvent::Found(_) => None,
        })
    }
}

/// Parameters of a single discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// How long to wait for SSDP responses and description fetches
    pub timeout: Duration,
    /// SSDP `ST` header value
    pub search_target: String,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            search_target: "ssdp:all".to_string(),
        }
    }
}

/// Get an iterator over all devices answering an `ssdp:all` search.
pub fn get_iter() -> DiscoveryIterator {
    get_iter_with_options(&DiscoveryOptions::default())
}

/// Get an iterator for a discovery run with custom options.
///
/// Socket setup failures produce an empty iterator.
pub fn get_iter_with_options(options: &DiscoveryOptions) -> DiscoveryIterator {
    DiscoveryIterator::new(options.timeout, &options.search_target).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to start discovery");
        DiscoveryIterator::empty()
    })
}

/// Scan the network and return the first device accepted by `filter`.
///
/// Blocks for up to the configured timeout plus description fetches.
pub fn find_first(filter: &DeviceFilter, options: &DiscoveryOptions) -> Option<Device> {
    filter.first_match(get_iter_with_options(options))
}
