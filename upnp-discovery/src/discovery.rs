//! Core discovery logic and iterator implementation.
//!
//! The iterator:
//! 1. Sends one SSDP M-SEARCH for the configured search target
//! 2. Buffers all responses received within the timeout
//! 3. Deduplicates responders by location
//! 4. Fetches and parses each device description over HTTP
//! 5. Yields discovered devices as events

use crate::device::Root;
use crate::error::{DiscoveryError, Result};
use crate::ssdp::{SsdpClient, SsdpResponse};
use crate::DeviceEvent;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, trace};

/// Iterator that discovers UPnP devices on the local network.
///
/// # Examples
///
/// ```no_run
/// use upnp_discovery::{get_iter, DeviceEvent};
///
/// for event in get_iter() {
///     match event {
///         DeviceEvent::Found(device) => {
///             println!("Found: {} ({})", device.name, device.model_name);
///         }
///     }
/// }
/// ```
pub struct DiscoveryIterator {
    ssdp_client: Option<SsdpClient>,
    search_target: String,
    ssdp_buffer: Vec<SsdpResponse>,
    buffer_index: usize,
    seen_locations: HashSet<String>,
    http_client: reqwest::blocking::Client,
}

impl DiscoveryIterator {
    /// Create a new discovery iterator
    pub fn new(timeout: Duration, search_target: &str) -> Result<Self> {
        let ssdp_client = SsdpClient::new(timeout)?;
        let mut iter = Self::from_responses(Vec::new(), timeout)?;
        iter.ssdp_client = Some(ssdp_client);
        iter.search_target = search_target.to_string();
        Ok(iter)
    }

    /// Iterator over an already-collected set of SSDP responses.
    pub(crate) fn from_responses(responses: Vec<SsdpResponse>, timeout: Duration) -> Result<Self> {
        let http_client = http_client(timeout)?;
        Ok(Self {
            ssdp_client: None,
            search_target: String::new(),
            ssdp_buffer: responses,
            buffer_index: 0,
            seen_locations: HashSet::new(),
            http_client,
        })
    }

    /// Create an empty iterator that yields no results
    pub(crate) fn empty() -> Self {
        Self {
            ssdp_client: None,
            search_target: String::new(),
            ssdp_buffer: Vec::new(),
            buffer_index: 0,
            seen_locations: HashSet::new(),
            http_client: reqwest::blocking::Client::new(),
        }
    }

    fn fill_buffer(&mut self) {
        if let Some(client) = self.ssdp_client.take() {
            match client.search(&self.search_target) {
                Ok(iter) => {
                    self.ssdp_buffer.extend(iter.filter_map(|result| result.ok()));
                    debug!(
                        responses = self.ssdp_buffer.len(),
                        search_target = %self.search_target,
                        "SSDP search finished"
                    );
                }
                Err(e) => debug!(error = %e, "SSDP search failed"),
            }
        }
    }
}

impl Iterator for DiscoveryIterator {
    type Item = DeviceEvent;

    fn next(&mut self) -> Option<Self::Item> {
        // Fill buffer on first call
        if self.ssdp_client.is_some() {
            self.fill_buffer();
        }

        while self.buffer_index < self.ssdp_buffer.len() {
            let location = self.ssdp_buffer[self.buffer_index].location.clone();
            self.buffer_index += 1;

            if !self.seen_locations.insert(location.clone()) {
                continue;
            }

            let root = match fetch_root(&self.http_client, &location) {
                Ok(root) => root,
                Err(e) => {
                    trace!(%location, error = %e, "skipping device");
                    continue;
                }
            };

            if let Some(device) = root.device.to_device(&location) {
                return Some(DeviceEvent::Found(device));
            }
        }

        None
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DiscoveryError::NetworkError(format!("Failed to create HTTP client: {}", e)))
}

fn fetch_root(client: &reqwest::blocking::Client, location: &str) -> Result<Root> {
    let xml = client
        .get(location)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(|e| {
            DiscoveryError::NetworkError(format!("Failed to fetch device description: {}", e))
        })?
        .text()
        .map_err(|e| DiscoveryError::NetworkError(format!("Failed to read response body: {}", e)))?;

    Root::from_xml(&xml)
}

/// Fetch and parse the description document at `location`.
pub fn fetch_description(location: &str, timeout: Duration) -> Result<Root> {
    fetch_root(&http_client(timeout)?, location)
}
