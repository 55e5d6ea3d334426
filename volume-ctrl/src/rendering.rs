//! RenderingControl session bound to one device.

use crate::error::Result;
use soap_client::{SoapClient, SoapError};
use std::time::Duration;
use tracing::debug;
use upnp_discovery::{fetch_description, Device};
use xmltree::Element;

pub const RENDERING_CONTROL: &str = "urn:schemas-upnp-org:service:RenderingControl:1";

const GET_VOLUME_PAYLOAD: &str = "<InstanceID>0</InstanceID><Channel>Master</Channel>";

/// Resolved RenderingControl endpoint of a device.
#[derive(Debug, Clone)]
pub struct ControlSession {
    client: SoapClient,
    control_url: String,
}

impl ControlSession {
    /// Fetch the device description at `location` and bind to its
    /// RenderingControl control URL.
    pub fn connect(location: &str, timeout: Duration) -> Result<Self> {
        let root = fetch_description(location, timeout)?;
        let control_url = root.control_url(location, RENDERING_CONTROL)?;
        debug!(%control_url, "resolved RenderingControl");
        Ok(Self::with_control_url(
            SoapClient::with_timeouts(timeout, timeout),
            control_url,
        ))
    }

    pub fn for_device(device: &Device, timeout: Duration) -> Result<Self> {
        Self::connect(&device.location, timeout)
    }

    pub fn with_control_url(client: SoapClient, control_url: impl Into<String>) -> Self {
        Self {
            client,
            control_url: control_url.into(),
        }
    }

    pub fn control_url(&self) -> &str {
        &self.control_url
    }

    /// Current master volume.
    pub fn get_volume(&self) -> std::result::Result<u16, SoapError> {
        let response = self.client.call(
            &self.control_url,
            RENDERING_CONTROL,
            "GetVolume",
            GET_VOLUME_PAYLOAD,
        )?;
        parse_current_volume(&response)
    }
}

fn parse_current_volume(response: &Element) -> std::result::Result<u16, SoapError> {
    let text = response
        .get_child("CurrentVolume")
        .and_then(|e| e.get_text())
        .ok_or_else(|| SoapError::Parse("Missing CurrentVolume".to_string()))?;

    text.trim()
        .parse()
        .map_err(|_| SoapError::Parse(format!("Invalid CurrentVolume '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(xml: &str) -> Element {
        Element::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_current_volume() {
        let xml =
            response("<GetVolumeResponse><CurrentVolume>37</CurrentVolume></GetVolumeResponse>");
        assert_eq!(parse_current_volume(&xml).unwrap(), 37);
    }

    #[test]
    fn test_parse_current_volume_rejects_garbage() {
        let missing = response("<GetVolumeResponse/>");
        assert!(matches!(parse_current_volume(&missing), Err(SoapError::Parse(_))));

        let garbage =
            response("<GetVolumeResponse><CurrentVolume>loud</CurrentVolume></GetVolumeResponse>");
        assert!(matches!(parse_current_volume(&garbage), Err(SoapError::Parse(_))));
    }
}
