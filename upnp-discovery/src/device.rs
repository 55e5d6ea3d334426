//! Device description parsing and service lookup.
//!
//! Parses the UPnP device description document a device serves at its SSDP
//! `LOCATION` and resolves service control URLs against it.

use crate::error::{DiscoveryError, Result};
use crate::Device;
use serde::Deserialize;
use url::Url;

/// UPnP device description root element.
#[derive(Debug, Deserialize)]
pub struct Root {
    #[serde(rename = "URLBase")]
    pub url_base: Option<String>,
    pub device: DeviceDescription,
}

/// A `<device>` element, possibly with embedded devices.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    pub device_type: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub model_name: String,
    pub model_number: Option<String>,
    #[serde(rename = "UDN")]
    pub udn: String,
    #[serde(default)]
    pub service_list: ServiceList,
    #[serde(default)]
    pub device_list: DeviceList,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceList {
    #[serde(rename = "service", default)]
    pub services: Vec<ServiceDescription>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeviceList {
    #[serde(rename = "device", default)]
    pub devices: Vec<DeviceDescription>,
}

/// A `<service>` entry of a device's service list.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDescription {
    #[serde(rename = "serviceType")]
    pub service_type: String,
    #[serde(rename = "serviceId")]
    pub service_id: String,
    #[serde(rename = "controlURL")]
    pub control_url: String,
    #[serde(rename = "eventSubURL")]
    pub event_sub_url: Option<String>,
}

impl Root {
    /// Parse a full device description document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        quick_xml::de::from_str(xml)
            .map_err(|e| DiscoveryError::ParseError(format!("Failed to parse device XML: {}", e)))
    }

    /// Absolute control URL for `service_type`, searching embedded devices too.
    ///
    /// Relative control URLs resolve against `URLBase` when present, otherwise
    /// against the description's own location.
    pub fn control_url(&self, location: &str, service_type: &str) -> Result<String> {
        let service = self
            .device
            .find_service(service_type)
            .ok_or_else(|| DiscoveryError::ServiceNotFound(service_type.to_string()))?;

        let base = self.url_base.as_deref().unwrap_or(location);
        let base = Url::parse(base).map_err(|e| {
            DiscoveryError::ParseError(format!("Invalid base URL '{}': {}", base, e))
        })?;

        base.join(&service.control_url)
            .map(String::from)
            .map_err(|e| {
                DiscoveryError::ParseError(format!(
                    "Invalid control URL '{}': {}",
                    service.control_url, e
                ))
            })
    }
}

impl DeviceDescription {
    /// Depth-first search for a service of the given type.
    pub fn find_service(&self, service_type: &str) -> Option<&ServiceDescription> {
        self.service_list
            .services
            .iter()
            .find(|s| s.service_type == service_type)
            .or_else(|| {
                self.device_list
                    .devices
                    .iter()
                    .find_map(|d| d.find_service(service_type))
            })
    }

    /// Convert to the public `Device` type.
    ///
    /// Returns `None` if the location is not an absolute http(s) URL with a host.
    pub fn to_device(&self, location: &str) -> Option<Device> {
        let (ip_address, port) = host_and_port(location)?;
        Some(Device {
            id: self.udn.clone(),
            name: self.friendly_name.clone(),
            manufacturer: self.manufacturer.clone(),
            model_name: self.model_name.clone(),
            location: location.to_string(),
            ip_address,
            port,
        })
    }
}

/// Host and effective port of a URL.
pub fn host_and_port(url: &str) -> Option<(String, u16)> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?.to_string();
    let port = url.port_or_known_default()?;
    Some((host, port))
}
