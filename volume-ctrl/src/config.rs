//! Command line configuration.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use upnp_discovery::{DeviceFilter, DiscoveryOptions};

/// Where the overlay text is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SurfaceKind {
    /// Full-screen terminal overlay
    Terminal,
    /// Headless: shown text goes to the log
    Log,
}

/// Show a soundbar's volume whenever it changes
#[derive(Parser, Debug, Clone)]
#[command(name = "volume-ctrl")]
#[command(version)]
pub struct Args {
    /// Case-insensitive vendor, model or name of the device to poll
    #[arg(long, default_value = "Bose", env = "VOLUME_CTRL_VENDOR")]
    pub vendor: String,

    /// SSDP search target
    #[arg(long, default_value = "ssdp:all")]
    pub search_target: String,

    /// Pause between discovery attempts while no device is held (ms)
    #[arg(long, default_value_t = 2000)]
    pub discovery_interval_ms: u64,

    /// SSDP response window and description fetch timeout (ms)
    #[arg(long, default_value_t = 3000)]
    pub discovery_timeout_ms: u64,

    /// Pause between volume requests (ms)
    #[arg(long, default_value_t = 200)]
    pub refresh_ms: u64,

    /// How long a new volume stays on screen (ms)
    #[arg(long, default_value_t = 500)]
    pub display_ms: u64,

    #[arg(long, value_enum, default_value_t = SurfaceKind::Terminal)]
    pub surface: SurfaceKind,

    /// Report random volumes instead of polling a device
    #[arg(long)]
    pub fake: bool,

    /// Base URL of a log relay to forward log lines to
    #[arg(long, env = "VOLUME_CTRL_RELAY_URL")]
    pub relay_url: Option<String>,

    /// Identifier used when posting to the log relay
    #[arg(long, default_value = "stef", env = "VOLUME_CTRL_RELAY_IDENTIFIER")]
    pub relay_identifier: String,

    /// Log filter, e.g. "info" or "volume_ctrl=debug"
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log file used while the terminal overlay owns the screen
    #[arg(long, default_value = "volume-ctrl.log")]
    pub log_file: PathBuf,
}

impl Args {
    /// Reject settings the pollers cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        let intervals = [
            ("discovery-interval-ms", self.discovery_interval_ms),
            ("discovery-timeout-ms", self.discovery_timeout_ms),
            ("refresh-ms", self.refresh_ms),
            ("display-ms", self.display_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
            return Err(format!("--{} must be greater than 0", name));
        }

        if self.vendor.trim().is_empty() {
            return Err("--vendor must not be empty".to_string());
        }

        if let Some(url) = &self.relay_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("--relay-url must be an http(s) URL, got '{}'", url));
            }
        }

        Ok(())
    }

    pub fn filter(&self) -> DeviceFilter {
        DeviceFilter::new(self.vendor.trim())
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            timeout: self.discovery_timeout(),
            search_target: self.search_target.clone(),
        }
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_interval_ms)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn display_duration(&self) -> Duration {
        Duration::from_millis(self.display_ms)
    }
}
