//! Discovery and volume polling loops.
//!
//! The two loops share a [`DeviceSlot`]. The discovery loop fills it when it
//! is empty; the volume loop reads it and empties it again when the device
//! stops answering, which makes the discovery loop search on its next tick.
//! Network calls block, so both loops run them on tokio's blocking pool.

use crate::error::{PollError, Result};
use crate::rendering::ControlSession;
use parking_lot::Mutex;
use soap_client::SoapError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use upnp_discovery::{find_first, Device, DeviceFilter, DiscoveryOptions};

/// The device currently polled, if any.
#[derive(Debug, Clone, Default)]
pub struct DeviceSlot {
    inner: Arc<Mutex<Option<Device>>>,
}

impl DeviceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Device> {
        self.inner.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_none()
    }

    pub fn set(&self, device: Device) {
        *self.inner.lock() = Some(device);
    }

    pub fn clear(&self) {
        *self.inner.lock() = None;
    }
}

/// One network scan for a matching device.
pub trait DeviceFinder: Send + Sync + 'static {
    fn find(&self) -> Option<Device>;
}

/// Opens a session that can read a device's volume.
pub trait SessionFactory: Send + Sync + 'static {
    type Session: VolumeSource;

    fn connect(&self, device: &Device) -> Result<Self::Session>;
}

pub trait VolumeSource: Send + Sync + 'static {
    fn get_volume(&self) -> std::result::Result<u16, SoapError>;
}

/// SSDP scan narrowed down by a vendor filter.
#[derive(Debug, Clone)]
pub struct NetworkFinder {
    pub filter: DeviceFilter,
    pub options: DiscoveryOptions,
}

impl DeviceFinder for NetworkFinder {
    fn find(&self) -> Option<Device> {
        find_first(&self.filter, &self.options)
    }
}

/// Opens RenderingControl sessions from device descriptions.
#[derive(Debug, Clone)]
pub struct RenderingControlFactory {
    pub timeout: Duration,
}

impl SessionFactory for RenderingControlFactory {
    type Session = ControlSession;

    fn connect(&self, device: &Device) -> Result<ControlSession> {
        ControlSession::for_device(device, self.timeout)
    }
}

impl VolumeSource for ControlSession {
    fn get_volume(&self) -> std::result::Result<u16, SoapError> {
        ControlSession::get_volume(self)
    }
}

/// Fill `slot` whenever it is empty, checking every `interval`.
///
/// Only returns if a scan task panics.
pub async fn discovery_loop<F: DeviceFinder>(
    finder: Arc<F>,
    slot: DeviceSlot,
    interval: Duration,
) -> Result<()> {
    loop {
        if slot.is_empty() {
            let finder = finder.clone();
            match tokio::task::spawn_blocking(move || finder.find()).await? {
                Some(device) => {
                    info!(
                        name = %device.name,
                        model = %device.model_name,
                        ip = %device.ip_address,
                        "device discovered"
                    );
                    slot.set(device);
                }
                None => info!("device not found, retrying"),
            }
        }
        tokio::time::sleep(interval).await;
    }
}

/// Poll the device in `slot` every `interval` and pass each volume to
/// `on_volume`.
///
/// The session is opened on first use and kept until the device stops
/// answering; then both the session and the slot are cleared. Any other
/// failure ends the loop with an error.
pub async fn volume_loop<C, V>(
    factory: Arc<C>,
    slot: DeviceSlot,
    interval: Duration,
    mut on_volume: V,
) -> Result<()>
where
    C: SessionFactory,
    V: FnMut(u16),
{
    let mut session: Option<Arc<C::Session>> = None;

    loop {
        if let Some(device) = slot.get() {
            match poll_once(&factory, &device, &mut session).await {
                Ok(volume) => on_volume(volume),
                Err(e) if e.is_device_gone() => {
                    warn!(error = %e, name = %device.name, "device unreachable, rediscovering");
                    session = None;
                    slot.clear();
                }
                Err(e) => return Err(e),
            }
        }
        tokio::time::sleep(interval).await;
    }
}

async fn poll_once<C: SessionFactory>(
    factory: &Arc<C>,
    device: &Device,
    session: &mut Option<Arc<C::Session>>,
) -> Result<u16> {
    let current = match session {
        Some(current) => current.clone(),
        None => {
            debug!(location = %device.location, "opening control session");
            let factory = factory.clone();
            let device = device.clone();
            let opened = tokio::task::spawn_blocking(move || factory.connect(&device)).await??;
            let opened = Arc::new(opened);
            *session = Some(opened.clone());
            opened
        }
    };

    let volume = tokio::task::spawn_blocking(move || current.get_volume()).await?;
    volume.map_err(PollError::from)
}

/// Report a random volume in `0..=100` every `interval`.
pub async fn fake_volume_loop<V: FnMut(u16)>(interval: Duration, mut on_volume: V) {
    use rand::Rng;

    loop {
        let volume = rand::rng().random_range(0..=100);
        on_volume(volume);
        tokio::time::sleep(interval).await;
    }
}
