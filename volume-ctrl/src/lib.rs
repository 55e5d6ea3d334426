//! Shows a UPnP soundbar's volume as a timed overlay whenever it changes.
//!
//! A discovery loop finds the device, a volume loop polls it over
//! RenderingControl, and [`VolumeDisplay`] turns changed values into overlay
//! display requests.

pub mod app;
pub mod config;
mod error;
pub mod logging;
pub mod poller;
pub mod rendering;

pub use app::{shutdown_on, DisplaySink, VolumeDisplay};
pub use config::{Args, SurfaceKind};
pub use error::{PollError, Result};
pub use poller::{
    discovery_loop, fake_volume_loop, volume_loop, DeviceFinder, DeviceSlot, NetworkFinder,
    RenderingControlFactory, SessionFactory, VolumeSource,
};
pub use rendering::{ControlSession, RENDERING_CONTROL};
