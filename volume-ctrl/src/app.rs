//! Volume change detection feeding the overlay.

use anyhow::Context;
use overlay::{DisplayRequest, Overlay, OverlayHandle, OverlaySurface};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Receiver of display requests.
pub trait DisplaySink {
    fn set_text(&self, request: DisplayRequest);
}

impl DisplaySink for OverlayHandle {
    fn set_text(&self, request: DisplayRequest) {
        OverlayHandle::set_text(self, request);
    }
}

/// Turns polled volumes into display requests, skipping repeats.
#[derive(Debug)]
pub struct VolumeDisplay<D> {
    sink: D,
    last_volume: u16,
    display_duration: Duration,
}

impl<D: DisplaySink> VolumeDisplay<D> {
    /// The last volume starts at 0, so a device reporting 0 shows nothing
    /// until it changes.
    pub fn new(sink: D, display_duration: Duration) -> Self {
        Self {
            sink,
            last_volume: 0,
            display_duration,
        }
    }

    pub fn last_volume(&self) -> u16 {
        self.last_volume
    }

    pub fn on_volume(&mut self, volume: u16) {
        if volume == self.last_volume {
            return;
        }
        debug!(from = self.last_volume, to = volume, "volume changed");
        self.last_volume = volume;
        self.sink
            .set_text(DisplayRequest::new(volume.to_string(), self.display_duration));
    }
}

/// Wait for `signal`, then stop `tasks` and restore the overlay surface.
///
/// The surface is restored even when waiting for the signal fails; that
/// error is returned afterwards.
pub async fn shutdown_on<S, F>(
    overlay: Overlay<S>,
    tasks: Vec<JoinHandle<()>>,
    signal: F,
) -> anyhow::Result<()>
where
    S: OverlaySurface,
    F: Future<Output = std::io::Result<()>>,
{
    let signalled = signal.await;
    info!("shutting down");

    for task in tasks {
        task.abort();
    }
    let closed = overlay.close().await;

    signalled.context("failed to listen for Ctrl-C")?;
    closed.context("failed to restore overlay surface")?;
    Ok(())
}
