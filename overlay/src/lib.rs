//! Timed text overlay.
//!
//! [`Overlay`] owns two tasks on the current tokio runtime:
//!
//! - a redraw loop that, every `redraw_interval`, picks up the pending
//!   startup message (once) or the pending value message, shows it for its
//!   duration and hides it again;
//! - a keep-on-top loop that re-asserts the surface every
//!   `keep_on_top_interval`.
//!
//! Producers call [`OverlayHandle::set_text`]. There is no queue: a value set
//! before the redraw loop picked up the previous one replaces it.
//!
//! ```no_run
//! use overlay::{DisplayRequest, LogSurface, Overlay, OverlayConfig};
//! use std::time::Duration;
//!
//! # async fn run() -> overlay::Result<()> {
//! let overlay = Overlay::spawn(LogSurface, OverlayConfig::default());
//! overlay.handle().set_text(DisplayRequest::new("42", Duration::from_millis(500)));
//! overlay.close().await
//! # }
//! ```

mod error;
mod state;
mod surface;

pub use error::{OverlayError, Result};
pub use state::{DisplayRequest, OverlayPhase, OverlayState};
pub use surface::{LogSurface, OverlaySurface, TerminalSurface};

#[cfg(any(test, feature = "test-support"))]
pub use surface::{RecordingSurface, SurfaceCall};

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Text shown once right after start.
pub const STARTUP_TEXT: &str = "Starting up volume ctrl";

#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub redraw_interval: Duration,
    pub keep_on_top_interval: Duration,
    /// One-shot message shown before any value
    pub startup: Option<DisplayRequest>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            redraw_interval: Duration::from_millis(500),
            keep_on_top_interval: Duration::from_millis(50),
            startup: Some(DisplayRequest::new(STARTUP_TEXT, Duration::from_secs(2))),
        }
    }
}

/// Cloneable producer side of the overlay.
#[derive(Debug, Clone)]
pub struct OverlayHandle {
    state: Arc<Mutex<OverlayState>>,
}

impl OverlayHandle {
    /// Replace the pending value message.
    pub fn set_text(&self, request: DisplayRequest) {
        debug!(text = %request.text, "display request");
        self.state.lock().set_value(request);
    }

    pub fn phase(&self) -> OverlayPhase {
        self.state.lock().phase()
    }

    pub fn pending_value(&self) -> Option<DisplayRequest> {
        self.state.lock().pending_value().cloned()
    }
}

pub struct Overlay<S: OverlaySurface> {
    handle: OverlayHandle,
    surface: Arc<Mutex<S>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<S: OverlaySurface> Overlay<S> {
    /// Start the redraw and keep-on-top loops on the current runtime.
    pub fn spawn(surface: S, config: OverlayConfig) -> Self {
        let handle = OverlayHandle {
            state: Arc::new(Mutex::new(OverlayState::new(config.startup))),
        };
        let surface = Arc::new(Mutex::new(surface));

        let redraw = tokio::spawn(redraw_loop(
            handle.state.clone(),
            surface.clone(),
            config.redraw_interval,
        ));
        let keep_on_top = tokio::spawn(keep_on_top_loop(
            surface.clone(),
            config.keep_on_top_interval,
        ));

        Self {
            handle,
            surface,
            tasks: vec![redraw, keep_on_top],
        }
    }

    pub fn handle(&self) -> OverlayHandle {
        self.handle.clone()
    }

    pub fn set_text(&self, request: DisplayRequest) {
        self.handle.set_text(request);
    }

    /// Cancel both loops, hide any text and restore the surface.
    pub async fn close(mut self) -> Result<()> {
        for task in self.tasks.drain(..) {
            task.abort();
            // Cancellation is the expected outcome here
            let _ = task.await;
        }
        let mut surface = self.surface.lock();
        surface.clear()?;
        surface.restore()
    }
}

async fn redraw_loop<S: OverlaySurface>(
    state: Arc<Mutex<OverlayState>>,
    surface: Arc<Mutex<S>>,
    interval: Duration,
) {
    if let Err(e) = run_redraw(state, surface, interval).await {
        error!(error = %e, "overlay redraw loop stopped");
    }
}

async fn run_redraw<S: OverlaySurface>(
    state: Arc<Mutex<OverlayState>>,
    surface: Arc<Mutex<S>>,
    interval: Duration,
) -> Result<()> {
    loop {
        tokio::time::sleep(interval).await;

        let next = state.lock().begin();
        let Some(request) = next else {
            continue;
        };

        surface.lock().render(&request.text)?;
        tokio::time::sleep(request.duration).await;
        surface.lock().clear()?;

        state.lock().finish();
    }
}

async fn keep_on_top_loop<S: OverlaySurface>(surface: Arc<Mutex<S>>, interval: Duration) {
    loop {
        let refreshed = surface.lock().keep_on_top();
        if let Err(e) = refreshed {
            error!(error = %e, "overlay keep-on-top loop stopped");
            return;
        }
        tokio::time::sleep(interval).await;
    }
}
