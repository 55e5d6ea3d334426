//! Drawing surfaces for the overlay.
//!
//! A surface only knows how to show one line of text, hide it, and
//! re-assert itself above other output. Timing lives in [`crate::Overlay`].

use crate::error::Result;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use std::io::Write;

/// Platform presentation behind the overlay.
pub trait OverlaySurface: Send + 'static {
    fn render(&mut self, text: &str) -> Result<()>;

    fn clear(&mut self) -> Result<()>;

    /// Re-draw so the text stays above anything else writing to the surface.
    fn keep_on_top(&mut self) -> Result<()>;

    /// Give the underlying display back. Called once on close.
    fn restore(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Draws the text on a terminal's alternate screen at a fixed cell.
pub struct TerminalSurface<W: Write> {
    out: W,
    column: u16,
    row: u16,
    current: Option<String>,
}

impl<W: Write + Send + 'static> TerminalSurface<W> {
    /// Switch `out` to the alternate screen and hide the cursor.
    pub fn new(mut out: W, column: u16, row: u16) -> Result<Self> {
        execute!(out, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        Ok(Self {
            out,
            column,
            row,
            current: None,
        })
    }

    fn draw(&mut self, text: &str) -> Result<()> {
        queue!(
            self.out,
            MoveTo(self.column, self.row),
            SetAttribute(Attribute::Bold),
            Print(text),
            SetAttribute(Attribute::Reset),
        )?;
        self.out.flush()?;
        Ok(())
    }

    /// Everything written so far, for writers that keep it.
    pub fn writer(&self) -> &W {
        &self.out
    }
}

impl TerminalSurface<std::io::Stdout> {
    pub fn stdout(column: u16, row: u16) -> Result<Self> {
        Self::new(std::io::stdout(), column, row)
    }
}

impl<W: Write + Send + 'static> OverlaySurface for TerminalSurface<W> {
    fn render(&mut self, text: &str) -> Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        self.draw(text)?;
        self.current = Some(text.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.current = None;
        execute!(self.out, Clear(ClearType::All))?;
        Ok(())
    }

    fn keep_on_top(&mut self) -> Result<()> {
        match self.current.clone() {
            Some(text) => self.draw(&text),
            None => {
                self.out.flush()?;
                Ok(())
            }
        }
    }

    fn restore(&mut self) -> Result<()> {
        execute!(self.out, Show, LeaveAlternateScreen)?;
        Ok(())
    }
}

/// Headless surface that reports rendered text through `tracing`.
#[derive(Debug, Default)]
pub struct LogSurface;

impl OverlaySurface for LogSurface {
    fn render(&mut self, text: &str) -> Result<()> {
        tracing::info!(target: "overlay", text, "show");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        tracing::debug!(target: "overlay", "hide");
        Ok(())
    }

    fn keep_on_top(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::{RecordingSurface, SurfaceCall};

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use super::OverlaySurface;
    use crate::error::Result;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SurfaceCall {
        Render(String),
        Clear,
        KeepOnTop,
        Restore,
    }

    /// Records every call; clones share the log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingSurface {
        calls: Arc<Mutex<Vec<SurfaceCall>>>,
    }

    impl RecordingSurface {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<SurfaceCall> {
            self.calls.lock().clone()
        }

        /// Calls other than the periodic keep-on-top refresh.
        pub fn visible_calls(&self) -> Vec<SurfaceCall> {
            self.calls
                .lock()
                .iter()
                .filter(|call| **call != SurfaceCall::KeepOnTop)
                .cloned()
                .collect()
        }

        pub fn rendered(&self) -> Vec<String> {
            self.calls
                .lock()
                .iter()
                .filter_map(|call| match call {
                    SurfaceCall::Render(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl OverlaySurface for RecordingSurface {
        fn render(&mut self, text: &str) -> Result<()> {
            self.calls.lock().push(SurfaceCall::Render(text.to_string()));
            Ok(())
        }

        fn clear(&mut self) -> Result<()> {
            self.calls.lock().push(SurfaceCall::Clear);
            Ok(())
        }

        fn keep_on_top(&mut self) -> Result<()> {
            self.calls.lock().push(SurfaceCall::KeepOnTop);
            Ok(())
        }

        fn restore(&mut self) -> Result<()> {
            self.calls.lock().push(SurfaceCall::Restore);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(surface: &TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8_lossy(surface.writer()).to_string()
    }

    #[test]
    fn test_terminal_surface_draws_text() {
        let mut surface = TerminalSurface::new(Vec::new(), 5, 2).unwrap();
        surface.render("37").unwrap();

        let out = output(&surface);
        assert!(out.contains("37"));
        // MoveTo is 1-based in the escape sequence: row 3, column 6
        assert!(out.contains("\u{1b}[3;6H"));
    }

    #[test]
    fn test_terminal_keep_on_top_redraws_current_text() {
        let mut surface = TerminalSurface::new(Vec::new(), 0, 0).unwrap();
        surface.render("55").unwrap();
        surface.keep_on_top().unwrap();

        assert_eq!(output(&surface).matches("55").count(), 2);

        surface.clear().unwrap();
        surface.keep_on_top().unwrap();
        assert_eq!(output(&surface).matches("55").count(), 2);
    }

    #[test]
    fn test_terminal_restore_leaves_alternate_screen() {
        let mut surface = TerminalSurface::new(Vec::new(), 0, 0).unwrap();
        surface.restore().unwrap();

        let out = output(&surface);
        assert!(out.contains("\u{1b}[?1049h"));
        assert!(out.contains("\u{1b}[?1049l"));
    }

    #[test]
    fn test_recording_surface_shares_log_between_clones() {
        let recorder = RecordingSurface::new();
        let mut handle = recorder.clone();

        handle.render("1").unwrap();
        handle.keep_on_top().unwrap();
        handle.clear().unwrap();

        assert_eq!(recorder.calls().len(), 3);
        assert_eq!(
            recorder.visible_calls(),
            vec![SurfaceCall::Render("1".to_string()), SurfaceCall::Clear]
        );
        assert_eq!(recorder.rendered(), vec!["1".to_string()]);
    }
}
