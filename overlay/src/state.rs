//! Pending display requests and the overlay phase.

use std::time::Duration;

/// A piece of text to show for a fixed time.
///
/// Consumed exactly once by the redraw loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRequest {
    pub text: String,
    pub duration: Duration,
}

impl DisplayRequest {
    pub fn new(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            duration,
        }
    }
}

/// What the overlay surface currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayPhase {
    #[default]
    Idle,
    ShowingStartup,
    ShowingValue,
}

/// At most one pending request per kind; a new value request replaces an
/// unconsumed one.
#[derive(Debug, Default)]
pub struct OverlayState {
    startup: Option<DisplayRequest>,
    value: Option<DisplayRequest>,
    phase: OverlayPhase,
}

impl OverlayState {
    pub fn new(startup: Option<DisplayRequest>) -> Self {
        Self {
            startup,
            value: None,
            phase: OverlayPhase::Idle,
        }
    }

    pub fn set_value(&mut self, request: DisplayRequest) {
        self.value = Some(request);
    }

    pub fn pending_value(&self) -> Option<&DisplayRequest> {
        self.value.as_ref()
    }

    pub fn phase(&self) -> OverlayPhase {
        self.phase
    }

    /// Take the next request to show, startup first.
    ///
    /// Does nothing while a request is already being shown.
    pub fn begin(&mut self) -> Option<DisplayRequest> {
        if self.phase != OverlayPhase::Idle {
            return None;
        }
        if let Some(request) = self.startup.take() {
            self.phase = OverlayPhase::ShowingStartup;
            return Some(request);
        }
        let request = self.value.take()?;
        self.phase = OverlayPhase::ShowingValue;
        Some(request)
    }

    /// The shown request has timed out.
    pub fn finish(&mut self) {
        self.phase = OverlayPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn request(text: &str) -> DisplayRequest {
        DisplayRequest::new(text, Duration::from_millis(500))
    }

    #[test]
    fn test_startup_is_shown_before_value() {
        let mut state = OverlayState::new(Some(request("Starting up")));
        state.set_value(request("12"));

        assert_eq!(state.begin(), Some(request("Starting up")));
        assert_eq!(state.phase(), OverlayPhase::ShowingStartup);
        assert_eq!(state.begin(), None);

        state.finish();
        assert_eq!(state.begin(), Some(request("12")));
        assert_eq!(state.phase(), OverlayPhase::ShowingValue);

        state.finish();
        assert_eq!(state.phase(), OverlayPhase::Idle);
        assert_eq!(state.begin(), None);
    }

    #[test]
    fn test_startup_is_shown_once() {
        let mut state = OverlayState::new(Some(request("hello")));

        assert_eq!(state.begin(), Some(request("hello")));
        state.finish();

        assert_eq!(state.begin(), None);
        assert_eq!(state.phase(), OverlayPhase::Idle);
    }

    #[rstest]
    #[case(None, None, &[])]
    #[case(Some("Starting up"), None, &["Starting up"])]
    #[case(None, Some("42"), &["42"])]
    #[case(Some("Starting up"), Some("42"), &["Starting up", "42"])]
    fn test_show_order(
        #[case] startup: Option<&str>,
        #[case] value: Option<&str>,
        #[case] expected: &[&str],
    ) {
        let mut state = OverlayState::new(startup.map(request));
        if let Some(value) = value {
            state.set_value(request(value));
        }

        let mut shown = Vec::new();
        while let Some(next) = state.begin() {
            shown.push(next.text);
            state.finish();
        }

        assert_eq!(shown, expected);
        assert_eq!(state.phase(), OverlayPhase::Idle);
    }

    #[test]
    fn test_new_value_replaces_pending_value() {
        let mut state = OverlayState::new(None);
        state.set_value(request("10"));
        state.set_value(request("20"));

        assert_eq!(state.begin(), Some(request("20")));
        state.finish();
        assert_eq!(state.begin(), None);
    }

    #[test]
    fn test_value_set_while_showing_waits_for_next_cycle() {
        let mut state = OverlayState::new(None);
        state.set_value(request("10"));
        state.begin();

        state.set_value(request("11"));
        assert_eq!(state.pending_value(), Some(&request("11")));

        state.finish();
        assert_eq!(state.begin(), Some(request("11")));
    }
}
