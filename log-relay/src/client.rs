//! Forward `tracing` events to a log relay.
//!
//! [`RelayLayer`] formats each event as
//! `<time> - <target> - <LEVEL> - <message>` and hands it to a
//! [`RelayForwarder`] task which POSTs it to `<url>/log`. Delivery is best
//! effort: failed or timed out posts are dropped, and so are lines emitted
//! while the queue is full.

use std::fmt::Write as _;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::error::{RelayError, Result};
use crate::LogEntry;

/// Targets whose events are never relayed; the forwarder's own HTTP stack
/// logs through them.
const SKIPPED_TARGETS: &[&str] = &["hyper", "reqwest", "h2", "want", "mio"];

/// Delivery limits for a relay connection.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Upper bound for one POST, connect included
    pub timeout: Duration,
    /// Lines buffered while a POST is in flight
    pub queue_capacity: usize,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            queue_capacity: 1024,
        }
    }
}

/// Create a layer and the forwarder that delivers its lines.
pub fn relay(
    url: &str,
    identifier: &str,
    max_level: Level,
) -> Result<(RelayLayer, RelayForwarder)> {
    relay_with_options(url, identifier, max_level, &RelayOptions::default())
}

pub fn relay_with_options(
    url: &str,
    identifier: &str,
    max_level: Level,
    options: &RelayOptions,
) -> Result<(RelayLayer, RelayForwarder)> {
    let client = reqwest::Client::builder()
        .timeout(options.timeout)
        .build()
        .map_err(|e| RelayError::Client(e.to_string()))?;

    let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
    let layer = RelayLayer {
        identifier: identifier.to_string(),
        max_level,
        tx,
    };
    let forwarder = RelayForwarder {
        endpoint: format!("{}/log", url.trim_end_matches('/')),
        client,
        rx,
    };
    Ok((layer, forwarder))
}

/// `tracing_subscriber` layer producing relay log entries.
pub struct RelayLayer {
    identifier: String,
    max_level: Level,
    tx: mpsc::Sender<LogEntry>,
}

impl<S: Subscriber> Layer<S> for RelayLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.max_level || is_skipped(metadata.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let payload = format_line(
            &chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            metadata.target(),
            metadata.level(),
            &visitor.finish(),
        );
        // Full queue or a stopped forwarder: the line is lost
        let _ = self.tx.try_send(LogEntry {
            identifier: self.identifier.clone(),
            payload,
        });
    }
}

fn is_skipped(target: &str) -> bool {
    SKIPPED_TARGETS.iter().any(|skipped| target.starts_with(skipped))
}

fn format_line(time: &str, target: &str, level: &Level, message: &str) -> String {
    format!("{} - {} - {} - {}", time, target, level, message)
}

/// Collects the `message` field followed by `key=value` pairs.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Delivers relayed lines; run it on a tokio runtime.
pub struct RelayForwarder {
    endpoint: String,
    client: reqwest::Client,
    rx: mpsc::Receiver<LogEntry>,
}

impl RelayForwarder {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post lines until every layer handle is dropped.
    pub async fn run(mut self) {
        while let Some(entry) = self.rx.recv().await {
            let _ = self
                .client
                .post(&self.endpoint)
                .json(&entry)
                .send()
                .await;
        }
    }
}
