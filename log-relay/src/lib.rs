//! Log relay: keeps an append-only text log per client identifier.
//!
//! Clients POST `{identifier, payload}` to `/log` and read everything back
//! with `GET /logs/?identifier=<id>`. Only identifiers on the configured
//! [`AllowList`] are accepted; everyone else gets `403`.
//!
//! ```no_run
//! use log_relay::{AllowList, LogStore, RelayServer};
//! use std::sync::Arc;
//!
//! # async fn run() -> log_relay::Result<()> {
//! let store = LogStore::open("logs", AllowList::new(["stef"])?).await?;
//! let server = RelayServer::start(([0, 0, 0, 0], 8000).into(), Arc::new(store)).await?;
//! println!("listening at {}", server.base_url());
//! server.wait().await;
//! # Ok(())
//! # }
//! ```
//!
//! The [`client`] module forwards an application's `tracing` output to a
//! relay.

pub mod client;
mod error;
mod server;
mod store;

pub use error::{RelayError, Result};
pub use server::{routes, RelayServer};
pub use store::{
    resolve_storage_root, storage_root_from_env, AllowList, LogStore, LOCAL_STORAGE_ENV,
    NO_LOGS_PLACEHOLDER,
};

use serde::{Deserialize, Serialize};

/// Body of `POST /log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub identifier: String,
    pub payload: String,
}

impl LogEntry {
    pub fn new(identifier: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            payload: payload.into(),
        }
    }
}
