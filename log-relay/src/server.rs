//! HTTP surface of the log relay.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::error::{RelayError, Result};
use crate::store::LogStore;
use crate::LogEntry;

#[derive(Debug, Deserialize)]
struct ReadQuery {
    identifier: String,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct DetailBody {
    detail: &'static str,
}

#[derive(Debug, Serialize)]
struct Greeting {
    msg: &'static str,
}

/// Identifier not on the allow-list.
#[derive(Debug)]
struct UnknownIdentifier;

impl warp::reject::Reject for UnknownIdentifier {}

/// Disk I/O failed while serving a request.
#[derive(Debug)]
struct StorageFailure;

impl warp::reject::Reject for StorageFailure {}

fn reject(err: RelayError) -> Rejection {
    match err {
        RelayError::Unauthorized(identifier) => {
            warn!(%identifier, "rejected unknown identifier");
            warp::reject::custom(UnknownIdentifier)
        }
        other => {
            error!(error = %other, "log store failure");
            warp::reject::custom(StorageFailure)
        }
    }
}

/// All relay routes with rejections mapped to responses:
///
/// - `GET /` greeting
/// - `POST /log` with a JSON [`LogEntry`]
/// - `GET /logs/?identifier=<id>`
pub fn routes(
    store: Arc<LogStore>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_store = warp::any().map(move || store.clone());

    let root = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::json(&[Greeting { msg: "Hello World" }]));

    let append = warp::path("log")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(64 * 1024))
        .and(warp::body::json::<LogEntry>())
        .and(with_store.clone())
        .and_then(|entry: LogEntry, store: Arc<LogStore>| async move {
            store
                .append(&entry.identifier, &entry.payload)
                .await
                .map_err(reject)?;
            debug!(
                identifier = %entry.identifier,
                bytes = entry.payload.len(),
                "appended log line"
            );
            Ok::<_, Rejection>(warp::reply::json(&StatusBody { status: "success" }))
        });

    let read = warp::path("logs")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<ReadQuery>())
        .and(with_store)
        .and_then(|query: ReadQuery, store: Arc<LogStore>| async move {
            store.read(&query.identifier).await.map_err(reject)
        });

    root.or(append).or(read).recover(handle_rejection)
}

/// Handle rejections and convert them to HTTP responses.
async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Infallible> {
    let (code, detail) = if err.find::<UnknownIdentifier>().is_some() {
        (StatusCode::FORBIDDEN, "unknown identifier")
    } else if err.find::<StorageFailure>().is_some() {
        (StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (StatusCode::BAD_REQUEST, "invalid log entry")
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "missing identifier")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "payload too large")
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported media type")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "length required")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&DetailBody { detail }),
        code,
    ))
}

/// Running relay server bound to a local address.
pub struct RelayServer {
    local_addr: SocketAddr,
    shutdown_tx: Option<mpsc::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl RelayServer {
    /// Bind `addr` and start serving on the current runtime.
    ///
    /// Port 0 picks a free port; see [`RelayServer::local_addr`].
    pub async fn start(addr: SocketAddr, store: Arc<LogStore>) -> Result<Self> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let (local_addr, server) = warp::serve(routes(store))
            .try_bind_with_graceful_shutdown(addr, async move {
                shutdown_rx.recv().await;
            })
            .map_err(|e| RelayError::Bind(e.to_string()))?;

        info!(%local_addr, "log relay listening");
        let server_handle = tokio::spawn(server);

        Ok(Self {
            local_addr,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Wait until the server stops on its own.
    pub async fn wait(mut self) {
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
        info!("log relay stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AllowList, NO_LOGS_PLACEHOLDER};
    use std::path::PathBuf;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("log-relay-routes-{}", uuid::Uuid::new_v4()))
    }

    async fn store() -> Arc<LogStore> {
        let allow = AllowList::new(["stef"]).unwrap();
        Arc::new(LogStore::open(temp_root(), allow).await.unwrap())
    }

    #[tokio::test]
    async fn test_root_greeting() {
        let store = store().await;
        let response = warp::test::request()
            .method("GET")
            .path("/")
            .reply(&routes(store.clone()))
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), br#"[{"msg":"Hello World"}]"#);

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let store = store().await;
        let filter = routes(store.clone());

        let response = warp::test::request()
            .method("POST")
            .path("/log")
            .json(&LogEntry::new("stef", "hello"))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), br#"{"status":"success"}"#);

        let response = warp::test::request()
            .method("GET")
            .path("/logs/?identifier=stef")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), b"hello\n");
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_read_without_slash_and_without_logs() {
        let store = store().await;
        let response = warp::test::request()
            .method("GET")
            .path("/logs?identifier=stef")
            .reply(&routes(store.clone()))
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body().as_ref(), NO_LOGS_PLACEHOLDER.as_bytes());

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_forbidden() {
        let store = store().await;
        let filter = routes(store.clone());

        for payload in ["x", "", "stef"] {
            let response = warp::test::request()
                .method("POST")
                .path("/log")
                .json(&LogEntry::new("unknown", payload))
                .reply(&filter)
                .await;
            assert_eq!(response.status(), 403);
            assert_eq!(response.body().as_ref(), br#"{"detail":"unknown identifier"}"#);
        }

        let response = warp::test::request()
            .method("GET")
            .path("/logs/?identifier=unknown")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 403);

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let store = store().await;
        let filter = routes(store.clone());

        let response = warp::test::request()
            .method("POST")
            .path("/log")
            .header("content-type", "application/json")
            .body(r#"{"identifier":"stef"}"#)
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 400);

        let response = warp::test::request()
            .method("POST")
            .path("/log")
            .header("content-type", "text/plain")
            .body(r#"{"identifier":"stef","payload":"hello"}"#)
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 415);
        assert_eq!(response.body().as_ref(), br#"{"detail":"unsupported media type"}"#);

        let response = warp::test::request()
            .method("POST")
            .path("/log")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 411);

        let response = warp::test::request()
            .method("GET")
            .path("/logs/")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 400);

        let response = warp::test::request()
            .method("GET")
            .path("/log")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 405);

        let response = warp::test::request()
            .method("GET")
            .path("/nowhere")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), 404);

        let _ = std::fs::remove_dir_all(store.root());
    }
}
