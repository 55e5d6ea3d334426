use anyhow::{ensure, Context, Result};
use clap::Parser;
use log_relay::{storage_root_from_env, AllowList, LogStore, RelayServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Stores log lines posted by volume-ctrl clients
#[derive(Parser, Debug)]
#[command(name = "log-relay")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8000", env = "LOG_RELAY_BIND")]
    bind: SocketAddr,

    /// Identifiers allowed to post and read logs
    #[arg(long = "allow", value_delimiter = ',', default_value = "stef", env = "LOG_RELAY_ALLOW")]
    allow: Vec<String>,

    /// Directory holding one <identifier>.log per client
    #[arg(long)]
    storage_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let args = Args::parse();

    let allow_list = allow_list(args.allow)?;
    let root = storage_root_from_env(args.storage_root);
    let store = LogStore::open(&root, allow_list)
        .await
        .with_context(|| format!("failed to open storage root {}", root.display()))?;
    info!(
        root = %store.root().display(),
        identifiers = store.allow_list().len(),
        "log store ready"
    );

    let server = RelayServer::start(args.bind, Arc::new(store))
        .await
        .context("failed to start log relay")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    info!("shutting down");
    server.shutdown().await;

    Ok(())
}

/// Allow-list from `--allow`; a relay nobody may use is a configuration error.
fn allow_list(identifiers: Vec<String>) -> Result<AllowList> {
    let allow_list = AllowList::new(identifiers).context("invalid allow-list")?;
    ensure!(!allow_list.is_empty(), "allow-list must name at least one identifier");
    Ok(allow_list)
}
