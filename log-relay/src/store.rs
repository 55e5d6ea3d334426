//! Allow-list and append-only per-identifier log files.

use crate::error::{RelayError, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Body returned by `read` when nothing was appended yet.
pub const NO_LOGS_PLACEHOLDER: &str = "no logs for this identifier yet";

/// Env flag selecting `./logs` as the storage root.
pub const LOCAL_STORAGE_ENV: &str = "LOG_RELAY_LOCAL";

/// Identifiers permitted to use the relay.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    identifiers: HashSet<String>,
}

impl AllowList {
    /// Build from configured identifiers.
    ///
    /// Identifiers double as file names, so empty names and names containing
    /// path separators or `..` are rejected.
    pub fn new<I, T>(identifiers: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut set = HashSet::new();
        for identifier in identifiers {
            let identifier = identifier.into().trim().to_string();
            if identifier.is_empty()
                || identifier.contains(['/', '\\'])
                || identifier.contains("..")
            {
                return Err(RelayError::InvalidIdentifier(identifier));
            }
            set.insert(identifier);
        }
        Ok(Self { identifiers: set })
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Pick the storage root: explicit path, then the local env flag, then the
/// per-user data directory.
pub fn resolve_storage_root(
    explicit: Option<PathBuf>,
    local_flag: Option<OsString>,
    data_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    match local_flag {
        Some(flag) if !flag.is_empty() => PathBuf::from("logs"),
        _ => data_dir
            .unwrap_or_else(|| PathBuf::from("."))
            .join("log-relay"),
    }
}

/// [`resolve_storage_root`] against the process environment.
pub fn storage_root_from_env(explicit: Option<PathBuf>) -> PathBuf {
    resolve_storage_root(
        explicit,
        std::env::var_os(LOCAL_STORAGE_ENV),
        dirs::data_dir(),
    )
}

/// One append-only text file per authorized identifier.
#[derive(Debug)]
pub struct LogStore {
    root: PathBuf,
    allow_list: AllowList,
}

impl LogStore {
    /// Create the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>, allow_list: AllowList) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root, allow_list })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    fn path_for(&self, identifier: &str) -> Result<PathBuf> {
        if !self.allow_list.contains(identifier) {
            return Err(RelayError::Unauthorized(identifier.to_string()));
        }
        Ok(self.root.join(format!("{}.log", identifier)))
    }

    /// Append `payload` and a newline to the identifier's log.
    pub async fn append(&self, identifier: &str, payload: &str) -> Result<()> {
        let path = self.path_for(identifier)?;

        let mut line = String::with_capacity(payload.len() + 1);
        line.push_str(payload);
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Full log text, or [`NO_LOGS_PLACEHOLDER`] if nothing was appended.
    pub async fn read(&self, identifier: &str) -> Result<String> {
        let path = self.path_for(identifier)?;

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(NO_LOGS_PLACEHOLDER.to_string())
            }
            Err(e) => Err(e.into()),
        }
    }
}
