//! Local session store.
//!
//! A small JSON key/value file (`session.json` in the state directory)
//! standing in for browser local storage. It is never authoritative: it
//! holds the login flag, the last known source list and the activation
//! history. Reads of absent or unreadable keys yield the default.

pub mod record_cache;

pub use record_cache::{CacheEntry, PendingTicket, Record, RecordCache};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::Source;

pub const AUTH_KEY: &str = "initro_auth";
pub const SOURCES_KEY: &str = "initro_sources";
pub const ACTIVATION_HISTORY_KEY: &str = "initro_activation_history";

const STORE_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write session store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Presence of this record under `AUTH_KEY` opens the protected screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub email: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// One finalized activation, newest first in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationRecord {
    pub id: String,
    pub audience: String,
    pub channel: String,
    pub count: u64,
    pub scheduled_for: String,
    pub created_at: String,
}

#[derive(Debug, Default)]
pub struct SessionStore {
    /// None for a purely in-memory store
    path: Option<PathBuf>,
    entries: BTreeMap<String, serde_json::Value>,
}

impl SessionStore {
    /// Open (or lazily create) the store in `dir`.
    ///
    /// A missing or corrupt file starts an empty store rather than failing.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(STORE_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "session store unreadable, starting empty");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        debug!(path = %path.display(), keys = entries.len(), "session store opened");
        Self {
            path: Some(path),
            entries,
        }
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Read a key; absent or mistyped values yield `None`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed session value");
                None
            }
        }
    }

    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key).unwrap_or_default()
    }

    /// Write a key. The in-memory map only changes once the file is written.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value);
        self.commit(next)
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.commit(next)
    }

    fn commit(&mut self, next: BTreeMap<String, serde_json::Value>) -> Result<(), StoreError> {
        Self::flush(self.path.as_deref(), &next)?;
        self.entries = next;
        Ok(())
    }

    fn flush(
        path: Option<&Path>,
        entries: &BTreeMap<String, serde_json::Value>,
    ) -> Result<(), StoreError> {
        let Some(path) = path else {
            return Ok(());
        };
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(entries)?;
            fs::write(path, contents)
        };
        write().map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    // ─── Auth gate ──────────────────────────────────────────────────────────

    pub fn auth(&self) -> Option<AuthSession> {
        self.get(AUTH_KEY)
    }

    pub fn is_authenticated(&self) -> bool {
        self.contains(AUTH_KEY)
    }

    pub fn sign_in(&mut self, session: &AuthSession) -> Result<(), StoreError> {
        self.set(AUTH_KEY, session)
    }

    pub fn sign_out(&mut self) -> Result<(), StoreError> {
        self.remove(AUTH_KEY)
    }

    // ─── Cached sources ─────────────────────────────────────────────────────

    pub fn cached_sources(&self) -> Vec<Source> {
        self.get_or_default(SOURCES_KEY)
    }

    pub fn cache_sources(&mut self, sources: &[Source]) -> Result<(), StoreError> {
        self.set(SOURCES_KEY, &sources)
    }

    // ─── Activation history ─────────────────────────────────────────────────

    pub fn activation_history(&self) -> Vec<ActivationRecord> {
        self.get_or_default(ACTIVATION_HISTORY_KEY)
    }

    /// Prepend a record to the history
    pub fn record_activation(&mut self, record: ActivationRecord) -> Result<(), StoreError> {
        let mut history = self.activation_history();
        history.insert(0, record);
        self.set(ACTIVATION_HISTORY_KEY, &history)
    }

    pub fn clear_activation_history(&mut self) -> Result<(), StoreError> {
        self.remove(ACTIVATION_HISTORY_KEY)
    }
}
