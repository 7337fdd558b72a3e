//! Key-value storage collaborators.
//!
//! [`Storage`] is the narrow async interface the persistence bridge talks
//! to: `get` a JSON value by key, `set` one. [`JsonFileStore`] keeps every
//! key in one JSON object on disk; [`MemoryStore`] keeps them in process.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pomo_core::error::{PomoError, Result};
use serde_json::Value;
use tracing::{debug, warn};

// ── Storage trait ─────────────────────────────────────────────────────────────

/// Asynchronous key-value persistence.
///
/// Implementations are eventually consistent; there is no transaction
/// spanning several calls.
pub trait Storage: Send + Sync + 'static {
    /// Fetch the value stored under `key`, or `None` when absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<()>> + Send;
}

/// Default location of the state file: `~/.pomo/state.json`.
pub fn default_state_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pomo")
        .join("state.json")
}

// ── JsonFileStore ─────────────────────────────────────────────────────────────

/// Stores all keys as one JSON object in a single file.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write never leaves a truncated document behind.
pub struct JsonFileStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document. A missing file is an empty document.
    async fn read_document(&self) -> Result<serde_json::Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "state file absent");
                return Ok(serde_json::Map::new());
            }
            Err(e) => {
                return Err(PomoError::StorageRead {
                    key: self.path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(PomoError::StorageRead {
                key: self.path.display().to_string(),
                reason: format!("expected a JSON object, found {other}"),
            }),
        }
    }

    async fn write_document(&self, doc: &serde_json::Map<String, Value>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(doc).map_err(std::io::Error::other)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }
}

impl Storage for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut doc = self.read_document().await?;
        Ok(doc.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut doc = match self.read_document().await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "replacing unreadable state file");
                serde_json::Map::new()
            }
        };
        doc.insert(key.to_string(), value);

        self.write_document(&doc)
            .await
            .map_err(|e| PomoError::StorageWrite {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

/// In-process storage. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous read of the current value under `key`.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Seed a value without going through the async interface.
    pub fn insert(&self, key: &str, value: Value) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }
}

impl Storage for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }
}

/// Shared stores work wherever a store does.
impl<S: Storage> Storage for std::sync::Arc<S> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<()>> + Send {
        (**self).set(key, value)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
