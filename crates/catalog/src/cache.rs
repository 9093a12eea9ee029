//! Process-wide catalog cache.
//!
//! The catalog is an eventually-consistent, idempotent read surface, so the
//! cache is deliberately simple: a key-value store without TTLs, written
//! through to disk so a restarted host starts warm. Readers tolerate a miss
//! by re-fetching; they never block on another reader populating an entry.
//!
//! One instance is created at startup and injected into everything that
//! reads the catalog; the store lives for the whole process.

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Key-value cache interface shared by the preloader and the search
/// controller.
///
/// Keys follow the `categories` / `models_<category>` / `detail_<model_id>`
/// convention so `clear_prefix` can invalidate one family at a time.
pub trait CacheStore: Send + Sync {
    /// Returns the cached value for `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;
    /// Stores `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, value: Value);
    /// Removes every entry whose key starts with `prefix`.
    fn clear_prefix(&self, prefix: &str);
}

/// Purely in-memory store, used in tests and as a fallback when no cache
/// directory is available.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    fn clear_prefix(&self, prefix: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|key, _| !key.starts_with(prefix));
        }
    }
}

/// On-disk entry wrapper. `saved_at` is informational only; entries never
/// expire.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    value: Value,
    saved_at: DateTime<Utc>,
}

/// Memory cache written through to one JSON file per key.
///
/// Disk failures degrade to memory-only behavior with a warning; a corrupt
/// or unreadable file counts as a miss.
#[derive(Debug)]
pub struct FileCacheStore {
    directory: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
}

impl FileCacheStore {
    /// Creates a store rooted at `directory`, creating it if needed.
    pub fn new(directory: PathBuf) -> Self {
        if let Err(error) = std::fs::create_dir_all(&directory) {
            warn!(path = %directory.display(), %error, "cache directory unavailable; running memory-only");
        }
        Self {
            directory,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a store in the platform cache directory
    /// (`<cache_dir>/wavespeed-node`).
    pub fn in_default_location() -> Self {
        let directory = dirs_next::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wavespeed-node");
        Self::new(directory)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", sanitize_key(key)))
    }

    fn read_from_disk(&self, key: &str) -> Option<Value> {
        let path = self.entry_path(key);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<CacheEntry>(&content) {
            Ok(entry) => Some(entry.value),
            Err(error) => {
                warn!(path = %path.display(), %error, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn write_to_disk(&self, key: &str, value: &Value) {
        let entry = CacheEntry {
            value: value.clone(),
            saved_at: Utc::now(),
        };
        let bytes = match serde_json::to_vec(&entry) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(key, %error, "cache entry did not serialize");
                return;
            }
        };
        if let Err(error) = write_bytes_atomically(&self.entry_path(key), &bytes) {
            warn!(key, %error, "cache write-through failed");
        }
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.entries.lock().ok().and_then(|entries| entries.get(key).cloned()) {
            return Some(value);
        }
        let value = self.read_from_disk(key)?;
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.clone());
        }
        Some(value)
    }

    fn set(&self, key: &str, value: Value) {
        self.write_to_disk(key, &value);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    fn clear_prefix(&self, prefix: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|key, _| !key.starts_with(prefix));
        }
        let sanitized_prefix = sanitize_key(prefix);
        let Ok(directory_entries) = std::fs::read_dir(&self.directory) else {
            return;
        };
        for entry in directory_entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else { continue };
            if name.starts_with(&sanitized_prefix) {
                debug!(file = name, "clearing cache entry");
                let _ = std::fs::remove_file(entry.path());
            }
        }
    }
}

/// Maps a cache key to a filesystem-safe file stem.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' })
        .collect()
}

fn write_bytes_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent_directory = path.parent().unwrap_or_else(|| Path::new("."));
    let temp_path = build_temp_entry_path(parent_directory);

    let mut temp_file = File::create(&temp_path)?;
    temp_file.write_all(bytes)?;
    temp_file.sync_all()?;
    drop(temp_file);

    std::fs::rename(&temp_path, path)?;
    Ok(())
}

fn build_temp_entry_path(parent_directory: &Path) -> PathBuf {
    let process_identifier = std::process::id();
    let timestamp_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_nanos())
        .unwrap_or_default();
    parent_directory.join(format!(".cache-entry-{process_identifier}-{timestamp_nanos}.tmp"))
}
