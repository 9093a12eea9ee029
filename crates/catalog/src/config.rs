//! API-key configuration.
//!
//! Key resolution priority: runtime override (set by the host-side client
//! node for the current session) → `WAVESPEED_API_KEY` environment variable
//! → persistent JSON config file in the platform config directory. The key
//! itself is never logged.

use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const API_KEY_ENV_VAR: &str = "WAVESPEED_API_KEY";
const CONFIG_PATH_ENV_VAR: &str = "WAVESPEED_CONFIG_PATH";

/// Session-scoped key override, set through [`set_runtime_api_key`].
static RUNTIME_API_KEY: Lazy<Mutex<Option<String>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct NodeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

impl NodeConfig {
    fn load() -> Self {
        let path = default_config_path();
        if let Ok(content) = std::fs::read_to_string(&path)
            && let Ok(config) = serde_json::from_str(&content)
        {
            return config;
        }
        NodeConfig::default()
    }

    fn save(&self) -> io::Result<()> {
        let path = default_config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        restrict_permissions(&path);
        Ok(())
    }
}

/// Sets or clears the runtime key override for this session.
pub fn set_runtime_api_key(api_key: Option<String>) {
    if let Ok(mut guard) = RUNTIME_API_KEY.lock() {
        debug!(present = api_key.is_some(), "runtime API key updated");
        *guard = api_key;
    }
}

/// Resolves the effective API key: runtime override, then environment, then
/// config file.
pub fn effective_api_key() -> Option<String> {
    if let Ok(guard) = RUNTIME_API_KEY.lock()
        && let Some(key) = guard.as_ref()
        && !key.trim().is_empty()
    {
        return Some(key.clone());
    }

    if let Ok(key) = env::var(API_KEY_ENV_VAR)
        && !key.trim().is_empty()
    {
        return Some(key);
    }

    NodeConfig::load().api_key.filter(|key| !key.trim().is_empty())
}

/// Persists `api_key` to the config file.
pub fn save_api_key(api_key: &str) -> io::Result<()> {
    let mut config = NodeConfig::load();
    config.api_key = Some(api_key.trim().to_string());
    config.save()
}

/// Removes any persisted key; the environment and runtime sources are
/// untouched.
pub fn delete_api_key() -> io::Result<()> {
    let mut config = NodeConfig::load();
    if config.api_key.take().is_some() {
        config.save()?;
    }
    Ok(())
}

/// Whether any key source currently yields a key.
pub fn has_api_key() -> bool {
    effective_api_key().is_some()
}

/// Path of the JSON config file, overridable for tests and portable
/// installs.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV_VAR)
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wavespeed-node")
        .join("config.json")
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(error) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        warn!(%error, "could not restrict config file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) {}
