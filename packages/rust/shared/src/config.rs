//! Application configuration for artfill.
//!
//! User config lives at `~/.artfill/artfill.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets never live in the file: it only names the env vars that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ArtfillError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "artfill.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".artfill";

// ---------------------------------------------------------------------------
// Config structs (matching artfill.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document store connection.
    #[serde(default)]
    pub store: StoreConfig,

    /// Page fetching.
    #[serde(default)]
    pub http: HttpConfig,

    /// Update loop pacing.
    #[serde(default)]
    pub updater: UpdaterConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Name of the env var holding the connection string.
    #[serde(default = "default_url_env")]
    pub url_env: String,

    /// Name of the env var holding the auth token for remote databases.
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url_env: default_url_env(),
            auth_token_env: default_auth_token_env(),
        }
    }
}

fn default_url_env() -> String {
    "ARTFILL_DATABASE_URL".into()
}
fn default_auth_token_env() -> String {
    "ARTFILL_AUTH_TOKEN".into()
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent sent with every page fetch.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0".into()
}

/// `[updater]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Fixed pause between records, in ms.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_delay_ms() -> u64 {
    1000
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.artfill/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ArtfillError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.artfill/artfill.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ArtfillError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ArtfillError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ArtfillError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ArtfillError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ArtfillError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the store connection string from the env var named in config.
pub fn resolve_store_url(config: &AppConfig) -> Result<String> {
    let var_name = &config.store.url_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(ArtfillError::config(format!(
            "store connection string not found. Set the {var_name} environment variable \
             (a database file path or a libsql:// URL), or pass --database."
        ))),
    }
}

/// Resolve the optional auth token for remote stores.
pub fn resolve_store_auth_token(config: &AppConfig) -> Option<String> {
    std::env::var(&config.store.auth_token_env)
        .ok()
        .filter(|t| !t.is_empty())
}
