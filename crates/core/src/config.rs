//! Application configuration: file-backed with environment overrides.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Directory name under the user config dir holding our settings.
pub const CONFIG_DIR: &str = "gamedeals";
/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# gamedeals configuration.
# Every key can also be supplied as an environment variable with the
# GAMEDEALS_ prefix, e.g. GAMEDEALS_API_BASE_URL.

# Base URL of the storefront REST API.
api_base_url = "https://api.gamedeals.example"

# Base URL of the OAuth provider used for login hand-off.
oauth_base_url = "https://auth.gamedeals.example"

# Analytics measurement id. Leave empty to disable page-view beacons.
# analytics_id = "G-XXXXXXX"

# Fixed per-request timeout, in seconds.
request_timeout_secs = 10
"#;

/// Externally supplied settings for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the storefront REST API.
    pub api_base_url: String,
    /// Base URL of the OAuth provider used by the login screen.
    pub oauth_base_url: String,
    /// Analytics measurement id; beacons are disabled when absent.
    #[serde(default)]
    pub analytics_id: Option<String>,
    /// Fixed per-request timeout in seconds. No retries are layered on top.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Directory receiving the rolling log file.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.gamedeals.example".to_string(),
            oauth_base_url: "https://auth.gamedeals.example".to_string(),
            analytics_id: None,
            request_timeout_secs: default_timeout_secs(),
            log_dir: default_log_dir(),
        }
    }
}

impl AppConfig {
    /// Default location of the settings file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Load settings from the default path layered with `GAMEDEALS_*`
    /// environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load settings from an explicit file path. A missing or unreadable
    /// file falls back to defaults with a warning.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("GAMEDEALS"));

        match builder.build().and_then(Config::try_deserialize) {
            Ok(config) => Ok(config),
            Err(err) => {
                warn!("invalid configuration ({err}); falling back to defaults");
                Ok(AppConfig::default())
            }
        }
    }
}

/// Write the commented default settings file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = AppConfig::default_path();
    if path.exists() {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    // `GAMEDEALS_*` variables are process-global, so every test that
    // loads a config takes this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let _env = ENV_LOCK.lock().unwrap();
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("nope.toml"))?;
        assert_eq!(config.request_timeout_secs, 10);
        assert!(config.analytics_id.is_none());
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let _env = ENV_LOCK.lock().unwrap();
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
api_base_url = "https://api.test.local"
oauth_base_url = "https://auth.test.local"
analytics_id = "G-TEST"
request_timeout_secs = 3
"#,
        )?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_base_url, "https://api.test.local");
        assert_eq!(config.analytics_id.as_deref(), Some("G-TEST"));
        assert_eq!(config.request_timeout_secs, 3);
        Ok(())
    }

    #[test]
    fn template_parses_into_config() -> Result<()> {
        let _env = ENV_LOCK.lock().unwrap();
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.api_base_url, "https://api.gamedeals.example");
        Ok(())
    }

    #[test]
    fn env_overrides_beat_file_values() -> Result<()> {
        let _env = ENV_LOCK.lock().unwrap();
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "request_timeout_secs = 3\n")?;
        std::env::set_var("GAMEDEALS_REQUEST_TIMEOUT_SECS", "7");
        std::env::set_var("GAMEDEALS_API_BASE_URL", "https://env.test.local");
        let loaded = AppConfig::load_from(&path);
        std::env::remove_var("GAMEDEALS_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("GAMEDEALS_API_BASE_URL");
        let config = loaded?;
        assert_eq!(config.request_timeout_secs, 7);
        assert_eq!(config.api_base_url, "https://env.test.local");
        Ok(())
    }
}
