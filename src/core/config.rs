//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.karte/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//! The backend address is injected into every component through
//! `ResolvedConfig` — no module-level constants.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct KarteConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    pub transport: Option<Transport>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UiConfig {
    pub scroll_duration_ms: Option<u64>,
    pub list_gap: Option<u16>,
}

/// How answer fragments reach the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Native chunked response body from `POST /chat`.
    #[default]
    Stream,
    /// Fixed-interval polling of the remote fragment queue.
    Polling,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_SCROLL_DURATION_MS: u64 = 1000;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub transport: Transport,
    pub poll_interval: Duration,
    pub scroll_duration: Duration,
    pub list_gap: u16,
}

impl ResolvedConfig {
    /// Apply the override hierarchy on top of a parsed config file.
    pub fn resolve(
        config: &KarteConfig,
        env_base_url: Option<String>,
        cli_base_url: Option<String>,
        cli_transport: Option<Transport>,
    ) -> Self {
        let base_url = cli_base_url
            .or(env_base_url)
            .or_else(|| config.backend.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        // Trailing slashes would double up when endpoint paths are appended.
        let base_url = base_url.trim_end_matches('/').to_string();

        Self {
            base_url,
            transport: cli_transport
                .or(config.backend.transport)
                .unwrap_or_default(),
            poll_interval: Duration::from_millis(
                config
                    .backend
                    .poll_interval_ms
                    .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            scroll_duration: Duration::from_millis(
                config
                    .ui
                    .scroll_duration_ms
                    .unwrap_or(DEFAULT_SCROLL_DURATION_MS),
            ),
            list_gap: config
                .ui
                .list_gap
                .unwrap_or(crate::core::filler::DEFAULT_LIST_GAP),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.karte/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".karte").join("config.toml"))
}

/// Load config from `~/.karte/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `KarteConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<KarteConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(KarteConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(KarteConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: KarteConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# Karte Configuration
# All settings are optional — defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [backend]
# base_url = "http://localhost:8000"   # Or set KARTE_BACKEND_URL env var
# transport = "stream"                 # "stream" or "polling"
# poll_interval_ms = 100               # Polling transport only

# [ui]
# scroll_duration_ms = 1000            # Submit scroll glide duration
# list_gap = 2                         # Rows between the anchor pair
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Could not create config directory: {e}");
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Could not write default config: {e}");
    }
}
