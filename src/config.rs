//! Configuration management for gdreviews.
//!
//! Settings start from defaults, take an optional TOML file on top, and
//! finally environment variables (`.env` is loaded by the binary first).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::repository::DbContext;
use crate::scrapers::{RetryPolicy, ScrapeOptions};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "gdreviews.db";

/// Config file looked for inside the data directory.
pub const CONFIG_FILENAME: &str = "gdreviews.toml";

/// Log file written inside the `LOG_PATH` directory.
pub const LOG_FILENAME: &str = "log.jsonl";

const DEFAULT_PROXY_ENDPOINT: &str = "unblock.smartproxy.com:60000";
const DEFAULT_RENDER_HEADER: &str = "X-SU-Headless: html";

/// Unblocking proxy the fetch layer routes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub endpoint: String,
    /// `Name: value` header asking the proxy to render the page.
    pub render_header: Option<String>,
    pub accept_invalid_certs: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            endpoint: DEFAULT_PROXY_ENDPOINT.to_string(),
            render_header: Some(DEFAULT_RENDER_HEADER.to_string()),
            accept_invalid_certs: true,
        }
    }
}

impl ProxyConfig {
    /// Proxy URL with credentials, or `None` when requests should go direct.
    pub fn proxy_url(&self) -> Option<String> {
        let username = self.username.as_deref().filter(|u| !u.is_empty())?;
        let password = self.password.as_deref().unwrap_or("");
        Some(format!(
            "http://{}:{}@{}",
            urlencoding::encode(username),
            urlencoding::encode(password),
            self.endpoint
        ))
    }

    /// Apply `SMART_USERNAME`, `SMART_PASSWORD` and `PROXY_ENDPOINT`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(username) = env_var("SMART_USERNAME") {
            self.username = Some(username);
        }
        if let Some(password) = env_var("SMART_PASSWORD") {
            self.password = Some(password);
        }
        if let Some(endpoint) = env_var("PROXY_ENDPOINT") {
            self.endpoint = endpoint;
        }
        self
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    pub proxy: ProxyConfig,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Fixed user agent; `None` picks a browser one per client.
    pub user_agent: Option<String>,
    pub retry: RetryPolicy,
    pub scrape: ScrapeOptions,
    /// Concurrent scrape sessions or company lookups.
    pub workers: usize,
    /// Reviews per insert transaction.
    pub batch_size: usize,
    /// HTTP 429 responses tolerated before every fetch is refused.
    pub rate_limit_max_hits: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gdreviews");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            proxy: ProxyConfig::default(),
            request_timeout: 60,
            user_agent: None,
            retry: RetryPolicy::default(),
            scrape: ScrapeOptions::default(),
            workers: default_workers(),
            batch_size: 100,
            rate_limit_max_hits: None,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Create a database context for the configured database.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_max_hits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrape: Option<ScrapeOptions>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse TOML config: {}", e))?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let path = match path_str.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(path_str)),
            None => PathBuf::from(path_str),
        };

        if path.is_absolute() {
            path
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers.max(1);
        }
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size.max(1);
        }
        if let Some(max_hits) = self.rate_limit_max_hits {
            settings.rate_limit_max_hits = Some(max_hits);
        }
        if let Some(ref proxy) = self.proxy {
            settings.proxy = proxy.clone();
        }
        if let Some(retry) = self.retry {
            settings.retry = retry;
        }
        if let Some(ref scrape) = self.scrape {
            settings.scrape = scrape.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path.
    pub config_path: Option<PathBuf>,
    /// Data directory override (--data-dir flag).
    pub data_dir: Option<PathBuf>,
}

async fn load_file_config(options: &LoadOptions, data_dir: &Path) -> Config {
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{}, using defaults", e);
                Config::default()
            });
    }

    let candidate = data_dir.join(CONFIG_FILENAME);
    if candidate.exists() {
        tracing::debug!("Found config in data dir: {}", candidate.display());
        return Config::load_from_path(&candidate)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{}, using defaults", e);
                Config::default()
            });
    }

    Config::default()
}

/// Load settings: defaults, then config file, then environment.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let mut settings = Settings::default();
    if let Some(ref data_dir) = options.data_dir {
        settings.data_dir = data_dir.clone();
    }

    let config = load_file_config(&options, &settings.data_dir).await;
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    // --data-dir wins over the file
    if let Some(data_dir) = options.data_dir {
        settings.data_dir = data_dir;
    }

    apply_env_overrides(&mut settings);
    (settings, config)
}

fn apply_env_overrides(settings: &mut Settings) {
    settings.proxy = std::mem::take(&mut settings.proxy).with_env_overrides();

    if let Some(database_url) = env_var("DATABASE_URL") {
        tracing::debug!("Using DATABASE_URL from environment: {}", database_url);
        settings.database_url = Some(database_url);
    }
}
