//! Configuration file parsing and resolved server settings.
//!
//! Configuration is read once at startup from a JSON file, merged with CLI
//! overrides, and validated into an immutable [`ServerSettings`] that is
//! passed by reference into every component. Nothing re-reads configuration
//! after startup; the query path never touches the filesystem for settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Corpus store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Parse the corpus once into an owned hash set; O(1) lookups
    Set,
    /// Map the corpus read-only and scan it per query; O(1) extra memory
    Mapped,
}

/// When the corpus store resynchronizes with the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Re-check the file's modification stamp before every query
    Always,
    /// Load once at startup; rebuilt only on an administrative trigger (SIGHUP)
    Once,
}

impl RefreshMode {
    pub fn from_reread(reread_on_query: bool) -> Self {
        if reread_on_query {
            RefreshMode::Always
        } else {
            RefreshMode::Once
        }
    }
}

/// TLS section of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsFileConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub cert_path: Option<PathBuf>,
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

/// Raw configuration file contents, all fields optional with defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Text file whose lines form the searchable dataset
    #[serde(default)]
    pub corpus_path: Option<PathBuf>,

    /// Re-check the corpus file before every query
    #[serde(default)]
    pub reread_on_query: bool,

    /// Corpus store backend
    #[serde(default = "default_backend")]
    pub backend: Backend,

    #[serde(default)]
    pub tls: TlsFileConfig,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent connection handlers; 0 means unbounded
    #[serde(default)]
    pub max_connections: usize,

    /// Log verbosity, in env-filter syntax ("info", "needle=debug", ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_backend() -> Backend {
    Backend::Set
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    44445
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            corpus_path: None,
            reread_on_query: false,
            backend: default_backend(),
            tls: TlsFileConfig::default(),
            host: default_host(),
            port: default_port(),
            max_connections: 0,
            log_level: default_log_level(),
        }
    }
}

impl ConfigFile {
    /// Load config from the given path, or return defaults if it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: ConfigFile = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}

/// CLI overrides applied on top of the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub corpus_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub reread_on_query: Option<bool>,
    pub backend: Option<Backend>,
    pub max_connections: Option<usize>,
}

/// Validated TLS key material locations
#[derive(Debug, Clone)]
pub struct TlsSettings {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Resolved, validated configuration. Immutable once built; request
/// handling never mutates it.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub corpus_path: PathBuf,
    pub refresh: RefreshMode,
    pub backend: Backend,
    pub tls: Option<TlsSettings>,
    pub host: String,
    pub port: u16,
    pub max_connections: usize,
    pub log_level: String,
}

impl ServerSettings {
    /// Merge config file and CLI overrides into validated settings.
    /// Fails fast on anything that would leave the server half-configured.
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Result<Self> {
        let corpus_path = overrides
            .corpus_path
            .or(file.corpus_path)
            .context("corpus_path is required (set it in the config file or pass --corpus)")?;

        let tls = if file.tls.enabled {
            let cert_path = file
                .tls
                .cert_path
                .context("tls.cert_path is required when TLS is enabled")?;
            let key_path = file
                .tls
                .key_path
                .context("tls.key_path is required when TLS is enabled")?;
            Some(TlsSettings {
                cert_path,
                key_path,
            })
        } else {
            None
        };

        Ok(Self {
            corpus_path,
            refresh: RefreshMode::from_reread(
                overrides.reread_on_query.unwrap_or(file.reread_on_query),
            ),
            backend: overrides.backend.unwrap_or(file.backend),
            tls,
            host: overrides.host.unwrap_or(file.host),
            port: overrides.port.unwrap_or(file.port),
            max_connections: overrides.max_connections.unwrap_or(file.max_connections),
            log_level: file.log_level,
        })
    }

    /// Address string for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
