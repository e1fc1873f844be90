//! TOML-based configuration for the client.
//!
//! Read from the platform-appropriate config file (overridable with
//! `--config`):
//! - Windows:  `%APPDATA%\Lunaria\client.toml`
//! - Linux:    `~/.config/lunaria/client.toml`
//! - macOS:    `~/Library/Application Support/Lunaria/client.toml`
//!
//! Every field has a default, so a missing file or a partial one is fine:
//!
//! ```toml
//! [client]
//! log_level = "info"
//!
//! [discovery]
//! port = 4270
//! total_timeout_ms = 5000
//! bind_address = "0.0.0.0"
//!
//! [scan]
//! api_port = 4269
//! probe_timeout_ms = 2000
//! connect_timeout_ms = 1000
//! fallback_network = "192.168.1.0/24"
//! # network = "10.1.0.0/22"      # skip auto-detection
//!
//! [sync]
//! download_dir = "./photos"
//! overwrite = false
//! concurrency = 1
//! request_timeout_ms = 10000
//! idle_timeout_ms = 30000
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ipnetwork::Ipv4Network;
use lunaria_core::{API_PORT, DISCOVERY_PORT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "client.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but is unusable.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub client: GeneralConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Passive listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryConfig {
    /// UDP port announcements arrive on.
    #[serde(default = "default_discovery_port")]
    pub port: u16,
    /// Budget of one whole discovery session (listen + scan fallback).
    #[serde(default = "default_total_timeout_ms")]
    pub total_timeout_ms: u64,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Active scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// Port the seeds' HTTP API listens on.
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Network scanned when the local one cannot be determined.
    #[serde(default = "default_fallback_network")]
    pub fallback_network: String,
    /// Pins the scanned network, skipping auto-detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

/// Sync pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    #[serde(default)]
    pub overwrite: bool,
    /// Maximum transfers in flight; 1 is strictly sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Whole-request bound for the status and listing calls.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Longest silence tolerated inside a photo transfer.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_discovery_port() -> u16 {
    DISCOVERY_PORT
}
fn default_total_timeout_ms() -> u64 {
    5000
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_api_port() -> u16 {
    API_PORT
}
fn default_probe_timeout_ms() -> u64 {
    2000
}
fn default_connect_timeout_ms() -> u64 {
    1000
}
fn default_fallback_network() -> String {
    "192.168.1.0/24".to_string()
}
fn default_download_dir() -> PathBuf {
    PathBuf::from("./photos")
}
fn default_concurrency() -> usize {
    1
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_idle_timeout_ms() -> u64 {
    30_000
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: default_discovery_port(),
            total_timeout_ms: default_total_timeout_ms(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            probe_timeout_ms: default_probe_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            fallback_network: default_fallback_network(),
            network: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            overwrite: false,
            concurrency: default_concurrency(),
            request_timeout_ms: default_request_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

// ── Derived values ────────────────────────────────────────────────────────────

impl DiscoveryConfig {
    /// Socket address the passive listener binds.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                field: "discovery.bind_address",
                reason: format!("{e}"),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn total_timeout(&self) -> Duration {
        Duration::from_millis(self.total_timeout_ms)
    }
}

impl ScanConfig {
    pub fn probe_timeout(&self) -> Result<Duration, ConfigError> {
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.probe_timeout_ms",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(Duration::from_millis(self.probe_timeout_ms))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn fallback(&self) -> Result<Ipv4Network, ConfigError> {
        parse_network("scan.fallback_network", &self.fallback_network)
    }

    /// The pinned network, if one is configured.
    pub fn network_override(&self) -> Result<Option<Ipv4Network>, ConfigError> {
        self.network
            .as_deref()
            .map(|n| parse_network("scan.network", n))
            .transpose()
    }
}

impl SyncConfig {
    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        non_zero_ms("sync.request_timeout_ms", self.request_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Result<Duration, ConfigError> {
        non_zero_ms("sync.idle_timeout_ms", self.idle_timeout_ms)
    }
}

fn non_zero_ms(field: &'static str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be non-zero".to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

fn parse_network(field: &'static str, value: &str) -> Result<Ipv4Network, ConfigError> {
    value
        .parse::<Ipv4Network>()
        .map_err(|e| ConfigError::InvalidValue {
            field,
            reason: format!("`{value}`: {e}"),
        })
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Default config file path for this platform.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the base directory cannot
/// be determined from the environment.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config at `path`, returning `ClientConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] or [`ConfigError::Serialize`].
pub fn save_config(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the `lunaria` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Lunaria"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("lunaria"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("Lunaria")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default_matches_protocol_ports() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.discovery.port, 4270);
        assert_eq!(cfg.scan.api_port, 4269);
        assert_eq!(cfg.discovery.total_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.sync.concurrency, 1);
        assert!(!cfg.sync.overwrite);
    }

    #[test]
    fn test_partial_toml_fills_in_defaults() {
        // Arrange
        let text = "[scan]\nprobe_timeout_ms = 300\nnetwork = \"10.1.0.0/22\"\n";

        // Act
        let cfg: ClientConfig = toml::from_str(text).unwrap();

        // Assert
        assert_eq!(cfg.scan.probe_timeout().unwrap(), Duration::from_millis(300));
        assert_eq!(cfg.scan.api_port, 4269);
        assert_eq!(
            cfg.scan.network_override().unwrap().map(|n| n.to_string()),
            Some("10.1.0.0/22".to_string())
        );
        assert_eq!(cfg.client.log_level, "info");
    }

    #[test]
    fn test_listen_addr_combines_bind_address_and_port() {
        let cfg = DiscoveryConfig::default();
        assert_eq!(cfg.listen_addr().unwrap(), "0.0.0.0:4270".parse().unwrap());
    }

    #[test]
    fn test_invalid_network_is_reported_with_field_name() {
        let cfg = ScanConfig {
            fallback_network: "192.168.1.0/99".to_string(),
            ..ScanConfig::default()
        };

        let err = cfg.fallback().unwrap_err();

        assert!(err.to_string().contains("scan.fallback_network"));
    }

    #[test]
    fn test_zero_probe_timeout_is_rejected() {
        let cfg = ScanConfig {
            probe_timeout_ms: 0,
            ..ScanConfig::default()
        };
        assert!(matches!(
            cfg.probe_timeout(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_sync_timeouts_default_and_reject_zero() {
        let mut cfg = SyncConfig::default();
        assert_eq!(cfg.request_timeout().unwrap(), Duration::from_secs(10));
        assert_eq!(cfg.idle_timeout().unwrap(), Duration::from_secs(30));

        cfg.idle_timeout_ms = 0;

        let err = cfg.idle_timeout().unwrap_err();
        assert!(err.to_string().contains("sync.idle_timeout_ms"));
    }

    #[test]
    fn test_load_config_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("client.toml")).unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.toml");
        let mut cfg = ClientConfig::default();
        cfg.sync.overwrite = true;
        cfg.sync.download_dir = PathBuf::from("/srv/lunaria");

        // Act
        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_load_config_malformed_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        std::fs::write(&path, "[sync\nconcurrency = ").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }
}
