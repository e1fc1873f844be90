//! TOML-based configuration persistence for the seed.
//!
//! The seed keeps its configuration next to the process, in `seed.toml` in
//! the working directory by default (the binary accepts `--config` to point
//! elsewhere).  Example:
//!
//! ```toml
//! [seed]
//! seed_id = "seed-1a2b3c4d"
//! name = "Kitchen Basil"
//! location = "Kitchen"
//! owner = "ada"
//! photos_dir = "./photos"
//! expose_api = true
//! port = 4269
//!
//! [announce]
//! discovery_port = 4270
//! broadcast_address = "255.255.255.255"
//! interval_secs = 30
//! ```
//!
//! Fields annotated with `#[serde(default = "..")]` may be omitted; the
//! identity fields are required because a seed without an id cannot announce.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use lunaria_core::{SeedIdentity, API_PORT, DISCOVERY_PORT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::register_seed::{SeedRegistration, DEFAULT_PHOTOS_DIR};

/// Default seed config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "seed.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config file exists yet; the seed has to be registered first.
    #[error("no seed configuration at {path}; run `lunaria-seed register` first")]
    NotRegistered { path: PathBuf },

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

/// Top-level seed configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedConfig {
    pub seed: SeedSection,
    #[serde(default)]
    pub announce: AnnounceConfig,
}

/// Who the seed is and where its photos live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedSection {
    pub seed_id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default = "default_photos_dir")]
    pub photos_dir: PathBuf,
    /// Whether the photo HTTP API is served.  Announcing a seed whose API is
    /// off still works, but clients will not be able to sync from it.
    #[serde(default = "default_true")]
    pub expose_api: bool,
    /// TCP port of the photo HTTP API.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

/// Discovery broadcast settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnounceConfig {
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    #[serde(default = "default_broadcast_address")]
    pub broadcast_address: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_photos_dir() -> PathBuf {
    PathBuf::from(DEFAULT_PHOTOS_DIR)
}
fn default_true() -> bool {
    true
}
fn default_api_port() -> u16 {
    API_PORT
}
fn default_discovery_port() -> u16 {
    DISCOVERY_PORT
}
fn default_broadcast_address() -> String {
    "255.255.255.255".to_string()
}
fn default_interval_secs() -> u64 {
    30
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            discovery_port: default_discovery_port(),
            broadcast_address: default_broadcast_address(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl SeedConfig {
    /// Builds a fresh config from a validated registration.
    pub fn from_registration(registration: SeedRegistration) -> Self {
        let SeedRegistration {
            identity,
            photos_dir,
        } = registration;
        Self {
            seed: SeedSection {
                seed_id: identity.seed_id,
                name: identity.name,
                location: identity.location,
                owner: identity.owner,
                photos_dir,
                expose_api: true,
                port: identity.port,
            },
            announce: AnnounceConfig::default(),
        }
    }

    /// The identity this seed announces.
    pub fn identity(&self) -> SeedIdentity {
        SeedIdentity {
            seed_id: self.seed.seed_id.clone(),
            name: self.seed.name.clone(),
            location: self.seed.location.clone(),
            owner: self.seed.owner.clone(),
            port: self.seed.port,
        }
    }
}

impl AnnounceConfig {
    /// Destination of announcement datagrams.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `broadcast_address` is not an
    /// IP address.
    pub fn target(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .broadcast_address
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                field: "announce.broadcast_address",
                reason: e.to_string(),
            })?;
        Ok(SocketAddr::new(ip, self.discovery_port))
    }

    /// Period between announcements.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero interval.
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "announce.interval_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Duration::from_secs(self.interval_secs))
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads the seed config from `path`.
///
/// # Errors
///
/// Returns [`ConfigError::NotRegistered`] if the file does not exist,
/// [`ConfigError::Io`] for other file-system errors, and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<SeedConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotRegistered {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(path: &Path, config: &SeedConfig) -> Result<(), ConfigError> {
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

// ── Tests ─────────────────────────────────────────────────────────────────────
