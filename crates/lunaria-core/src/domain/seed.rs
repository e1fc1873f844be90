//! Seed identity records.
//!
//! Three views of the same seed exist on the wire and in memory:
//!
//! - [`SeedStatus`] – what `GET /status` returns: who the seed is.
//! - [`SeedIdentity`] – [`SeedStatus`] plus the TCP port of the seed's HTTP
//!   API.  This is what `GET /discovery` returns to an active-scan probe.
//! - [`Announcement`] – [`SeedIdentity`] plus the sender's wall-clock
//!   timestamp.  This is what a seed broadcasts on the discovery port.
//!
//! On the client side every observation (announcement or scan hit) becomes a
//! [`DiscoveredSeed`], which adds the address the observation came from and
//! the observer's own "last seen" time.

use std::net::IpAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Who a seed is, as reported by its status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedStatus {
    /// Opaque identifier, stable for the lifetime of the seed's registration.
    pub seed_id: String,
    /// Human-readable name (e.g. `"Kitchen Basil"`).
    pub name: String,
    /// Location label (e.g. `"Kitchen"`).
    pub location: String,
    /// Owner label.
    pub owner: String,
}

/// A seed's identity together with the port its file-serving API listens on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedIdentity {
    pub seed_id: String,
    pub name: String,
    pub location: String,
    pub owner: String,
    /// TCP port of the seed's HTTP API.
    pub port: u16,
}

/// One discovery broadcast from a seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub identity: SeedIdentity,
    /// Sender wall-clock time in milliseconds since the Unix epoch, set at
    /// send time.  Freshness metadata only.
    pub timestamp: u64,
}

/// How a [`DiscoveredSeed`] was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    /// A UDP announcement was received from the seed.
    Announcement,
    /// The seed answered an active-scan HTTP probe.
    Scan,
}

/// The client-side view of a seed observed during one discovery session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSeed {
    pub identity: SeedIdentity,
    /// The address the observation arrived from.
    pub address: IpAddr,
    /// Observer time (ms since epoch) of the most recent observation.
    pub last_seen: u64,
    /// The sender's announcement timestamp; `None` for scan hits.
    pub announced_at: Option<u64>,
    pub source: DiscoverySource,
}

impl DiscoveredSeed {
    /// Builds a record from a received announcement.
    pub fn from_announcement(announcement: Announcement, address: IpAddr, last_seen: u64) -> Self {
        Self {
            identity: announcement.identity,
            address,
            last_seen,
            announced_at: Some(announcement.timestamp),
            source: DiscoverySource::Announcement,
        }
    }

    /// Builds a record from a successful scan probe.
    pub fn from_scan(identity: SeedIdentity, address: IpAddr, scanned_at: u64) -> Self {
        Self {
            identity,
            address,
            last_seen: scanned_at,
            announced_at: None,
            source: DiscoverySource::Scan,
        }
    }

    /// The seed's id.
    pub fn seed_id(&self) -> &str {
        &self.identity.seed_id
    }

    /// Base URL of the seed's HTTP API, e.g. `http://192.168.1.40:4269`.
    pub fn base_url(&self) -> String {
        match self.address {
            IpAddr::V4(ip) => format!("http://{ip}:{}", self.identity.port),
            IpAddr::V6(ip) => format!("http://[{ip}]:{}", self.identity.port),
        }
    }
}

/// Generates a fresh seed id of the form `seed-xxxxxxxx`.
pub fn generate_seed_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("seed-{}", &uuid[..8])
}

/// Returns the current time as milliseconds since the Unix epoch.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
