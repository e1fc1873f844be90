//! DiscoverSeedsUseCase: one bounded discovery session.
//!
//! ```text
//! discover(total)
//!  ├─ listener.listen(window)      -- passive, cheap, low-noise
//!  │    └─ non-empty? ──► return it (scanner never runs)
//!  └─ scanner.scan()               -- active fallback, up to 254 probes
//! ```
//!
//! The listener gets the bulk of the budget: everything except the time the
//! scanner needs for its slowest probe, but never less than half the total.
//! Once the scanner's probes are issued nothing cancels them; the scan ends
//! when the slowest probe's own timeout fires.

use std::time::Duration;

use async_trait::async_trait;
use lunaria_core::DiscoveredSeed;
use thiserror::Error;
use tracing::{info, warn};

/// Error type for the discovery seams.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The listener could not receive on the discovery port.
    #[error("announcement listener unavailable: {0}")]
    ListenerUnavailable(String),
}

/// Passive source of seeds: collects announcements for a window.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnnouncementListener: Send + Sync {
    /// Listens for `window` and returns every seed heard, deduplicated.
    async fn listen(&self, window: Duration) -> Result<Vec<DiscoveredSeed>, DiscoveryError>;
}

/// Active source of seeds: probes the local network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SeedScanner: Send + Sync {
    /// Probes every candidate host and returns the hits, deduplicated.
    async fn scan(&self) -> Vec<DiscoveredSeed>;

    /// Upper bound on how long [`scan`](Self::scan) takes.
    fn budget(&self) -> Duration;
}

/// Orchestrates the listener and the fallback scanner.
pub struct DiscoverSeedsUseCase<L, S> {
    listener: L,
    scanner: S,
}

impl<L: AnnouncementListener, S: SeedScanner> DiscoverSeedsUseCase<L, S> {
    pub fn new(listener: L, scanner: S) -> Self {
        Self { listener, scanner }
    }

    /// How much of `total` the passive listener is given.
    pub fn listen_window(&self, total: Duration) -> Duration {
        total.saturating_sub(self.scanner.budget()).max(total / 2)
    }

    /// Runs one discovery session within roughly `total`.
    ///
    /// Failures never escape: a listener that cannot bind counts as "heard
    /// nothing" and the scanner takes over.  An empty result is a valid
    /// outcome.
    pub async fn discover(&self, total: Duration) -> Vec<DiscoveredSeed> {
        let window = self.listen_window(total);
        info!("[1/2] listening for seed announcements for {window:?}");

        match self.listener.listen(window).await {
            Ok(seeds) if !seeds.is_empty() => {
                info!("announcements found {} seed(s)", seeds.len());
                return seeds;
            }
            Ok(_) => info!("no announcements heard"),
            Err(e) => warn!("{e}; falling back to network scan"),
        }

        info!("[2/2] scanning the local network");
        let seeds = self.scanner.scan().await;
        info!("network scan complete, found {} seed(s)", seeds.len());
        seeds
    }
}

/// Picks one seed by exact id, or by case-insensitive name when the name is
/// unambiguous.
///
/// # Errors
///
/// Returns [`SelectError`] if nothing matches or a name matches several seeds.
pub fn select_seed<'a>(
    seeds: &'a [DiscoveredSeed],
    query: &str,
) -> Result<&'a DiscoveredSeed, SelectError> {
    if let Some(seed) = seeds.iter().find(|s| s.seed_id() == query) {
        return Ok(seed);
    }
    let mut by_name = seeds
        .iter()
        .filter(|s| s.identity.name.eq_ignore_ascii_case(query));
    match (by_name.next(), by_name.next()) {
        (Some(seed), None) => Ok(seed),
        (Some(_), Some(_)) => Err(SelectError::Ambiguous(query.to_string())),
        (None, _) => Err(SelectError::NotFound(query.to_string())),
    }
}

/// Error type for [`select_seed`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectError {
    #[error("no discovered seed matches `{0}`")]
    NotFound(String),
    #[error("several discovered seeds are named `{0}`; select by seed id")]
    Ambiguous(String),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
