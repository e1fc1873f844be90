//! Active discovery: probe every host of the local network concurrently.
//!
//! All probes are issued at once and awaited together, so a full `/24`
//! finishes in roughly one probe timeout rather than 254 of them.  A host
//! counts as a seed only if its probe returns a valid identity; everything
//! else (refused, timed out, non-200, wrong body) is a silent miss.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use ipnetwork::Ipv4Network;
use lunaria_core::{current_timestamp_ms, DiscoveredSeed, SeedIdentity, SeedRegistry};
use tracing::{debug, info, warn};

use super::enumerator::{candidate_hosts, NetworkEnumerator};
use crate::application::discover_seeds::SeedScanner;

/// Upper bound on hosts probed in one scan.  Larger networks are truncated.
pub const MAX_SCAN_HOSTS: usize = 1024;

/// Asks one host whether it is a seed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prober: Send + Sync {
    /// `Some(identity)` on a valid answer, `None` on any failure.
    async fn probe(&self, host: Ipv4Addr) -> Option<SeedIdentity>;

    /// Per-probe timeout; also the scan's wall-clock budget.
    fn timeout(&self) -> Duration;
}

/// Probes the hosts of the local network for seeds.
pub struct ActiveScanner<P> {
    enumerator: Box<dyn NetworkEnumerator>,
    fallback: Ipv4Network,
    prober: P,
}

impl<P: Prober> ActiveScanner<P> {
    /// `fallback` is scanned when `enumerator` cannot name a network.
    pub fn new(enumerator: Box<dyn NetworkEnumerator>, fallback: Ipv4Network, prober: P) -> Self {
        Self {
            enumerator,
            fallback,
            prober,
        }
    }

    /// The network this scanner will probe.
    pub fn resolve_network(&self) -> Ipv4Network {
        self.enumerator.local_network().unwrap_or_else(|| {
            warn!(
                "could not determine the local network; guessing {}",
                self.fallback
            );
            self.fallback
        })
    }

    /// Probes every candidate host and returns the hits, deduplicated by
    /// seed id, in host order.
    pub async fn scan_network(&self) -> Vec<DiscoveredSeed> {
        let network = self.resolve_network();
        let mut hosts = candidate_hosts(network);
        if hosts.len() > MAX_SCAN_HOSTS {
            warn!(
                "{network} has {} hosts; probing only the first {MAX_SCAN_HOSTS}",
                hosts.len()
            );
            hosts.truncate(MAX_SCAN_HOSTS);
        }
        info!("probing {} host(s) in {network}", hosts.len());

        let probes = hosts.iter().map(|&host| async move {
            let identity = self.prober.probe(host).await?;
            Some(DiscoveredSeed::from_scan(
                identity,
                IpAddr::V4(host),
                current_timestamp_ms(),
            ))
        });
        let hits = join_all(probes).await;

        let mut registry = SeedRegistry::new();
        for seed in hits.into_iter().flatten() {
            debug!("seed {} answered at {}", seed.seed_id(), seed.address);
            if registry.get(seed.seed_id()).is_none() {
                info!(
                    "found seed {} ({}) at {}",
                    seed.identity.name,
                    seed.seed_id(),
                    seed.address
                );
            }
            registry.upsert(seed);
        }
        registry.into_seeds()
    }
}

#[async_trait]
impl<P: Prober> SeedScanner for ActiveScanner<P> {
    async fn scan(&self) -> Vec<DiscoveredSeed> {
        self.scan_network().await
    }

    fn budget(&self) -> Duration {
        self.prober.timeout()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
