//! Passive discovery: collect UDP announcements for a bounded window.
//!
//! The listener binds the discovery port (normally `0.0.0.0:4270`), then
//! receives until the window's deadline.  Every datagram that decodes as a
//! valid [`Announcement`](lunaria_core::Announcement) is upserted into a
//! [`SeedRegistry`] with the sender's IP as the seed address; anything else
//! is dropped.  The socket is released when the window closes.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use lunaria_core::protocol::MAX_DATAGRAM_SIZE;
use lunaria_core::{current_timestamp_ms, decode_announcement, DiscoveredSeed, SeedRegistry};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::application::discover_seeds::{AnnouncementListener, DiscoveryError};

/// Error type for the passive listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The discovery port could not be bound (usually: already in use).
    #[error("failed to bind discovery listener on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// A bound discovery socket, consumed by [`collect`](Self::collect).
pub struct PassiveListener {
    socket: UdpSocket,
}

impl PassiveListener {
    /// Binds the discovery socket.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::BindFailed`].
    pub async fn bind(addr: SocketAddr) -> Result<Self, ListenerError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ListenerError::BindFailed { addr, source })?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    /// Receives for `window`, then releases the socket and returns every
    /// distinct seed heard, in first-heard order.
    pub async fn collect(self, window: Duration) -> Vec<DiscoveredSeed> {
        let deadline = Instant::now() + window;
        let mut registry = SeedRegistry::new();
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

        loop {
            let (len, from) = match timeout_at(deadline, self.socket.recv_from(&mut buf)).await {
                Err(_) => break,
                Ok(Ok(received)) => received,
                Ok(Err(e)) => {
                    // e.g. ICMP-induced errors on some platforms; keep listening.
                    warn!("discovery receive error: {e}");
                    continue;
                }
            };

            match decode_announcement(&buf[..len]) {
                Ok(announcement) => {
                    let seed =
                        DiscoveredSeed::from_announcement(announcement, from.ip(), current_timestamp_ms());
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
                Err(e) => debug!("ignoring datagram from {from}: {e}"),
            }
        }

        registry.into_seeds()
    }
}

/// Binds `bind_addr` and collects announcements for `window`.
///
/// # Errors
///
/// Returns [`ListenerError::BindFailed`]; receive problems never surface.
pub async fn listen(bind_addr: SocketAddr, window: Duration) -> Result<Vec<DiscoveredSeed>, ListenerError> {
    let listener = PassiveListener::bind(bind_addr).await?;
    Ok(listener.collect(window).await)
}

/// [`AnnouncementListener`] that binds a fresh socket per session.
pub struct UdpAnnouncementListener {
    bind_addr: SocketAddr,
}

impl UdpAnnouncementListener {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }
}

#[async_trait]
impl AnnouncementListener for UdpAnnouncementListener {
    async fn listen(&self, window: Duration) -> Result<Vec<DiscoveredSeed>, DiscoveryError> {
        listen(self.bind_addr, window)
            .await
            .map_err(|e| DiscoveryError::ListenerUnavailable(e.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
