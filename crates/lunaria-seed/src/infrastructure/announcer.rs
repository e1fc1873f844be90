//! UDP broadcast announcer.
//!
//! A [`SeedAnnouncer`] owns one broadcast-capable UDP socket for its whole
//! lifetime.  While started, a background Tokio task sends the seed's
//! [`Announcement`] once immediately and then once per interval to the
//! target address (normally `255.255.255.255:4270`).
//!
//! Delivery is fire-and-forget: a failed send is logged and the schedule
//! carries on.  Nobody acknowledges announcements.
//!
//! # Lifecycle
//!
//! ```text
//! bind() ──► start() ──► stop() ──► start() ... ──► close()
//! ```
//!
//! `start` while running and `stop` while stopped are no-ops.  `close`
//! stops the task and releases the socket; `start` after `close` fails with
//! [`AnnouncerError::Closed`].  Instances are independent: the socket binds
//! an ephemeral source port by default, so several announcers (or an
//! announcer and a listener on port 4270) coexist on one host.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lunaria_core::{current_timestamp_ms, encode_announcement, Announcement, SeedIdentity};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Error type for announcer operations.
#[derive(Debug, Error)]
pub enum AnnouncerError {
    /// The UDP socket could not be bound.
    #[error("failed to bind announcer socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// SO_BROADCAST could not be enabled.
    #[error("failed to enable broadcast: {0}")]
    Broadcast(#[source] std::io::Error),
    /// The configured interval is zero.
    #[error("announcement interval must be non-zero")]
    ZeroInterval,
    /// The announcer has been closed.
    #[error("announcer is closed")]
    Closed,
    /// The announcement could not be encoded.
    #[error("failed to encode announcement: {0}")]
    Encode(#[from] lunaria_core::ProtocolError),
    /// The datagram could not be sent.
    #[error("failed to send announcement to {target}: {source}")]
    Send {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for a [`SeedAnnouncer`].
#[derive(Debug, Clone)]
pub struct AnnouncerConfig {
    /// Local address the sending socket binds to.
    pub bind_addr: SocketAddr,
    /// Period between announcements.
    pub interval: Duration,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:0".parse().unwrap(),
            interval: Duration::from_secs(30),
        }
    }
}

/// Periodically broadcasts a seed's identity.
pub struct SeedAnnouncer {
    config: AnnouncerConfig,
    socket: Option<Arc<UdpSocket>>,
    task: Option<JoinHandle<()>>,
    last_timestamp: Arc<AtomicU64>,
}

impl SeedAnnouncer {
    /// Opens the announcer's socket and enables broadcast on it.
    ///
    /// # Errors
    ///
    /// Returns [`AnnouncerError::BindFailed`] if the socket cannot be bound,
    /// [`AnnouncerError::Broadcast`] if broadcast cannot be enabled, and
    /// [`AnnouncerError::ZeroInterval`] for a zero interval.
    pub async fn bind(config: AnnouncerConfig) -> Result<Self, AnnouncerError> {
        if config.interval.is_zero() {
            return Err(AnnouncerError::ZeroInterval);
        }
        let addr = config.bind_addr;
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| AnnouncerError::BindFailed { addr, source })?;
        socket.set_broadcast(true).map_err(AnnouncerError::Broadcast)?;

        debug!("announcer socket bound on {:?}", socket.local_addr().ok());
        Ok(Self {
            config,
            socket: Some(Arc::new(socket)),
            task: None,
            last_timestamp: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Local address of the sending socket, `None` once closed.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// `true` while the periodic task is scheduled.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    /// Starts announcing `identity` to `target`.
    ///
    /// The first announcement is sent immediately, then one per interval.
    /// Must be called from within a Tokio runtime.  Calling `start` while
    /// already running keeps the current schedule.
    ///
    /// # Errors
    ///
    /// Returns [`AnnouncerError::Closed`] after [`close`](Self::close).
    pub fn start(&mut self, identity: SeedIdentity, target: SocketAddr) -> Result<(), AnnouncerError> {
        let socket = self.socket.clone().ok_or(AnnouncerError::Closed)?;
        if self.is_running() {
            debug!("announcer already running; start ignored");
            return Ok(());
        }

        info!(
            "announcing seed {} ({}) to {target} every {:?}",
            identity.name, identity.seed_id, self.config.interval
        );
        self.task = Some(tokio::spawn(announce_loop(
            socket,
            identity,
            target,
            self.config.interval,
            Arc::clone(&self.last_timestamp),
        )));
        Ok(())
    }

    /// Stops the periodic schedule.  The socket stays open.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("announcer stopped");
        }
    }

    /// Stops announcing and releases the socket.
    pub fn close(&mut self) {
        self.stop();
        if self.socket.take().is_some() {
            info!("announcer closed");
        }
    }
}

impl Drop for SeedAnnouncer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Body of the periodic announcement task.
async fn announce_loop(
    socket: Arc<UdpSocket>,
    identity: SeedIdentity,
    target: SocketAddr,
    period: Duration,
    last_timestamp: Arc<AtomicU64>,
) {
    // The first tick of a Tokio interval completes immediately.
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let timestamp = next_timestamp(&last_timestamp, current_timestamp_ms());
        match send_announcement(&socket, &identity, timestamp, target).await {
            Ok(len) => debug!("sent announcement for {} ({len} bytes)", identity.seed_id),
            Err(e) => warn!("{e}"),
        }
    }
}

/// Encodes and sends one announcement datagram.
///
/// # Errors
///
/// Returns [`AnnouncerError::Encode`] or [`AnnouncerError::Send`].
pub async fn send_announcement(
    socket: &UdpSocket,
    identity: &SeedIdentity,
    timestamp: u64,
    target: SocketAddr,
) -> Result<usize, AnnouncerError> {
    let bytes = encode_announcement(&Announcement {
        identity: identity.clone(),
        timestamp,
    })?;
    socket
        .send_to(&bytes, target)
        .await
        .map_err(|source| AnnouncerError::Send { target, source })
}

/// Returns a timestamp strictly greater than any previously issued one.
///
/// Wall clocks can stand still between two sends (coarse clocks) or step
/// backwards (NTP), so the issued value is `max(now, last + 1)`.
fn next_timestamp(last: &AtomicU64, now: u64) -> u64 {
    let mut current = last.load(Ordering::Relaxed);
    loop {
        let next = now.max(current + 1);
        match last.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => current = actual,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> SeedIdentity {
        SeedIdentity {
            seed_id: "seed-test0001".to_string(),
            name: "Test Fern".to_string(),
            location: "Lab".to_string(),
            owner: "ci".to_string(),
            port: 4269,
        }
    }

    fn loopback_config(interval: Duration) -> AnnouncerConfig {
        AnnouncerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            interval,
        }
    }

    #[test]
    fn test_announcer_config_default_interval_is_thirty_seconds() {
        let cfg = AnnouncerConfig::default();
        assert_eq!(cfg.interval, Duration::from_secs(30));
        assert_eq!(cfg.bind_addr.port(), 0);
    }

    #[test]
    fn test_next_timestamp_follows_wall_clock_when_it_advances() {
        let last = AtomicU64::new(100);
        assert_eq!(next_timestamp(&last, 500), 500);
        assert_eq!(next_timestamp(&last, 900), 900);
    }

    #[test]
    fn test_next_timestamp_is_strictly_increasing_when_clock_stalls() {
        // Arrange
        let last = AtomicU64::new(0);

        // Act
        let a = next_timestamp(&last, 1_000);
        let b = next_timestamp(&last, 1_000);
        let c = next_timestamp(&last, 999);

        // Assert
        assert_eq!((a, b, c), (1_000, 1_001, 1_002));
    }

    #[tokio::test]
    async fn test_bind_rejects_zero_interval() {
        let result = SeedAnnouncer::bind(loopback_config(Duration::ZERO)).await;
        assert!(matches!(result, Err(AnnouncerError::ZeroInterval)));
    }

    #[tokio::test]
    async fn test_bind_uses_ephemeral_port() {
        let announcer = SeedAnnouncer::bind(loopback_config(Duration::from_secs(1)))
            .await
            .unwrap();
        let addr = announcer.local_addr().expect("bound");
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        // Arrange
        let mut announcer = SeedAnnouncer::bind(loopback_config(Duration::from_secs(60)))
            .await
            .unwrap();
        let target: SocketAddr = "127.0.0.1:9".parse().unwrap();

        // Act / Assert
        announcer.stop();
        assert!(!announcer.is_running());
        announcer.start(identity(), target).unwrap();
        announcer.start(identity(), target).unwrap();
        assert!(announcer.is_running());
        announcer.stop();
        announcer.stop();
        assert!(!announcer.is_running());
    }

    #[tokio::test]
    async fn test_send_error_does_not_stop_schedule() {
        // Arrange: an IPv4 socket cannot send to an IPv6 target, so every
        // send in the loop fails.
        let mut announcer = SeedAnnouncer::bind(loopback_config(Duration::from_millis(20)))
            .await
            .unwrap();
        let unreachable: SocketAddr = "[::1]:9".parse().unwrap();
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        assert!(send_announcement(&socket, &identity(), 1, unreachable).await.is_err());

        // Act
        announcer.start(identity(), unreachable).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        // Assert
        assert!(announcer.is_running());
        announcer.close();
        assert!(!announcer.is_running());
    }

    #[tokio::test]
    async fn test_start_after_close_fails() {
        let mut announcer = SeedAnnouncer::bind(loopback_config(Duration::from_secs(60)))
            .await
            .unwrap();
        announcer.close();
        announcer.close();

        let result = announcer.start(identity(), "127.0.0.1:9".parse().unwrap());

        assert!(matches!(result, Err(AnnouncerError::Closed)));
        assert!(announcer.is_closed());
        assert!(announcer.local_addr().is_none());
    }

    #[tokio::test]
    async fn test_send_announcement_delivers_decodable_datagram() {
        // Arrange
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        // Act
        send_announcement(&sender, &identity(), 42, target).await.unwrap();
        let mut buf = [0u8; 1024];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();

        // Assert
        let decoded = lunaria_core::decode_announcement(&buf[..len]).unwrap();
        assert_eq!(decoded.identity, identity());
        assert_eq!(decoded.timestamp, 42);
    }
}
