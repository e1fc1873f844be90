//! lunaria-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does lunaria-client do?
//!
//! The client runs on the machine that keeps the photo archive.  It:
//!
//! 1. Finds seeds on the LAN.  It first listens passively for UDP
//!    announcements; only if none arrive within the window does it fall
//!    back to probing every host of the local /24 over HTTP.
//! 2. Syncs one seed: fetches its status and photo listing, then downloads
//!    every photo that is not already in the local archive.

/// Application layer: discovery coordination and the sync pipeline.
pub mod application;

/// Infrastructure layer: UDP listener, subnet scanner, HTTP client, config.
pub mod infrastructure;
