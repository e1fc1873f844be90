//! lunaria-seed library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does lunaria-seed do?
//!
//! A *seed* is a field device that captures photos on a schedule and serves
//! them over a small HTTP API.  This crate covers the seed's side of the
//! discovery protocol:
//!
//! 1. Registering the device: generating a stable seed id and writing the
//!    seed configuration file.
//! 2. Announcing the device: broadcasting its identity on the discovery port
//!    once immediately and then on a fixed interval, so clients on the same
//!    LAN can find it without any DNS or multicast infrastructure.

/// Application layer: seed registration.
pub mod application;

/// Infrastructure layer: the UDP announcer and the seed config file.
pub mod infrastructure;
