//! Network infrastructure for discovery.
//!
//! # Sub-modules
//!
//! - **`listener`** – binds the discovery port and collects seed
//!   announcements for a bounded window, deduplicated by seed id.
//!
//! - **`enumerator`** – answers "which IPv4 subnet am I on?" so the scanner
//!   knows which hosts to probe.  Pluggable per platform, with a documented
//!   fallback guess.
//!
//! - **`scanner`** – the fallback path: probes every host of the subnet
//!   concurrently and keeps the ones that answer like a seed.

pub mod enumerator;
pub mod listener;
pub mod scanner;
