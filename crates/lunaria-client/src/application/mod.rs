//! Application layer use cases for the client.
//!
//! Use cases in this layer orchestrate and depend on traits rather than on
//! sockets or HTTP, so tests can drive them with mocks and fakes.
//!
//! # Sub-modules
//!
//! - **`discover_seeds`** – runs the passive listener and, only when it comes
//!   back empty, the active scanner.  Never both in parallel.
//!
//! - **`sync_photos`** – pulls a seed's listing and downloads each photo
//!   exactly once into the local archive, skipping files already present.

pub mod discover_seeds;
pub mod sync_photos;
