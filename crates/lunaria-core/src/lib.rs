//! # lunaria-core
//!
//! Shared library for Lunaria containing the seed identity types, the
//! per-session discovery registry, and the JSON codecs used on the discovery
//! channel and the seed HTTP API.
//!
//! This crate is used by both the seed and the client applications.
//! It has zero dependencies on OS APIs or network sockets.
//!
//! # Architecture overview
//!
//! A *seed* is a field device that periodically captures photos.  It
//! advertises itself on the LAN by broadcasting an [`Announcement`] on UDP
//! port [`DISCOVERY_PORT`], and serves its photos over HTTP on
//! [`API_PORT`].  A *client* listens for those announcements (or, when none
//! arrive, probes every host on its subnet) and then pulls the photos into a
//! local archive.
//!
//! - **`domain`** – identity records, the client-side [`DiscoveredSeed`] view,
//!   and the [`SeedRegistry`] that deduplicates observations by seed id.
//! - **`protocol`** – strict encode/decode of every JSON payload exchanged
//!   between seeds and clients.

pub mod domain;
pub mod protocol;

pub use domain::registry::SeedRegistry;
pub use domain::seed::{
    current_timestamp_ms, generate_seed_id, Announcement, DiscoveredSeed, SeedIdentity,
    SeedStatus,
};
pub use protocol::codec::{
    decode_announcement, decode_photo_list, decode_probe, decode_status, encode_announcement,
    ProtocolError,
};
pub use protocol::{API_PORT, DISCOVERY_PORT};
