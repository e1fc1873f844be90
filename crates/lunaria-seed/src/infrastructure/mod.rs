//! Infrastructure layer for the seed application.
//!
//! Contains OS-facing adapters: the UDP broadcast announcer and the TOML
//! configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `lunaria_core`, but MUST NOT be imported by the `application` layer.

pub mod announcer;
pub mod storage;
