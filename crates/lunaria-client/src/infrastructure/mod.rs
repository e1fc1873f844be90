//! Infrastructure layer for the client application.
//!
//! Contains OS-facing adapters: the UDP announcement listener, the subnet
//! scanner and its network enumerator, the HTTP client for the seed API, and
//! configuration file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `lunaria_core`, but MUST NOT be imported by the `application` layer.

pub mod http;
pub mod network;
pub mod storage;
