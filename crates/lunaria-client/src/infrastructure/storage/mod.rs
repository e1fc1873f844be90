//! Storage infrastructure: client configuration file persistence.

pub mod config;
