//! Storage infrastructure: seed configuration file persistence.

pub mod config;
