//! Application layer use cases for the seed.
//!
//! - **`register_seed`** – validates a registration request and produces the
//!   identity a new seed will announce for the rest of its life.

pub mod register_seed;
