//! Domain entities for Lunaria.
//!
//! Pure data types and rules with no infrastructure dependencies: what a seed
//! says about itself, what a client remembers about a seed it observed, and
//! how repeated observations of the same seed collapse into one record.

/// Identity records and the client-side view of a discovered seed.
pub mod seed;

/// Insertion-ordered, id-keyed set of discovered seeds.
pub mod registry;
