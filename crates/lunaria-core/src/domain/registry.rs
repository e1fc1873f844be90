//! SeedRegistry: the result set of one discovery session.
//!
//! Every observation of a seed (announcement or scan hit) is upserted here,
//! keyed by seed id.  A repeat observation fully replaces the earlier record
//! (no field merging) but keeps the slot of the first observation, so
//! [`SeedRegistry::into_seeds`] returns seeds in first-observed order.

use std::collections::HashMap;

use super::seed::DiscoveredSeed;

/// Insertion-ordered, id-keyed set of [`DiscoveredSeed`]s.
#[derive(Debug, Default, Clone)]
pub struct SeedRegistry {
    seeds: Vec<DiscoveredSeed>,
    index: HashMap<String, usize>,
}

impl SeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a seed.
    ///
    /// Returns `true` if this was the first observation of the seed id.
    pub fn upsert(&mut self, seed: DiscoveredSeed) -> bool {
        match self.index.get(seed.seed_id()) {
            Some(&slot) => {
                self.seeds[slot] = seed;
                false
            }
            None => {
                self.index.insert(seed.seed_id().to_string(), self.seeds.len());
                self.seeds.push(seed);
                true
            }
        }
    }

    pub fn get(&self, seed_id: &str) -> Option<&DiscoveredSeed> {
        self.index.get(seed_id).map(|&slot| &self.seeds[slot])
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Consumes the registry, returning seeds in first-observed order.
    pub fn into_seeds(self) -> Vec<DiscoveredSeed> {
        self.seeds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::seed::SeedIdentity;

    fn seed(id: &str, name: &str, last_seen: u64) -> DiscoveredSeed {
        DiscoveredSeed::from_scan(
            SeedIdentity {
                seed_id: id.to_string(),
                name: name.to_string(),
                location: "greenhouse".to_string(),
                owner: "ops".to_string(),
                port: 4269,
            },
            "192.168.1.20".parse().unwrap(),
            last_seen,
        )
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = SeedRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_upsert_reports_first_observation() {
        let mut registry = SeedRegistry::new();
        assert!(registry.upsert(seed("seed-a", "Basil", 1)));
        assert!(!registry.upsert(seed("seed-a", "Basil", 2)));
    }

    #[test]
    fn test_upsert_replaces_whole_record_on_duplicate() {
        // Arrange
        let mut registry = SeedRegistry::new();
        registry.upsert(seed("seed-a", "Basil", 1));

        // Act
        registry.upsert(seed("seed-a", "Basil (renamed)", 2));

        // Assert
        assert_eq!(registry.len(), 1);
        let stored = registry.get("seed-a").unwrap();
        assert_eq!(stored.identity.name, "Basil (renamed)");
        assert_eq!(stored.last_seen, 2);
    }

    #[test]
    fn test_into_seeds_preserves_first_observed_order() {
        // Arrange
        let mut registry = SeedRegistry::new();
        registry.upsert(seed("seed-b", "Mint", 1));
        registry.upsert(seed("seed-a", "Basil", 2));
        registry.upsert(seed("seed-b", "Mint", 3));

        // Act
        let ids: Vec<String> = registry
            .into_seeds()
            .into_iter()
            .map(|s| s.identity.seed_id)
            .collect();

        // Assert
        assert_eq!(ids, vec!["seed-b", "seed-a"]);
    }
}
