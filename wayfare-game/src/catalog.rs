//! Built-in location catalog used when no scenario backend is reachable.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::location::Location;

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/fallback_locations.json");

/// A fixed set of hand-written locations the session can always fall back to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FallbackCatalog {
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl FallbackCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            locations: Vec::new(),
        }
    }

    /// Load a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid location data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The embedded catalog shipped with the crate.
    #[must_use]
    pub fn load() -> Self {
        serde_json::from_str(DEFAULT_CATALOG_DATA).unwrap_or_default()
    }

    /// Pick a location, preferring ones whose names were not used yet. Once
    /// every entry has been used the whole catalog becomes eligible again.
    /// Returns `None` only when the catalog itself is empty.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R, used_names: &[String]) -> Option<&Location> {
        if self.locations.is_empty() {
            return None;
        }
        let fresh: Vec<&Location> = self
            .locations
            .iter()
            .filter(|location| !used_names.iter().any(|used| used == &location.name))
            .collect();
        if fresh.is_empty() {
            let idx = rng.gen_range(0..self.locations.len());
            return Some(&self.locations[idx]);
        }
        let idx = rng.gen_range(0..fresh.len());
        Some(fresh[idx])
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.locations.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl<'a> IntoIterator for &'a FallbackCatalog {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn embedded_catalog_parses_and_validates() {
        let catalog = FallbackCatalog::load();
        assert_eq!(catalog.len(), 6);
        for location in &catalog {
            assert_eq!(location.validate(), Ok(()), "{}", location.name);
        }
    }

    #[test]
    fn pick_prefers_unused_names() {
        let catalog = FallbackCatalog::load();
        let used: Vec<String> = catalog
            .iter()
            .take(catalog.len() - 1)
            .map(|l| l.name.clone())
            .collect();
        let only_fresh = catalog.iter().last().map(|l| l.name.clone());

        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            let picked = catalog.pick(&mut rng, &used).map(|l| l.name.clone());
            assert_eq!(picked, only_fresh);
        }
    }

    #[test]
    fn pick_recycles_once_everything_was_used() {
        let catalog = FallbackCatalog::load();
        let used: Vec<String> = catalog.iter().map(|l| l.name.clone()).collect();
        let mut rng = SmallRng::seed_from_u64(11);
        assert!(catalog.pick(&mut rng, &used).is_some());
    }

    #[test]
    fn pick_on_empty_catalog_is_none() {
        let catalog = FallbackCatalog::empty();
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(catalog.pick(&mut rng, &[]), None);
    }

    #[test]
    fn picks_are_deterministic_per_seed() {
        let catalog = FallbackCatalog::load();
        let mut first = SmallRng::seed_from_u64(99);
        let mut second = SmallRng::seed_from_u64(99);
        for _ in 0..10 {
            assert_eq!(
                catalog.pick(&mut first, &[]).map(|l| &l.name),
                catalog.pick(&mut second, &[]).map(|l| &l.name)
            );
        }
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(FallbackCatalog::from_json("{\"locations\": 12}").is_err());
    }
}
