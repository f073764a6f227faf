//! Caching of population distributions, keyed by a content fingerprint of
//! the register and the adjustment configuration.
//!
//! The aggregation itself is cheap but the register can be large and is
//! reloaded between sessions; callers that hold one can skip the pass
//! entirely. The store is injectable so that embedders decide where cached
//! tables live. [NoStore] disables caching without changing the call site.

use std::collections::HashMap;

use log::debug;

use crate::config::*;
use crate::population_distribution;

/// A place to keep computed distributions between runs.
pub trait DistributionStore {
    fn get(&self, key: &str) -> Option<Vec<PopulationRow>>;
    fn put(&mut self, key: &str, rows: &[PopulationRow]);
}

/// In-memory store, useful for interactive sessions.
#[derive(Default)]
pub struct MemoryStore {
    cells: HashMap<String, Vec<PopulationRow>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            cells: HashMap::new(),
        }
    }
}

impl DistributionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<PopulationRow>> {
        self.cells.get(key).cloned()
    }

    fn put(&mut self, key: &str, rows: &[PopulationRow]) {
        self.cells.insert(key.to_string(), rows.to_vec());
    }
}

/// A store that retains nothing.
pub struct NoStore;

impl DistributionStore for NoStore {
    fn get(&self, _key: &str) -> Option<Vec<PopulationRow>> {
        None
    }

    fn put(&mut self, _key: &str, _rows: &[PopulationRow]) {}
}

/// SHA-256 over a canonical line-per-record rendering of the register plus
/// the adjustment configuration. Two equal inputs always fingerprint equal;
/// any change to a record, its order, or an adjustment changes the key.
pub fn register_fingerprint(
    records: &[NeighborhoodRecord],
    adjustments: &[SpecialAdjustment],
) -> String {
    let mut buffer = String::new();
    for r in records.iter() {
        buffer.push_str(&format!(
            "{}|{}|{}|{}|{}|{}|{}|{}\n",
            r.nuts1,
            r.nuts2,
            r.nuts3,
            r.province,
            r.district,
            r.neighborhood_code,
            r.status.code(),
            r.population
        ));
    }
    for adj in adjustments.iter() {
        buffer.push_str(&format!("@{}", adj.stratum));
        for p in adj.predicates.iter() {
            buffer.push_str(&format!("|{}={}", p.field.name(), p.value));
        }
        buffer.push('\n');
    }
    sha256::digest(buffer)
}

/// [population_distribution], going through the store. Diagnostics are only
/// produced on a miss; a cached table already had its adjustments applied.
pub fn population_distribution_cached(
    store: &mut dyn DistributionStore,
    records: &[NeighborhoodRecord],
    adjustments: &[SpecialAdjustment],
    strict: bool,
) -> Result<(Vec<PopulationRow>, Vec<Diagnostic>), SamplingError> {
    let key = register_fingerprint(records, adjustments);
    if let Some(rows) = store.get(&key) {
        debug!("population_distribution_cached: hit for {}", &key[..12]);
        return Ok((rows, Vec::new()));
    }
    let (rows, diagnostics) = population_distribution(records, adjustments, strict)?;
    store.put(&key, &rows);
    Ok((rows, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, population: u64) -> NeighborhoodRecord {
        NeighborhoodRecord {
            nuts1: "TR6".to_string(),
            nuts2: "TR61".to_string(),
            nuts3: "TR611".to_string(),
            province: "Antalya".to_string(),
            district: "Kepez".to_string(),
            neighborhood_code: code.to_string(),
            status: DistrictStatus::Central,
            population,
        }
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = vec![record("N1", 100), record("N2", 200)];
        let mut b = a.clone();
        assert_eq!(register_fingerprint(&a, &[]), register_fingerprint(&b, &[]));
        b[1].population = 201;
        assert_ne!(register_fingerprint(&a, &[]), register_fingerprint(&b, &[]));
    }

    #[test]
    fn memory_store_round_trip() {
        let records = vec![record("N1", 100)];
        let mut store = MemoryStore::new();
        let (first, _) =
            population_distribution_cached(&mut store, &records, &[], false).unwrap();
        let (second, _) =
            population_distribution_cached(&mut store, &records, &[], false).unwrap();
        assert_eq!(first, second);
        assert!(store
            .get(&register_fingerprint(&records, &[]))
            .is_some());
    }

    #[test]
    fn no_store_recomputes() {
        let records = vec![record("N1", 100)];
        let mut store = NoStore;
        let (rows, _) =
            population_distribution_cached(&mut store, &records, &[], false).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(store.get(&register_fingerprint(&records, &[])).is_none());
    }
}
