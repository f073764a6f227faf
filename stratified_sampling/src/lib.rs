mod config;
use log::{debug, info, warn};

use std::collections::BTreeMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::index::sample_weighted;
use rand::SeedableRng;

pub mod builder;
pub mod cache;
pub mod manual;

pub use crate::config::*;

// **** Stratum definitions ****

/// The three metropolitan strata, keyed by their finest geographic code.
const METRO_NUTS3: [&str; 3] = ["TR100", "TR310", "TR510"];

/// Interviews planned per listed neighborhood on the non-metropolitan road.
/// This is a fixed domain constant of the fieldwork design; it does not track
/// the configurable average of [SamplingParams].
pub const OTHER_ROAD_INTERVIEWS_PER_NEIGHBORHOOD: u32 = 2;

/// Assigns a register record to its stratum.
///
/// The rules are evaluated in order, first match wins. Metropolitan province
/// centers form their own strata; a few regions are merged in pairs; the two
/// regions that contain a metropolitan center get an "excluding" stratum for
/// their remainder; everything else falls back to the coarse code.
pub fn assign_stratum(record: &NeighborhoodRecord) -> String {
    let nuts3 = record.nuts3.as_str();
    let nuts2 = record.nuts2.as_str();
    let nuts1 = record.nuts1.as_str();

    if METRO_NUTS3.contains(&nuts3) {
        return nuts3.to_string();
    }
    if nuts2.starts_with("TR61") {
        return "TR61".to_string();
    }
    if nuts2.starts_with("TR62") || nuts2.starts_with("TR63") {
        return "TR62&TR63".to_string();
    }
    if nuts2.starts_with("TRC1") {
        return "TRC1".to_string();
    }
    if nuts2.starts_with("TRC2") || nuts2.starts_with("TRC3") {
        return "TRC2&TRC3".to_string();
    }
    if nuts1 == "TR3" && nuts3 != "TR310" {
        return "TR3-dışı".to_string();
    }
    if nuts1 == "TR5" && nuts3 != "TR510" {
        return "TR5-dışı".to_string();
    }
    nuts1.to_string()
}

/// Assigns a record to its stratum and urbanization class.
pub fn classify(record: &NeighborhoodRecord) -> (String, UrbanClass) {
    (assign_stratum(record), record.status.urban_class())
}

// **** Population aggregation ****

/// Reduces the register into one row per stratum, with the population split
/// by urbanization class, and applies the special adjustments.
///
/// An adjustment that targets a stratum absent from the register is skipped
/// with a diagnostic, or aborts the build when `strict` is set.
pub fn population_distribution(
    records: &[NeighborhoodRecord],
    adjustments: &[SpecialAdjustment],
    strict: bool,
) -> Result<(Vec<PopulationRow>, Vec<Diagnostic>), SamplingError> {
    info!("population_distribution: aggregating {} records", records.len());

    let mut totals: BTreeMap<String, (u64, u64)> = BTreeMap::new();
    for record in records.iter() {
        let (stratum, class) = classify(record);
        let entry = totals.entry(stratum).or_insert((0, 0));
        match class {
            UrbanClass::Metro => entry.0 += record.population,
            UrbanClass::Other => entry.1 += record.population,
        }
    }

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for adj in adjustments.iter() {
        match adj.action {
            AdjustmentAction::AddPopulation => {
                let matched: u64 = records
                    .iter()
                    .filter(|r| adj.matches(r))
                    .map(|r| r.population)
                    .sum();
                match totals.get_mut(&adj.stratum) {
                    Some(entry) => {
                        debug!(
                            "population_distribution: adding {} to the other total of {}",
                            matched, adj.stratum
                        );
                        entry.1 += matched;
                    }
                    None => {
                        let reason = "stratum not present in the register".to_string();
                        if strict {
                            return Err(SamplingError::ConditionEval {
                                stratum: adj.stratum.clone(),
                                reason,
                            });
                        }
                        warn!("adjustment for stratum {} skipped: {}", adj.stratum, reason);
                        diagnostics.push(Diagnostic::AdjustmentSkipped {
                            stratum: adj.stratum.clone(),
                            reason,
                        });
                    }
                }
            }
        }
    }

    let rows: Vec<PopulationRow> = totals
        .into_iter()
        .map(|(stratum, (metro, other))| PopulationRow {
            stratum,
            metro_population: metro,
            other_population: other,
            total_population: metro + other,
        })
        .collect();
    Ok((rows, diagnostics))
}

// **** Proportional allocation ****

/// Derives the sampling frame: per-stratum interview counts and neighborhood
/// targets, proportional to population.
///
/// The interview split uses round-half-even per stratum and then pushes the
/// whole rounding drift onto the largest stratum, so the sizes always sum to
/// the requested total. The metro/other neighborhood split deliberately uses
/// plain rounding with subtraction instead; the two targets still always sum
/// to the neighborhood count.
pub fn sampling_frame(
    distribution: &[PopulationRow],
    params: &SamplingParams,
) -> Result<(Vec<FrameRow>, Vec<Diagnostic>), SamplingError> {
    if params.total_sample_size == 0 {
        return Err(SamplingError::InvalidParameter {
            name: "total_sample_size",
            value: 0,
        });
    }
    if params.interviews_per_neighborhood == 0 {
        return Err(SamplingError::InvalidParameter {
            name: "interviews_per_neighborhood",
            value: 0,
        });
    }
    if distribution.is_empty() {
        return Err(SamplingError::EmptyFrame);
    }
    let grand_total: u64 = distribution.iter().map(|r| r.total_population).sum();
    if grand_total == 0 {
        return Err(SamplingError::ZeroTotalPopulation);
    }

    info!(
        "sampling_frame: allocating {} interviews over {} strata, total population {}",
        params.total_sample_size,
        distribution.len(),
        grand_total
    );

    let mut sizes: Vec<i64> = distribution
        .iter()
        .map(|row| {
            let share = row.total_population as f64 / grand_total as f64
                * params.total_sample_size as f64;
            share.round_ties_even() as i64
        })
        .collect();

    let diff = params.total_sample_size as i64 - sizes.iter().sum::<i64>();
    if diff != 0 {
        // First occurrence wins when several strata share the largest size.
        let mut largest = 0usize;
        for (idx, &size) in sizes.iter().enumerate() {
            if size > sizes[largest] {
                largest = idx;
            }
        }
        debug!(
            "sampling_frame: rounding drift {}, corrected on stratum {}",
            diff, distribution[largest].stratum
        );
        sizes[largest] += diff;
    }

    let mut rows: Vec<FrameRow> = Vec::with_capacity(distribution.len());
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for (row, &size) in distribution.iter().zip(sizes.iter()) {
        let (sample_size, neighborhood_count, metro_neighborhoods, other_neighborhoods) =
            if row.total_population == 0 {
                (0, 0, 0, 0)
            } else {
                debug_assert!(size >= 0, "corrected sample size must not be negative");
                let sample_size = size.max(0) as u32;
                let count = sample_size.div_ceil(params.interviews_per_neighborhood);
                let metro = (row.metro_population as f64 / row.total_population as f64
                    * count as f64)
                    .round_ties_even() as u32;
                (sample_size, count, metro, count - metro)
            };
        if sample_size > 0 && metro_neighborhoods == 0 && other_neighborhoods == 0 {
            warn!(
                "sampling_frame: stratum {} has {} interviews but no neighborhoods",
                row.stratum, sample_size
            );
            diagnostics.push(Diagnostic::ZeroAllocation {
                stratum: row.stratum.clone(),
                sample_size,
            });
        }
        rows.push(FrameRow {
            stratum: row.stratum.clone(),
            metro_population: row.metro_population,
            other_population: row.other_population,
            total_population: row.total_population,
            sample_size,
            neighborhood_count,
            metro_neighborhoods,
            other_neighborhoods,
        });
    }
    Ok((rows, diagnostics))
}

/// Largest-remainder apportionment of `target` units over `weights`.
///
/// Each row gets the floor of its fractional share; the leftover units go one
/// by one to the rows with the largest fractional remainder, ties broken by
/// row index. A zero weight total yields all zeros.
pub fn largest_remainder_allocation(weights: &[u64], target: u32) -> Vec<u32> {
    let total: u64 = weights.iter().sum();
    if total == 0 {
        return vec![0; weights.len()];
    }

    let mut floors: Vec<u32> = Vec::with_capacity(weights.len());
    let mut remainders: Vec<f64> = Vec::with_capacity(weights.len());
    for &w in weights.iter() {
        let share = target as f64 * (w as f64 / total as f64);
        let floor = share.floor();
        floors.push(floor as u32);
        remainders.push(share - floor);
    }

    let assigned: u32 = floors.iter().sum();
    let leftover = target.saturating_sub(assigned) as usize;
    if leftover > 0 {
        let mut order: Vec<usize> = (0..weights.len()).collect();
        order.sort_by(|&a, &b| {
            remainders[b]
                .partial_cmp(&remainders[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        for &idx in order.iter().take(leftover) {
            floors[idx] += 1;
        }
    }
    floors
}

// **** Weighted sampling ****

/// Draws `count` records without replacement, with probability proportional
/// to population. Returns `min(count, pool size)` records.
///
/// The generator is freshly seeded on every call, so a cell's selection does
/// not depend on how many draws happened before it. Callers must check for an
/// empty pool first; asking for a positive count from nothing is an error.
pub fn weighted_sample(
    pool: &[&NeighborhoodRecord],
    count: usize,
    seed: u64,
) -> Result<Vec<NeighborhoodRecord>, SamplingError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if pool.is_empty() {
        return Err(SamplingError::EmptyPool);
    }
    let wanted = count.min(pool.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let picked = match sample_weighted(&mut rng, pool.len(), |i| pool[i].population as f64, wanted)
    {
        Ok(indices) => indices,
        // Weights come from u64 populations and wanted <= pool.len().
        Err(_) => unreachable!("weighted draw over non-negative weights"),
    };
    Ok(picked.into_iter().map(|i| pool[i].clone()).collect())
}

// **** The two sampling roads ****

fn group_by_stratum<'a>(
    records: &'a [NeighborhoodRecord],
) -> BTreeMap<String, Vec<&'a NeighborhoodRecord>> {
    let mut groups: BTreeMap<String, Vec<&NeighborhoodRecord>> = BTreeMap::new();
    for record in records.iter() {
        groups.entry(assign_stratum(record)).or_default().push(record);
    }
    groups
}

/// Road 1: metropolitan strata. One direct population-weighted draw per
/// stratum with a positive metro target.
fn metro_road(
    groups: &BTreeMap<String, Vec<&NeighborhoodRecord>>,
    frame: &[FrameRow],
    params: &SamplingParams,
) -> Result<(Vec<Selection>, Vec<Diagnostic>), SamplingError> {
    let mut selections: Vec<Selection> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    for row in frame.iter().filter(|r| r.metro_neighborhoods > 0) {
        let pool: Vec<&NeighborhoodRecord> = groups
            .get(&row.stratum)
            .map(|g| {
                g.iter()
                    .filter(|r| r.status.urban_class() == UrbanClass::Metro)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if pool.is_empty() {
            warn!(
                "metro_road: stratum {} has a target of {} but no metro records",
                row.stratum, row.metro_neighborhoods
            );
            diagnostics.push(Diagnostic::EmptyPool {
                stratum: row.stratum.clone(),
                class: UrbanClass::Metro,
            });
            continue;
        }
        let picked = weighted_sample(&pool, row.metro_neighborhoods as usize, params.seed)?;
        info!(
            "metro_road: stratum {}: selected {} of {} neighborhoods",
            row.stratum,
            picked.len(),
            row.metro_neighborhoods
        );
        selections.extend(picked.into_iter().map(|record| Selection {
            stratum: row.stratum.clone(),
            urban_class: UrbanClass::Metro,
            record,
        }));
    }
    Ok((selections, diagnostics))
}

/// Road 2: non-metropolitan strata. The stratum target is split over the
/// central/outer status cells by largest remainder, one district is chosen
/// per cell, and the neighborhoods are drawn within that district.
fn other_road(
    groups: &BTreeMap<String, Vec<&NeighborhoodRecord>>,
    frame: &[FrameRow],
    params: &SamplingParams,
) -> Result<(Vec<Selection>, Vec<Diagnostic>), SamplingError> {
    let mut selections: Vec<Selection> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    for row in frame.iter().filter(|r| r.other_neighborhoods > 0) {
        let group: Vec<&NeighborhoodRecord> = groups
            .get(&row.stratum)
            .map(|g| {
                g.iter()
                    .filter(|r| r.status.urban_class() == UrbanClass::Other)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if group.is_empty() {
            warn!(
                "other_road: stratum {} has a target of {} but no other-class records",
                row.stratum, row.other_neighborhoods
            );
            diagnostics.push(Diagnostic::EmptyPool {
                stratum: row.stratum.clone(),
                class: UrbanClass::Other,
            });
            continue;
        }

        let cell_statuses = [DistrictStatus::Central, DistrictStatus::Outer];
        let cell_populations: Vec<u64> = cell_statuses
            .iter()
            .map(|&status| {
                group
                    .iter()
                    .filter(|r| r.status == status)
                    .map(|r| r.population)
                    .sum()
            })
            .collect();
        let allocation = largest_remainder_allocation(&cell_populations, row.other_neighborhoods);
        info!(
            "other_road: stratum {}: targets {:?} over status cells, {} interviews planned",
            row.stratum,
            allocation,
            row.other_neighborhoods * OTHER_ROAD_INTERVIEWS_PER_NEIGHBORHOOD
        );

        for (idx, &status) in cell_statuses.iter().enumerate() {
            let needed = allocation[idx] as usize;
            if needed == 0 {
                continue;
            }
            let subset: Vec<&NeighborhoodRecord> =
                group.iter().filter(|r| r.status == status).cloned().collect();
            if subset.is_empty() {
                continue;
            }

            let district = choose_district(&subset, status, params.seed);
            let cell: Vec<&NeighborhoodRecord> = subset
                .iter()
                .filter(|r| r.district == district)
                .cloned()
                .collect();
            let pool = if cell.is_empty() {
                warn!(
                    "other_road: stratum {}: district {} (status {}) has no neighborhoods, \
                     falling back to the whole cell",
                    row.stratum,
                    district,
                    status.code()
                );
                diagnostics.push(Diagnostic::DistrictFallback {
                    stratum: row.stratum.clone(),
                    status,
                    district: district.clone(),
                });
                subset
            } else {
                cell
            };

            let picked = weighted_sample(&pool, needed, params.seed)?;
            debug!(
                "other_road: stratum {} status {}: selected {} of {} in district {}",
                row.stratum,
                status.code(),
                picked.len(),
                needed,
                district
            );
            selections.extend(picked.into_iter().map(|record| Selection {
                stratum: row.stratum.clone(),
                urban_class: UrbanClass::Other,
                record,
            }));
        }
    }
    Ok((selections, diagnostics))
}

/// Picks the district that serves a status cell. Central cells take the first
/// district in register order; outer cells draw one district with probability
/// proportional to its population.
fn choose_district(subset: &[&NeighborhoodRecord], status: DistrictStatus, seed: u64) -> String {
    if status == DistrictStatus::Central {
        return subset[0].district.clone();
    }
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for record in subset.iter() {
        *totals.entry(record.district.as_str()).or_insert(0) += record.population;
    }
    let names: Vec<&str> = totals.keys().cloned().collect();
    let weights: Vec<u64> = totals.values().cloned().collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => {
            let mut rng = StdRng::seed_from_u64(seed);
            names[dist.sample(&mut rng)].to_string()
        }
        // All districts have zero population; the first one serves.
        Err(_) => names[0].to_string(),
    }
}

// **** Orchestration ****

/// Runs both sampling roads over the register and reconciles the achieved
/// neighborhood counts against the frame.
///
/// The roads read disjoint slices of the same immutable register and do not
/// share state; their outputs are concatenated metro road first.
pub fn draw_sample(
    records: &[NeighborhoodRecord],
    frame: &[FrameRow],
    params: &SamplingParams,
) -> Result<SamplingOutcome, SamplingError> {
    let groups = group_by_stratum(records);

    let (mut selections, mut diagnostics) = metro_road(&groups, frame, params)?;
    let (other_selections, other_diagnostics) = other_road(&groups, frame, params)?;
    selections.extend(other_selections);
    diagnostics.extend(other_diagnostics);

    let mut achieved: BTreeMap<&str, u32> = BTreeMap::new();
    for selection in selections.iter() {
        *achieved.entry(selection.stratum.as_str()).or_insert(0) += 1;
    }
    let comparison: Vec<PlanComparison> = frame
        .iter()
        .map(|row| PlanComparison {
            stratum: row.stratum.clone(),
            planned_neighborhoods: row.neighborhood_count,
            achieved_neighborhoods: achieved.get(row.stratum.as_str()).cloned().unwrap_or(0),
        })
        .collect();

    info!(
        "draw_sample: {} neighborhoods selected over {} strata",
        selections.len(),
        frame.len()
    );
    Ok(SamplingOutcome {
        selections,
        comparison,
        diagnostics,
    })
}

/// Runs the full pipeline: aggregation, allocation, then both sampling roads.
pub fn run_sampling_plan(
    records: &[NeighborhoodRecord],
    adjustments: &[SpecialAdjustment],
    params: &SamplingParams,
) -> Result<PlanOutcome, SamplingError> {
    let (distribution, mut diagnostics) =
        population_distribution(records, adjustments, params.strict_adjustments)?;
    let (frame, frame_diagnostics) = sampling_frame(&distribution, params)?;
    diagnostics.extend(frame_diagnostics);
    let outcome = draw_sample(records, &frame, params)?;
    diagnostics.extend(outcome.diagnostics);
    Ok(PlanOutcome {
        distribution,
        frame,
        selections: outcome.selections,
        comparison: outcome.comparison,
        diagnostics,
    })
}

// ------------------------------
// Tests
// ------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        nuts3: &str,
        district: &str,
        code: &str,
        status: DistrictStatus,
        population: u64,
    ) -> NeighborhoodRecord {
        NeighborhoodRecord {
            nuts1: nuts3.get(..3).unwrap_or(nuts3).to_string(),
            nuts2: nuts3.get(..4).unwrap_or(nuts3).to_string(),
            nuts3: nuts3.to_string(),
            province: district.to_string(),
            district: district.to_string(),
            neighborhood_code: code.to_string(),
            status,
            population,
        }
    }

    fn pop_row(stratum: &str, metro: u64, other: u64) -> PopulationRow {
        PopulationRow {
            stratum: stratum.to_string(),
            metro_population: metro,
            other_population: other,
            total_population: metro + other,
        }
    }

    #[test]
    fn stratum_rules() {
        let r = record("TR100", "Fatih", "N1", DistrictStatus::MetropolitanCenter, 10);
        assert_eq!(assign_stratum(&r), "TR100");
        let r = record("TR611", "Kepez", "N2", DistrictStatus::Central, 10);
        assert_eq!(assign_stratum(&r), "TR61");
        let r = record("TR632", "Merkez", "N3", DistrictStatus::Outer, 10);
        assert_eq!(assign_stratum(&r), "TR62&TR63");
        let r = record("TRC12", "Merkez", "N4", DistrictStatus::Central, 10);
        assert_eq!(assign_stratum(&r), "TRC1");
        let r = record("TRC31", "Merkez", "N5", DistrictStatus::Outer, 10);
        assert_eq!(assign_stratum(&r), "TRC2&TRC3");
        // TR3 rolls up to its excluding stratum, but its metro center does not.
        let mut r = record("TR321", "Efeler", "N6", DistrictStatus::Central, 10);
        r.nuts1 = "TR3".to_string();
        assert_eq!(assign_stratum(&r), "TR3-dışı");
        let mut r = record("TR510", "Çankaya", "N7", DistrictStatus::MetropolitanCenter, 10);
        r.nuts1 = "TR5".to_string();
        assert_eq!(assign_stratum(&r), "TR510");
        let mut r = record("TR521", "Merkez", "N8", DistrictStatus::Central, 10);
        r.nuts1 = "TR5".to_string();
        assert_eq!(assign_stratum(&r), "TR5-dışı");
        let r = record("TR901", "Merkez", "N9", DistrictStatus::Central, 10);
        assert_eq!(assign_stratum(&r), "TR9");
    }

    #[test]
    fn classify_is_idempotent() {
        let r = record("TR611", "Kepez", "N1", DistrictStatus::Outer, 42);
        assert_eq!(classify(&r), classify(&r));
        assert_eq!(classify(&r).1, UrbanClass::Other);
    }

    #[test]
    fn distribution_splits_and_adjusts() {
        let records = vec![
            record("TR100", "Fatih", "N1", DistrictStatus::MetropolitanCenter, 500),
            record("TR611", "Kepez", "N2", DistrictStatus::Central, 300),
            record("TR611", "Serik", "N3", DistrictStatus::Outer, 200),
        ];
        let adjustments = vec![SpecialAdjustment {
            stratum: "TR61".to_string(),
            predicates: vec![FieldPredicate {
                field: RegisterField::District,
                value: "Kepez".to_string(),
            }],
            action: AdjustmentAction::AddPopulation,
        }];
        let (rows, diags) = population_distribution(&records, &adjustments, false).unwrap();
        assert!(diags.is_empty());
        assert_eq!(rows.len(), 2);
        let tr61 = rows.iter().find(|r| r.stratum == "TR61").unwrap();
        // 300 + 200 from the register, plus 300 added by the adjustment.
        assert_eq!(tr61.other_population, 800);
        assert_eq!(tr61.total_population, tr61.metro_population + tr61.other_population);
    }

    #[test]
    fn adjustment_for_unknown_stratum_is_skipped() {
        let records = vec![record("TR611", "Kepez", "N1", DistrictStatus::Central, 100)];
        let adjustments = vec![SpecialAdjustment {
            stratum: "TR99".to_string(),
            predicates: vec![],
            action: AdjustmentAction::AddPopulation,
        }];
        let (_, diags) = population_distribution(&records, &adjustments, false).unwrap();
        assert_eq!(diags.len(), 1);
        let err = population_distribution(&records, &adjustments, true).unwrap_err();
        assert!(matches!(err, SamplingError::ConditionEval { .. }));
    }

    #[test]
    fn frame_exact_split() {
        let distribution = vec![pop_row("A", 0, 700), pop_row("B", 0, 300)];
        let params = SamplingParams::new(1000, 10);
        let (rows, _) = sampling_frame(&distribution, &params).unwrap();
        assert_eq!(rows[0].sample_size, 700);
        assert_eq!(rows[1].sample_size, 300);
        assert_eq!(rows[0].neighborhood_count, 70);
        assert_eq!(rows[1].neighborhood_count, 30);
    }

    #[test]
    fn frame_remainder_correction() {
        // Three equal strata: 33.3... each, rounded to 33, one interview left
        // over for the largest (first) stratum.
        let distribution = vec![pop_row("A", 0, 1), pop_row("B", 0, 1), pop_row("C", 0, 1)];
        let params = SamplingParams::new(100, 10);
        let (rows, _) = sampling_frame(&distribution, &params).unwrap();
        let total: u32 = rows.iter().map(|r| r.sample_size).sum();
        assert_eq!(total, 100);
        assert_eq!(rows[0].sample_size, 34);
        assert_eq!(rows[1].sample_size, 33);
    }

    #[test]
    fn frame_split_invariant() {
        let distribution = vec![
            pop_row("A", 350, 650),
            pop_row("B", 10, 1),
            pop_row("C", 0, 77),
        ];
        let params = SamplingParams::new(500, 7);
        let (rows, _) = sampling_frame(&distribution, &params).unwrap();
        for row in rows.iter() {
            assert_eq!(
                row.metro_neighborhoods + row.other_neighborhoods,
                row.neighborhood_count
            );
        }
    }

    #[test]
    fn frame_zero_population_stratum() {
        let distribution = vec![pop_row("A", 0, 1000), pop_row("B", 0, 0)];
        let params = SamplingParams::new(100, 10);
        let (rows, _) = sampling_frame(&distribution, &params).unwrap();
        let b = &rows[1];
        assert_eq!(b.sample_size, 0);
        assert_eq!(b.neighborhood_count, 0);
        assert_eq!(b.metro_neighborhoods, 0);
        assert_eq!(b.other_neighborhoods, 0);
    }

    #[test]
    fn frame_metro_zero_goes_to_other() {
        let distribution = vec![pop_row("A", 0, 1000)];
        let params = SamplingParams::new(100, 10);
        let (rows, _) = sampling_frame(&distribution, &params).unwrap();
        assert_eq!(rows[0].metro_neighborhoods, 0);
        assert_eq!(rows[0].other_neighborhoods, rows[0].neighborhood_count);
    }

    #[test]
    fn frame_rejects_bad_inputs() {
        let params = SamplingParams::new(100, 10);
        assert_eq!(
            sampling_frame(&[], &params).unwrap_err(),
            SamplingError::EmptyFrame
        );
        let zero = vec![pop_row("A", 0, 0)];
        assert_eq!(
            sampling_frame(&zero, &params).unwrap_err(),
            SamplingError::ZeroTotalPopulation
        );
        let rows = vec![pop_row("A", 0, 10)];
        assert!(matches!(
            sampling_frame(&rows, &SamplingParams::new(0, 10)).unwrap_err(),
            SamplingError::InvalidParameter { .. }
        ));
    }

    #[test]
    fn largest_remainder_reference_vector() {
        assert_eq!(largest_remainder_allocation(&[600, 400], 7), vec![4, 3]);
    }

    #[test]
    fn largest_remainder_sums_to_target() {
        for target in [0u32, 1, 5, 13] {
            let alloc = largest_remainder_allocation(&[5, 3, 9, 1], target);
            assert_eq!(alloc.iter().sum::<u32>(), target);
        }
    }

    #[test]
    fn largest_remainder_zero_total() {
        assert_eq!(largest_remainder_allocation(&[0, 0], 5), vec![0, 0]);
    }

    #[test]
    fn sampler_is_deterministic() {
        let records: Vec<NeighborhoodRecord> = (0..20)
            .map(|i| {
                record(
                    "TR611",
                    "Kepez",
                    &format!("N{}", i),
                    DistrictStatus::Central,
                    100 + i,
                )
            })
            .collect();
        let pool: Vec<&NeighborhoodRecord> = records.iter().collect();
        let a = weighted_sample(&pool, 5, 42).unwrap();
        let b = weighted_sample(&pool, 5, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn sampler_caps_at_pool_size() {
        let records = vec![
            record("TR611", "Kepez", "N1", DistrictStatus::Central, 10),
            record("TR611", "Kepez", "N2", DistrictStatus::Central, 20),
        ];
        let pool: Vec<&NeighborhoodRecord> = records.iter().collect();
        let picked = weighted_sample(&pool, 5, 42).unwrap();
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn sampler_rejects_empty_pool() {
        assert_eq!(
            weighted_sample(&[], 3, 42).unwrap_err(),
            SamplingError::EmptyPool
        );
        assert!(weighted_sample(&[], 0, 42).unwrap().is_empty());
    }

    #[test]
    fn sampler_draws_are_unique() {
        let records: Vec<NeighborhoodRecord> = (0..50)
            .map(|i| {
                record(
                    "TR611",
                    "Kepez",
                    &format!("N{}", i),
                    DistrictStatus::Central,
                    10 + i,
                )
            })
            .collect();
        let pool: Vec<&NeighborhoodRecord> = records.iter().collect();
        let picked = weighted_sample(&pool, 10, 42).unwrap();
        let mut codes: Vec<&str> = picked.iter().map(|r| r.neighborhood_code.as_str()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 10);
    }

    fn small_register() -> Vec<NeighborhoodRecord> {
        let mut records = Vec::new();
        // A metropolitan stratum.
        for i in 0..30 {
            records.push(record(
                "TR100",
                "Fatih",
                &format!("M{}", i),
                DistrictStatus::MetropolitanCenter,
                1000 + i,
            ));
        }
        // A non-metropolitan stratum with central and outer districts.
        for i in 0..20 {
            records.push(record(
                "TR611",
                "Kepez",
                &format!("C{}", i),
                DistrictStatus::Central,
                500 + i,
            ));
        }
        for i in 0..20 {
            let district = if i % 2 == 0 { "Serik" } else { "Manavgat" };
            records.push(record(
                "TR611",
                district,
                &format!("O{}", i),
                DistrictStatus::Outer,
                400 + i,
            ));
        }
        records
    }

    #[test]
    fn full_plan_holds_invariants() {
        let records = small_register();
        let params = SamplingParams::new(200, 10);
        let outcome = run_sampling_plan(&records, &[], &params).unwrap();

        let total: u32 = outcome.frame.iter().map(|r| r.sample_size).sum();
        assert_eq!(total, params.total_sample_size);
        for row in outcome.frame.iter() {
            assert_eq!(
                row.metro_neighborhoods + row.other_neighborhoods,
                row.neighborhood_count
            );
        }
        assert!(!outcome.selections.is_empty());
        assert_eq!(outcome.comparison.len(), outcome.frame.len());
        for cmp in outcome.comparison.iter() {
            assert!(cmp.achieved_neighborhoods <= cmp.planned_neighborhoods);
        }
    }

    #[test]
    fn full_plan_is_reproducible() {
        let records = small_register();
        let params = SamplingParams::new(200, 10);
        let a = run_sampling_plan(&records, &[], &params).unwrap();
        let b = run_sampling_plan(&records, &[], &params).unwrap();
        assert_eq!(a.selections, b.selections);
        assert_eq!(a.comparison, b.comparison);
    }

    #[test]
    fn other_road_outer_only_stratum() {
        // No central records: the whole target lands on the outer cell and
        // the central row is skipped without an empty draw.
        let mut records = Vec::new();
        for i in 0..10 {
            records.push(record(
                "TR611",
                "Serik",
                &format!("O{}", i),
                DistrictStatus::Outer,
                100,
            ));
        }
        let frame = vec![FrameRow {
            stratum: "TR61".to_string(),
            metro_population: 0,
            other_population: 1000,
            total_population: 1000,
            sample_size: 10,
            neighborhood_count: 5,
            metro_neighborhoods: 0,
            other_neighborhoods: 5,
        }];
        let params = SamplingParams::new(10, 2);
        let outcome = draw_sample(&records, &frame, &params).unwrap();
        assert_eq!(outcome.selections.len(), 5);
        assert!(outcome
            .selections
            .iter()
            .all(|s| s.urban_class == UrbanClass::Other));
    }

    #[test]
    fn roads_report_empty_pools() {
        // The frame promises metro neighborhoods that the register cannot
        // provide; the road records the gap instead of failing.
        let records = vec![record("TR611", "Kepez", "N1", DistrictStatus::Central, 100)];
        let frame = vec![FrameRow {
            stratum: "TR61".to_string(),
            metro_population: 500,
            other_population: 100,
            total_population: 600,
            sample_size: 6,
            neighborhood_count: 3,
            metro_neighborhoods: 2,
            other_neighborhoods: 1,
        }];
        let params = SamplingParams::new(6, 2);
        let outcome = draw_sample(&records, &frame, &params).unwrap();
        assert!(outcome.diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::EmptyPool {
                class: UrbanClass::Metro,
                ..
            }
        )));
        // The other road still delivers its single neighborhood.
        assert_eq!(outcome.selections.len(), 1);
    }
}
