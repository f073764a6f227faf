// Optional pre-filtering of the register by province eligibility lists, and
// the neighborhood code exports that go with it.

use std::collections::BTreeMap;

use crate::sampler::io_common::normalize_header;
use crate::sampler::*;

/// Reads a single-column CSV of NUTS3 codes. The file must carry a
/// `NUTS3KODU` column; empty cells and duplicates are ignored.
pub fn read_code_list(path: &str) -> SampleResult<HashSet<String>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context(OpeningCsvSnafu {
            path: path.to_string(),
        })?;
    let mut records = rdr.into_records();

    let header = match records.next() {
        Some(line_r) => line_r.context(CsvLineParseSnafu {})?,
        None => {
            return EmptyCsvSnafu {
                path: path.to_string(),
            }
            .fail()
        }
    };
    let column = match header
        .iter()
        .position(|h| normalize_header(h) == "NUTS3KODU")
    {
        Some(idx) => idx,
        None => {
            whatever!("No NUTS3KODU column in {}", path)
        }
    };

    let mut codes: HashSet<String> = HashSet::new();
    for line_r in records {
        let line = line_r.context(CsvLineParseSnafu {})?;
        if let Some(code) = line.get(column) {
            let code = code.trim();
            if !code.is_empty() {
                codes.insert(code.to_string());
            }
        }
    }
    info!("read_code_list: {} codes from {}", codes.len(), path);
    Ok(codes)
}

/// Keeps only the records whose province appears in one of the lists.
pub fn filter_register(
    records: Vec<NeighborhoodRecord>,
    metropol: &HashSet<String>,
    other: &HashSet<String>,
) -> Vec<NeighborhoodRecord> {
    records
        .into_iter()
        .filter(|r| metropol.contains(&r.nuts3) || other.contains(&r.nuts3))
        .collect()
}

/// Writes the sorted, de-duplicated neighborhood codes of one urbanization
/// class, one code per line. Returns the number of codes written.
pub fn export_neighborhood_codes(
    records: &[NeighborhoodRecord],
    class: UrbanClass,
    path: &Path,
) -> SampleResult<usize> {
    let mut codes: Vec<&str> = records
        .iter()
        .filter(|r| r.status.urban_class() == class)
        .map(|r| r.neighborhood_code.as_str())
        .collect();
    codes.sort_unstable();
    codes.dedup();
    let mut contents = codes.join("\n");
    contents.push('\n');
    fs::write(path, contents).context(WritingOutputSnafu {})?;
    Ok(codes.len())
}

/// Strata that carry other-class records but no central district at all.
/// Their stratum target can only be served by outer districts, which is
/// worth surfacing before fieldwork starts.
pub fn check_central_coverage(records: &[NeighborhoodRecord]) -> Vec<String> {
    let mut seen: BTreeMap<String, (bool, bool)> = BTreeMap::new();
    for record in records.iter() {
        if record.status.urban_class() != UrbanClass::Other {
            continue;
        }
        let entry = seen.entry(assign_stratum(record)).or_insert((false, false));
        entry.0 = true;
        if record.status == DistrictStatus::Central {
            entry.1 = true;
        }
    }
    seen.into_iter()
        .filter(|(_, (has_other, has_central))| *has_other && !*has_central)
        .map(|(stratum, _)| stratum)
        .collect()
}
