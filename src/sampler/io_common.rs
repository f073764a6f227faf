// Primitives shared by the register readers.

use crate::sampler::*;

/// The canonical column names the pipeline needs, in the order records carry
/// them.
pub const CANONICAL_COLUMNS: [&str; 8] = [
    "nuts1",
    "nuts2",
    "nuts3",
    "province",
    "district",
    "neighborhood_code",
    "status",
    "population",
];

/// A register file decoded to text cells, before validation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Rows dropped while validating the raw table.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DropStats {
    /// Empty geographic codes or unreadable required values.
    pub missing_values: usize,
    /// Status codes outside the three mapped values.
    pub unmapped_status: usize,
}

/// Normalizes a raw header the way register exports are messy: trimmed,
/// non-breaking spaces removed, spaces underscored, upper-cased.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .replace('\u{00a0}', " ")
        .replace(' ', "_")
        .to_uppercase()
}

/// Resolves the canonical columns to their positions in the header row. The
/// raw names from the plan are normalized the same way as the headers
/// themselves; a canonical name with no mapping is looked up directly.
pub fn resolve_columns(
    header: &[String],
    columns: &HashMap<String, String>,
) -> SampleResult<HashMap<String, usize>> {
    let normalized: Vec<String> = header.iter().map(|h| normalize_header(h)).collect();
    let mut res: HashMap<String, usize> = HashMap::new();
    let mut missing: Vec<String> = Vec::new();
    for canonical in CANONICAL_COLUMNS.iter() {
        let raw = columns
            .get(*canonical)
            .map(|s| normalize_header(s))
            .unwrap_or_else(|| normalize_header(canonical));
        match normalized.iter().position(|h| *h == raw) {
            Some(idx) => {
                res.insert(canonical.to_string(), idx);
            }
            None => missing.push(canonical.to_string()),
        }
    }
    if !missing.is_empty() {
        return MissingColumnsSnafu { columns: missing }.fail();
    }
    Ok(res)
}

/// Validates the raw table into register records.
///
/// Rows are dropped, not failed on: empty geographic codes, unreadable
/// population or identifier cells, and status codes outside {0, 1, 2} (those
/// records never enter the pipeline). The drop counts come back with the
/// records so the caller can surface them.
pub fn parse_records(
    table: &RawTable,
    columns: &HashMap<String, String>,
) -> SampleResult<(Vec<NeighborhoodRecord>, DropStats)> {
    let index = resolve_columns(&table.header, columns)?;
    let cell = |row: &Vec<String>, name: &str| -> String {
        row.get(index[name]).map(|s| s.trim().to_string()).unwrap_or_default()
    };

    let mut records: Vec<NeighborhoodRecord> = Vec::new();
    let mut drops = DropStats::default();
    for row in table.rows.iter() {
        let nuts1 = cell(row, "nuts1");
        let nuts2 = cell(row, "nuts2");
        let nuts3 = cell(row, "nuts3");
        let province = cell(row, "province");
        let district = cell(row, "district");
        let neighborhood_code = cell(row, "neighborhood_code");
        if nuts1.is_empty()
            || nuts2.is_empty()
            || nuts3.is_empty()
            || province.is_empty()
            || district.is_empty()
            || neighborhood_code.is_empty()
        {
            drops.missing_values += 1;
            continue;
        }
        let population = match parse_count(&cell(row, "population")) {
            Some(p) => p,
            None => {
                drops.missing_values += 1;
                continue;
            }
        };
        let status = match parse_count(&cell(row, "status"))
            .and_then(|code| DistrictStatus::from_code(code as i64))
        {
            Some(s) => s,
            None => {
                drops.unmapped_status += 1;
                continue;
            }
        };
        records.push(NeighborhoodRecord {
            nuts1,
            nuts2,
            nuts3,
            province,
            district,
            neighborhood_code,
            status,
            population,
        });
    }
    debug!(
        "parse_records: {} records, {:?} dropped",
        records.len(),
        drops
    );
    Ok((records, drops))
}

/// Reads a non-negative integer cell, tolerating the float rendering some
/// spreadsheet exports use ("12.0").
fn parse_count(s: &str) -> Option<u64> {
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    match s.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 => Some(f as u64),
        _ => None,
    }
}
