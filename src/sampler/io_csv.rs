// Primitives for reading CSV register files.

use crate::sampler::io_common::RawTable;
use crate::sampler::*;

pub fn read_csv_register(path: &str) -> SampleResult<RawTable> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context(OpeningCsvSnafu {
            path: path.to_string(),
        })?;
    let mut records = rdr.into_records();

    let header: Vec<String> = match records.next() {
        Some(line_r) => line_r
            .context(CsvLineParseSnafu {})?
            .iter()
            .map(|s| s.to_string())
            .collect(),
        None => {
            return EmptyCsvSnafu {
                path: path.to_string(),
            }
            .fail()
        }
    };
    debug!("header: {:?}", header);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for line_r in records {
        let line = line_r.context(CsvLineParseSnafu {})?;
        rows.push(line.iter().map(|s| s.to_string()).collect());
    }
    info!("read_csv_register: {} data rows from {}", rows.len(), path);
    Ok(RawTable { header, rows })
}
