// Primitives for reading Excel register files.

use calamine::{open_workbook, Reader, Xlsx};

use crate::sampler::io_common::RawTable;
use crate::sampler::*;

pub fn read_excel_register(path: &str, worksheet: &Option<String>) -> SampleResult<RawTable> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu {
        path: path.to_string(),
    })?;
    let wrange = match worksheet {
        Some(name) => workbook
            .worksheet_range(name.as_str())
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu {
                path: path.to_string(),
            })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu {
                path: path.to_string(),
            })?,
    };

    let mut rows_iter = wrange.rows();
    let header_row = rows_iter.next().context(EmptyExcelSnafu {})?;
    debug!("header: {:?}", header_row);
    let header: Vec<String> = header_row.iter().map(cell_to_string).collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in rows_iter {
        rows.push(row.iter().map(cell_to_string).collect());
    }
    info!("read_excel_register: {} data rows from {}", rows.len(), path);
    Ok(RawTable { header, rows })
}

/// Renders a cell as text. Integral floats lose their ".0" so that code and
/// status columns exported as numbers read back cleanly.
fn cell_to_string(cell: &calamine::DataType) -> String {
    match cell {
        calamine::DataType::String(s) => s.clone(),
        calamine::DataType::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        calamine::DataType::Float(f) => f.to_string(),
        calamine::DataType::Int(i) => i.to_string(),
        calamine::DataType::Bool(b) => b.to_string(),
        calamine::DataType::Empty => String::new(),
        _ => String::new(),
    }
}
