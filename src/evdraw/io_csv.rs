// Primitives for reading CSV files.

use std::path::Path;

use crate::evdraw::table::{Cell, Table};
use crate::evdraw::*;

/// Reads a CSV file with a header line. All the cells are read as text.
pub fn read_csv_table(path: &Path) -> EvDrawResult<Table> {
    let p = path.display().to_string();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path: p.clone() })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu {
            path: p.clone(),
            lineno: 1_usize,
        })?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    debug!("read_csv_table: {:?}: header: {:?}", p, header);

    let mut table = Table::new(header);
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {
            path: p.clone(),
            lineno,
        })?;
        table.push_row(
            line.iter()
                .map(|s| {
                    if s.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::text(s)
                    }
                })
                .collect(),
        );
    }
    info!("Read {} rows from '{}'", table.len(), p);
    Ok(table)
}
