// Reading and writing spreadsheets.

use calamine::{open_workbook_auto, DataType, Range, Reader};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

use crate::evdraw::io_common::simplify_file_name;
use crate::evdraw::table::{Cell, Table};
use crate::evdraw::*;

/// Reads a worksheet into a table. The first row is the header.
///
/// Without a worksheet name, the first worksheet is used.
pub fn read_excel_table(path: &Path, worksheet_name: Option<&str>) -> EvDrawResult<Table> {
    let wrange = get_range(path, worksheet_name)?;
    let mut iter = wrange.rows();
    let header_row = iter.next().context(EmptyExcelSnafu {
        path: path.display().to_string(),
    })?;
    let header: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, dt)| match read_cell(dt).as_text() {
            Some(s) => s,
            // Unnamed columns still need a name to be written back.
            None => format!("unnamed_{}", idx),
        })
        .collect();
    debug!("read_excel_table: {:?}: header: {:?}", path, header);

    let mut table = Table::new(header);
    for row in iter {
        table.push_row(row.iter().map(read_cell).collect());
    }
    info!(
        "Read {} rows from '{}'",
        table.len(),
        simplify_file_name(path)
    );
    Ok(table)
}

fn get_range(path: &Path, worksheet_name_o: Option<&str>) -> EvDrawResult<Range<DataType>> {
    let p = path.display().to_string();
    debug!("read_excel_file: path: {:?} worksheet: {:?}", &p, &worksheet_name_o);
    let mut workbook = open_workbook_auto(path).context(OpeningExcelSnafu { path: p.clone() })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(MissingWorksheetSnafu {
                path: p.clone(),
                name: worksheet_name,
            })?
            .context(OpeningExcelSnafu { path: p })?;
        Ok(wrange)
    } else {
        let sheet_names = workbook.sheet_names().to_owned();
        if sheet_names.len() > 1 {
            warn!(
                "'{}' has {} worksheets, using the first one ({:?})",
                p,
                sheet_names.len(),
                sheet_names[0]
            );
        }
        let wrange = workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path: p.clone() })?
            .context(OpeningExcelSnafu { path: p })?;
        Ok(wrange)
    }
}

fn read_cell(dt: &DataType) -> Cell {
    match dt {
        DataType::Empty => Cell::Empty,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Float(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(b) => Cell::Bool(*b),
        DataType::DateTime(f) => Cell::DateTime(*f),
        other => Cell::Text(format!("{:?}", other)),
    }
}

const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Writes a table to a new workbook with a single worksheet.
///
/// The workbook is first written next to the target and then moved over it,
/// so an existing file is either fully replaced or left untouched.
pub fn write_excel_table(path: &Path, table: &Table) -> EvDrawResult<()> {
    let p = path.display().to_string();
    let date_format = Format::new().set_num_format(DATE_NUM_FORMAT);
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, name) in table.header.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name)
            .context(WritingExcelSnafu { path: p.clone() })?;
    }
    for (idx, row) in table.rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            let written = match cell {
                Cell::Empty => continue,
                Cell::Text(s) => worksheet.write_string(r, c, s),
                Cell::Number(n) => worksheet.write_number(r, c, *n),
                Cell::Bool(b) => worksheet.write_boolean(r, c, *b),
                Cell::DateTime(f) => worksheet.write_number_with_format(r, c, *f, &date_format),
            };
            written.context(WritingExcelSnafu { path: p.clone() })?;
        }
    }

    let staging = path.with_file_name(format!(".{}.partial", simplify_file_name(path)));
    workbook
        .save(&staging)
        .context(WritingExcelSnafu { path: p.clone() })?;
    fs::rename(&staging, path).context(WritingFileSnafu { path: p.clone() })?;
    info!("Wrote {} rows to '{}'", table.len(), p);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.xlsx");
        let mut table = Table::new(vec![
            "nom_du_participant".to_string(),
            "numero_ticket".to_string(),
            "status".to_string(),
        ]);
        table.push_row(vec![Cell::text("Alice"), Cell::Number(1.0), Cell::text("present")]);
        table.push_row(vec![Cell::text("Bob"), Cell::Number(2.0), Cell::Empty]);
        write_excel_table(&path, &table).unwrap();

        let back = read_excel_table(&path, None).unwrap();
        assert_eq!(back.header, table.header);
        assert_eq!(back.len(), 2);
        assert_eq!(back.text(0, Some(0)), Some("Alice".to_string()));
        assert_eq!(back.text(1, Some(1)), Some("2".to_string()));
        assert_eq!(back.text(1, Some(2)), None);
        // No staging file is left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn date_cells_survive_a_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.xlsx");
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let format = Format::new().set_num_format("yyyy-mm-dd hh:mm");
        worksheet.write_string(0, 0, "inscription").unwrap();
        worksheet
            .write_number_with_format(1, 0, 45458.395833333336, &format)
            .unwrap();
        workbook.save(&first).unwrap();

        let table = read_excel_table(&first, None).unwrap();
        assert!(matches!(table.rows[0][0], Cell::DateTime(_)));
        assert_eq!(table.text(0, Some(0)), Some("2024-06-15 09:30:00".to_string()));

        let second = dir.path().join("second.xlsx");
        write_excel_table(&second, &table).unwrap();
        let back = read_excel_table(&second, None).unwrap();
        assert!(matches!(back.rows[0][0], Cell::DateTime(_)));
        assert_eq!(back.text(0, Some(0)), Some("2024-06-15 09:30:00".to_string()));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_excel_table(&dir.path().join("nope.xlsx"), None).unwrap_err();
        assert!(matches!(err, EvDrawError::OpeningExcel { .. }));
    }

    #[test]
    fn unknown_worksheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.xlsx");
        let mut table = Table::new(vec!["a".to_string()]);
        table.push_row(vec![Cell::text("x")]);
        write_excel_table(&path, &table).unwrap();
        let err = read_excel_table(&path, Some("Feuil2")).unwrap_err();
        assert!(matches!(err, EvDrawError::MissingWorksheet { .. }));
        let ok = read_excel_table(&path, Some("Sheet1")).unwrap();
        assert_eq!(ok.len(), 1);
    }
}
