// An in-memory table with named columns, as read from a spreadsheet.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use event_draw::TIMESTAMP_FORMAT;
use std::collections::{HashMap, HashSet};

use crate::evdraw::io_common::clean_name;

#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A date-formatted spreadsheet cell, as a serial number of days.
    DateTime(f64),
}

/// Converts a spreadsheet serial date (days since 1899-12-30) into a date.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round();
    if !millis.is_finite() || millis.abs() > 1e15 {
        return None;
    }
    epoch.checked_add_signed(Duration::milliseconds(millis as i64))
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// The content of the cell as text. Whole numbers have no decimal part,
    /// so that ticket number 12 reads `12` and not `12.0`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::DateTime(f) => Some(match serial_to_datetime(*f) {
                Some(d) => d.format(TIMESTAMP_FORMAT).to_string(),
                None => f.to_string(),
            }),
        }
    }

    /// Like [Cell::as_text], but text cells are returned untrimmed.
    pub fn as_raw_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) if !s.trim().is_empty() => Some(s.clone()),
            other => other.as_text(),
        }
    }

    pub fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct Table {
    pub header: Vec<String>,
    /// Every row has exactly as many cells as the header.
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(header: Vec<String>) -> Table {
        Table {
            header,
            rows: Vec::new(),
        }
    }

    /// Adds a row, padding or truncating it to the width of the header.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.header.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds a column by name. The lookup compares cleaned names, so
    /// `numéro_ticket` finds `numero_ticket`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name).or_else(|| {
            let wanted = clean_name(name);
            self.header.iter().position(|h| clean_name(h) == wanted)
        })
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn text(&self, row: usize, col: Option<usize>) -> Option<String> {
        col.and_then(|c| self.get(row, c)).and_then(|c| c.as_text())
    }

    pub fn raw_text(&self, row: usize, col: Option<usize>) -> Option<String> {
        col.and_then(|c| self.get(row, c)).and_then(|c| c.as_raw_text())
    }

    pub fn add_column(&mut self, name: &str, values: Vec<Cell>) {
        self.header.push(name.to_string());
        let mut values = values.into_iter();
        for row in self.rows.iter_mut() {
            row.push(values.next().unwrap_or(Cell::Empty));
        }
    }

    pub fn rename_columns(&mut self, f: impl Fn(&str) -> String) {
        self.header = self.header.iter().map(|h| f(h)).collect();
    }

    pub fn filter(&self, pred: impl Fn(&[Cell]) -> bool) -> Table {
        Table {
            header: self.header.clone(),
            rows: self.rows.iter().filter(|r| pred(r.as_slice())).cloned().collect(),
        }
    }

    pub fn without_columns(&self, cols: &[usize]) -> Table {
        let keep: Vec<bool> = (0..self.header.len()).map(|c| !cols.contains(&c)).collect();
        Table {
            header: retain_by_mask(&self.header, &keep),
            rows: self.rows.iter().map(|r| retain_by_mask(r, &keep)).collect(),
        }
    }

    /// Drops the rows, then the columns, that only contain empty cells.
    pub fn remove_empty(&mut self) {
        self.rows.retain(|r| r.iter().any(|c| !c.is_empty()));
        let keep: Vec<bool> = (0..self.header.len())
            .map(|c| self.rows.iter().any(|r| !r[c].is_empty()))
            .collect();
        self.header = retain_by_mask(&self.header, &keep);
        self.rows = self.rows.iter().map(|r| retain_by_mask(r, &keep)).collect();
    }

    /// Fills the empty cells of the given columns with the last value above them.
    pub fn forward_fill(&mut self, cols: &[usize]) {
        for &c in cols {
            let mut last: Option<Cell> = None;
            for row in self.rows.iter_mut() {
                if !row[c].is_empty() {
                    last = Some(row[c].clone());
                } else if let Some(prev) = &last {
                    row[c] = prev.clone();
                }
            }
        }
    }

    /// Concatenates tables. The header is the union of the headers, in order
    /// of first appearance, with columns matched as in `column_index`.
    /// Missing cells are empty.
    pub fn concat(tables: &[Table]) -> Table {
        let mut res = Table::default();
        for t in tables {
            for h in t.header.iter() {
                if res.column_index(h).is_none() {
                    res.header.push(h.clone());
                }
            }
        }
        for t in tables {
            let positions: Vec<usize> = t
                .header
                .iter()
                .filter_map(|h| res.column_index(h))
                .collect();
            for row in t.rows.iter() {
                let mut new_row = vec![Cell::Empty; res.header.len()];
                for (cell, &pos) in row.iter().zip(positions.iter()) {
                    new_row[pos] = cell.clone();
                }
                res.rows.push(new_row);
            }
        }
        res
    }

    /// Number of rows for each distinct text value of a column, in order of
    /// first appearance. Empty cells are not counted.
    pub fn value_counts(&self, col: usize) -> Vec<(String, usize)> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        for row in self.rows.iter() {
            if let Some(v) = row[col].as_text() {
                let e = counts.entry(v.clone()).or_insert(0);
                if *e == 0 {
                    order.push(v);
                }
                *e += 1;
            }
        }
        order
            .into_iter()
            .map(|v| {
                let n = counts[&v];
                (v, n)
            })
            .collect()
    }

    /// Keeps the first row for each distinct value of the key columns.
    pub fn drop_duplicates(&self, key_cols: &[usize]) -> Table {
        let mut seen: HashSet<Vec<Option<String>>> = HashSet::new();
        let mut res = Table::new(self.header.clone());
        for row in self.rows.iter() {
            if seen.insert(key_of(row, key_cols)) {
                res.rows.push(row.clone());
            }
        }
        res
    }

    /// Inner join on the given key columns. The columns of `right` that are
    /// keys or already exist in `self` are not repeated.
    pub fn merge(&self, right: &Table, keys: &[&str]) -> Table {
        let left_keys: Vec<usize> = keys.iter().filter_map(|k| self.column_index(k)).collect();
        let right_keys: Vec<usize> = keys.iter().filter_map(|k| right.column_index(k)).collect();
        let added: Vec<usize> = (0..right.header.len())
            .filter(|c| !right_keys.contains(c) && !self.header.contains(&right.header[*c]))
            .collect();

        let mut header = self.header.clone();
        header.extend(added.iter().map(|c| right.header[*c].clone()));
        let mut res = Table::new(header);
        if left_keys.len() != keys.len() || right_keys.len() != keys.len() {
            return res;
        }

        let mut right_index: HashMap<Vec<Option<String>>, Vec<usize>> = HashMap::new();
        for (idx, row) in right.rows.iter().enumerate() {
            right_index.entry(key_of(row, &right_keys)).or_default().push(idx);
        }
        for row in self.rows.iter() {
            if let Some(matches) = right_index.get(&key_of(row, &left_keys)) {
                for &m in matches {
                    let mut new_row = row.clone();
                    new_row.extend(added.iter().map(|c| right.rows[m][*c].clone()));
                    res.rows.push(new_row);
                }
            }
        }
        res
    }
}

fn key_of(row: &[Cell], key_cols: &[usize]) -> Vec<Option<String>> {
    key_cols.iter().map(|c| row[*c].as_text()).collect()
}

fn retain_by_mask<T: Clone>(xs: &[T], mask: &[bool]) -> Vec<T> {
    xs.iter()
        .zip(mask.iter())
        .filter(|(_, keep)| **keep)
        .map(|(x, _)| x.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(header: &[&str], rows: &[&[&str]]) -> Table {
        let mut res = Table::new(header.iter().map(|s| s.to_string()).collect());
        for r in rows {
            res.push_row(
                r.iter()
                    .map(|s| if s.is_empty() { Cell::Empty } else { Cell::text(s) })
                    .collect(),
            );
        }
        res
    }

    #[test]
    fn number_cells_as_text() {
        assert_eq!(Cell::Number(12.0).as_text(), Some("12".to_string()));
        assert_eq!(Cell::Number(1.5).as_text(), Some("1.5".to_string()));
        assert_eq!(Cell::text("  ").as_text(), None);
        assert_eq!(Cell::text(" Bob ").as_text(), Some("Bob".to_string()));
    }

    #[test]
    fn date_cells_as_text() {
        assert_eq!(
            Cell::DateTime(45458.395833333336).as_text(),
            Some("2024-06-15 09:30:00".to_string())
        );
        assert_eq!(
            Cell::DateTime(45458.0).as_text(),
            Some("2024-06-15 00:00:00".to_string())
        );
        assert_eq!(
            Cell::text(" Oui ").as_raw_text(),
            Some(" Oui ".to_string())
        );
        assert_eq!(Cell::text("  ").as_raw_text(), None);
    }

    #[test]
    fn column_lookup_uses_cleaned_names() {
        let table = t(&["nom_du_participant", "numero_ticket"], &[]);
        assert_eq!(table.column_index("numéro_ticket"), Some(1));
        assert_eq!(table.column_index("Nom du participant"), Some(0));
        assert_eq!(table.column_index("email"), None);
    }

    #[test]
    fn remove_empty_rows_and_columns() {
        let mut table = t(
            &["a", "b", "c"],
            &[&["1", "", "x"], &["", "", ""], &["2", "", ""]],
        );
        table.remove_empty();
        assert_eq!(table.header, vec!["a", "c"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn without_columns() {
        let table = t(&["a", "b", "c"], &[&["1", "2", "3"]]);
        let res = table.without_columns(&[1]);
        assert_eq!(res.header, vec!["a", "c"]);
        assert_eq!(res.rows[0], vec![Cell::text("1"), Cell::text("3")]);
    }

    #[test]
    fn forward_fill_identity() {
        let mut table = t(
            &["name", "answer"],
            &[&["Alice", "1"], &["", "2"], &["Bob", "3"], &["", "4"]],
        );
        table.forward_fill(&[0]);
        let names: Vec<Option<String>> = (0..4).map(|r| table.text(r, Some(0))).collect();
        assert_eq!(
            names,
            vec![
                Some("Alice".to_string()),
                Some("Alice".to_string()),
                Some("Bob".to_string()),
                Some("Bob".to_string())
            ]
        );
    }

    #[test]
    fn concat_unions_headers() {
        let a = t(&["name", "ticket"], &[&["A", "1"]]);
        let b = t(&["name", "email", "ticket"], &[&["B", "b@x", "2"]]);
        let c = Table::concat(&[a, b]);
        assert_eq!(c.header, vec!["name", "ticket", "email"]);
        assert_eq!(c.len(), 2);
        assert_eq!(c.text(0, Some(2)), None);
        assert_eq!(c.text(1, Some(1)), Some("2".to_string()));
        assert_eq!(c.text(1, Some(2)), Some("b@x".to_string()));
    }

    #[test]
    fn value_counts_in_order() {
        let table = t(&["name"], &[&["B"], &["A"], &["B"], &[""]]);
        assert_eq!(
            table.value_counts(0),
            vec![("B".to_string(), 2), ("A".to_string(), 1)]
        );
    }

    #[test]
    fn drop_duplicates_keeps_first() {
        let table = t(
            &["name", "email", "answer"],
            &[&["A", "a", "1"], &["A", "a", "2"], &["A", "b", "3"]],
        );
        let unique = table.drop_duplicates(&[0, 1]);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique.text(0, Some(2)), Some("1".to_string()));
        assert_eq!(unique.text(1, Some(2)), Some("3".to_string()));
    }

    #[test]
    fn merge_on_keys() {
        let left = t(&["name", "email", "r1"], &[&["A", "a", "x"], &["B", "b", "y"]]);
        let right = t(&["name", "email", "ticket"], &[&["B", "b", "2"]]);
        let merged = left.merge(&right, &["name", "email"]);
        assert_eq!(merged.header, vec!["name", "email", "r1", "ticket"]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.text(0, Some(3)), Some("2".to_string()));
    }
}
