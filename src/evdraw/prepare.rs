// Cleaning of the raw registration export and split by role.

use event_draw::{Role, Status};
use std::path::{Path, PathBuf};

use crate::evdraw::config_reader::{ColumnNames, EventConfig};
use crate::evdraw::io_common::{clean_name, is_csv, is_spreadsheet, simplify_file_name};
use crate::evdraw::io_excel::write_excel_table;
use crate::evdraw::table::{Cell, Table};
use crate::evdraw::*;

/// Added to the raw export before the column names are cleaned.
pub const TICKET_NUMBER_COLUMN: &str = "numéro_ticket";

/// The per-role files: `event_registration_{suffix}.xlsx`.
pub const ROLE_EXPORTS: [(&str, Role); 3] = [
    ("sponsors", Role::Sponsor),
    ("benevoles", Role::Volunteer),
    ("visiteurs", Role::Visitor),
];

pub fn role_export_name(suffix: &str) -> String {
    format!("event_registration_{}.xlsx", suffix)
}

/// Finds the only export of the input directory and gives it its canonical
/// name. The extension of the export is kept.
///
/// A missing directory is created, so that the user knows where to put the
/// export, and reported as an error.
pub fn find_input_file(input_dir: &Path, target_name: &str) -> EvDrawResult<PathBuf> {
    let d = input_dir.display().to_string();
    info!("Looking for the registration export in '{}'", d);
    if !input_dir.is_dir() {
        fs::create_dir_all(input_dir).context(CreatingDirSnafu { path: d.clone() })?;
        return MissingInputDirSnafu { path: d }.fail();
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(input_dir).context(ReadingDirSnafu { path: d.clone() })? {
        let p = entry.context(ReadingDirSnafu { path: d.clone() })?.path();
        // Lock files of an open workbook.
        if simplify_file_name(&p).starts_with("~$") {
            continue;
        }
        if p.is_file() && (is_spreadsheet(&p) || is_csv(&p)) {
            files.push(p);
        }
    }
    files.sort();

    let source = match files.as_slice() {
        [] => return NoInputFileSnafu { path: d }.fail(),
        [single] => single.clone(),
        several => {
            let names: Vec<String> = several.iter().map(|p| simplify_file_name(p)).collect();
            return MultipleInputFilesSnafu {
                path: d,
                files: names.join(", "),
            }
            .fail();
        }
    };

    let mut target = input_dir.join(target_name);
    if let Some(ext) = source.extension() {
        target.set_extension(ext);
    }
    if source == target {
        info!("The export is already named '{}'", simplify_file_name(&target));
    } else {
        fs::rename(&source, &target).context(RenamingInputSnafu {
            from: source.display().to_string(),
            to: target.display().to_string(),
        })?;
        info!(
            "Renamed '{}' to '{}'",
            simplify_file_name(&source),
            simplify_file_name(&target)
        );
    }
    Ok(target)
}

/// Numbers the tickets, cleans the column names, drops the empty rows and
/// columns, then normalizes the roles and the statuses.
pub fn clean_registrations(raw: Table, columns: &ColumnNames) -> EvDrawResult<Table> {
    let mut table = raw;
    let numbers: Vec<Cell> = (1..=table.len()).map(|n| Cell::Number(n as f64)).collect();
    table.add_column(TICKET_NUMBER_COLUMN, numbers);
    table.rename_columns(clean_name);
    table.remove_empty();
    debug!("clean_registrations: columns: {:?}", table.header);

    normalize_roles(&mut table, columns);
    normalize_status(&mut table, columns)?;
    Ok(table)
}

fn normalize_roles(table: &mut Table, columns: &ColumnNames) {
    let col = match table.column_index(&columns.role) {
        Some(c) => c,
        None => {
            warn!(
                "No '{}' column, the roles are not normalized",
                columns.role
            );
            return;
        }
    };
    for row in table.rows.iter_mut() {
        let label = row[col].as_text().unwrap_or_default();
        row[col] = Cell::text(Role::classify(&label).label());
    }
    info!("Roles: {:?}", table.value_counts(col));
}

fn normalize_status(table: &mut Table, columns: &ColumnNames) -> EvDrawResult<()> {
    let col = table.column_index(&columns.status).context(MissingColumnSnafu {
        column: columns.status.clone(),
        source_name: "registration export",
    })?;
    for (idx, row) in table.rows.iter_mut().enumerate() {
        let raw = row[col].as_text();
        let status = match Status::parse(raw.as_deref()) {
            Some(s) => s,
            None => {
                warn!(
                    "Row {}: unknown status {:?}, treated as absent",
                    idx + 2,
                    raw
                );
                Status::Absent
            }
        };
        row[col] = Cell::text(status.label());
    }
    info!("Statuses: {:?}", table.value_counts(col));
    Ok(())
}

/// The present participants of each role, in the order of [ROLE_EXPORTS].
pub fn split_by_role(table: &Table, columns: &ColumnNames) -> Vec<(&'static str, Table)> {
    let role_col = table.column_index(&columns.role);
    let status_col = table.column_index(&columns.status);
    ROLE_EXPORTS
        .iter()
        .map(|(suffix, role)| {
            let part = match (role_col, status_col) {
                (Some(r), Some(s)) => table.filter(|row| {
                    row[r].as_text().as_deref() == Some(role.label())
                        && row[s].as_text().as_deref() == Some(Status::Present.label())
                }),
                _ => Table::new(table.header.clone()),
            };
            (*suffix, part)
        })
        .collect()
}

/// Runs the whole preparation and returns the cleaned table.
pub fn prepare_registrations(config: &EventConfig) -> EvDrawResult<Table> {
    let input = find_input_file(Path::new(&config.input_directory), &config.input_file_name)?;
    let raw = read_table(&input, config.excel_worksheet_name.as_deref())?;
    let cleaned = clean_registrations(raw, &config.columns)?;

    ensure_output_dir(config)?;
    write_excel_table(&config.cleaned_path(), &cleaned)?;
    for (suffix, part) in split_by_role(&cleaned, &config.columns) {
        info!("{} present participants for '{}'", part.len(), suffix);
        write_excel_table(&config.output_path(&role_export_name(suffix)), &part)?;
    }
    Ok(cleaned)
}
