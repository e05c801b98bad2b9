use log::{debug, info, warn};

use event_draw::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::evdraw::config_reader::*;
use crate::evdraw::io_common::{is_csv, simplify_file_name, timestamped_file_name};
use crate::evdraw::io_csv::read_csv_table;
use crate::evdraw::io_excel::{read_excel_table, write_excel_table};
use crate::evdraw::table::Table;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod prepare;
mod records;
mod table;

#[derive(Debug, Snafu)]
pub enum EvDrawError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("The file {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("The file {path} has no worksheet named '{name}'"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("Error writing the workbook {path}"))]
    WritingExcel {
        source: rust_xlsxwriter::XlsxError,
        path: String,
    },
    #[snafu(display("Error writing the file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error reading the configuration file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("The file {path} does not exist. {hint}"))]
    MissingFile { path: String, hint: String },
    #[snafu(display("The column '{column}' is missing from the {source_name}"))]
    MissingColumn { column: String, source_name: String },

    #[snafu(display(
        "The input directory {path} did not exist and has been created: add the registration export to it and run again"
    ))]
    MissingInputDir { path: String },
    #[snafu(display("Error creating the directory {path}"))]
    CreatingDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error listing the directory {path}"))]
    ReadingDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("No spreadsheet or CSV file found in {path}"))]
    NoInputFile { path: String },
    #[snafu(display("Only one file is allowed in {path}, found: {files}"))]
    MultipleInputFiles { path: String, files: String },
    #[snafu(display("Error renaming {from} to {to}"))]
    RenamingInput {
        source: std::io::Error,
        from: String,
        to: String,
    },

    #[snafu(display("Error while asking for the number of winners"))]
    Prompt { source: std::io::Error },
    #[snafu(display("'{input}' is not a whole number of winners"))]
    InvalidCount { input: String },

    #[snafu(display("The survey answers could not be pivoted"))]
    Pivot { source: PivotError },
    #[snafu(display("The draw failed"))]
    Lottery { source: LotteryError },
}

pub type EvDrawResult<T> = Result<T, EvDrawError>;

/// Reads a spreadsheet or a CSV file, depending on its extension.
pub fn read_table(path: &Path, worksheet_name: Option<&str>) -> EvDrawResult<Table> {
    if is_csv(path) {
        read_csv_table(path)
    } else {
        read_excel_table(path, worksheet_name)
    }
}

/// `None` when the file does not exist.
fn read_optional_table(path: &Path) -> EvDrawResult<Option<Table>> {
    if !path.exists() {
        return Ok(None);
    }
    read_table(path, None).map(Some)
}

fn ensure_output_dir(config: &EventConfig) -> EvDrawResult<()> {
    fs::create_dir_all(&config.output_directory).context(CreatingDirSnafu {
        path: config.output_directory.clone(),
    })
}

pub fn run_prepare(config: &EventConfig) -> EvDrawResult<()> {
    info!("Preparing the registrations");
    let cleaned = prepare::prepare_registrations(config)?;
    info!(
        "{} registrations written to '{}'",
        cleaned.len(),
        config.cleaned_path().display()
    );
    Ok(())
}

/// Pivots the survey answers of the cleaned registrations. Returns the path
/// of the written file.
pub fn run_pivot(config: &EventConfig, merge_details: bool) -> EvDrawResult<PathBuf> {
    run_pivot_at(config, merge_details, Local::now().naive_local())
}

fn run_pivot_at(
    config: &EventConfig,
    merge_details: bool,
    now: NaiveDateTime,
) -> EvDrawResult<PathBuf> {
    let columns = &config.columns;
    let cleaned_path = config.cleaned_path();
    let cleaned = read_optional_table(&cleaned_path)?.context(MissingFileSnafu {
        path: cleaned_path.display().to_string(),
        hint: "Run the prepare step first.",
    })?;

    let answers = records::answer_rows_from_table(&cleaned, columns)?;
    info!("Pivoting {} answer rows", answers.len());
    let pivoted = pivot(&answers, &LogReporter).context(PivotSnafu)?;
    let mut output = records::pivot_to_table(&pivoted, columns, &config.answer_column_prefix);

    if merge_details {
        output = merge_participant_details(&cleaned, &output, columns)?;
    }

    ensure_output_dir(config)?;
    let path = config.output_path(&timestamped_file_name("event_registration_pivot", now));
    write_excel_table(&path, &output)?;
    info!(
        "{} participants with up to {} answers written to '{}'",
        output.len(),
        pivoted.width,
        simplify_file_name(&path)
    );
    Ok(path)
}

/// Adds the other columns of the first row of each participant in front of
/// the pivoted answers.
fn merge_participant_details(
    cleaned: &Table,
    pivoted: &Table,
    columns: &ColumnNames,
) -> EvDrawResult<Table> {
    let mut filled = cleaned.clone();
    let keys: Vec<usize> = [&columns.name, &columns.email]
        .iter()
        .filter_map(|c| filled.column_index(c))
        .collect();
    filled.forward_fill(&keys);
    let answers_col = filled
        .column_index(&columns.answers)
        .context(MissingColumnSnafu {
            column: columns.answers.clone(),
            source_name: "cleaned registrations",
        })?;
    let details = filled.drop_duplicates(&keys).without_columns(&[answers_col]);
    Ok(details.merge(pivoted, &[columns.name.as_str(), columns.email.as_str()]))
}

/// Reads the number of winners typed by the user.
pub fn read_count<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> EvDrawResult<i64> {
    write!(output, "Number of winners to draw? ").context(PromptSnafu)?;
    output.flush().context(PromptSnafu)?;
    let mut line = String::new();
    input.read_line(&mut line).context(PromptSnafu)?;
    let trimmed = line.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .context(InvalidCountSnafu { input: trimmed })
}

fn load_candidates(config: &EventConfig) -> EvDrawResult<Vec<ParticipantRecord>> {
    let mut tables: Vec<Table> = Vec::new();
    for path in config.pool_paths() {
        match read_optional_table(&path)? {
            Some(t) => {
                info!("'{}': {} candidates", simplify_file_name(&path), t.len());
                tables.push(t);
            }
            None => warn!(
                "The candidate file '{}' was not found, it is skipped",
                path.display()
            ),
        }
    }
    let pool = Table::concat(&tables);
    records::participants_from_table(&pool, &config.columns, "candidate pool")
}

/// Draws new winners and appends them to the winners file.
///
/// The count is asked on `input` when not provided. Returns `None` when
/// there was nobody to draw from. The winners file is only written after a
/// successful draw.
pub fn run_draw<R: BufRead, W: Write>(
    config: &EventConfig,
    count: Option<i64>,
    input: &mut R,
    output: &mut W,
) -> EvDrawResult<Option<LotteryOutcome>> {
    let columns = &config.columns;
    let candidates = load_candidates(config)?;
    if candidates.is_empty() {
        info!("No candidates, nothing to draw");
        return Ok(None);
    }

    let winners_path = config.winners_path();
    let previous = read_optional_table(&winners_path)?;
    match &previous {
        Some(t) => info!("{} previous winners in '{}'", t.len(), winners_path.display()),
        None => info!("No previous winners, everybody is eligible"),
    }
    let ledger = records::ledger_from_table(previous.as_ref(), columns);

    let count = match count {
        Some(c) => c,
        None => {
            let eligible = compute_eligible(&candidates, &ledger, &LogReporter);
            if eligible.is_empty() {
                info!("No eligible tickets left for this draw");
                return Ok(None);
            }
            info!("{} eligible tickets for this draw", eligible.len());
            read_count(input, output)?
        }
    };

    let mut lottery = match config.random_seed {
        Some(seed) => {
            info!("Using the random seed {}", seed);
            LotteryDraw::from_seed(seed)
        }
        None => LotteryDraw::from_entropy(),
    };
    let outcome = run_lottery(&candidates, ledger, count, &mut lottery, &LogReporter)
        .context(LotterySnafu)?;

    let new_rows = records::winners_to_table(&outcome.winners, columns);
    let combined = match previous {
        Some(t) => Table::concat(&[t, new_rows]),
        None => new_rows,
    };
    ensure_output_dir(config)?;
    write_excel_table(&winners_path, &combined)?;

    println!("The {} new winners are:", outcome.winners.len());
    for w in outcome.winners.iter() {
        println!(
            "  {} (ticket {}, {})",
            w.participant.name, w.participant.ticket_id, w.participant.role
        );
    }
    info!(
        "The winners file '{}' now holds {} entries",
        winners_path.display(),
        outcome.ledger.len()
    );
    Ok(Some(outcome))
}

/// Runs the preparation, the pivot and the draw in sequence.
///
/// A registration export without survey answers has nothing to pivot: the
/// pivot is skipped with a warning in this case.
pub fn run_all<R: BufRead, W: Write>(
    config: &EventConfig,
    count: Option<i64>,
    input: &mut R,
    output: &mut W,
) -> EvDrawResult<()> {
    run_prepare(config)?;
    match run_pivot(config, false) {
        Ok(_) => {}
        Err(EvDrawError::MissingColumn { column, .. }) => {
            warn!("No '{}' column, the pivot is skipped", column)
        }
        Err(e) => return Err(e),
    }
    run_draw(config, count, input, output)?;
    info!("All the steps completed");
    Ok(())
}
