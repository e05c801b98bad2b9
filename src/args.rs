use clap::{Parser, Subcommand};

/// Prepares event registration exports, pivots survey answers and draws prize winners.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Option<Command>,

    /// (file path, optional) A JSON configuration file. See the manual for the available options.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory) The directory containing the raw registration export. Overrides the configuration.
    #[clap(long, value_parser)]
    pub input_dir: Option<String>,

    /// (directory) The directory where all the generated files are written. Overrides the configuration.
    #[clap(long, value_parser)]
    pub output_dir: Option<String>,

    /// When reading an Excel file with several worksheets, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, optional) Appends the log to this file instead of the terminal. Missing directories are created.
    #[clap(long, value_parser)]
    pub log_file: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Cleans the raw export and writes one file per role.
    Prepare,
    /// Turns the survey answers into one row per participant.
    Pivot {
        /// Adds the other columns of each participant to the pivoted answers.
        #[clap(long, takes_value = false)]
        merge_details: bool,
    },
    /// Draws new winners and appends them to the winners ledger.
    Draw {
        /// (integer) The number of winners to draw. Asked on the terminal when missing.
        #[clap(short = 'n', long, value_parser)]
        count: Option<i64>,
        /// (integer) Seeds the random generator, for rehearsals. Overrides the configuration.
        #[clap(long, value_parser)]
        seed: Option<u64>,
    },
    /// Runs prepare, pivot and draw in sequence (default).
    All,
}
