use clap::Parser;
use log::{debug, warn, LevelFilter};
use snafu::ErrorCompat;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

mod args;
mod evdraw;

use crate::args::{Args, Command};
use crate::evdraw::config_reader::{read_config, EventConfig};
use crate::evdraw::EvDrawResult;

/// The configuration file, if any, with the command line overrides applied.
fn load_config(args: &Args) -> EvDrawResult<EventConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => EventConfig::default(),
    };
    if let Some(dir) = &args.input_dir {
        config.input_directory = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_directory = dir.clone();
    }
    if let Some(name) = &args.excel_worksheet_name {
        config.excel_worksheet_name = Some(name.clone());
    }
    if let Some(Command::Draw { seed: Some(seed), .. }) = &args.command {
        config.random_seed = Some(*seed);
    }
    debug!("config: {:?}", config);
    Ok(config)
}

/// Opens the log file in append mode, creating its directory if needed.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn run(args: &Args) -> EvDrawResult<()> {
    let config = load_config(args)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    match args.command.clone().unwrap_or(Command::All) {
        Command::Prepare => evdraw::run_prepare(&config),
        Command::Pivot { merge_details } => evdraw::run_pivot(&config, merge_details).map(|_| ()),
        Command::Draw { count, .. } => {
            evdraw::run_draw(&config, count, &mut input, &mut output).map(|_| ())
        }
        Command::All => evdraw::run_all(&config, None, &mut input, &mut output),
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).parse_default_env();
    if let Some(path) = &args.log_file {
        match open_log_file(Path::new(path)) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("Cannot open the log file {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }
    builder.init();
    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        warn!("Error occured {:?}", e);
        for (idx, err) in ErrorCompat::iter_chain(&e).enumerate() {
            if idx == 0 {
                eprintln!("An error occured: {}", err);
            } else {
                eprintln!("  caused by: {}", err);
            }
        }
        std::process::exit(1);
    }
}
