use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use sql_evaluator::dump::write_dump;
use sql_evaluator::ir::encoder::EncodeOptions;
use sql_evaluator::ir::guard::DEFAULT_MAX_DEPTH;
use sql_evaluator::loader::{load_query, load_tables};
use sql_evaluator::logging::init_logger;

/// Reads a JSON SQL query and the tables it names, and writes both back out
/// as canonical text.
#[derive(Parser, Debug)]
#[command(name = "sql-evaluator")]
#[command(version)]
struct Cli {
    /// Folder holding the `<source>.table.json` files
    table_folder: PathBuf,

    /// Query document
    sql_json_file: PathBuf,

    /// File to write; created or truncated
    output_file: PathBuf,

    /// Log level filter (defaults to RUST_LOG, then "info")
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors on stderr
    #[arg(long)]
    no_color: bool,

    /// Also write a DEBUG session log to the user cache directory
    #[arg(long)]
    log_file: bool,

    /// Spaces per nesting level in the query block
    #[arg(long, default_value_t = 4)]
    indent: usize,

    /// Maximum node nesting depth before encoding is refused
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

fn run(cli: &Cli) -> Result<()> {
    let query = load_query(&cli.sql_json_file)?;
    let tables = load_tables(&cli.table_folder, &query)?;

    let file = File::create(&cli.output_file)
        .with_context(|| format!("Error opening {:?} for writing", cli.output_file))?;
    let mut writer = BufWriter::new(file);
    let options = EncodeOptions::pretty(cli.indent).with_max_depth(cli.max_depth);
    write_dump(&mut writer, &query, &tables, &options)
        .with_context(|| format!("Error writing {:?}", cli.output_file))?;
    writer
        .flush()
        .with_context(|| format!("Error writing {:?}", cli.output_file))?;

    info!("Wrote {:?}", cli.output_file);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logger(cli.no_color, cli.log_level.as_deref(), cli.log_file) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
