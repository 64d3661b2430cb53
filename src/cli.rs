use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::load::LoadMode;

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean cafe sales exports and load them into SQLite", long_about = None)]
pub struct Cli {
    /// YAML pipeline configuration; flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract, clean, load and validate in one pass
    Run(RunArgs),
    /// Preview the raw rows of an export without interpreting them
    Extract(ExtractArgs),
    /// Clean an export and write the typed table as JSON or CSV
    Clean(CleanArgs),
    /// Load a cleaned JSON table into the destination store
    Load(LoadArgs),
    /// Check that the destination table has rows and no NULL total_spent
    Validate(ValidateArgs),
    /// Run every .sql file in a directory and save each result as CSV
    Report(ReportArgs),
    /// Open the destination store and print the SQLite version
    Ping(PingArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Raw delimited export with a header row
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Field delimiter (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct DatabaseArgs {
    /// SQLite database file (":memory:" for a scratch database)
    #[arg(short = 'd', long = "database")]
    pub database: Option<PathBuf>,
    /// Destination table name
    #[arg(short = 't', long = "table")]
    pub table: Option<String>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub database: DatabaseArgs,
    /// Replace the destination table or append to it
    #[arg(long, value_enum)]
    pub mode: Option<LoadMode>,
    /// Skip the post-load quality checks
    #[arg(long = "skip-validation")]
    pub skip_validation: bool,
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum CleanFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format for the cleaned table
    #[arg(long, value_enum, default_value = "json")]
    pub format: CleanFormat,
    /// Render the cleaned table as an aligned text table on stdout instead
    #[arg(long = "preview")]
    pub preview: bool,
    /// Log every dropped row and the required columns it was missing
    #[arg(long = "show-dropped")]
    pub show_dropped: bool,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Cleaned table produced by `clean --format json`
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    #[command(flatten)]
    pub database: DatabaseArgs,
    /// Replace the destination table or append to it
    #[arg(long, value_enum)]
    pub mode: Option<LoadMode>,
    /// Load even when the cleaned table has no rows
    #[arg(long = "allow-empty")]
    pub allow_empty: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
    /// Directory holding the .sql report queries
    #[arg(long = "sql-dir")]
    pub sql_dir: Option<PathBuf>,
    /// Directory the CSV results are written to
    #[arg(long = "reports-dir")]
    pub reports_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct PingArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
