pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod database;
pub mod error;
pub mod extract;
pub mod io_utils;
pub mod load;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod schema;
pub mod table;
pub mod validate;

use std::{env, fs::File, io::BufReader, path::Path, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, CleanFormat, Commands, DatabaseArgs, InputArgs},
    config::PipelineConfig,
    record::CleanTable,
};

pub use crate::{
    clean::{clean, clean_with_report},
    error::EtlError,
    extract::extract,
    load::{LoadMode, load},
    pipeline::run_pipeline,
    schema::infer_schema,
    validate::validate,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("cafe_sales_etl", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = PipelineConfig::resolve(cli.config.as_deref())
        .with_context(|| format!("Loading configuration {:?}", cli.config))?;
    match cli.command {
        Commands::Run(args) => handle_run(config, &args),
        Commands::Extract(args) => handle_extract(config, &args),
        Commands::Clean(args) => handle_clean(config, &args),
        Commands::Load(args) => handle_load(config, &args),
        Commands::Validate(args) => handle_validate(config, &args.database),
        Commands::Report(args) => handle_report(config, &args),
        Commands::Ping(args) => handle_ping(config, &args.database),
    }
}

fn apply_input(config: &mut PipelineConfig, args: &InputArgs) {
    if let Some(input) = &args.input {
        config.input = input.clone();
    }
    if let Some(delimiter) = args.delimiter {
        config.delimiter = Some(delimiter as char);
    }
}

fn apply_database(config: &mut PipelineConfig, args: &DatabaseArgs) {
    if let Some(path) = &args.database {
        config.database.path = path.clone();
    }
    if let Some(table) = &args.table {
        config.table = table.clone();
    }
}

fn input_delimiter(config: &PipelineConfig) -> Result<u8> {
    Ok(io_utils::resolve_input_delimiter(
        &config.input,
        config.delimiter_byte()?,
    ))
}

fn handle_run(mut config: PipelineConfig, args: &cli::RunArgs) -> Result<()> {
    apply_input(&mut config, &args.input);
    apply_database(&mut config, &args.database);
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    debug!("Resolved configuration: {:?}", config);
    let summary = pipeline::run_pipeline(&config, !args.skip_validation)
        .with_context(|| format!("Running pipeline for {:?}", config.input))?;
    println!(
        "Loaded {} row(s) into '{}' ({} extracted, {} dropped)",
        summary.loaded, config.table, summary.extracted, summary.dropped
    );
    Ok(())
}

fn handle_extract(mut config: PipelineConfig, args: &cli::ExtractArgs) -> Result<()> {
    apply_input(&mut config, &args.input);
    let raw = extract::extract(&config.input, input_delimiter(&config)?)
        .with_context(|| format!("Extracting {:?}", config.input))?;
    table::print_table(&raw, args.rows);
    info!(
        "Displayed {} of {} row(s) from {:?}",
        args.rows.min(raw.row_count()),
        raw.row_count(),
        config.input
    );
    Ok(())
}

fn handle_clean(mut config: PipelineConfig, args: &cli::CleanArgs) -> Result<()> {
    apply_input(&mut config, &args.input);
    let delimiter = input_delimiter(&config)?;
    let raw = extract::extract(&config.input, delimiter)
        .with_context(|| format!("Extracting {:?}", config.input))?;
    let outcome = clean::clean_with_report(raw)
        .with_context(|| format!("Cleaning {:?}", config.input))?;
    if args.show_dropped {
        for dropped in &outcome.dropped {
            warn!(
                "Dropped row {} (missing {})",
                dropped.row + 2,
                dropped.missing.join(", ")
            );
        }
    }

    let cleaned = outcome.table;
    if args.preview {
        table::print_table(&cleaned.to_raw(), cleaned.row_count());
        return Ok(());
    }
    match args.format {
        CleanFormat::Json => write_json(&cleaned, args.output.as_deref())?,
        CleanFormat::Csv => write_csv(&cleaned, args.output.as_deref(), delimiter)?,
    }
    Ok(())
}

fn write_json(table: &CleanTable, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) if !io_utils::is_dash(path) => {
            let file =
                File::create(path).with_context(|| format!("Creating output file {path:?}"))?;
            serde_json::to_writer_pretty(file, table).context("Writing cleaned table JSON")?;
            info!("Wrote {} cleaned row(s) to {:?}", table.row_count(), path);
        }
        _ => {
            serde_json::to_writer_pretty(std::io::stdout(), table)
                .context("Writing cleaned table JSON")?;
            println!();
        }
    }
    Ok(())
}

fn write_csv(table: &CleanTable, output: Option<&Path>, delimiter: u8) -> Result<()> {
    let raw = table.to_raw();
    let mut writer = io_utils::open_csv_writer(output, delimiter)?;
    writer.write_record(&raw.headers)?;
    for row in &raw.rows {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

fn handle_load(mut config: PipelineConfig, args: &cli::LoadArgs) -> Result<()> {
    apply_database(&mut config, &args.database);
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    let file = File::open(&args.input)
        .with_context(|| format!("Opening cleaned table {:?}", args.input))?;
    let table: CleanTable = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Parsing cleaned table {:?}", args.input))?;
    let table = clean::conform(table)
        .with_context(|| format!("Checking cleaned table {:?}", args.input))?;
    if !args.allow_empty {
        pipeline::ensure_loadable(&table)?;
    }
    let mut conn = database::open(&config.database)
        .with_context(|| format!("Opening database {:?}", config.database.path))?;
    let inserted = load::load(&mut conn, &table, &config.table, config.mode)?;
    println!("Loaded {inserted} row(s) into '{}'", config.table);
    Ok(())
}

fn handle_validate(mut config: PipelineConfig, args: &DatabaseArgs) -> Result<()> {
    apply_database(&mut config, args);
    let conn = database::open(&config.database)
        .with_context(|| format!("Opening database {:?}", config.database.path))?;
    let summary = validate::validate(&conn, &config.table)?;
    println!(
        "Validation passed: {} row(s), 0 nulls in total_spent",
        summary.rows
    );
    Ok(())
}

fn handle_report(mut config: PipelineConfig, args: &cli::ReportArgs) -> Result<()> {
    apply_database(&mut config, &args.database);
    if let Some(dir) = &args.sql_dir {
        config.sql_dir = dir.clone();
    }
    if let Some(dir) = &args.reports_dir {
        config.reports_dir = dir.clone();
    }
    let conn = database::open(&config.database)
        .with_context(|| format!("Opening database {:?}", config.database.path))?;
    let outputs = report::run_reports(&conn, &config.sql_dir, &config.reports_dir)?;
    if outputs.is_empty() {
        bail!("No .sql files found in {:?}", config.sql_dir);
    }
    for output in &outputs {
        println!("Report saved: {}", output.path.display());
    }
    Ok(())
}

fn handle_ping(mut config: PipelineConfig, args: &DatabaseArgs) -> Result<()> {
    apply_database(&mut config, args);
    let conn = database::open(&config.database)
        .with_context(|| format!("Opening database {:?}", config.database.path))?;
    let version = database::server_version(&conn)?;
    println!("Connected to SQLite {version}");
    Ok(())
}
