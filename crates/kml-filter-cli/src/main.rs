// CLI handlers take owned clap values
#![allow(
    clippy::needless_pass_by_value,  // clap requires owned strings
    clippy::must_use_candidate,      // CLI functions don't need must_use
)]

//! kml-filter CLI - query and export placemarks from a KML map
//!
//! Loads the configured KML/KMZ document once and serves one operation per
//! invocation: list matching placemarks, show distinct field values, or
//! export the matches to a new KML file.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use config::Config;
use kml_filter::{Exporter, FilterSpec, PlacemarkService, Record};
use std::path::PathBuf;
use std::process::ExitCode;

/// How chatty a run is on stderr
///
/// Results (records, values, exported path) always go to stdout; this only
/// governs the `Matched`/`Exported` summaries and the log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    /// `-q`: no summaries, errors only
    Quiet,
    /// Summaries plus warnings
    Normal,
    /// `-v`: summaries plus debug logs from the loader and exporter
    Verbose,
}

impl Verbosity {
    /// `-q` wins over `-v` (clap already rejects both together)
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Verbose,
            (false, false) => Self::Normal,
        }
    }

    const fn shows_summary(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// `env_logger` filter used when `RUST_LOG` is unset
    const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "debug",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "kml-filter")]
#[command(version, about = "Filter KML placemarks and export the matches", long_about = None)]
struct Args {
    /// KML or KMZ document to load (default: content/DIRECIONADORES1.kml)
    #[arg(short, long, global = true, value_name = "PATH")]
    source: Option<PathBuf>,

    /// Use this config file instead of ~/.kml-filter.toml and ./.kml-filter.toml
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print results and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Attribute filters shared by `list` and `export`
#[derive(clap::Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Exact CLIENTE value
    #[arg(long)]
    client: Option<String>,

    /// Exact SITUAÇÃO value
    #[arg(long)]
    status: Option<String>,

    /// Exact BAIRRO value
    #[arg(long)]
    neighborhood: Option<String>,

    /// Substring of REFERENCIA, ignoring case (at least 3 characters)
    #[arg(long)]
    reference: Option<String>,

    /// Substring of RUA/CRUZAMENTO, ignoring case (at least 3 characters)
    #[arg(long)]
    cross_street: Option<String>,
}

impl From<FilterArgs> for FilterSpec {
    fn from(args: FilterArgs) -> Self {
        Self {
            client: args.client,
            status: args.status,
            neighborhood: args.neighborhood,
            reference: args.reference,
            cross_street: args.cross_street,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List placemarks matching the filters
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the distinct values of CLIENTE, SITUAÇÃO or BAIRRO
    Unique {
        /// Field name, case-insensitive
        field: String,

        /// Print values as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the distinct values of every filterable field
    Filters {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export placemarks matching the filters to a new KML file
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Directory for the exported file (default: system temp dir)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(verbosity.log_filter()))
        .target(env_logger::Target::Stderr)
        .init();

    match run(args, verbosity) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args, verbosity: Verbosity) -> Result<()> {
    let config = Config::resolve(args.config.as_deref())?;
    let source = config.resolve_source(args.source);

    let export_dir = match &args.command {
        Commands::Export { output_dir, .. } => config.resolve_export_dir(output_dir.clone()),
        _ => config.resolve_export_dir(None),
    };
    let exporter = export_dir.map_or_else(Exporter::default, Exporter::with_dir);

    let service = PlacemarkService::open(&source, exporter)
        .with_context(|| format!("Failed to load KML document: {}", source.display()))?;

    match args.command {
        Commands::List { filters, json } => list_command(&service, filters, json, verbosity),
        Commands::Unique { field, json } => unique_command(&service, &field, json),
        Commands::Filters { json } => filters_command(&service, json),
        Commands::Export { filters, .. } => export_command(&service, filters, verbosity),
    }
}

fn list_command(
    service: &PlacemarkService,
    filters: FilterArgs,
    json: bool,
    verbosity: Verbosity,
) -> Result<()> {
    let spec = FilterSpec::from(filters);
    let records: Vec<&Record> = service.filter_records(&spec)?.collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for record in &records {
        println!("{}", format_record(record));
    }
    if verbosity.shows_summary() {
        eprintln!(
            "{} {} of {} placemarks",
            "Matched".green().bold(),
            records.len(),
            service.records().len()
        );
    }
    Ok(())
}

/// One-line text rendering of a record
fn format_record(record: &Record) -> String {
    let field = |value: &Option<String>| value.as_deref().unwrap_or("-").to_string();
    format!(
        "{} | {} | {} | {} | {}",
        field(&record.client),
        field(&record.status),
        field(&record.neighborhood),
        field(&record.reference),
        field(&record.cross_street)
    )
}

fn unique_command(service: &PlacemarkService, field: &str, json: bool) -> Result<()> {
    let values = service.unique_values(field)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        print_values(&values);
    }
    Ok(())
}

fn print_values(values: &[String]) {
    for value in values {
        if value.is_empty() {
            println!("{}", "(empty)".dimmed());
        } else {
            println!("{value}");
        }
    }
}

fn filters_command(service: &PlacemarkService, json: bool) -> Result<()> {
    let filters = service.available_filters();
    if json {
        println!("{}", serde_json::to_string_pretty(&filters)?);
        return Ok(());
    }

    for (title, values) in [
        ("CLIENTE", &filters.clientes),
        ("SITUAÇÃO", &filters.situacoes),
        ("BAIRRO", &filters.bairros),
    ] {
        println!("{}", title.cyan().bold());
        print_values(values);
        println!();
    }
    Ok(())
}

fn export_command(
    service: &PlacemarkService,
    filters: FilterArgs,
    verbosity: Verbosity,
) -> Result<()> {
    let spec = FilterSpec::from(filters);
    let records: Vec<&Record> = service.filter_records(&spec)?.collect();

    let path = service
        .export_records(records.iter().copied())
        .with_context(|| {
            format!(
                "Failed to export placemarks to {}",
                service.exporter().dir().display()
            )
        })?;

    if verbosity.shows_summary() {
        eprintln!(
            "{} {} placemarks",
            "Exported".green().bold(),
            records.len()
        );
    }
    println!("{}", path.display());
    Ok(())
}
