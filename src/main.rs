//! CLI entry point for the shipment delay cleaner.
//!
//! `clean` runs the full batch pipeline, `summarize` prints mean delays per
//! group without writing, and `inspect` shows the dataset overview.

use anyhow::Result;
use clap::{Parser, Subcommand};
use shipment_delays::InvalidRowPolicy;
use shipment_delays::analyzers::aggregate::mean_delay_by;
use shipment_delays::analyzers::report::{log_overview, overview};
use shipment_delays::loader::load_table;
use shipment_delays::normalize::normalize_columns;
use shipment_delays::pipeline::{DEFAULT_INPUT, DEFAULT_OUTPUT, PipelineConfig, enrich, run};
use shipment_delays::schema::CARRIER_NAME;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "shipment_delays")]
#[command(about = "Clean shipment records and summarize delivery delays", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive delay features and write the cleaned CSV
    Clean {
        /// Raw shipment CSV (.csv or .csv.gz)
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Destination for the enriched CSV; parent directories are created
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Optional: write the delay report as JSON to this path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// What to do with rows whose date or delay is invalid (fail | flag)
        #[arg(long, default_value_t = InvalidRowPolicy::Fail)]
        on_invalid: InvalidRowPolicy,

        /// Columns to report mean delay by
        #[arg(short = 'g', long = "group-by", default_values_t = [CARRIER_NAME.to_string()])]
        group_by: Vec<String>,
    },
    /// Print mean delay per group without writing any file
    Summarize {
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Grouping column, e.g. Carrier_Name or Pickup_Weekday
        #[arg(short, long, default_value = CARRIER_NAME)]
        by: String,

        #[arg(long, default_value_t = InvalidRowPolicy::Fail)]
        on_invalid: InvalidRowPolicy,
    },
    /// Show row count, inferred column kinds and missing values
    Inspect {
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,
    },
}

/// Colored stderr output plus a daily-rolling JSON log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/shipment_delays.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("shipment_delays.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Clean {
            input,
            output,
            report,
            on_invalid,
            group_by,
        } => {
            let config = PipelineConfig {
                input,
                output,
                report,
                on_invalid,
                group_by,
            };
            run(&config)?;
            info!(output = %config.output.display(), "Cleaned dataset saved");
        }
        Commands::Summarize {
            input,
            by,
            on_invalid,
        } => {
            let enriched = enrich(&input, on_invalid)?;
            let means = mean_delay_by(&enriched, &by)?;

            for (group, mean) in &means {
                println!("{group}\t{mean:.2}");
            }
            info!(by = %by, groups = means.len(), "Summary complete");
        }
        Commands::Inspect { input } => {
            let table = normalize_columns(load_table(&input)?);
            log_overview(&overview(&table));
        }
    }

    Ok(())
}
