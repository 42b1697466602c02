//! End-to-end batch run: load, normalize, derive, report, write.

use std::path::PathBuf;
use std::time::Instant;

use tracing::info;

use crate::analyzers::report::{build_report, log_report};
use crate::analyzers::types::DelayReport;
use crate::error::Result;
use crate::features::{EnrichedTable, InvalidRowPolicy, derive_features};
use crate::loader::load_table;
use crate::normalize::normalize_columns;
use crate::output::{print_pretty, write_report_json, write_table};
use crate::schema::CARRIER_NAME;

pub const DEFAULT_INPUT: &str = "data/raw/fedex_delivery_data.csv";
pub const DEFAULT_OUTPUT: &str = "data/processed/fedex_cleaned.csv";

/// Inputs for one cleaning run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Where to write the JSON report, if anywhere.
    pub report: Option<PathBuf>,
    pub on_invalid: InvalidRowPolicy,
    /// Columns to report mean delay by.
    pub group_by: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            report: None,
            on_invalid: InvalidRowPolicy::default(),
            group_by: vec![CARRIER_NAME.to_string()],
        }
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub enriched: EnrichedTable,
    pub report: DelayReport,
}

/// Loads, normalizes and enriches the input without writing anything.
pub fn enrich(input: &std::path::Path, on_invalid: InvalidRowPolicy) -> Result<EnrichedTable> {
    let table = load_table(input)?;
    let table = normalize_columns(table);
    derive_features(table, on_invalid)
}

/// Runs the whole pipeline. The report is built before the output is
/// written, so an unknown group column fails the run before any file is
/// touched.
#[tracing::instrument(
    skip_all,
    fields(input = %config.input.display(), output = %config.output.display())
)]
pub fn run(config: &PipelineConfig) -> Result<PipelineOutcome> {
    let start = Instant::now();

    let enriched = enrich(&config.input, config.on_invalid)?;
    let report = build_report(&enriched, &config.group_by)?;

    write_table(&config.output, &enriched.table)?;
    if let Some(path) = &config.report {
        write_report_json(path, &report)?;
    }

    log_report(&report);
    print_pretty(&report);

    info!(
        rows = enriched.table.height(),
        flagged = enriched.issues.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Pipeline complete"
    );

    Ok(PipelineOutcome { enriched, report })
}
