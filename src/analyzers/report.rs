use std::collections::BTreeMap;

use chrono::{Utc, Weekday};
use tracing::info;

use crate::analyzers::aggregate::{delays_by, mean_delay_by};
use crate::analyzers::types::{ColumnOverview, DatasetOverview, DelayReport, WeekdaySummary};
use crate::error::Result;
use crate::features::{EnrichedTable, PICKUP_WEEKDAY, weekday_name};
use crate::stats::{DelaySummary, Histogram};
use crate::table::Table;

/// Number of histogram bins used for the delay distribution.
pub const HISTOGRAM_BINS: usize = 30;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Rows, inferred column kinds and missing-cell counts.
pub fn overview(table: &Table) -> DatasetOverview {
    let columns = table
        .missing_counts()
        .into_iter()
        .zip(table.kinds())
        .map(|((name, missing), &kind)| ColumnOverview {
            name,
            kind,
            missing,
        })
        .collect();

    DatasetOverview {
        rows: table.height(),
        columns,
    }
}

/// Builds the full delay report for an enriched table.
///
/// `group_columns` are each passed to [`mean_delay_by`]; an unknown column
/// is an error.
#[tracing::instrument(skip(enriched))]
pub fn build_report(enriched: &EnrichedTable, group_columns: &[String]) -> Result<DelayReport> {
    let delays: Vec<i64> = enriched.shipments.iter().filter_map(|s| s.delay).collect();

    let mut means = BTreeMap::new();
    for column in group_columns {
        means.insert(column.clone(), mean_delay_by(enriched, column)?);
    }

    let mut per_weekday = delays_by(enriched, PICKUP_WEEKDAY)?;
    let by_weekday = WEEK
        .iter()
        .filter_map(|&day| {
            let name = weekday_name(day);
            let delays = per_weekday.remove(name)?;
            DelaySummary::from_delays(&delays).map(|summary| WeekdaySummary {
                weekday: name.to_string(),
                summary,
            })
        })
        .collect();

    Ok(DelayReport {
        schema_version: 1,
        generated_at: Utc::now(),
        overview: overview(&enriched.table),
        delay: DelaySummary::from_delays(&delays),
        histogram: Histogram::from_delays(&delays, HISTOGRAM_BINS),
        mean_delay_by: means,
        by_weekday,
        flagged_rows: enriched.issues.clone(),
    })
}

/// Emits the overview through tracing.
pub fn log_overview(overview: &DatasetOverview) {
    info!(rows = overview.rows, columns = overview.columns.len(), "Dataset overview");
    for column in &overview.columns {
        info!(
            column = %column.name,
            kind = ?column.kind,
            missing = column.missing,
            "Column"
        );
    }
}

/// Emits the report's headline numbers through tracing.
pub fn log_report(report: &DelayReport) {
    log_overview(&report.overview);

    if let Some(d) = &report.delay {
        info!(
            count = d.count,
            mean = d.mean,
            std = d.std,
            min = d.min,
            median = d.median,
            max = d.max,
            "Delay distribution"
        );
    }

    for (column, groups) in &report.mean_delay_by {
        for (group, mean) in groups {
            info!(by = %column, group = %group, mean_delay = mean, "Average delay");
        }
    }

    for w in &report.by_weekday {
        info!(
            weekday = %w.weekday,
            count = w.summary.count,
            q25 = w.summary.q25,
            median = w.summary.median,
            q75 = w.summary.q75,
            "Delay by pickup day"
        );
    }

    if !report.flagged_rows.is_empty() {
        info!(flagged = report.flagged_rows.len(), "Rows flagged during derivation");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{InvalidRowPolicy, derive_features};
    use crate::table::ColumnKind;

    fn enriched(rows: &[[&str; 5]], policy: InvalidRowPolicy) -> EnrichedTable {
        let table = Table::new(
            ["Year", "Month", "DayofMonth", "Shipment_Delay", "Carrier_Name"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        );
        derive_features(table, policy).unwrap()
    }

    #[test]
    fn test_report_weekdays_are_monday_first() {
        // Sunday 2023-02-05, Wednesday 2023-02-01, Monday 2023-01-30
        let e = enriched(
            &[
                ["2023", "2", "5", "3", "X"],
                ["2023", "2", "1", "1", "Y"],
                ["2023", "1", "30", "2", "X"],
            ],
            InvalidRowPolicy::Fail,
        );

        let report = build_report(&e, &["Carrier_Name".to_string()]).unwrap();
        let days: Vec<&str> = report.weekdays().map(|(d, _)| d).collect();
        assert_eq!(days, vec!["Monday", "Wednesday", "Sunday"]);

        let carriers = report.mean_delay_by("Carrier_Name").unwrap();
        assert_eq!(carriers["X"], 2.5);
        assert_eq!(report.delay().unwrap().count, 3);
        assert_eq!(report.histogram().total(), 3);
    }

    #[test]
    fn test_overview_counts_missing() {
        let e = enriched(
            &[["2023", "2", "30", "", "X"], ["2023", "2", "1", "1", ""]],
            InvalidRowPolicy::Flag,
        );
        let report = build_report(&e, &[]).unwrap();
        let overview = report.overview();

        assert_eq!(overview.rows(), 2);
        let delay = overview
            .columns()
            .iter()
            .find(|c| c.name() == "Shipment_Delay")
            .unwrap();
        assert_eq!(delay.missing(), 1);
        assert_eq!(delay.kind(), ColumnKind::Integer);

        let pickup = overview
            .columns()
            .iter()
            .find(|c| c.name() == "Pickup_Date")
            .unwrap();
        assert_eq!(pickup.missing(), 1);
        assert_eq!(pickup.kind(), ColumnKind::Date);
        assert_eq!(report.flagged_rows().len(), 1);
    }

    #[test]
    fn test_report_serializes() {
        let e = enriched(&[["2023", "1", "30", "3", "X"]], InvalidRowPolicy::Fail);
        let report = build_report(&e, &["Carrier_Name".to_string()]).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["schema_version"], 1);
        assert_eq!(json["mean_delay_by"]["Carrier_Name"]["X"], 3.0);
        assert_eq!(json["by_weekday"][0]["weekday"], "Monday");
        assert_eq!(json["overview"]["columns"][0]["kind"], "integer");
    }
}
