//! Derived delay and pickup-date features.
//!
//! Day-of-week convention: Monday = 0 through Sunday = 6, so the weekend is
//! `{5, 6}`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PipelineError, Result, Stage};
use crate::schema::{DAY_OF_MONTH, MONTH, SHIPMENT_DELAY, ShipmentRecord, ShipmentSchema, YEAR};
use crate::table::{DATE_FORMAT, Table};

pub const PICKUP_DATE: &str = "Pickup_Date";
pub const DELIVERY_DATE: &str = "Delivery_Date";
pub const DELAY: &str = "Delay";
pub const PICKUP_DAY_OF_WEEK: &str = "Pickup_DayOfWeek";
pub const IS_WEEKEND: &str = "Is_Weekend";
pub const PICKUP_WEEKDAY: &str = "Pickup_Weekday";

/// Derived columns in the order they are appended to the table.
pub const DERIVED_COLUMNS: [&str; 6] = [
    PICKUP_DATE,
    DELIVERY_DATE,
    DELAY,
    PICKUP_DAY_OF_WEEK,
    IS_WEEKEND,
    PICKUP_WEEKDAY,
];

/// What to do with a row whose date parts or delay cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidRowPolicy {
    /// Abort the run on the first invalid row.
    #[default]
    Fail,
    /// Keep the row, leave the affected derived cells empty and record an
    /// [`RowIssue`].
    Flag,
}

impl FromStr for InvalidRowPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(InvalidRowPolicy::Fail),
            "flag" => Ok(InvalidRowPolicy::Flag),
            other => Err(format!("unknown invalid-row policy '{other}' (expected fail or flag)")),
        }
    }
}

impl fmt::Display for InvalidRowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidRowPolicy::Fail => f.write_str("fail"),
            InvalidRowPolicy::Flag => f.write_str("flag"),
        }
    }
}

/// Fields derived from the pickup date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pickup {
    pub date: NaiveDate,
    /// `None` when the delay is missing or unusable.
    pub delivery_date: Option<NaiveDate>,
    pub day_of_week: u32,
    pub is_weekend: bool,
    pub weekday: Weekday,
}

/// Derived values for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrichedShipment {
    pub delay: Option<i64>,
    pub pickup: Option<Pickup>,
}

/// A flagged row, 1-based over data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub message: String,
}

/// A table with the derived columns attached, plus the typed derived values
/// for each row.
#[derive(Debug, Clone)]
pub struct EnrichedTable {
    pub table: Table,
    pub shipments: Vec<EnrichedShipment>,
    pub issues: Vec<RowIssue>,
}

pub fn is_weekend(day_of_week: u32) -> bool {
    matches!(day_of_week, 5 | 6)
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Shifts `date` by a signed number of days, rolling over months and years.
pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

fn pickup_date(record: &ShipmentRecord, row: usize) -> Result<NaiveDate> {
    let invalid = |reason: String| PipelineError::InvalidDate {
        stage: Stage::Derive,
        row,
        reason,
    };

    let part = |field: &crate::schema::Field, column: &str| match field {
        Ok(Some(v)) => Ok(*v),
        Ok(None) => Err(invalid(format!("{column} is empty"))),
        Err(text) => Err(invalid(format!("{column} '{text}' is not an integer"))),
    };

    let year = part(&record.year, YEAR)?;
    let month = part(&record.month, MONTH)?;
    let day = part(&record.day_of_month, DAY_OF_MONTH)?;

    i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .zip(u32::try_from(day).ok())
        .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
        .ok_or_else(|| invalid(format!("{year}-{month}-{day} is not a valid calendar date")))
}

/// Derives every feature for one record.
///
/// Returns the derived values together with every problem found, in column
/// order; the caller decides whether a problem is fatal.
fn derive_row(record: &ShipmentRecord, row: usize) -> (EnrichedShipment, Vec<PipelineError>) {
    let mut problems = Vec::new();

    let delay = match &record.shipment_delay {
        Ok(delay) => *delay,
        Err(text) => {
            problems.push(PipelineError::InvalidValue {
                stage: Stage::Derive,
                row,
                column: SHIPMENT_DELAY.to_string(),
                value: text.clone(),
            });
            None
        }
    };

    let pickup = match pickup_date(record, row) {
        Ok(date) => {
            let delivery_date = match delay {
                Some(d) => {
                    let shifted = add_days(date, d);
                    if shifted.is_none() {
                        problems.push(PipelineError::InvalidDate {
                            stage: Stage::Derive,
                            row,
                            reason: format!("{date} shifted by {d} days is out of range"),
                        });
                    }
                    shifted
                }
                None => None,
            };
            let weekday = date.weekday();
            let day_of_week = weekday.num_days_from_monday();
            Some(Pickup {
                date,
                delivery_date,
                day_of_week,
                is_weekend: is_weekend(day_of_week),
                weekday,
            })
        }
        Err(e) => {
            problems.push(e);
            None
        }
    };

    (EnrichedShipment { delay, pickup }, problems)
}

fn derived_cells(shipment: &EnrichedShipment) -> [String; 6] {
    let date = |d: Option<NaiveDate>| {
        d.map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    };
    let pickup = shipment.pickup.as_ref();

    [
        date(pickup.map(|p| p.date)),
        date(pickup.and_then(|p| p.delivery_date)),
        shipment.delay.map(|d| d.to_string()).unwrap_or_default(),
        pickup.map(|p| p.day_of_week.to_string()).unwrap_or_default(),
        pickup.map(|p| p.is_weekend.to_string()).unwrap_or_default(),
        pickup
            .map(|p| weekday_name(p.weekday).to_string())
            .unwrap_or_default(),
    ]
}

/// Adds the derived columns to a normalized table.
///
/// Row count is preserved under both policies. Derived columns already
/// present in the input are overwritten in place.
///
/// # Errors
///
/// [`PipelineError::MissingColumn`] when a required column is absent, and
/// under [`InvalidRowPolicy::Fail`] the first [`PipelineError::InvalidValue`]
/// or [`PipelineError::InvalidDate`] encountered. Under
/// [`InvalidRowPolicy::Flag`] every problem in a row becomes its own
/// [`RowIssue`].
#[tracing::instrument(skip(table), fields(rows = table.height()))]
pub fn derive_features(mut table: Table, policy: InvalidRowPolicy) -> Result<EnrichedTable> {
    let schema = ShipmentSchema::resolve(&table)?;

    let mut shipments = Vec::with_capacity(table.height());
    let mut issues = Vec::new();

    for (i, cells) in table.rows().iter().enumerate() {
        let row = i + 1;
        let (shipment, problems) = derive_row(&schema.record(cells), row);

        for e in problems {
            match policy {
                InvalidRowPolicy::Fail => return Err(e),
                InvalidRowPolicy::Flag => {
                    warn!(row, error = %e, "Flagged invalid row");
                    issues.push(RowIssue {
                        row,
                        message: e.to_string(),
                    });
                }
            }
        }

        shipments.push(shipment);
    }

    let mut columns: [Vec<String>; 6] = Default::default();
    for shipment in &shipments {
        for (column, cell) in columns.iter_mut().zip(derived_cells(shipment)) {
            column.push(cell);
        }
    }
    for (name, values) in DERIVED_COLUMNS.iter().zip(columns) {
        table.set_column(name, values);
    }

    info!(rows = shipments.len(), flagged = issues.len(), "Derived features");

    Ok(EnrichedTable {
        table,
        shipments,
        issues,
    })
}
