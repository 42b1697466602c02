//! Typed view over the columns the feature deriver needs.
//!
//! Column lookups happen once, in [`ShipmentSchema::resolve`]; every row is
//! then read by index into a [`ShipmentRecord`].

use crate::error::{PipelineError, Result, Stage};
use crate::table::{Table, parse_integral};

pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const DAY_OF_MONTH: &str = "DayofMonth";
pub const SHIPMENT_DELAY: &str = "Shipment_Delay";
pub const CARRIER_NAME: &str = "Carrier_Name";

/// Columns that must be present after normalization.
pub const REQUIRED_COLUMNS: [&str; 4] = [YEAR, MONTH, DAY_OF_MONTH, SHIPMENT_DELAY];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipmentSchema {
    year: usize,
    month: usize,
    day_of_month: usize,
    shipment_delay: usize,
}

/// One row's raw fields. A `Err` cell holds the offending text.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRecord {
    pub year: Field,
    pub month: Field,
    pub day_of_month: Field,
    pub shipment_delay: Field,
}

/// An integer cell: parsed, empty, or unparseable.
pub type Field = std::result::Result<Option<i64>, String>;

impl ShipmentSchema {
    /// Locates every required column, failing on the first one absent.
    pub fn resolve(table: &Table) -> Result<Self> {
        let find = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| PipelineError::MissingColumn {
                    stage: Stage::Derive,
                    column: column.to_string(),
                })
        };

        let mut indices = [0; REQUIRED_COLUMNS.len()];
        for (slot, column) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = find(column)?;
        }
        let [year, month, day_of_month, shipment_delay] = indices;

        Ok(ShipmentSchema {
            year,
            month,
            day_of_month,
            shipment_delay,
        })
    }

    pub fn record(&self, row: &[String]) -> ShipmentRecord {
        let int = |i: usize| parse_integral(&row[i]).map_err(|()| row[i].clone());

        ShipmentRecord {
            year: int(self.year),
            month: int(self.month),
            day_of_month: int(self.day_of_month),
            shipment_delay: int(self.shipment_delay),
        }
    }
}
