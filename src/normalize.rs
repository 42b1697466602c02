//! Column-name normalization.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::table::Table;

/// Known misspellings mapped to the canonical column name.
static COLUMN_ALIASES: &[(&str, &str)] = &[("DayOfMonth", "DayofMonth")];

/// Canonical form of a single column name.
pub fn canonical_column_name(name: &str) -> String {
    let trimmed = name.trim();
    COLUMN_ALIASES
        .iter()
        .find(|(alias, _)| *alias == trimmed)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Trims surrounding whitespace from every column name and fixes known
/// misnamed columns. Idempotent; rows are untouched.
#[tracing::instrument(skip_all, fields(columns = table.width()))]
pub fn normalize_columns(table: Table) -> Table {
    let table = table.rename_columns(|name| {
        let canonical = canonical_column_name(name);
        if canonical != name {
            debug!(from = name, to = %canonical, "Renamed column");
        }
        canonical
    });

    let mut seen = HashSet::new();
    for name in table.columns() {
        if !seen.insert(name.as_str()) {
            warn!(column = %name, "Duplicate column after normalization; lookups use the first");
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Table {
        Table::new(
            names.iter().map(|n| n.to_string()).collect(),
            vec![names.iter().map(|_| "1".to_string()).collect()],
        )
    }

    #[test]
    fn test_trims_and_renames() {
        let table =
            normalize_columns(headers(&[" Year ", "Month", "DayOfMonth", "\tShipment_Delay"]));
        assert_eq!(
            table.columns(),
            &["Year", "Month", "DayofMonth", "Shipment_Delay"]
        );
    }

    #[test]
    fn test_alias_with_whitespace() {
        assert_eq!(canonical_column_name("  DayOfMonth "), "DayofMonth");
        assert_eq!(canonical_column_name("dayofmonth"), "dayofmonth");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_columns(headers(&[" Carrier_Name", "DayOfMonth "]));
        let twice = normalize_columns(once.clone());
        assert_eq!(once.columns(), twice.columns());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_values_and_height_untouched() {
        let input = headers(&[" a", "b "]);
        let rows = input.rows().to_vec();
        let out = normalize_columns(input);
        assert_eq!(out.height(), 1);
        assert_eq!(out.rows(), rows.as_slice());
    }
}
