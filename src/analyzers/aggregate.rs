use std::collections::BTreeMap;

use crate::analyzers::utility::mean;
use crate::error::{PipelineError, Result, Stage};
use crate::features::EnrichedTable;

/// Groups the `Delay` values of every row by the value of `group_column`.
///
/// Rows with an empty group value or a missing delay are left out, so every
/// returned group holds at least one delay.
pub fn delays_by(
    enriched: &EnrichedTable,
    group_column: &str,
) -> Result<BTreeMap<String, Vec<i64>>> {
    let index = enriched
        .table
        .column_index(group_column)
        .ok_or_else(|| PipelineError::MissingColumn {
            stage: Stage::Aggregate,
            column: group_column.to_string(),
        })?;

    let mut groups: BTreeMap<String, Vec<i64>> = BTreeMap::new();

    for (key, shipment) in enriched.table.column_cells(index).zip(&enriched.shipments) {
        let Some(delay) = shipment.delay else {
            continue;
        };
        if key.trim().is_empty() {
            continue;
        }
        groups.entry(key.to_string()).or_default().push(delay);
    }

    Ok(groups)
}

/// Mean `Delay` per distinct value of `group_column`.
///
/// Groups without any delay are absent rather than reported as zero.
#[tracing::instrument(skip(enriched))]
pub fn mean_delay_by(
    enriched: &EnrichedTable,
    group_column: &str,
) -> Result<BTreeMap<String, f64>> {
    let means = delays_by(enriched, group_column)?
        .into_iter()
        .map(|(group, delays)| {
            let values: Vec<f64> = delays.iter().map(|&d| d as f64).collect();
            (group, mean(&values))
        })
        .collect::<BTreeMap<_, _>>();

    tracing::debug!(groups = means.len(), "Computed group means");
    Ok(means)
}
