//! Delay aggregation and reporting.
//!
//! Groups enriched rows by a column, computes mean delays, and assembles the
//! dataset overview, delay distribution and per-weekday summaries into a
//! [`types::DelayReport`].

pub mod aggregate;
pub mod report;
pub mod types;
pub mod utility;
