//! Shipment delay cleaning: load a CSV of shipment records, normalize its
//! column names, derive pickup/delivery date and delay features, summarize
//! delays, and write the enriched table back out.

pub mod analyzers;
pub mod error;
pub mod features;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod stats;
pub mod table;

pub use error::{ErrorKind, PipelineError, Stage};
pub use features::{EnrichedTable, InvalidRowPolicy};
pub use pipeline::{PipelineConfig, run};
pub use table::Table;
