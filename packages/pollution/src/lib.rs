#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pollution timelines from raw CSV readings.
//!
//! [`parsing`] turns loosely-formatted CSV text into [`RawReading`]s,
//! [`aggregate`] groups them into chronologically sorted
//! [`MonthlyAggregate`]s normalized against a dataset-wide maximum, and
//! [`combine`] merges several chemicals' timelines into one. The chemical
//! definitions themselves live in [`registry`].

pub mod aggregate;
pub mod combine;
pub mod parsing;
pub mod registry;
pub mod timeline;

use std::path::Path;

pub use envrisk_pollution_models::{
    AggregatedDataPoint, ChemicalConfig, CombinedMonthlyAggregate, MonthlyAggregate, RawReading,
    TaggedDataPoint, TimelineSummary,
};

use crate::parsing::IngestReport;

/// Errors that can occur while loading pollution data.
#[derive(Debug, thiserror::Error)]
pub enum PollutionError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV header row could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// None of the accepted header names for a required column is present.
    #[error("Missing column '{field}' (accepted headers: {candidates})")]
    MissingColumn {
        /// Logical field name.
        field: &'static str,
        /// Comma-separated accepted header names.
        candidates: String,
    },
}

/// Reads a CSV file and aggregates it into a monthly timeline.
///
/// # Errors
///
/// Returns [`PollutionError`] if the file cannot be opened or its header
/// row lacks a required column. Bad data rows are dropped, not fatal.
pub fn load_timeline(
    path: &Path,
) -> Result<(Vec<MonthlyAggregate>, IngestReport), PollutionError> {
    log::info!("Loading readings from {}", path.display());
    let file = std::fs::File::open(path)?;
    let (readings, report) = parsing::read_readings(file)?;
    let months = aggregate::aggregate(&readings);
    log::info!(
        "{}: {} months from {} readings",
        path.display(),
        months.len(),
        readings.len()
    );
    Ok((months, report))
}
