#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County boundaries and the scenario values joined onto them.
//!
//! Boundary polygons are downloaded from a registered source
//! ([`registry`], [`fetch`]), converted out of `ArcGIS` JSON when needed
//! ([`arcgis`]), held in an explicit [`cache::BoundaryCache`], indexed for
//! point lookups ([`index`]), and finally enriched with per-county
//! scenario values by name ([`enrich`]).

pub mod arcgis;
pub mod cache;
pub mod enrich;
pub mod fetch;
pub mod index;
pub mod normalize;
pub mod registry;

pub use envrisk_geography_models::{
    BoundarySource, EnrichedEntity, EnrichmentSummary, MISSING_NAME, ScenarioRecord, UNKNOWN_NAME,
};

use thiserror::Error;

/// Errors that can occur while acquiring or indexing boundaries.
#[derive(Debug, Error)]
pub enum GeoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data conversion error (unexpected response shape, no usable
    /// polygons, ...).
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

impl GeoError {
    pub(crate) fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }
}
