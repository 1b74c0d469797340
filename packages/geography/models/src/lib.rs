#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for county boundaries and the scenario values joined onto
//! them.

use serde::{Deserialize, Serialize};

/// Name written into an entity that has no usable attributes or geometry.
pub const MISSING_NAME: &str = "MISSING";

/// Name used when a feature has attributes but none of the known name
/// fields.
pub const UNKNOWN_NAME: &str = "UNKNOWN";

/// One externally supplied value for a named county.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRecord {
    pub name: String,
    /// Value in `[0, 1]`, used as the risk score.
    pub normalized_value: f64,
    pub predicted_value: f64,
}

/// Attributes added to a boundary feature by enrichment.
///
/// Serializes to the property names map layers read: `CNTY`,
/// `riskScore`, `predictedValue`, `isDataAvailable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedEntity {
    /// County name as it appeared on the feature (not normalized).
    #[serde(rename = "CNTY")]
    pub county_name: String,
    pub risk_score: f64,
    pub predicted_value: f64,
    pub is_data_available: bool,
}

impl EnrichedEntity {
    /// An entity with no scenario value attached.
    #[must_use]
    pub fn unmatched(county_name: impl Into<String>) -> Self {
        Self {
            county_name: county_name.into(),
            risk_score: 0.0,
            predicted_value: 0.0,
            is_data_available: false,
        }
    }

    /// An entity carrying `record`'s values.
    #[must_use]
    pub fn matched(county_name: impl Into<String>, record: &ScenarioRecord) -> Self {
        Self {
            county_name: county_name.into(),
            risk_score: record.normalized_value,
            predicted_value: record.predicted_value,
            is_data_available: true,
        }
    }
}

/// Counts from one enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
    /// Original names of the unmatched entities, in input order.
    pub unmatched_names: Vec<String>,
}

impl EnrichmentSummary {
    pub fn record(&mut self, entity: &EnrichedEntity) {
        self.total += 1;
        if entity.is_data_available {
            self.matched += 1;
        } else {
            self.unmatched += 1;
            self.unmatched_names.push(entity.county_name.clone());
        }
    }
}

/// A boundary dataset that can be fetched over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundarySource {
    /// Unique identifier (e.g. `"wa_counties"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Dataset version; bump to invalidate cached copies.
    pub version: String,
    /// Endpoint returning a `GeoJSON` `FeatureCollection`.
    pub geojson_url: String,
    /// Endpoint returning an `ArcGIS` JSON `FeatureSet`, tried when the
    /// `GeoJSON` endpoint fails.
    pub arcgis_url: Option<String>,
}

impl BoundarySource {
    /// Cache key identifying this source at its current version.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}@{}", self.id, self.version)
    }
}
