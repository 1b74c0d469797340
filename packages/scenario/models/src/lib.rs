#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Request and response types of the scenario-generation API.
//!
//! A scenario is a free-text prompt ("wildfire smoke doubles in eastern
//! Washington"); the API answers with one predicted value per county plus
//! the metric and its baseline.

use envrisk_geography_models::ScenarioRecord;
use envrisk_spatial_models::ScalarSample;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/simulate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub prompt: String,
}

/// Full response of `POST /api/simulate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub success: bool,
    pub data: SimulationData,
    /// JSON-encoded parameters the model chose for the scenario.
    #[serde(default)]
    pub director_prompt: String,
}

/// The simulated metric across counties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationData {
    pub metric: String,
    pub unit: String,
    #[serde(default)]
    pub scenario_description: String,
    #[serde(rename = "dataPoints")]
    pub data_points: Vec<CountyDataPoint>,
    pub baseline: Baseline,
}

/// One county's simulated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyDataPoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// County seat.
    #[serde(default)]
    pub seat: String,
    /// Population density (people per square mile).
    #[serde(default)]
    pub density: f64,
    #[serde(default)]
    pub ground_truth_value: f64,
    /// Multiplier applied to the ground truth by the scenario.
    #[serde(default)]
    pub scenario_factor: f64,
    pub predicted_value: f64,
    /// Predicted value rescaled to `[0, 1]` across all counties.
    pub normalized: f64,
}

/// Ground-truth statistics before the scenario was applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

impl SimulationData {
    /// County centres as samples carrying the normalized value.
    #[must_use]
    pub fn samples(&self) -> Vec<ScalarSample> {
        self.data_points
            .iter()
            .map(|p| ScalarSample::new(p.lon, p.lat, p.normalized))
            .collect()
    }

    /// Per-county values for joining onto boundary polygons.
    #[must_use]
    pub fn scenario_records(&self) -> Vec<ScenarioRecord> {
        self.data_points
            .iter()
            .map(|p| ScenarioRecord {
                name: p.name.clone(),
                normalized_value: p.normalized,
                predicted_value: p.predicted_value,
            })
            .collect()
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "success": true,
        "data": {
            "metric": "PM2.5",
            "unit": "µg/m³",
            "scenario_description": "Wildfire smoke",
            "dataPoints": [
                {
                    "name": "King County",
                    "lat": 47.49,
                    "lon": -121.83,
                    "seat": "Seattle",
                    "density": 1000.5,
                    "ground_truth_value": 8.0,
                    "scenario_factor": 1.5,
                    "predicted_value": 12.0,
                    "normalized": 0.75
                },
                { "name": "Ferry", "lat": 48.47, "lon": -118.52, "predicted_value": 2.0, "normalized": 0.0 }
            ],
            "baseline": { "min": 2.0, "max": 16.0, "average": 7.5 }
        },
        "director_prompt": "{\"metric\": \"PM2.5\"}"
    }"#;

    #[test]
    fn parses_api_response() {
        let response: SimulationResponse = serde_json::from_str(RESPONSE).unwrap();
        assert!(response.success);
        assert_eq!(response.data.metric, "PM2.5");
        assert_eq!(response.data.data_points.len(), 2);
        assert_eq!(response.data.data_points[0].seat, "Seattle");
        assert_eq!(response.data.data_points[1].seat, "");
        assert!((response.data.baseline.max - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn samples_are_lon_lat_with_normalized_value() {
        let response: SimulationResponse = serde_json::from_str(RESPONSE).unwrap();
        let samples = response.data.samples();
        assert_eq!(samples[0], ScalarSample::new(-121.83, 47.49, 0.75));
    }

    #[test]
    fn scenario_records_carry_both_values() {
        let response: SimulationResponse = serde_json::from_str(RESPONSE).unwrap();
        let records = response.data.scenario_records();
        assert_eq!(records[0].name, "King County");
        assert!((records[0].normalized_value - 0.75).abs() < f64::EPSILON);
        assert!((records[0].predicted_value - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_data_points_in_camel_case() {
        let response: SimulationResponse = serde_json::from_str(RESPONSE).unwrap();
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["data"]["dataPoints"].is_array());
        assert!(json["data"]["data_points"].is_null());
    }
}
