#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the scenario-generation API.
//!
//! The API turns a free-text scenario prompt into per-county predicted
//! values. Generation runs an LLM server-side and routinely takes tens of
//! seconds, so the client timeout is long.

pub mod client;

pub use client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, ScenarioClient};
pub use envrisk_scenario_models::{
    Baseline, CountyDataPoint, HealthStatus, SimulationData, SimulationRequest, SimulationResponse,
};

use thiserror::Error;

/// Errors returned by [`ScenarioClient`].
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("Scenario API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The request did not complete within the client timeout.
    #[error("Request timed out after {seconds}s; the scenario may still be generating")]
    Timeout {
        /// Configured timeout.
        seconds: u64,
    },

    /// The API could not be reached at all.
    #[error("Cannot connect to scenario API at {url}")]
    Unreachable {
        /// Base URL that was tried.
        url: String,
    },

    /// The API answered `success: false`.
    #[error("Scenario generation was not successful")]
    Unsuccessful,
}
