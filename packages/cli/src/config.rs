//! Pipeline configuration, read from an optional TOML file.
//!
//! Every field has a default, so a missing or empty file is valid:
//!
//! ```toml
//! [interpolation]
//! power = 2.0
//! max_influence_radius = 0.3
//! # Weight every sample regardless of distance:
//! # unbounded = true
//!
//! [densify]
//! target_point_count = 20000
//!
//! [smoothing]
//! sigma = 1.5
//! passes = 2
//!
//! [region]
//! north = 49.0
//! south = 45.5
//! west = -124.8
//! east = -116.9
//!
//! [scenario_api]
//! base_url = "http://localhost:8000"
//! timeout_secs = 120
//! ```

use std::path::Path;
use std::time::Duration;

use envrisk_scenario::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use envrisk_spatial::densify::DensifyParams;
use envrisk_spatial::interpolate::IdwParams;
use envrisk_spatial_models::BoundingBox;
use serde::Deserialize;

/// Environment variable overriding `[scenario_api] base_url`.
pub const SCENARIO_API_URL_ENV: &str = "SCENARIO_API_URL";

/// Radius written back when the built-in IDW defaults are unbounded.
const DEFAULT_INFLUENCE_RADIUS: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub interpolation: InterpolationConfig,
    pub densify: DensifyConfig,
    pub smoothing: SmoothingConfig,
    pub region: BoundingBox,
    pub scenario_api: ScenarioApiConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            interpolation: InterpolationConfig::default(),
            densify: DensifyConfig::default(),
            smoothing: SmoothingConfig::default(),
            region: BoundingBox::WASHINGTON,
            scenario_api: ScenarioApiConfig::default(),
        }
    }
}

/// IDW settings. TOML has no null, so the unbounded Shepard mode is
/// selected with `unbounded = true` rather than by omitting the radius.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpolationConfig {
    pub power: f64,
    /// In degrees. Ignored when `unbounded` is set.
    pub max_influence_radius: f64,
    pub unbounded: bool,
    pub anchor_epsilon: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        let params = IdwParams::default();
        Self {
            power: params.power,
            max_influence_radius: params
                .max_influence_radius
                .unwrap_or(DEFAULT_INFLUENCE_RADIUS),
            unbounded: params.max_influence_radius.is_none(),
            anchor_epsilon: params.anchor_epsilon,
        }
    }
}

impl InterpolationConfig {
    #[must_use]
    pub const fn params(&self) -> IdwParams {
        IdwParams {
            power: self.power,
            max_influence_radius: if self.unbounded {
                None
            } else {
                Some(self.max_influence_radius)
            },
            anchor_epsilon: self.anchor_epsilon,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DensifyConfig {
    /// Total points (known plus synthetic) to aim for.
    pub target_point_count: usize,
    pub step_cap: f64,
    pub spacing_divisor: f64,
    pub noise_threshold: f64,
    pub chunk_rows: usize,
}

impl Default for DensifyConfig {
    fn default() -> Self {
        let params = DensifyParams::default();
        Self {
            target_point_count: 20_000,
            step_cap: params.step_cap,
            spacing_divisor: params.spacing_divisor,
            noise_threshold: params.noise_threshold,
            chunk_rows: params.chunk_rows,
        }
    }
}

impl DensifyConfig {
    #[must_use]
    pub const fn params(&self, idw: IdwParams) -> DensifyParams {
        DensifyParams {
            idw,
            step_cap: self.step_cap,
            spacing_divisor: self.spacing_divisor,
            noise_threshold: self.noise_threshold,
            chunk_rows: self.chunk_rows,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmoothingConfig {
    /// Gaussian standard deviation, in cells.
    pub sigma: f64,
    pub passes: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            sigma: 1.5,
            passes: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ScenarioApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ScenarioApiConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineConfig {
    /// Parses configuration text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text is malformed or has unknown keys.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(text)
    }

    /// Loads the file at `path` (or defaults when `None`) and applies the
    /// environment override.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::parse(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };
        Ok(config.with_api_url_override(std::env::var(SCENARIO_API_URL_ENV).ok()))
    }

    /// Replaces the scenario API base URL when `url` is non-empty.
    #[must_use]
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            log::debug!("Scenario API URL overridden by {SCENARIO_API_URL_ENV}: {url}");
            self.scenario_api.base_url = url;
        }
        self
    }
}
