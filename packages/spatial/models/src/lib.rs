#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point, sample, and region types shared across the spatial pipeline.
//!
//! Everything here is a plain value type. Coordinates are planar degrees
//! (`lon`, `lat`); no projection is applied anywhere in the pipeline.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LonLat {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Planar Euclidean distance in degrees.
    ///
    /// Not geodesic. Interpolation constants (anchor epsilon, influence
    /// radius, step caps) are tuned against this metric.
    #[must_use]
    pub fn planar_distance(&self, other: &Self) -> f64 {
        let d_lon = other.lon - self.lon;
        let d_lat = other.lat - self.lat;
        d_lon.hypot(d_lat)
    }
}

/// A scalar value observed (or estimated) at a position.
///
/// Also used for the cells of a dense raster, where positions lie on a
/// uniform grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarSample {
    pub position: LonLat,
    pub value: f64,
}

impl ScalarSample {
    #[must_use]
    pub const fn new(lon: f64, lat: f64, value: f64) -> Self {
        Self {
            position: LonLat::new(lon, lat),
            value,
        }
    }
}

/// An axis-aligned bounding box in degrees. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Approximate Washington State extent.
    pub const WASHINGTON: Self = Self {
        north: 49.0,
        south: 45.5,
        west: -124.8,
        east: -116.9,
    };

    /// King County extent (Shoreline to Auburn, Puget Sound to Snoqualmie
    /// Pass).
    pub const KING_COUNTY: Self = Self {
        north: 47.7776,
        south: 47.1556,
        west: -122.5413,
        east: -121.0630,
    };

    #[must_use]
    pub const fn new(north: f64, south: f64, west: f64, east: f64) -> Self {
        Self {
            north,
            south,
            west,
            east,
        }
    }

    #[must_use]
    pub fn contains(&self, point: LonLat) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lon >= self.west
            && point.lon <= self.east
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Returns `true` if the box has a positive, finite extent on both axes.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.width().is_finite()
            && self.height().is_finite()
            && self.width() > 0.0
            && self.height() > 0.0
    }

    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            east: self.east.max(other.east),
        }
    }
}

/// The individual factors that make up a composite risk score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum RiskFactor {
    AirQuality,
    NoisePollution,
    FloodClimate,
}

impl RiskFactor {
    pub const ALL: &[Self] = &[Self::AirQuality, Self::NoisePollution, Self::FloodClimate];
}

/// Relative weights of the risk factors. The sum is arbitrary; use
/// [`RiskWeights::normalized`] before combining.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskWeights {
    pub air_quality: f64,
    pub noise_pollution: f64,
    pub flood_climate: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            air_quality: 0.4,
            noise_pollution: 0.35,
            flood_climate: 0.25,
        }
    }
}

impl RiskWeights {
    #[must_use]
    pub const fn get(&self, factor: RiskFactor) -> f64 {
        match factor {
            RiskFactor::AirQuality => self.air_quality,
            RiskFactor::NoisePollution => self.noise_pollution,
            RiskFactor::FloodClimate => self.flood_climate,
        }
    }

    /// Returns a copy with `factor` set from a percentage slider value
    /// (0-100).
    #[must_use]
    pub const fn with_percent(mut self, factor: RiskFactor, percent: f64) -> Self {
        let value = percent / 100.0;
        match factor {
            RiskFactor::AirQuality => self.air_quality = value,
            RiskFactor::NoisePollution => self.noise_pollution = value,
            RiskFactor::FloodClimate => self.flood_climate = value,
        }
        self
    }

    /// Rescales the weights so they sum to 1.
    ///
    /// Negative or non-finite weights count as zero. If nothing positive
    /// remains, every factor gets an equal share.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let air = clean(self.air_quality);
        let noise = clean(self.noise_pollution);
        let flood = clean(self.flood_climate);
        let total = air + noise + flood;

        if total <= 0.0 {
            let third = 1.0 / 3.0;
            return Self {
                air_quality: third,
                noise_pollution: third,
                flood_climate: third,
            };
        }

        Self {
            air_quality: air / total,
            noise_pollution: noise / total,
            flood_climate: flood / total,
        }
    }

    /// Weighted average of the breakdown using the normalized weights.
    #[must_use]
    pub fn composite(&self, breakdown: &RiskBreakdown) -> f64 {
        let w = self.normalized();
        w.air_quality * breakdown.air_quality
            + w.noise_pollution * breakdown.noise_pollution
            + w.flood_climate * breakdown.flood_climate
    }
}

/// Per-factor scores (each in `[0, 1]`) at a single location.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskBreakdown {
    pub air_quality: f64,
    pub noise_pollution: f64,
    pub flood_climate: f64,
}

impl RiskBreakdown {
    /// A breakdown where every factor carries the same score.
    #[must_use]
    pub const fn uniform(score: f64) -> Self {
        Self {
            air_quality: score,
            noise_pollution: score,
            flood_climate: score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_distance_is_euclidean_degrees() {
        let a = LonLat::new(-122.0, 47.0);
        let b = LonLat::new(-121.0, 48.0);
        assert!((a.planar_distance(&b) - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn bounding_box_edges_are_inclusive() {
        let bbox = BoundingBox::WASHINGTON;
        assert!(bbox.contains(LonLat::new(-124.8, 45.5)));
        assert!(bbox.contains(LonLat::new(-116.9, 49.0)));
        assert!(!bbox.contains(LonLat::new(-116.8, 47.0)));
        assert!(!bbox.contains(LonLat::new(-120.0, 49.01)));
    }

    #[test]
    fn weights_normalize_to_one() {
        let w = RiskWeights {
            air_quality: 2.0,
            noise_pollution: 1.0,
            flood_climate: 1.0,
        }
        .normalized();
        assert!((w.air_quality - 0.5).abs() < 1e-12);
        assert!((w.noise_pollution - 0.25).abs() < 1e-12);
        assert!((w.air_quality + w.noise_pollution + w.flood_climate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_weights_become_equal_shares() {
        let w = RiskWeights {
            air_quality: 0.0,
            noise_pollution: 0.0,
            flood_climate: 0.0,
        }
        .normalized();
        assert!((w.air_quality - 1.0 / 3.0).abs() < 1e-12);
        assert!((w.flood_climate - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn composite_of_uniform_breakdown_is_the_score() {
        let score = RiskWeights::default().composite(&RiskBreakdown::uniform(0.7));
        assert!((score - 0.7).abs() < 1e-12);
    }

    #[test]
    fn percent_updates_single_factor() {
        let w = RiskWeights::default().with_percent(RiskFactor::FloodClimate, 80.0);
        assert!((w.flood_climate - 0.8).abs() < 1e-12);
        assert!((w.air_quality - 0.4).abs() < 1e-12);
    }

    #[test]
    fn risk_factor_parses_from_snake_case() {
        let factor: RiskFactor = "noise_pollution".parse().unwrap();
        assert_eq!(factor, RiskFactor::NoisePollution);
        assert_eq!(RiskFactor::FloodClimate.to_string(), "flood_climate");
    }

    #[test]
    fn weights_serialize_camel_case() {
        let json = serde_json::to_value(RiskWeights::default()).unwrap();
        assert!(json.get("noisePollution").is_some());
    }
}
