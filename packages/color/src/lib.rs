#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Color scales for normalized risk and pollution values.
//!
//! A [`ColorScale`] is a single ordered table of bands. Each band has a
//! start threshold, the color at that threshold, and a qualitative level.
//! Both [`ColorScale::color_for`] and [`ColorScale::level_for`] resolve the
//! band through the same lookup, so a value's color segment and its label
//! always agree.
//!
//! Presets: [`risk`] (Very Low .. Extreme) and [`pollution`] (Good ..
//! Hazardous, optionally re-thresholded around a chemical's danger level).

pub mod pollution;
pub mod risk;
pub mod scale;

pub use pollution::{PollutionLevel, pollution_scale};
pub use risk::{RiskLevel, risk_scale};
pub use scale::{Boundary, ColorScale, LegendEntry, ScaleBand};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when building a color scale.
#[derive(Debug, Error)]
pub enum ColorError {
    /// A band threshold table is unusable.
    #[error("Invalid thresholds: {message}")]
    InvalidThresholds {
        /// Description of what went wrong.
        message: String,
    },
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    /// Linear interpolation per channel, rounded to the nearest integer.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| {
            let (a, b) = (f64::from(a), f64::from(b));
            (b - a).mul_add(t, a).round().clamp(0.0, 255.0) as u8
        };
        Self {
            r: channel(self.r, other.r),
            g: channel(self.g, other.g),
            b: channel(self.b, other.b),
        }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

/// An RGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// CSS `rgb(r, g, b)` string, alpha dropped.
    #[must_use]
    pub fn css_rgb(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// `#rrggbb` hex string, alpha dropped.
    #[must_use]
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Rgba> for [u8; 4] {
    fn from(value: Rgba) -> Self {
        value.to_array()
    }
}
