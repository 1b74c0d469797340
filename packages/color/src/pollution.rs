//! Air-quality style pollution scale: Good through Hazardous.
//!
//! The default table splits `[0, 1]` into five equal bands. A chemical
//! with a known danger level can get its own table via
//! [`pollution_scale_for_danger`], which moves the `Very Unhealthy` start to
//! the danger fraction and spreads the other thresholds around it.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Boundary, ColorError, ColorScale, Rgb, Rgba, ScaleBand};

/// Qualitative pollution level.
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
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
pub enum PollutionLevel {
    Good,
    Moderate,
    Unhealthy,
    #[strum(to_string = "Very Unhealthy")]
    VeryUnhealthy,
    Hazardous,
}

impl PollutionLevel {
    /// Health guidance for the level.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Good => "Air quality is good. No health impacts expected.",
            Self::Moderate => {
                "Air quality is acceptable. Sensitive individuals may experience minor breathing difficulties."
            }
            Self::Unhealthy => {
                "Air quality is unhealthy for sensitive groups. General public may experience breathing difficulties."
            }
            Self::VeryUnhealthy => {
                "Air quality is very unhealthy. Everyone may experience health effects."
            }
            Self::Hazardous => {
                "Air quality is hazardous. Emergency conditions. Everyone should avoid outdoor activities."
            }
        }
    }
}

/// Translucent so overlapping points blend.
const ALPHA: u8 = 200;

static POLLUTION_SCALE: LazyLock<ColorScale<PollutionLevel>> = LazyLock::new(|| {
    ColorScale::new(
        vec![
            ScaleBand::new(0.0, Rgb::new(34, 139, 34), PollutionLevel::Good),
            ScaleBand::new(0.2, Rgb::new(76, 175, 76), PollutionLevel::Moderate),
            ScaleBand::new(0.4, Rgb::new(255, 255, 0), PollutionLevel::Unhealthy),
            ScaleBand::new(0.6, Rgb::new(255, 165, 0), PollutionLevel::VeryUnhealthy),
            ScaleBand::new(0.8, Rgb::new(255, 0, 0), PollutionLevel::Hazardous),
        ],
        Rgb::new(139, 0, 0),
        ALPHA,
        Boundary::UpperInclusive,
    )
    .unwrap_or_else(|e| panic!("Invalid pollution scale table: {e}"))
});

/// The default pollution scale. Thresholds are upper-inclusive: 0.2 is
/// still `Good`.
#[must_use]
pub fn pollution_scale() -> &'static ColorScale<PollutionLevel> {
    &POLLUTION_SCALE
}

#[must_use]
pub fn pollution_color(normalized: f64) -> Rgba {
    POLLUTION_SCALE.color_for(normalized)
}

#[must_use]
pub fn pollution_level(normalized: f64) -> PollutionLevel {
    POLLUTION_SCALE.level_for(normalized)
}

/// Builds a pollution scale whose `Very Unhealthy` band starts at
/// `danger_fraction` (a chemical's danger threshold divided by the
/// normalization maximum).
///
/// The lower three bands split `[0, danger)` evenly and `Hazardous`
/// starts halfway between the danger fraction and 1. A danger fraction of
/// 0.6 reproduces the default table.
///
/// # Errors
///
/// Returns [`ColorError::InvalidThresholds`] unless `danger_fraction` lies
/// strictly between 0 and 1.
pub fn pollution_scale_for_danger(
    danger_fraction: f64,
) -> Result<ColorScale<PollutionLevel>, ColorError> {
    if !(danger_fraction > 0.0 && danger_fraction < 1.0) {
        return Err(ColorError::InvalidThresholds {
            message: format!("danger fraction must be in (0, 1), got {danger_fraction}"),
        });
    }
    let d = danger_fraction;
    log::debug!("Building pollution scale with danger fraction {d:.3}");
    POLLUTION_SCALE.with_thresholds(&[0.0, d / 3.0, 2.0 * d / 3.0, d, f64::midpoint(d, 1.0)])
}
