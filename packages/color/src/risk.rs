//! The generic composite-risk scale: green valleys through deep red peaks.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::{Boundary, ColorScale, Rgb, Rgba, ScaleBand};

/// Qualitative risk level.
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
pub enum RiskLevel {
    #[strum(to_string = "Very Low")]
    VeryLow,
    Low,
    Moderate,
    High,
    #[strum(to_string = "Very High")]
    VeryHigh,
    Extreme,
}

static RISK_SCALE: LazyLock<ColorScale<RiskLevel>> = LazyLock::new(|| {
    ColorScale::new(
        vec![
            ScaleBand::new(0.00, Rgb::new(34, 197, 94), RiskLevel::VeryLow),
            ScaleBand::new(0.15, Rgb::new(134, 239, 172), RiskLevel::Low),
            ScaleBand::new(0.35, Rgb::new(234, 179, 8), RiskLevel::Moderate),
            ScaleBand::new(0.50, Rgb::new(249, 115, 22), RiskLevel::High),
            ScaleBand::new(0.65, Rgb::new(239, 68, 68), RiskLevel::VeryHigh),
            // Flat: the peaks stay deep red up to 1.
            ScaleBand::new(0.85, Rgb::new(185, 28, 28), RiskLevel::Extreme),
        ],
        Rgb::new(185, 28, 28),
        255,
        Boundary::LowerInclusive,
    )
    .unwrap_or_else(|e| panic!("Invalid risk scale table: {e}"))
});

/// The shared composite-risk scale. Thresholds are lower-inclusive: 0.15
/// is already `Low`.
#[must_use]
pub fn risk_scale() -> &'static ColorScale<RiskLevel> {
    &RISK_SCALE
}

#[must_use]
pub fn risk_color(score: f64) -> Rgba {
    RISK_SCALE.color_for(score)
}

#[must_use]
pub fn risk_level(score: f64) -> RiskLevel {
    RISK_SCALE.level_for(score)
}
