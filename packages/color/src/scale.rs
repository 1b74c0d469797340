//! The shared band-table interpolation engine.

use serde::{Deserialize, Serialize};

use crate::{ColorError, Rgb, Rgba};

/// Which band owns a value that lands exactly on a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Boundary {
    /// A threshold belongs to the band that starts there.
    LowerInclusive,
    /// A threshold belongs to the band that ends there.
    UpperInclusive,
}

/// One entry of a scale's band table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleBand<L> {
    /// Normalized value where the band begins.
    pub start: f64,
    /// Color at `start`. The band fades toward the next band's color (or
    /// the scale's end color for the last band).
    pub color: Rgb,
    pub level: L,
}

impl<L> ScaleBand<L> {
    pub const fn new(start: f64, color: Rgb, level: L) -> Self {
        Self {
            start,
            color,
            level,
        }
    }
}

/// A legend row describing one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry<L> {
    pub level: L,
    pub start: f64,
    pub end: f64,
    pub start_color: Rgba,
    pub end_color: Rgba,
}

/// A piecewise-linear color scale over `[0, 1]` with one qualitative level
/// per segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScale<L> {
    bands: Vec<ScaleBand<L>>,
    end_color: Rgb,
    alpha: u8,
    boundary: Boundary,
}

impl<L: Copy> ColorScale<L> {
    /// Builds a scale from its band table.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::InvalidThresholds`] unless the table is
    /// non-empty, starts at 0, and its starts are finite, strictly
    /// increasing, and below 1.
    pub fn new(
        bands: Vec<ScaleBand<L>>,
        end_color: Rgb,
        alpha: u8,
        boundary: Boundary,
    ) -> Result<Self, ColorError> {
        let starts: Vec<f64> = bands.iter().map(|b| b.start).collect();
        validate_starts(&starts)?;
        Ok(Self {
            bands,
            end_color,
            alpha,
            boundary,
        })
    }

    /// Returns a copy with the band starts replaced by `starts`, keeping
    /// colors and levels.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError::InvalidThresholds`] if the number of starts
    /// differs from the number of bands or the starts are invalid.
    pub fn with_thresholds(&self, starts: &[f64]) -> Result<Self, ColorError> {
        if starts.len() != self.bands.len() {
            return Err(invalid(format!(
                "expected {} thresholds, got {}",
                self.bands.len(),
                starts.len()
            )));
        }
        validate_starts(starts)?;

        let bands = self
            .bands
            .iter()
            .zip(starts)
            .map(|(band, &start)| ScaleBand { start, ..*band })
            .collect();

        Ok(Self {
            bands,
            end_color: self.end_color,
            alpha: self.alpha,
            boundary: self.boundary,
        })
    }

    /// Color for a normalized value. Inputs outside `[0, 1]` saturate; NaN
    /// maps like 0.
    #[must_use]
    pub fn color_for(&self, value: f64) -> Rgba {
        let value = clamp_unit(value);
        let index = self.band_index(value);
        let (start, end) = self.span(index);
        let from = self.bands[index].color;
        let to = self
            .bands
            .get(index + 1)
            .map_or(self.end_color, |next| next.color);

        let t = if end > start {
            (value - start) / (end - start)
        } else {
            0.0
        };
        from.lerp(to, t).with_alpha(self.alpha)
    }

    /// Qualitative level for a normalized value.
    #[must_use]
    pub fn level_for(&self, value: f64) -> L {
        self.bands[self.band_index(clamp_unit(value))].level
    }

    /// Color and level together.
    #[must_use]
    pub fn classify(&self, value: f64) -> (Rgba, L) {
        (self.color_for(value), self.level_for(value))
    }

    #[must_use]
    pub fn bands(&self) -> &[ScaleBand<L>] {
        &self.bands
    }

    #[must_use]
    pub const fn alpha(&self) -> u8 {
        self.alpha
    }

    #[must_use]
    pub const fn boundary(&self) -> Boundary {
        self.boundary
    }

    #[must_use]
    pub fn legend(&self) -> Vec<LegendEntry<L>> {
        self.bands
            .iter()
            .enumerate()
            .map(|(i, band)| {
                let (start, end) = self.span(i);
                let end_color = self.bands.get(i + 1).map_or(self.end_color, |b| b.color);
                LegendEntry {
                    level: band.level,
                    start,
                    end,
                    start_color: band.color.with_alpha(self.alpha),
                    end_color: end_color.with_alpha(self.alpha),
                }
            })
            .collect()
    }

    fn span(&self, index: usize) -> (f64, f64) {
        let start = self.bands[index].start;
        let end = self.bands.get(index + 1).map_or(1.0, |b| b.start);
        (start, end)
    }

    /// The one place band membership is decided. `value` is already in
    /// `[0, 1]`.
    fn band_index(&self, value: f64) -> usize {
        match self.boundary {
            Boundary::LowerInclusive => self
                .bands
                .iter()
                .rposition(|b| value >= b.start)
                .unwrap_or(0),
            Boundary::UpperInclusive => (0..self.bands.len())
                .find(|&i| value <= self.span(i).1)
                .unwrap_or(self.bands.len() - 1),
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[allow(clippy::float_cmp)]
fn validate_starts(starts: &[f64]) -> Result<(), ColorError> {
    let Some(first) = starts.first() else {
        return Err(invalid("a scale needs at least one band".to_string()));
    };
    if *first != 0.0 {
        return Err(invalid(format!("first band must start at 0, got {first}")));
    }
    for pair in starts.windows(2) {
        if !(pair[1].is_finite() && pair[1] > pair[0]) {
            return Err(invalid(format!(
                "band starts must be strictly increasing, got {} after {}",
                pair[1], pair[0]
            )));
        }
    }
    if starts.last().is_some_and(|last| *last >= 1.0) {
        return Err(invalid("last band must start below 1".to_string()));
    }
    Ok(())
}

fn invalid(message: String) -> ColorError {
    ColorError::InvalidThresholds { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_band(boundary: Boundary) -> ColorScale<char> {
        ColorScale::new(
            vec![
                ScaleBand::new(0.0, Rgb::new(0, 0, 0), 'a'),
                ScaleBand::new(0.5, Rgb::new(100, 100, 100), 'b'),
            ],
            Rgb::new(200, 200, 200),
            255,
            boundary,
        )
        .unwrap()
    }

    #[test]
    fn interpolates_within_band() {
        let scale = two_band(Boundary::LowerInclusive);
        assert_eq!(scale.color_for(0.25), Rgba::new(50, 50, 50, 255));
        assert_eq!(scale.color_for(0.75), Rgba::new(150, 150, 150, 255));
        assert_eq!(scale.color_for(1.0), Rgba::new(200, 200, 200, 255));
    }

    #[test]
    fn boundary_rule_decides_threshold_owner() {
        assert_eq!(two_band(Boundary::LowerInclusive).level_for(0.5), 'b');
        assert_eq!(two_band(Boundary::UpperInclusive).level_for(0.5), 'a');
        assert_eq!(two_band(Boundary::UpperInclusive).level_for(0.0), 'a');
        assert_eq!(two_band(Boundary::UpperInclusive).level_for(0.500_001), 'b');
    }

    #[test]
    fn out_of_range_saturates() {
        let scale = two_band(Boundary::LowerInclusive);
        assert_eq!(scale.color_for(-3.0), scale.color_for(0.0));
        assert_eq!(scale.color_for(7.0), scale.color_for(1.0));
        assert_eq!(scale.level_for(f64::NAN), 'a');
        assert_eq!(scale.level_for(f64::INFINITY), 'b');
    }

    #[test]
    fn rejects_bad_tables() {
        let band = |s| ScaleBand::new(s, Rgb::new(0, 0, 0), ());
        let new = |bands: Vec<ScaleBand<()>>| ColorScale::new(bands, Rgb::new(0, 0, 0), 255, Boundary::LowerInclusive);
        assert!(new(vec![]).is_err());
        assert!(new(vec![band(0.1)]).is_err());
        assert!(new(vec![band(0.0), band(0.4), band(0.4)]).is_err());
        assert!(new(vec![band(0.0), band(1.0)]).is_err());
        assert!(new(vec![band(0.0), band(f64::NAN)]).is_err());
    }

    #[test]
    fn with_thresholds_keeps_colors_and_levels() {
        let scale = two_band(Boundary::LowerInclusive)
            .with_thresholds(&[0.0, 0.8])
            .unwrap();
        assert_eq!(scale.level_for(0.7), 'a');
        assert_eq!(scale.bands()[1].color, Rgb::new(100, 100, 100));
        assert!(two_band(Boundary::LowerInclusive).with_thresholds(&[0.0]).is_err());
    }

    #[test]
    fn legend_covers_unit_interval() {
        let legend = two_band(Boundary::LowerInclusive).legend();
        assert_eq!(legend.len(), 2);
        assert!(legend[0].start.abs() < f64::EPSILON);
        assert!((legend[0].end - legend[1].start).abs() < f64::EPSILON);
        assert!((legend[1].end - 1.0).abs() < f64::EPSILON);
        assert_eq!(legend[1].end_color, Rgba::new(200, 200, 200, 255));
    }

    #[test]
    fn legend_serializes_camel_case() {
        let legend = serde_json::to_value(two_band(Boundary::UpperInclusive).legend()).unwrap();
        assert_eq!(legend[0]["level"], "a");
        assert_eq!(legend[0]["end"], 0.5);
        assert_eq!(
            legend[1]["endColor"],
            serde_json::json!({ "r": 200, "g": 200, "b": 200, "a": 255 })
        );
    }

    #[test]
    fn scale_survives_json() {
        let scale = two_band(Boundary::UpperInclusive);
        let json = serde_json::to_string(&scale).unwrap();
        assert!(json.contains("\"upperInclusive\""));
        let back: ColorScale<char> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, scale);
    }
}
