//! Synthetic composite risk terrain.
//!
//! Each risk factor is modelled as a sum of Gaussian hotspots around known
//! pollution sources in King County (highways, the airport, industrial
//! corridors, shorelines). The composite surface is the weighted average
//! of the three factors.

use envrisk_spatial_models::{BoundingBox, LonLat, RiskBreakdown, RiskFactor, RiskWeights};
use serde::{Deserialize, Serialize};

use crate::{SpatialError, cell_count};
use crate::raster::RasterGrid;

/// Default grid resolution per axis.
pub const DEFAULT_RESOLUTION: usize = 100;

/// A Gaussian bump centred on a point.
#[derive(Debug, Clone, Copy)]
struct Hotspot {
    center: LonLat,
    sigma: f64,
    amplitude: f64,
}

const fn hotspot(lon: f64, lat: f64, sigma: f64, amplitude: f64) -> Hotspot {
    Hotspot {
        center: LonLat::new(lon, lat),
        sigma,
        amplitude,
    }
}

const AIR_QUALITY: &[Hotspot] = &[
    // I-5 corridor
    hotspot(-122.3321, 47.6062, 0.05, 0.8),
    // I-405 corridor
    hotspot(-122.2, 47.6, 0.04, 0.7),
    // Georgetown / South Seattle industrial
    hotspot(-122.3, 47.5, 0.06, 0.6),
];

const NOISE: &[Hotspot] = &[
    // SeaTac approach paths
    hotspot(-122.3, 47.45, 0.08, 0.9),
    hotspot(-122.3321, 47.6062, 0.06, 0.7),
    // Downtown
    hotspot(-122.3321, 47.6062, 0.03, 0.8),
    // Boeing Field
    hotspot(-122.3, 47.53, 0.04, 0.6),
];

const FLOOD_CLIMATE: &[Hotspot] = &[
    // Puget Sound shoreline
    hotspot(-122.4, 47.6, 0.1, 0.8),
    // Duwamish
    hotspot(-122.3, 47.5, 0.05, 0.7),
    // Lake Washington
    hotspot(-122.25, 47.6, 0.08, 0.6),
    // Green River valley
    hotspot(-122.2, 47.3, 0.06, 0.5),
];

const fn hotspots(factor: RiskFactor) -> &'static [Hotspot] {
    match factor {
        RiskFactor::AirQuality => AIR_QUALITY,
        RiskFactor::NoisePollution => NOISE,
        RiskFactor::FloodClimate => FLOOD_CLIMATE,
    }
}

/// Score in `[0, 1]` of a single factor at `point`.
#[must_use]
pub fn factor_score(factor: RiskFactor, point: LonLat) -> f64 {
    hotspots(factor)
        .iter()
        .map(|h| {
            let d_lon = point.lon - h.center.lon;
            let d_lat = point.lat - h.center.lat;
            let d2 = d_lon.mul_add(d_lon, d_lat * d_lat);
            h.amplitude * (-d2 / (2.0 * h.sigma * h.sigma)).exp()
        })
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Scores for all three factors at `point`.
#[must_use]
pub fn breakdown_at(point: LonLat) -> RiskBreakdown {
    RiskBreakdown {
        air_quality: factor_score(RiskFactor::AirQuality, point),
        noise_pollution: factor_score(RiskFactor::NoisePollution, point),
        flood_climate: factor_score(RiskFactor::FloodClimate, point),
    }
}

/// A composite risk surface with the per-cell factor scores behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskTerrain {
    pub grid: RasterGrid,
    /// Row-major, parallel to `grid.values()`.
    pub breakdowns: Vec<RiskBreakdown>,
    pub weights: RiskWeights,
}

/// Evaluates the composite risk on a `resolution × resolution` grid whose
/// first cell is the south-west corner of `bounds`. Cells step by
/// `extent / resolution`, so the north and east edges are not sampled.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidInput`] if `resolution` is zero, the cell
/// count overflows, or the bounds are degenerate.
#[allow(clippy::cast_precision_loss)]
pub fn generate_risk_terrain(
    bounds: &BoundingBox,
    resolution: usize,
    weights: &RiskWeights,
) -> Result<RiskTerrain, SpatialError> {
    if resolution == 0 {
        return Err(SpatialError::invalid("terrain resolution must be non-zero"));
    }
    if !bounds.is_valid() {
        return Err(SpatialError::invalid(format!(
            "terrain bounds must have positive extent, got {bounds:?}"
        )));
    }

    let cell_size = LonLat::new(
        bounds.width() / resolution as f64,
        bounds.height() / resolution as f64,
    );
    let origin = LonLat::new(bounds.west, bounds.south);

    let cells = cell_count(resolution, resolution)?;
    let breakdowns: Vec<RiskBreakdown> = (0..cells)
        .map(|i| {
            let (x, y) = ((i % resolution) as f64, (i / resolution) as f64);
            breakdown_at(LonLat::new(
                cell_size.lon.mul_add(x, origin.lon),
                cell_size.lat.mul_add(y, origin.lat),
            ))
        })
        .collect();

    let normalized = weights.normalized();
    let values = breakdowns.iter().map(|b| normalized.composite(b)).collect();
    let grid = RasterGrid::from_values(resolution, resolution, origin, cell_size, values)?;

    log::info!(
        "Generated {resolution}x{resolution} risk terrain (weights {:.2}/{:.2}/{:.2})",
        normalized.air_quality,
        normalized.noise_pollution,
        normalized.flood_climate
    );

    Ok(RiskTerrain {
        grid,
        breakdowns,
        weights: normalized,
    })
}
