//! Inverse distance weighted (IDW) estimation.
//!
//! Estimates a scalar field at a query point from a sparse set of known
//! samples. Near a known sample the value passes through exactly; within
//! the influence radius samples are weighted by a tapered inverse
//! distance; beyond it the closest sample's value decays smoothly instead
//! of dropping to zero.
//!
//! ```text
//! w_i = (1 - d_i / R)^p / (d_i + eps)     for d_i <= R
//! z   = sum(w_i * z_i) / sum(w_i)
//! ```
//!
//! Without a radius the classic Shepard weight `1 / (d_i + eps)^p` is used
//! over every sample.
//!
//! Distances are planar degrees, not geodesic. This is a known
//! approximation at county scale; the constants below are tuned against it.

use envrisk_spatial_models::{LonLat, ScalarSample};
use serde::{Deserialize, Serialize};

use crate::SpatialError;

/// Distance below which the nearest sample's value is returned directly
/// (about 1 km).
pub const ANCHOR_EPSILON: f64 = 0.01;

/// Added to every distance in the weight denominator.
pub const DISTANCE_EPSILON: f64 = 0.01;

/// Added to the closest distance when no sample lies within the radius.
pub const FALLBACK_OFFSET: f64 = 0.1;

/// Parameters for [`estimate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdwParams {
    /// Exponent applied to the distance taper. Higher values localise
    /// influence.
    pub power: f64,
    /// Samples further than this (in degrees) are ignored. `None` means
    /// every sample contributes.
    pub max_influence_radius: Option<f64>,
    /// Exact pass-through distance.
    pub anchor_epsilon: f64,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.0,
            max_influence_radius: Some(0.3),
            anchor_epsilon: ANCHOR_EPSILON,
        }
    }
}

impl IdwParams {
    #[must_use]
    pub const fn new(power: f64, max_influence_radius: Option<f64>) -> Self {
        Self {
            power,
            max_influence_radius,
            anchor_epsilon: ANCHOR_EPSILON,
        }
    }
}

/// Estimates the field value at `query` from `samples`.
///
/// For sample values in `[0, 1]` the result is also in `[0, 1]`: weights
/// are non-negative so the estimate is a convex combination, and the
/// fallback only ever shrinks the closest value.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidInput`] if `samples` is empty or the
/// parameters are not usable (non-finite power, non-positive radius).
pub fn estimate(
    query: LonLat,
    samples: &[ScalarSample],
    params: &IdwParams,
) -> Result<f64, SpatialError> {
    validate_params(params)?;

    let (closest, min_distance) = nearest(query, samples)
        .ok_or_else(|| SpatialError::invalid("cannot interpolate against zero samples"))?;

    Ok(estimate_from_nearest(
        query,
        samples,
        params,
        closest,
        min_distance,
    ))
}

/// Same as [`estimate`], for callers that have already validated the
/// parameters and know `samples` is non-empty. Used by the densifier to
/// avoid re-checking per candidate.
pub(crate) fn estimate_unchecked(
    query: LonLat,
    samples: &[ScalarSample],
    params: &IdwParams,
) -> f64 {
    nearest(query, samples).map_or(0.0, |(closest, d)| {
        estimate_from_nearest(query, samples, params, closest, d)
    })
}

pub(crate) fn validate_params(params: &IdwParams) -> Result<(), SpatialError> {
    if !params.power.is_finite() || params.power < 0.0 {
        return Err(SpatialError::invalid(format!(
            "IDW power must be finite and non-negative, got {}",
            params.power
        )));
    }
    if let Some(radius) = params.max_influence_radius
        && !(radius.is_finite() && radius > 0.0)
    {
        return Err(SpatialError::invalid(format!(
            "influence radius must be positive, got {radius}"
        )));
    }
    if !params.anchor_epsilon.is_finite() || params.anchor_epsilon < 0.0 {
        return Err(SpatialError::invalid(format!(
            "anchor epsilon must be non-negative, got {}",
            params.anchor_epsilon
        )));
    }
    Ok(())
}

/// Finds the sample closest to `query`. Ties keep the first sample.
fn nearest(query: LonLat, samples: &[ScalarSample]) -> Option<(&ScalarSample, f64)> {
    let mut best: Option<(&ScalarSample, f64)> = None;
    for sample in samples {
        let d = query.planar_distance(&sample.position);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((sample, d)),
        }
    }
    best
}

fn estimate_from_nearest(
    query: LonLat,
    samples: &[ScalarSample],
    params: &IdwParams,
    closest: &ScalarSample,
    min_distance: f64,
) -> f64 {
    if min_distance < params.anchor_epsilon {
        return closest.value;
    }

    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for sample in samples {
        let d = query.planar_distance(&sample.position);
        let weight = match params.max_influence_radius {
            Some(radius) if d > radius => continue,
            Some(radius) => (1.0 - d / radius).powf(params.power) / (d + DISTANCE_EPSILON),
            None => 1.0 / (d + DISTANCE_EPSILON).powf(params.power),
        };
        weighted_sum += sample.value * weight;
        weight_sum += weight;
    }

    if weight_sum > 0.0 {
        return weighted_sum / weight_sum;
    }

    // Nothing within the radius (or only samples exactly on its edge,
    // which carry zero weight).
    closest.value * (1.0 / (min_distance + FALLBACK_OFFSET)).min(1.0)
}
