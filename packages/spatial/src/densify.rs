//! Adaptive grid densification.
//!
//! Fills a region with synthetic interpolated points around a sparse set
//! of known samples. The grid step adapts to how far apart the known
//! samples are, so tightly clustered counties get a finer synthetic grid
//! than sparse ones.
//!
//! The known samples are always emitted first and unchanged; densification
//! only ever adds points.

use envrisk_spatial_models::{LonLat, ScalarSample};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::SpatialError;
use crate::interpolate::{IdwParams, estimate_unchecked, validate_params};
use crate::progress::ProgressCallback;
use crate::region::Region;

/// Parameters for [`densify`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensifyParams {
    /// Interpolation parameters used for every synthetic point.
    pub idw: IdwParams,
    /// Upper bound on the grid step, in degrees.
    pub step_cap: f64,
    /// The grid step is the average known-sample spacing divided by this.
    pub spacing_divisor: f64,
    /// Synthetic points whose estimate is not above this are discarded.
    pub noise_threshold: f64,
    /// Candidate rows evaluated per parallel chunk. Evaluation stops at
    /// the first chunk boundary after the target is reached.
    pub chunk_rows: usize,
}

impl Default for DensifyParams {
    fn default() -> Self {
        Self {
            idw: IdwParams::default(),
            step_cap: 0.05,
            spacing_divisor: 8.0,
            noise_threshold: 0.01,
            chunk_rows: 16,
        }
    }
}

/// Returns `known` plus interpolated points filling `region`, up to about
/// `target_point_count` points in total.
///
/// Candidates are walked row by row (south to north, west to east). A
/// candidate is skipped when it lies within half a step of a known sample
/// on both axes, when it falls outside `region`, or when its estimate is
/// at or below the noise threshold.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidInput`] if the parameters or region
/// bounds are unusable.
pub fn densify(
    known: &[ScalarSample],
    region: &dyn Region,
    target_point_count: usize,
    params: &DensifyParams,
    progress: &dyn ProgressCallback,
) -> Result<Vec<ScalarSample>, SpatialError> {
    validate(region, params)?;

    if known.is_empty() {
        return Ok(Vec::new());
    }

    let mut output = known.to_vec();
    let additional = target_point_count.saturating_sub(known.len());
    if additional == 0 {
        log::debug!(
            "Target of {target_point_count} points already met by {} known samples",
            known.len()
        );
        return Ok(output);
    }

    let average = average_pairwise_distance(known);
    let step = grid_step(average, params);
    log::info!(
        "Average sample spacing: {}, using grid step {step:.4} degrees",
        average.map_or_else(|| "n/a".to_string(), |d| format!("{d:.4}")),
    );

    let grid = CandidateGrid::new(region, step);
    progress.set_total(grid.rows as u64);
    progress.set_message(format!("Densifying {} candidate rows", grid.rows));

    let chunk_rows = params.chunk_rows.max(1);
    let mut added = 0usize;

    'chunks: for chunk_start in (0..grid.rows).step_by(chunk_rows) {
        let chunk_end = (chunk_start + chunk_rows).min(grid.rows);
        let quota = additional - added;

        let rows: Vec<Vec<ScalarSample>> = (chunk_start..chunk_end)
            .into_par_iter()
            .map(|row| evaluate_row(&grid, row, known, region, params, quota))
            .collect();

        progress.inc((chunk_end - chunk_start) as u64);

        for sample in rows.into_iter().flatten() {
            output.push(sample);
            added += 1;
            if added >= additional {
                break 'chunks;
            }
        }

        log::debug!("Processed {chunk_end}/{} rows, {added} points added", grid.rows);
    }

    progress.finish(format!("Added {added} interpolated points"));
    log::info!(
        "Generated {} total points ({added} interpolated)",
        output.len()
    );

    Ok(output)
}

fn validate(region: &dyn Region, params: &DensifyParams) -> Result<(), SpatialError> {
    validate_params(&params.idw)?;

    if !region.bounds().is_valid() {
        return Err(SpatialError::invalid(format!(
            "region bounds must have positive extent, got {:?}",
            region.bounds()
        )));
    }
    if !(params.step_cap.is_finite() && params.step_cap > 0.0) {
        return Err(SpatialError::invalid(format!(
            "step cap must be positive, got {}",
            params.step_cap
        )));
    }
    if !(params.spacing_divisor.is_finite() && params.spacing_divisor > 0.0) {
        return Err(SpatialError::invalid(format!(
            "spacing divisor must be positive, got {}",
            params.spacing_divisor
        )));
    }
    Ok(())
}

/// Mean planar distance over every unordered pair of samples, or `None`
/// with fewer than two samples.
#[allow(clippy::cast_precision_loss)]
fn average_pairwise_distance(samples: &[ScalarSample]) -> Option<f64> {
    let mut total = 0.0;
    let mut pairs = 0usize;

    for (i, a) in samples.iter().enumerate() {
        for b in &samples[i + 1..] {
            total += a.position.planar_distance(&b.position);
            pairs += 1;
        }
    }

    (pairs > 0).then(|| total / pairs as f64)
}

/// `min(average / divisor, cap)`, falling back to the cap when the spacing
/// is unknown or degenerate (all samples coincident).
fn grid_step(average: Option<f64>, params: &DensifyParams) -> f64 {
    average
        .map(|d| (d / params.spacing_divisor).min(params.step_cap))
        .filter(|step| step.is_finite() && *step > 0.0)
        .unwrap_or(params.step_cap)
}

/// Candidate coordinates laid out from the region's south-west corner.
struct CandidateGrid {
    south: f64,
    west: f64,
    step: f64,
    rows: usize,
    cols: usize,
}

impl CandidateGrid {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn new(region: &dyn Region, step: f64) -> Self {
        let bounds = region.bounds();
        // The small slack keeps the far edge when the extent is an exact
        // multiple of the step.
        let count = |extent: f64| (extent / step + 1e-9).floor() as usize + 1;
        Self {
            south: bounds.south,
            west: bounds.west,
            step,
            rows: count(bounds.height()),
            cols: count(bounds.width()),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn point(&self, row: usize, col: usize) -> LonLat {
        LonLat::new(
            self.step.mul_add(col as f64, self.west),
            self.step.mul_add(row as f64, self.south),
        )
    }
}

/// Synthetic points of one candidate row, west to east. At most `quota`
/// points are produced; the rest of the row is never evaluated.
fn evaluate_row(
    grid: &CandidateGrid,
    row: usize,
    known: &[ScalarSample],
    region: &dyn Region,
    params: &DensifyParams,
    quota: usize,
) -> Vec<ScalarSample> {
    let half_step = grid.step * 0.5;

    (0..grid.cols)
        .filter_map(|col| {
            let candidate = grid.point(row, col);

            let too_close = known.iter().any(|k| {
                (k.position.lat - candidate.lat).abs() < half_step
                    && (k.position.lon - candidate.lon).abs() < half_step
            });
            if too_close || !region.contains(candidate) {
                return None;
            }

            let value = estimate_unchecked(candidate, known, &params.idw);
            (value > params.noise_threshold).then_some(ScalarSample {
                position: candidate,
                value,
            })
        })
        .take(quota)
        .collect()
}

#[cfg(test)]
mod tests {
    use envrisk_spatial_models::BoundingBox;

    use super::*;
    use crate::progress::NullProgress;
    use crate::region::PredicateRegion;

    fn king_county_samples() -> Vec<ScalarSample> {
        vec![
            ScalarSample::new(-122.33, 47.61, 0.9),
            ScalarSample::new(-122.20, 47.48, 0.6),
            ScalarSample::new(-121.90, 47.35, 0.3),
            ScalarSample::new(-121.60, 47.70, 0.2),
        ]
    }

    #[test]
    fn empty_known_samples_yield_empty_output() {
        let out = densify(
            &[],
            &BoundingBox::KING_COUNTY,
            1000,
            &DensifyParams::default(),
            &NullProgress,
        )
        .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn output_starts_with_every_known_sample() {
        let known = king_county_samples();
        let out = densify(
            &known,
            &BoundingBox::KING_COUNTY,
            2000,
            &DensifyParams::default(),
            &NullProgress,
        )
        .unwrap();

        assert!(out.len() > known.len());
        assert_eq!(&out[..known.len()], known.as_slice());
    }

    #[test]
    fn keeps_known_samples_outside_region() {
        let mut known = king_county_samples();
        known.push(ScalarSample::new(-80.0, 35.0, 0.5));
        let out = densify(
            &known,
            &BoundingBox::KING_COUNTY,
            500,
            &DensifyParams::default(),
            &NullProgress,
        )
        .unwrap();
        assert!(out.contains(&known[4]));
    }

    #[test]
    fn never_exceeds_target() {
        let known = king_county_samples();
        let out = densify(
            &known,
            &BoundingBox::KING_COUNTY,
            50,
            &DensifyParams::default(),
            &NullProgress,
        )
        .unwrap();
        assert_eq!(out.len(), 50);
    }

    #[test]
    fn target_below_known_count_returns_known_only() {
        let known = king_county_samples();
        let out = densify(
            &known,
            &BoundingBox::KING_COUNTY,
            2,
            &DensifyParams::default(),
            &NullProgress,
        )
        .unwrap();
        assert_eq!(out, known);
    }

    #[test]
    fn synthetic_points_respect_region_threshold_and_spacing() {
        let known = king_county_samples();
        let region = PredicateRegion::new(BoundingBox::KING_COUNTY, |p: LonLat| p.lon < -122.0);
        let params = DensifyParams::default();
        let out = densify(&known, &region, 10_000, &params, &NullProgress).unwrap();

        let step = grid_step(average_pairwise_distance(&known), &params);
        for s in &out[known.len()..] {
            assert!(region.contains(s.position), "{s:?} outside region");
            assert!(s.value > params.noise_threshold);
            assert!(s.value <= 1.0);
            assert!(!known.iter().any(|k| {
                (k.position.lat - s.position.lat).abs() < step * 0.5
                    && (k.position.lon - s.position.lon).abs() < step * 0.5
            }));
        }
    }

    #[test]
    fn step_adapts_to_spacing_and_is_capped() {
        let params = DensifyParams::default();
        assert!((grid_step(Some(0.08), &params) - 0.01).abs() < 1e-12);
        assert!((grid_step(Some(4.0), &params) - 0.05).abs() < 1e-12);
        assert!((grid_step(None, &params) - 0.05).abs() < 1e-12);
        assert!((grid_step(Some(0.0), &params) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn result_is_independent_of_chunk_size() {
        let known = king_county_samples();
        let small = DensifyParams {
            chunk_rows: 1,
            ..DensifyParams::default()
        };
        let large = DensifyParams {
            chunk_rows: 64,
            ..DensifyParams::default()
        };
        let a = densify(&known, &BoundingBox::KING_COUNTY, 800, &small, &NullProgress).unwrap();
        let b = densify(&known, &BoundingBox::KING_COUNTY, 800, &large, &NullProgress).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn row_stops_at_quota() {
        let known = vec![ScalarSample::new(-122.0, 47.4, 0.8)];
        let params = DensifyParams::default();
        let region = BoundingBox::KING_COUNTY;
        let grid = CandidateGrid::new(&region, 0.001);

        let full = evaluate_row(&grid, 10, &known, &region, &params, usize::MAX);
        assert!(full.len() > 3);

        let limited = evaluate_row(&grid, 10, &known, &region, &params, 3);
        assert_eq!(limited, full[..3]);
        assert!(evaluate_row(&grid, 10, &known, &region, &params, 0).is_empty());
    }

    #[test]
    fn single_known_sample_uses_step_cap() {
        let known = vec![ScalarSample::new(-122.0, 47.4, 0.8)];
        let out = densify(
            &known,
            &BoundingBox::KING_COUNTY,
            100,
            &DensifyParams::default(),
            &NullProgress,
        )
        .unwrap();
        assert_eq!(out[0], known[0]);
        assert!(out.len() > 1);
    }
}
