//! Separable Gaussian smoothing of row-major rasters.
//!
//! Each pass convolves every row with a normalized 1-D kernel, then every
//! column. Samples beyond the raster edge replicate the nearest edge cell,
//! so a uniform raster comes back unchanged.

use rayon::prelude::*;

use crate::{SpatialError, check_shape};

/// Builds a normalized 1-D Gaussian kernel of radius `max(1, ceil(3 * sigma))`.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidInput`] if `sigma` is not finite and
/// positive.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn gaussian_kernel(sigma: f64) -> Result<Vec<f64>, SpatialError> {
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(SpatialError::invalid(format!(
            "sigma must be finite and positive, got {sigma}"
        )));
    }

    let radius = ((sigma * 3.0).ceil() as usize).max(1);
    let two_s2 = 2.0 * sigma * sigma;

    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let offset = i.abs_diff(radius) as f64;
            (-(offset * offset) / two_s2).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }

    Ok(kernel)
}

/// Blurs `raster` (`width * height` values, row-major) with a Gaussian of
/// standard deviation `sigma` cells, repeated `passes` times.
///
/// Output values are not clamped. Zero passes returns a copy.
///
/// # Errors
///
/// * [`SpatialError::ShapeMismatch`] if `raster.len() != width * height`
/// * [`SpatialError::InvalidInput`] if `sigma` is not finite and positive
pub fn smooth(
    raster: &[f64],
    width: usize,
    height: usize,
    sigma: f64,
    passes: usize,
) -> Result<Vec<f64>, SpatialError> {
    let expected = check_shape(raster.len(), width, height)?;

    let kernel = gaussian_kernel(sigma)?;
    let mut current = raster.to_vec();
    if expected == 0 {
        return Ok(current);
    }

    let mut scratch = vec![0.0; expected];
    for _ in 0..passes {
        convolve_rows(&current, &mut scratch, width, &kernel);
        convolve_columns(&scratch, &mut current, width, height, &kernel);
    }

    log::trace!("Smoothed {width}x{height} raster (sigma {sigma}, {passes} passes)");

    Ok(current)
}

fn clamped(index: usize, offset: usize, radius: usize, len: usize) -> usize {
    (index + offset).saturating_sub(radius).min(len - 1)
}

fn convolve_rows(src: &[f64], dst: &mut [f64], width: usize, kernel: &[f64]) {
    let radius = kernel.len() / 2;
    dst.par_chunks_mut(width)
        .zip(src.par_chunks(width))
        .for_each(|(out, row)| {
            for (x, cell) in out.iter_mut().enumerate() {
                *cell = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| row[clamped(x, k, radius, width)] * w)
                    .sum();
            }
        });
}

fn convolve_columns(src: &[f64], dst: &mut [f64], width: usize, height: usize, kernel: &[f64]) {
    let radius = kernel.len() / 2;
    dst.par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out)| {
            for (x, cell) in out.iter_mut().enumerate() {
                *cell = kernel
                    .iter()
                    .enumerate()
                    .map(|(k, w)| src[clamped(y, k, radius, height) * width + x] * w)
                    .sum();
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let kernel = gaussian_kernel(1.5).unwrap();
        assert_eq!(kernel.len(), 2 * 5 + 1);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        for i in 0..kernel.len() / 2 {
            assert!((kernel[i] - kernel[kernel.len() - 1 - i]).abs() < 1e-15);
        }
        assert!(kernel[5] > kernel[4]);
    }

    #[test]
    fn small_sigma_still_has_radius_one() {
        assert_eq!(gaussian_kernel(0.1).unwrap().len(), 3);
    }

    #[test]
    fn constant_raster_is_unchanged() {
        let raster = vec![0.42; 7 * 5];
        let out = smooth(&raster, 7, 5, 2.0, 3).unwrap();
        assert_eq!(out.len(), raster.len());
        for v in out {
            assert!((v - 0.42).abs() < 1e-12);
        }
    }

    #[test]
    fn spike_spreads_and_preserves_mass_away_from_edges() {
        let (w, h) = (21, 21);
        let mut raster = vec![0.0; w * h];
        raster[10 * w + 10] = 1.0;
        let out = smooth(&raster, w, h, 1.0, 1).unwrap();

        assert!(out[10 * w + 10] < 1.0);
        assert!(out[10 * w + 11] > 0.0);
        assert!((out[10 * w + 9] - out[10 * w + 11]).abs() < 1e-15);
        assert!((out.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn edges_are_not_darkened() {
        let (w, h) = (6, 4);
        let raster: Vec<f64> = (0..w * h).map(|i| if i % w == 0 { 1.0 } else { 0.5 }).collect();
        let out = smooth(&raster, w, h, 1.0, 1).unwrap();
        // With zero padding the left edge would fall well below 0.5.
        for y in 0..h {
            assert!(out[y * w] > 0.5);
        }
    }

    #[test]
    fn mismatched_shape_is_rejected() {
        let err = smooth(&[0.0; 10], 3, 3, 1.0, 1).unwrap_err();
        assert!(matches!(
            err,
            SpatialError::ShapeMismatch {
                expected: 9,
                actual: 10
            }
        ));
    }

    #[test]
    fn overflowing_shape_is_a_mismatch() {
        let err = smooth(&[], usize::MAX, 2, 1.0, 1).unwrap_err();
        assert!(matches!(
            err,
            SpatialError::ShapeMismatch {
                expected: usize::MAX,
                actual: 0
            }
        ));
    }

    #[test]
    fn zero_passes_returns_copy() {
        let raster = vec![0.1, 0.9, 0.3, 0.7];
        assert_eq!(smooth(&raster, 2, 2, 1.0, 0).unwrap(), raster);
    }

    #[test]
    fn non_positive_sigma_is_invalid() {
        assert!(matches!(
            smooth(&[0.0; 4], 2, 2, 0.0, 1),
            Err(SpatialError::InvalidInput { .. })
        ));
    }
}
