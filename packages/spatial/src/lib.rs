#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial densification and smoothing of sparse risk data.
//!
//! Turns a handful of per-county scenario values into dense, renderable
//! surfaces: inverse-distance-weighted estimation at arbitrary points
//! ([`interpolate`]), adaptive grid densification inside a region
//! ([`densify`]), separable Gaussian smoothing of rasters ([`smooth`]),
//! plus the raster, mesh, and synthetic terrain helpers built on top.
//!
//! Every operation is a pure function over its inputs. Distances are
//! planar degrees throughout.

pub mod densify;
pub mod interpolate;
pub mod mesh;
pub mod progress;
pub mod raster;
pub mod region;
pub mod smooth;
pub mod terrain;

pub use envrisk_spatial_models::{
    BoundingBox, LonLat, RiskBreakdown, RiskFactor, RiskWeights, ScalarSample,
};

use thiserror::Error;

/// Errors that can occur during spatial operations.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// The operation cannot proceed with the given input (e.g.
    /// interpolating against an empty sample set).
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what went wrong.
        message: String,
    },

    /// A raster's value buffer does not match its declared dimensions.
    #[error("Shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch {
        /// `width * height`, saturated at `usize::MAX` on overflow.
        expected: usize,
        /// Actual buffer length.
        actual: usize,
    },
}

impl SpatialError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Number of cells in a `width × height` grid.
pub(crate) fn cell_count(width: usize, height: usize) -> Result<usize, SpatialError> {
    width.checked_mul(height).ok_or_else(|| {
        SpatialError::invalid(format!("grid of {width}x{height} cells overflows usize"))
    })
}

/// Checks that a buffer of `len` values fills a `width × height` grid and
/// returns the cell count. A shape whose product overflows can never match.
pub(crate) const fn check_shape(
    len: usize,
    width: usize,
    height: usize,
) -> Result<usize, SpatialError> {
    let expected = width.saturating_mul(height);
    if len == expected {
        Ok(expected)
    } else {
        Err(SpatialError::ShapeMismatch {
            expected,
            actual: len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_count_rejects_overflow() {
        assert_eq!(cell_count(3, 4).unwrap(), 12);
        assert!(matches!(
            cell_count(usize::MAX, 2),
            Err(SpatialError::InvalidInput { .. })
        ));
    }

    #[test]
    fn overflowing_shape_never_matches() {
        assert!(matches!(
            check_shape(0, usize::MAX, 2),
            Err(SpatialError::ShapeMismatch {
                expected: usize::MAX,
                actual: 0
            })
        ));
        assert_eq!(check_shape(0, 0, usize::MAX).unwrap(), 0);
    }
}
