//! Dense row-major rasters over a uniform lon/lat grid.

use std::collections::BTreeMap;

use envrisk_spatial_models::{BoundingBox, LonLat, ScalarSample};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{SpatialError, cell_count, check_shape};
use crate::smooth::smooth;

/// Coordinates are matched to six decimal places (about 10 cm) when
/// snapping samples onto a grid.
const COORDINATE_SCALE: f64 = 1e6;

/// A `width × height` grid of values. Row 0 is the southern edge; within a
/// row, column 0 is the western edge. The first cell sits at `origin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterGrid {
    width: usize,
    height: usize,
    origin: LonLat,
    /// Spacing between adjacent cells (`lon` = column step, `lat` = row step).
    cell_size: LonLat,
    values: Vec<f64>,
}

impl RasterGrid {
    /// Wraps an existing value buffer.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::ShapeMismatch`] if `values.len()` is not
    /// `width * height`.
    pub fn from_values(
        width: usize,
        height: usize,
        origin: LonLat,
        cell_size: LonLat,
        values: Vec<f64>,
    ) -> Result<Self, SpatialError> {
        check_shape(values.len(), width, height)?;
        Ok(Self {
            width,
            height,
            origin,
            cell_size,
            values,
        })
    }

    /// Samples `f` at every cell of a grid spanning `bounds` edge to edge.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidInput`] if either dimension is zero or
    /// the bounds are degenerate.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_fn<F>(
        bounds: &BoundingBox,
        width: usize,
        height: usize,
        f: F,
    ) -> Result<Self, SpatialError>
    where
        F: Fn(LonLat) -> f64 + Sync,
    {
        if !bounds.is_valid() {
            return Err(SpatialError::invalid(format!(
                "raster bounds must have positive extent, got {bounds:?}"
            )));
        }
        let step = |extent: f64, n: usize| if n > 1 { extent / (n - 1) as f64 } else { 0.0 };
        let cell_size = LonLat::new(step(bounds.width(), width), step(bounds.height(), height));

        Self::from_origin_fn(
            LonLat::new(bounds.west, bounds.south),
            cell_size,
            width,
            height,
            f,
        )
    }

    /// Samples `f` on a grid starting at `origin` with the given spacing.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidInput`] if either dimension is zero or
    /// the cell count overflows.
    pub fn from_origin_fn<F>(
        origin: LonLat,
        cell_size: LonLat,
        width: usize,
        height: usize,
        f: F,
    ) -> Result<Self, SpatialError>
    where
        F: Fn(LonLat) -> f64 + Sync,
    {
        if width == 0 || height == 0 {
            return Err(SpatialError::invalid(format!(
                "raster dimensions must be non-zero, got {width}x{height}"
            )));
        }

        let cells = cell_count(width, height)?;

        let mut grid = Self {
            width,
            height,
            origin,
            cell_size,
            values: Vec::new(),
        };
        grid.values = (0..cells)
            .into_par_iter()
            .map(|i| f(grid.position(i % width, i / width)))
            .collect();

        Ok(grid)
    }

    /// Snaps a regularly spaced sample set onto a grid.
    ///
    /// Rows are the sorted unique latitudes, columns the sorted unique
    /// longitudes. Values are min-max normalised into `[0, 1]`; cells with
    /// no sample are 0. When several samples share a coordinate the last
    /// one wins.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidInput`] if `samples` is empty.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn from_samples(samples: &[ScalarSample]) -> Result<Self, SpatialError> {
        if samples.is_empty() {
            return Err(SpatialError::invalid("cannot build a raster from zero samples"));
        }

        let key = |v: f64| (v * COORDINATE_SCALE).round() as i64;

        let mut lats = BTreeMap::new();
        let mut lons = BTreeMap::new();
        let mut by_cell = BTreeMap::new();
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for s in samples {
            let (lat, lon) = (key(s.position.lat), key(s.position.lon));
            lats.entry(lat).or_insert(s.position.lat);
            lons.entry(lon).or_insert(s.position.lon);
            by_cell.insert((lat, lon), s.value);
            min = min.min(s.value);
            max = max.max(s.value);
        }

        let range = if max > min { max - min } else { 1.0 };
        let lat_keys: Vec<i64> = lats.keys().copied().collect();
        let lon_keys: Vec<i64> = lons.keys().copied().collect();

        let mut values = Vec::with_capacity(lat_keys.len() * lon_keys.len());
        for lat in &lat_keys {
            for lon in &lon_keys {
                values.push(
                    by_cell
                        .get(&(*lat, *lon))
                        .map_or(0.0, |v| (v - min) / range),
                );
            }
        }

        let first_last = |m: &BTreeMap<i64, f64>| {
            let first = m.values().next().copied().unwrap_or_default();
            let last = m.values().next_back().copied().unwrap_or_default();
            let step = if m.len() > 1 {
                (last - first) / (m.len() - 1) as f64
            } else {
                0.0
            };
            (first, step)
        };
        let (origin_lat, lat_step) = first_last(&lats);
        let (origin_lon, lon_step) = first_last(&lons);

        log::debug!(
            "Snapped {} samples onto a {}x{} grid",
            samples.len(),
            lon_keys.len(),
            lat_keys.len()
        );

        Self::from_values(
            lon_keys.len(),
            lat_keys.len(),
            LonLat::new(origin_lon, origin_lat),
            LonLat::new(lon_step, lat_step),
            values,
        )
    }

    /// Returns a Gaussian-smoothed copy with values clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidInput`] if `sigma` is not positive.
    pub fn smoothed(&self, sigma: f64, passes: usize) -> Result<Self, SpatialError> {
        let values = smooth(&self.values, self.width, self.height, sigma, passes)?
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0))
            .collect();
        Ok(Self {
            values,
            ..self.clone()
        })
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub const fn origin(&self) -> LonLat {
        self.origin
    }

    #[must_use]
    pub const fn cell_size(&self) -> LonLat {
        self.cell_size
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Value at column `x`, row `y`.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        (x < self.width && y < self.height).then(|| self.values[y * self.width + x])
    }

    /// Geographic position of column `x`, row `y`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position(&self, x: usize, y: usize) -> LonLat {
        LonLat::new(
            self.cell_size.lon.mul_add(x as f64, self.origin.lon),
            self.cell_size.lat.mul_add(y as f64, self.origin.lat),
        )
    }

    /// Every cell as a sample, in row-major order.
    #[must_use]
    pub fn samples(&self) -> Vec<ScalarSample> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &value)| ScalarSample {
                position: self.position(i % self.width, i / self.width),
                value,
            })
            .collect()
    }
}
