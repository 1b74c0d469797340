//! Triangle mesh generation from rasters.

use envrisk_spatial_models::{LonLat, ScalarSample};
use serde::{Deserialize, Serialize};

use crate::{SpatialError, check_shape};
use crate::raster::RasterGrid;

/// Approximate metres per degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Default vertical exaggeration applied to normalized values.
pub const DEFAULT_ELEVATION_MULTIPLIER: f64 = 8000.0;

/// A heightfield triangulated for rendering.
///
/// Positions are metre offsets from the first grid cell; `z` is the cell
/// value times the elevation multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeightfieldMesh {
    pub positions: Vec<[f64; 3]>,
    /// Area-weighted vertex normals, unit length.
    pub normals: Vec<[f64; 3]>,
    pub tex_coords: Vec<[f64; 2]>,
    pub indices: Vec<[u32; 3]>,
    pub grid_width: usize,
    pub grid_height: usize,
    pub origin: LonLat,
    pub cell_size: LonLat,
}

impl HeightfieldMesh {
    /// Meshes a raster.
    ///
    /// # Errors
    ///
    /// See [`HeightfieldMesh::from_samples`].
    pub fn build(grid: &RasterGrid, elevation_multiplier: f64) -> Result<Self, SpatialError> {
        Self::from_samples(
            &grid.samples(),
            grid.width(),
            grid.height(),
            elevation_multiplier,
        )
    }

    /// Meshes samples laid out row-major on a `width × height` grid, rows
    /// running south to north.
    ///
    /// # Errors
    ///
    /// * [`SpatialError::ShapeMismatch`] if `samples.len() != width * height`
    /// * [`SpatialError::InvalidInput`] if the grid is empty or has more
    ///   vertices than a `u32` index can address
    #[allow(clippy::cast_precision_loss)]
    pub fn from_samples(
        samples: &[ScalarSample],
        width: usize,
        height: usize,
        elevation_multiplier: f64,
    ) -> Result<Self, SpatialError> {
        let expected = check_shape(samples.len(), width, height)?;
        if expected == 0 {
            return Err(SpatialError::invalid("cannot mesh an empty grid"));
        }
        let vertex_count = u32::try_from(expected).map_err(|_| {
            SpatialError::invalid(format!("{expected} vertices exceed u32 index range"))
        })?;

        let origin = samples[0].position;
        let last_row_first = samples[(height - 1) * width].position;
        let first_row_last = samples[width - 1].position;
        let cell_size = LonLat::new(
            (first_row_last.lon - origin.lon) / (width.saturating_sub(1).max(1)) as f64,
            (last_row_first.lat - origin.lat) / (height.saturating_sub(1).max(1)) as f64,
        );

        let meters_per_degree_lon = METERS_PER_DEGREE * origin.lat.to_radians().cos();
        let fraction = |i: usize, n: usize| if n <= 1 { 0.0 } else { i as f64 / (n - 1) as f64 };

        let mut positions = Vec::with_capacity(expected);
        let mut tex_coords = Vec::with_capacity(expected);
        for (i, s) in samples.iter().enumerate() {
            let (x, y) = (i % width, i / width);
            positions.push([
                (s.position.lon - origin.lon) * meters_per_degree_lon,
                (s.position.lat - origin.lat) * METERS_PER_DEGREE,
                s.value * elevation_multiplier,
            ]);
            tex_coords.push([fraction(x, width), fraction(y, height)]);
        }

        let indices = triangulate(width, height);
        let normals = vertex_normals(&positions, &indices);

        log::debug!(
            "Built heightfield mesh: {vertex_count} vertices, {} triangles",
            indices.len()
        );

        Ok(Self {
            positions,
            normals,
            tex_coords,
            indices,
            grid_width: width,
            grid_height: height,
            origin,
            cell_size,
        })
    }
}

/// Two counter-clockwise triangles per grid quad. Callers guarantee
/// `width * height` fits in `u32`.
#[allow(clippy::cast_possible_truncation)]
fn triangulate(width: usize, height: usize) -> Vec<[u32; 3]> {
    let quads = width.saturating_sub(1) * height.saturating_sub(1);
    let mut indices = Vec::with_capacity(quads * 2);
    for y in 0..height.saturating_sub(1) {
        for x in 0..width.saturating_sub(1) {
            let i0 = (y * width + x) as u32;
            let i1 = i0 + 1;
            let i2 = i0 + width as u32;
            let i3 = i2 + 1;
            indices.push([i0, i1, i2]);
            indices.push([i1, i3, i2]);
        }
    }
    indices
}

fn vertex_normals(positions: &[[f64; 3]], indices: &[[u32; 3]]) -> Vec<[f64; 3]> {
    let mut normals = vec![[0.0; 3]; positions.len()];

    for tri in indices {
        let [a, b, c] = tri.map(|i| positions[i as usize]);
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let face = [
            u[1].mul_add(v[2], -(u[2] * v[1])),
            u[2].mul_add(v[0], -(u[0] * v[2])),
            u[0].mul_add(v[1], -(u[1] * v[0])),
        ];
        for i in tri {
            let n = &mut normals[*i as usize];
            n[0] += face[0];
            n[1] += face[1];
            n[2] += face[2];
        }
    }

    for n in &mut normals {
        let len = n[2].mul_add(n[2], n[0].mul_add(n[0], n[1] * n[1])).sqrt();
        *n = if len > 0.0 {
            [n[0] / len, n[1] / len, n[2] / len]
        } else {
            [0.0, 0.0, 1.0]
        };
    }

    normals
}
