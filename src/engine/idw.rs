//! Inverse distance weighted interpolation.
//!
//! `z(x) = sum(w_i * z_i) / sum(w_i)` with `w_i = 1 / d_i^p`, taken over the
//! `neighbors` samples closest to `x`. A query that coincides with a sample
//! returns that sample's value.

use crate::error::{BlendError, Result};
use crate::geometry::{PointSample, PointSet};
use crate::raster::{Raster, NODATA};
use crate::region::Region;
use log::debug;
use ndarray::Array2;
use rayon::prelude::*;

/// Squared distances below this are treated as an exact hit.
const HIT_TOLERANCE_SQ: f64 = 1e-20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdwParams {
    /// Distance exponent.
    pub power: f64,
    /// Number of nearest samples used per query.
    pub neighbors: usize,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.0,
            neighbors: 50,
        }
    }
}

impl IdwParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.power > 0.0) || !self.power.is_finite() {
            return Err(BlendError::InvalidPower(self.power));
        }
        if self.neighbors == 0 {
            return Err(BlendError::InvalidNeighbors(self.neighbors));
        }
        Ok(())
    }
}

/// Interpolate at one location. `scratch` is reused between calls to avoid
/// reallocating the distance list.
fn interpolate_at(
    samples: &[PointSample],
    x: f64,
    y: f64,
    params: &IdwParams,
    scratch: &mut Vec<(f64, f64)>,
) -> f64 {
    scratch.clear();
    for sample in samples {
        let d2 = sample.distance_squared(x, y);
        if d2 < HIT_TOLERANCE_SQ {
            return sample.value;
        }
        scratch.push((d2, sample.value));
    }

    let k = params.neighbors.min(scratch.len());
    if k < scratch.len() {
        scratch.select_nth_unstable_by(k - 1, |a, b| a.0.total_cmp(&b.0));
        scratch.truncate(k);
    }

    // Weights from squared distances: 1 / d^p == (d^2)^(-p/2).
    let half_power = params.power / 2.0;
    let (weighted, total) = scratch.iter().fold((0.0, 0.0), |(wz, w), &(d2, z)| {
        let weight = d2.powf(-half_power);
        (wz + weight * z, w + weight)
    });

    if total > 0.0 {
        weighted / total
    } else {
        NODATA
    }
}

/// Interpolate a surface covering every cell of `region`.
pub fn interpolate_surface(points: &PointSet, region: &Region, params: &IdwParams) -> Result<Raster> {
    params.validate()?;
    if points.is_empty() {
        return Err(BlendError::InsufficientSamples(0));
    }

    let (nrows, ncols) = region.shape();
    let samples = points.points();
    debug!(
        "IDW over {}x{} cells from {} samples (power={}, neighbors={})",
        ncols,
        nrows,
        samples.len(),
        params.power,
        params.neighbors
    );

    let rows: Vec<Vec<f64>> = (0..nrows)
        .into_par_iter()
        .map(|row| {
            let mut scratch = Vec::with_capacity(samples.len());
            (0..ncols)
                .map(|col| {
                    let (x, y) = region.cell_center(row, col);
                    interpolate_at(samples, x, y, params, &mut scratch)
                })
                .collect()
        })
        .collect();

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let data = Array2::from_shape_vec((nrows, ncols), flat)?;
    Raster::new(region.clone(), data)
}
