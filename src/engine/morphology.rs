//! Distance-based operations on the working grid: signed buffering of
//! cell-traced areas and the Euclidean distance transform.

use crate::error::Result;
use crate::geometry::AreaSet;
use crate::raster::{is_nodata, Raster};
use crate::region::Region;
use log::debug;
use ndarray::Array2;
use rayon::prelude::*;

// Stand-in for "infinitely far" in the distance transform; finite so the
// parabola intersections stay well defined.
const FAR: f64 = 1e30;

const BUFFER_EPSILON: f64 = 1e-9;

/// Distance from the centre of cell `(0, 0)` to the square of the cell
/// `(drow, dcol)` away from it.
fn center_to_cell_distance(drow: isize, dcol: isize, ns_res: f64, ew_res: f64) -> f64 {
    let dx = (dcol.unsigned_abs() as f64 * ew_res - ew_res / 2.0).max(0.0);
    let dy = (drow.unsigned_abs() as f64 * ns_res - ns_res / 2.0).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

/// Whether a cell whose membership equals `target` lies within `distance` of
/// the centre of `(row, col)`. Cells outside the grid count as not covered.
fn any_within(
    cells: &Array2<bool>,
    row: usize,
    col: usize,
    target: bool,
    distance: f64,
    region: &Region,
) -> bool {
    let (nrows, ncols) = cells.dim();
    let reach_rows = (distance / region.ns_res() + 0.5).ceil() as isize;
    let reach_cols = (distance / region.ew_res() + 0.5).ceil() as isize;

    for dr in -reach_rows..=reach_rows {
        for dc in -reach_cols..=reach_cols {
            if center_to_cell_distance(dr, dc, region.ns_res(), region.ew_res()) > distance {
                continue;
            }
            let r = row as isize + dr;
            let c = col as isize + dc;
            let covered = if r < 0 || c < 0 || r >= nrows as isize || c >= ncols as isize {
                false
            } else {
                cells[[r as usize, c as usize]]
            };
            if covered == target {
                return true;
            }
        }
    }
    false
}

/// Grow (`distance > 0`) or shrink (`distance < 0`) an area.
///
/// Growing adds every cell whose centre lies within `distance` of the area.
/// Shrinking keeps only the cells whose centre lies farther than `|distance|`
/// from anything outside the area, the outside of the region included.
pub fn buffer(area: &AreaSet, distance: f64) -> Result<AreaSet> {
    let region = area.region();
    let cells = area.cells();
    let (nrows, ncols) = region.shape();

    if distance == 0.0 {
        return Ok(area.clone());
    }

    let grow = distance > 0.0;
    let reach = distance.abs();

    let rows: Vec<Vec<bool>> = (0..nrows)
        .into_par_iter()
        .map(|row| {
            (0..ncols)
                .map(|col| {
                    let inside = cells[[row, col]];
                    if grow {
                        inside || any_within(cells, row, col, true, reach + BUFFER_EPSILON, region)
                    } else {
                        inside && !any_within(cells, row, col, false, reach - BUFFER_EPSILON, region)
                    }
                })
                .collect()
        })
        .collect();

    let flat: Vec<bool> = rows.into_iter().flatten().collect();
    let buffered = AreaSet::new(region.clone(), Array2::from_shape_vec((nrows, ncols), flat)?)?;
    debug!(
        "Buffer {:+}: {} -> {} cells",
        distance,
        area.cell_count(),
        buffered.cell_count()
    );
    Ok(buffered)
}

/// Squared 1-D Euclidean distance transform of a sampled function
/// (Felzenszwalb & Huttenlocher), with samples `spacing` apart.
fn squared_distance_1d(f: &[f64], spacing: f64) -> Vec<f64> {
    let n = f.len();
    let mut out = vec![FAR; n];
    if n == 0 {
        return out;
    }

    let pos = |i: usize| i as f64 * spacing;
    let mut hull = vec![0usize; n];
    let mut bounds = vec![0.0f64; n + 1];
    let mut k = 0usize;
    bounds[0] = f64::NEG_INFINITY;
    bounds[1] = f64::INFINITY;

    for q in 1..n {
        loop {
            let v = hull[k];
            let s = ((f[q] + pos(q) * pos(q)) - (f[v] + pos(v) * pos(v))) / (2.0 * (pos(q) - pos(v)));
            if s <= bounds[k] && k > 0 {
                k -= 1;
                continue;
            }
            if s <= bounds[k] {
                // k == 0: the new parabola dominates everything so far.
                hull[0] = q;
                bounds[1] = f64::INFINITY;
            } else {
                k += 1;
                hull[k] = q;
                bounds[k] = s;
                bounds[k + 1] = f64::INFINITY;
            }
            break;
        }
    }

    let mut k = 0usize;
    for (q, slot) in out.iter_mut().enumerate() {
        while bounds[k + 1] < pos(q) {
            k += 1;
        }
        let v = hull[k];
        let d = pos(q) - pos(v);
        *slot = d * d + f[v];
    }
    out
}

/// Euclidean distance, in map units, from each cell centre to the nearest
/// valid cell centre of `raster`. Valid cells get 0. If the raster has no
/// valid cell at all, every cell is no-data.
pub fn distance_transform(raster: &Raster) -> Result<Raster> {
    let region = raster.region();
    let (nrows, ncols) = region.shape();

    if raster.valid_count() == 0 {
        return Ok(Raster::empty(region.clone()));
    }

    let mut grid = raster.data().mapv(|v| if is_nodata(v) { FAR } else { 0.0 });

    // Columns first, north-south spacing.
    let columns: Vec<Vec<f64>> = (0..ncols)
        .into_par_iter()
        .map(|col| {
            let column: Vec<f64> = grid.column(col).to_vec();
            squared_distance_1d(&column, region.ns_res())
        })
        .collect();
    for (col, values) in columns.into_iter().enumerate() {
        for (row, v) in values.into_iter().enumerate() {
            grid[[row, col]] = v;
        }
    }

    // Then rows, east-west spacing.
    let rows: Vec<Vec<f64>> = (0..nrows)
        .into_par_iter()
        .map(|row| {
            let line: Vec<f64> = grid.row(row).to_vec();
            squared_distance_1d(&line, region.ew_res())
                .into_iter()
                .map(f64::sqrt)
                .collect()
        })
        .collect();

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let data = Array2::from_shape_vec((nrows, ncols), flat)?;
    Raster::new(region.clone(), data)
}
