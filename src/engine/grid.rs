use super::{idw, morphology, AreaOverlay, GeoEngine, IdwParams, MapExpr, ResampleMethod, SpatialRelation};
use crate::error::{BlendError, Result};
use crate::geometry::{AreaSet, PointSample, PointSet};
use crate::raster::{is_nodata, Raster, NODATA};
use crate::region::Region;
use log::debug;
use ndarray::{Array2, Zip};
use rayon::prelude::*;

/// In-process engine working directly on the cells of the working region.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridEngine;

impl GridEngine {
    pub fn new() -> Self {
        Self
    }
}

fn ensure_same_area_grid(a: &AreaSet, b: &AreaSet) -> Result<()> {
    if a.region().same_grid(b.region()) {
        Ok(())
    } else {
        Err(BlendError::RegionMismatch(
            "areas are traced on different grids".to_string(),
        ))
    }
}

fn zip_cells<F>(a: &Raster, b: &Raster, f: F) -> Result<Raster>
where
    F: Fn(f64, f64) -> f64,
{
    a.ensure_same_grid(b)?;
    let data = Zip::from(a.data()).and(b.data()).map_collect(|&x, &y| f(x, y));
    Raster::new(a.region().clone(), data).map(|r| r.with_projection(a.projection()))
}

impl GeoEngine for GridEngine {
    fn working_region(&self, rasters: &[&Raster]) -> Result<Region> {
        Region::covering(rasters.iter().map(|r| r.region()))
    }

    fn resample(&self, raster: &Raster, region: &Region, method: ResampleMethod) -> Result<Raster> {
        match method {
            ResampleMethod::Nearest => {}
        }
        if raster.region().same_grid(region) {
            return Ok(raster.clone());
        }

        let (nrows, ncols) = region.shape();
        let rows: Vec<Vec<f64>> = (0..nrows)
            .into_par_iter()
            .map(|row| {
                (0..ncols)
                    .map(|col| {
                        let (x, y) = region.cell_center(row, col);
                        raster.value_at(x, y).unwrap_or(NODATA)
                    })
                    .collect()
            })
            .collect();

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let data = Array2::from_shape_vec((nrows, ncols), flat)?;
        debug!(
            "Resampled {}x{} -> {}x{} (nearest)",
            raster.region().cols(),
            raster.region().rows(),
            ncols,
            nrows
        );
        Ok(Raster::new(region.clone(), data)?.with_projection(raster.projection()))
    }

    fn vectorize_area(&self, raster: &Raster) -> Result<AreaSet> {
        let cells = raster.data().mapv(|v| !is_nodata(v));
        AreaSet::new(raster.region().clone(), cells)
    }

    fn vectorize_points(&self, raster: &Raster) -> Result<PointSet> {
        let region = raster.region();
        let points = raster
            .data()
            .indexed_iter()
            .filter(|(_, v)| !is_nodata(**v))
            .map(|((row, col), v)| {
                let (x, y) = region.cell_center(row, col);
                PointSample::new(x, y, *v)
            })
            .collect();
        Ok(points)
    }

    fn overlay(&self, a: &AreaSet, b: &AreaSet, operator: AreaOverlay) -> Result<AreaSet> {
        ensure_same_area_grid(a, b)?;
        let cells = match operator {
            AreaOverlay::Not => Zip::from(a.cells()).and(b.cells()).map_collect(|&x, &y| x && !y),
            AreaOverlay::And => Zip::from(a.cells()).and(b.cells()).map_collect(|&x, &y| x && y),
        };
        AreaSet::new(a.region().clone(), cells)
    }

    fn buffer(&self, area: &AreaSet, distance: f64) -> Result<AreaSet> {
        morphology::buffer(area, distance)
    }

    fn select_by_location(
        &self,
        points: &PointSet,
        area: &AreaSet,
        relation: SpatialRelation,
    ) -> Result<PointSet> {
        let want_inside = relation == SpatialRelation::Overlap;
        Ok(points
            .iter()
            .filter(|p| area.covers(p.x, p.y) == want_inside)
            .copied()
            .collect())
    }

    fn map_algebra(&self, expr: MapExpr<'_>) -> Result<Raster> {
        debug!("Map algebra: {}", expr.name());
        match expr {
            MapExpr::Difference {
                minuend,
                subtrahend,
            } => zip_cells(minuend, subtrahend, |a, b| a - b),
            MapExpr::Correct { base, correction } => zip_cells(base, correction, |b, c| {
                if is_nodata(c) {
                    b
                } else {
                    b + c
                }
            }),
            MapExpr::Mask { mask, value } => zip_cells(mask, value, |m, v| {
                if is_nodata(m) || m == 0.0 {
                    NODATA
                } else {
                    v
                }
            }),
        }
    }

    fn distance_transform(&self, raster: &Raster) -> Result<Raster> {
        morphology::distance_transform(raster)
    }

    fn rescale(&self, raster: &Raster, to: (f64, f64)) -> Result<Raster> {
        let (lo, hi) = to;
        let Some((min, max)) = raster.value_range() else {
            return Ok(raster.clone());
        };
        let span = max - min;
        debug!("Rescale [{}, {}] -> [{}, {}]", min, max, lo, hi);

        let data = raster.data().mapv(|v| {
            if is_nodata(v) {
                NODATA
            } else if span > 0.0 {
                (lo + (v - min) / span * (hi - lo)).round()
            } else {
                lo
            }
        });
        Ok(Raster::new(raster.region().clone(), data)?.with_projection(raster.projection()))
    }

    fn idw_interpolate(&self, points: &PointSet, region: &Region, params: IdwParams) -> Result<Raster> {
        idw::interpolate_surface(points, region, &params)
    }

    fn rasterize(&self, area: &AreaSet, value: f64) -> Result<Raster> {
        let data = area.cells().mapv(|inside| if inside { value } else { NODATA });
        Raster::new(area.region().clone(), data)
    }

    fn composite(&self, layers: &[&Raster]) -> Result<Raster> {
        let (first, rest) = layers
            .split_first()
            .ok_or_else(|| BlendError::RegionMismatch("nothing to composite".to_string()))?;

        let mut out = (*first).clone();
        for layer in rest {
            out.ensure_same_grid(layer)?;
            Zip::from(out.data_mut()).and(layer.data()).for_each(|o, &v| {
                if is_nodata(*o) {
                    *o = v;
                }
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Extent;
    use ndarray::arr2;

    const N: f64 = NODATA;

    fn region(rows: usize, cols: usize, res: f64) -> Region {
        Region::new(
            Extent::new(0.0, cols as f64 * res, 0.0, rows as f64 * res),
            res,
            res,
        )
        .unwrap()
    }

    fn raster(data: Array2<f64>) -> Raster {
        let (rows, cols) = data.dim();
        Raster::new(region(rows, cols, 1.0), data).unwrap()
    }

    #[test]
    fn test_nearest_resample_keeps_source_values() {
        let coarse = Raster::new(region(2, 2, 2.0), arr2(&[[1.0, 2.0], [3.0, N]])).unwrap();
        let fine = GridEngine
            .resample(&coarse, &region(4, 4, 1.0), ResampleMethod::Nearest)
            .unwrap();

        assert_eq!(fine.get(0, 0), Some(1.0));
        assert_eq!(fine.get(1, 1), Some(1.0));
        assert_eq!(fine.get(0, 3), Some(2.0));
        assert_eq!(fine.get(3, 0), Some(3.0));
        assert_eq!(fine.get(3, 3), None);
        for v in fine.data().iter().filter(|v| !is_nodata(**v)) {
            assert!([1.0, 2.0, 3.0].contains(v));
        }
    }

    #[test]
    fn test_difference_propagates_nodata() {
        let a = raster(arr2(&[[5.0, 5.0], [N, 5.0]]));
        let b = raster(arr2(&[[3.0, N], [3.0, 1.0]]));
        let diff = GridEngine
            .map_algebra(MapExpr::Difference {
                minuend: &a,
                subtrahend: &b,
            })
            .unwrap();

        assert_eq!(diff.get(0, 0), Some(2.0));
        assert_eq!(diff.get(0, 1), None);
        assert_eq!(diff.get(1, 0), None);
        assert_eq!(diff.get(1, 1), Some(4.0));
    }

    #[test]
    fn test_correct_passes_base_through() {
        let base = raster(arr2(&[[3.0, 3.0], [N, 3.0]]));
        let correction = raster(arr2(&[[1.5, N], [1.0, N]]));
        let out = GridEngine
            .map_algebra(MapExpr::Correct {
                base: &base,
                correction: &correction,
            })
            .unwrap();

        assert_eq!(out.get(0, 0), Some(4.5));
        assert_eq!(out.get(0, 1), Some(3.0));
        assert_eq!(out.get(1, 0), None);
        assert_eq!(out.get(1, 1), Some(3.0));
    }

    #[test]
    fn test_mask_keeps_values_inside() {
        let mask = raster(arr2(&[[1.0, N], [0.0, 1.0]]));
        let value = raster(arr2(&[[7.0, 8.0], [9.0, 10.0]]));
        let out = GridEngine
            .map_algebra(MapExpr::Mask {
                mask: &mask,
                value: &value,
            })
            .unwrap();

        assert_eq!(out.get(0, 0), Some(7.0));
        assert_eq!(out.get(0, 1), None);
        assert_eq!(out.get(1, 0), None);
        assert_eq!(out.get(1, 1), Some(10.0));
    }

    #[test]
    fn test_overlay_not_and_and() {
        let a = GridEngine
            .vectorize_area(&raster(arr2(&[[1.0, 1.0], [1.0, N]])))
            .unwrap();
        let b = GridEngine
            .vectorize_area(&raster(arr2(&[[1.0, N], [N, N]])))
            .unwrap();

        let gap = GridEngine.overlay(&a, &b, AreaOverlay::Not).unwrap();
        assert_eq!(gap.cell_count(), 2);
        assert!(!gap.contains_cell(0, 0));

        let both = GridEngine.overlay(&a, &b, AreaOverlay::And).unwrap();
        assert_eq!(both.cell_count(), 1);
    }

    #[test]
    fn test_select_by_location() {
        let area = GridEngine
            .vectorize_area(&raster(arr2(&[[1.0, N], [N, N]])))
            .unwrap();
        let points = GridEngine
            .vectorize_points(&raster(arr2(&[[1.0, 2.0], [3.0, N]])))
            .unwrap();
        assert_eq!(points.len(), 3);

        let inside = GridEngine
            .select_by_location(&points, &area, SpatialRelation::Overlap)
            .unwrap();
        let outside = GridEngine
            .select_by_location(&points, &area, SpatialRelation::Disjoint)
            .unwrap();
        assert_eq!(inside.len(), 1);
        assert_eq!(inside.points()[0].value, 1.0);
        assert_eq!(outside.len(), 2);
    }

    #[test]
    fn test_rescale_to_integer_weights() {
        let r = raster(arr2(&[[0.0, 1.0, 3.0], [N, 2.0, 1.5]]));
        let out = GridEngine.rescale(&r, (0.0, 10000.0)).unwrap();

        assert_eq!(out.get(0, 0), Some(0.0));
        assert_eq!(out.get(0, 1), Some(3333.0));
        assert_eq!(out.get(0, 2), Some(10000.0));
        assert_eq!(out.get(1, 0), None);
        assert_eq!(out.get(1, 2), Some(5000.0));
    }

    #[test]
    fn test_rescale_constant_maps_to_lower_bound() {
        let r = raster(arr2(&[[4.0, 4.0]]));
        let out = GridEngine.rescale(&r, (0.0, 10000.0)).unwrap();
        assert_eq!(out.get(0, 1), Some(0.0));
    }

    #[test]
    fn test_composite_first_non_missing_wins() {
        let top = raster(arr2(&[[1.0, N], [N, 4.0]]));
        let bottom = raster(arr2(&[[9.0, 9.0], [N, 9.0]]));
        let out = GridEngine.composite(&[&top, &bottom]).unwrap();

        assert_eq!(out.get(0, 0), Some(1.0));
        assert_eq!(out.get(0, 1), Some(9.0));
        assert_eq!(out.get(1, 0), None);
        assert_eq!(out.get(1, 1), Some(4.0));
    }

    #[test]
    fn test_composite_rejects_mismatched_grids() {
        let a = raster(arr2(&[[1.0, 2.0]]));
        let b = raster(arr2(&[[1.0], [2.0]]));
        assert!(GridEngine.composite(&[&a, &b]).is_err());
        assert!(GridEngine.composite(&[]).is_err());
    }

    #[test]
    fn test_rasterize_area() {
        let area = GridEngine
            .vectorize_area(&raster(arr2(&[[1.0, N]])))
            .unwrap();
        let mask = GridEngine.rasterize(&area, 1.0).unwrap();
        assert_eq!(mask.get(0, 0), Some(1.0));
        assert_eq!(mask.get(0, 1), None);
    }
}
