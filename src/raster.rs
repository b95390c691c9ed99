use crate::error::{BlendError, Result};
use crate::region::{Extent, Region};
use ndarray::Array2;

/// Marker stored in cells without a value.
pub const NODATA: f64 = f64::NAN;

pub fn is_nodata(value: f64) -> bool {
    value.is_nan()
}

/// Single-band continuous raster over a north-up grid.
///
/// Cells without a value hold [`NODATA`] (`NaN`). The projection is kept as
/// WKT so two rasters can be checked for co-registration.
#[derive(Debug, Clone)]
pub struct Raster {
    region: Region,
    data: Array2<f64>,
    projection: String,
}

impl Raster {
    pub fn new(region: Region, data: Array2<f64>) -> Result<Self> {
        if data.dim() != region.shape() {
            let (rows, cols) = data.dim();
            return Err(BlendError::RegionMismatch(format!(
                "data is {}x{} but region is {}x{}",
                cols,
                rows,
                region.cols(),
                region.rows()
            )));
        }
        Ok(Self {
            region,
            data,
            projection: String::new(),
        })
    }

    pub fn filled(region: Region, value: f64) -> Self {
        let data = Array2::from_elem(region.shape(), value);
        Self {
            region,
            data,
            projection: String::new(),
        }
    }

    /// Raster with every cell set to no-data.
    pub fn empty(region: Region) -> Self {
        Self::filled(region, NODATA)
    }

    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = projection.into();
        self
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn extent(&self) -> &Extent {
        self.region.extent()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    pub fn projection(&self) -> &str {
        &self.projection
    }

    /// Value of a cell, `None` for no-data or out-of-range indices.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data
            .get((row, col))
            .copied()
            .filter(|v| !is_nodata(*v))
    }

    /// Value of the cell containing a map coordinate.
    pub fn value_at(&self, x: f64, y: f64) -> Option<f64> {
        let (row, col) = self.region.cell_at(x, y)?;
        self.get(row, col)
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !is_nodata(**v)).count()
    }

    /// (min, max) over valid cells.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| !is_nodata(*v))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Fail unless `other` lies on exactly the same grid.
    pub fn ensure_same_grid(&self, other: &Raster) -> Result<()> {
        if self.region.same_grid(&other.region) {
            Ok(())
        } else {
            Err(BlendError::RegionMismatch(format!(
                "{}x{} grid at ({}, {}) vs {}x{} grid at ({}, {})",
                self.region.cols(),
                self.region.rows(),
                self.extent().west,
                self.extent().north,
                other.region.cols(),
                other.region.rows(),
                other.extent().west,
                other.extent().north
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn region(rows: usize, cols: usize) -> Region {
        Region::new(Extent::new(0.0, cols as f64, 0.0, rows as f64), 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_shape_must_match_region() {
        let data = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        assert!(Raster::new(region(2, 2), data.clone()).is_ok());
        assert!(matches!(
            Raster::new(region(2, 3), data),
            Err(BlendError::RegionMismatch(_))
        ));
    }

    #[test]
    fn test_nodata_cells_are_skipped() {
        let data = arr2(&[[1.0, NODATA], [-3.0, 4.0]]);
        let raster = Raster::new(region(2, 2), data).unwrap();

        assert_eq!(raster.valid_count(), 3);
        assert_eq!(raster.get(0, 1), None);
        assert_eq!(raster.get(1, 0), Some(-3.0));
        assert_eq!(raster.get(5, 5), None);
        assert_eq!(raster.value_range(), Some((-3.0, 4.0)));
    }

    #[test]
    fn test_value_at_map_coordinate() {
        let data = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let raster = Raster::new(region(2, 2), data).unwrap();
        // Row 0 is the northern row.
        assert_eq!(raster.value_at(1.5, 1.5), Some(2.0));
        assert_eq!(raster.value_at(0.5, 0.5), Some(3.0));
        assert_eq!(raster.value_at(2.5, 0.5), None);
    }

    #[test]
    fn test_empty_raster_has_no_range() {
        let raster = Raster::empty(region(3, 3));
        assert_eq!(raster.valid_count(), 0);
        assert_eq!(raster.value_range(), None);
    }
}
