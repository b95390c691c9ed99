//! Working region: the bounding box and cell size shared by every grid
//! computation of a blend.

use crate::error::{BlendError, Result};
use log::debug;

// Tolerance when snapping extents to whole cells.
const SNAP_EPSILON: f64 = 1e-9;

/// Axis-aligned bounding box in map units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Extent {
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Self {
        Self {
            west,
            east,
            south,
            north,
        }
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            west: self.west.min(other.west),
            east: self.east.max(other.east),
            south: self.south.min(other.south),
            north: self.north.max(other.north),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.west && x < self.east && y > self.south && y <= self.north
    }
}

/// A north-up grid: extent plus north-south and east-west cell sizes.
///
/// The extent is always snapped so that it holds a whole number of cells,
/// anchored at the north-west corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    extent: Extent,
    ns_res: f64,
    ew_res: f64,
    rows: usize,
    cols: usize,
}

impl Region {
    pub fn new(extent: Extent, ns_res: f64, ew_res: f64) -> Result<Self> {
        if !(ns_res > 0.0) {
            return Err(BlendError::InvalidPixelSize(ns_res));
        }
        if !(ew_res > 0.0) {
            return Err(BlendError::InvalidPixelSize(ew_res));
        }

        let rows = (extent.height() / ns_res - SNAP_EPSILON).ceil().max(0.0) as usize;
        let cols = (extent.width() / ew_res - SNAP_EPSILON).ceil().max(0.0) as usize;
        if rows == 0 || cols == 0 {
            return Err(BlendError::InvalidDimensions(cols, rows));
        }

        let extent = Extent {
            west: extent.west,
            north: extent.north,
            east: extent.west + cols as f64 * ew_res,
            south: extent.north - rows as f64 * ns_res,
        };

        Ok(Self {
            extent,
            ns_res,
            ew_res,
            rows,
            cols,
        })
    }

    /// Build a region from a GDAL geotransform and raster size.
    pub fn from_geotransform(geotransform: &[f64; 6], width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(BlendError::InvalidDimensions(width, height));
        }
        if geotransform[2] != 0.0 || geotransform[4] != 0.0 {
            return Err(BlendError::UnsupportedGeoTransform(*geotransform));
        }

        let ew_res = geotransform[1].abs();
        let ns_res = geotransform[5].abs();
        if ew_res <= 0.0 {
            return Err(BlendError::InvalidPixelSize(ew_res));
        }
        if ns_res <= 0.0 {
            return Err(BlendError::InvalidPixelSize(ns_res));
        }

        let x0 = geotransform[0];
        let y0 = geotransform[3];
        let x1 = x0 + geotransform[1] * width as f64;
        let y1 = y0 + geotransform[5] * height as f64;
        let extent = Extent::new(x0.min(x1), x0.max(x1), y0.min(y1), y0.max(y1));

        Self::new(extent, ns_res, ew_res)
    }

    /// Union extent of all regions at the finest north-south and east-west
    /// resolution found among them.
    ///
    /// The grid lines pass through the north-west corner of the first region;
    /// the union is grown outward to the next whole cell on every side.
    pub fn covering<'a, I>(regions: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Region>,
    {
        let mut iter = regions.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| BlendError::RegionMismatch("no regions to cover".to_string()))?;

        let (union, ns_res, ew_res) = iter.fold(
            (first.extent, first.ns_res, first.ew_res),
            |(extent, ns, ew), r| (extent.union(&r.extent), ns.min(r.ns_res), ew.min(r.ew_res)),
        );

        let west_cells = ((first.extent.west - union.west) / ew_res - SNAP_EPSILON).ceil().max(0.0);
        let north_cells = ((union.north - first.extent.north) / ns_res - SNAP_EPSILON).ceil().max(0.0);
        let extent = Extent {
            west: first.extent.west - west_cells * ew_res,
            north: first.extent.north + north_cells * ns_res,
            ..union
        };

        debug!(
            "Covering region: W={} E={} S={} N={} nsres={} ewres={}",
            extent.west, extent.east, extent.south, extent.north, ns_res, ew_res
        );
        Self::new(extent, ns_res, ew_res)
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn ns_res(&self) -> f64 {
        self.ns_res
    }

    pub fn ew_res(&self) -> f64 {
        self.ew_res
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols), matching ndarray's `dim()`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// The larger of the two cell sizes; used as the square cell side for
    /// buffer distances.
    pub fn cell_side(&self) -> f64 {
        self.ns_res.max(self.ew_res)
    }

    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.extent.west + (col as f64 + 0.5) * self.ew_res,
            self.extent.north - (row as f64 + 0.5) * self.ns_res,
        )
    }

    /// Cell containing the map coordinate, if it lies inside the region.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !self.extent.contains(x, y) {
            return None;
        }
        let col = ((x - self.extent.west) / self.ew_res).floor() as usize;
        let row = ((self.extent.north - y) / self.ns_res).floor() as usize;
        if row < self.rows && col < self.cols {
            Some((row, col))
        } else {
            None
        }
    }

    pub fn geotransform(&self) -> [f64; 6] {
        [
            self.extent.west,
            self.ew_res,
            0.0,
            self.extent.north,
            0.0,
            -self.ns_res,
        ]
    }

    /// Whether two regions describe the same grid.
    pub fn same_grid(&self, other: &Region) -> bool {
        let tol = SNAP_EPSILON * self.cell_side().max(1.0);
        self.rows == other.rows
            && self.cols == other.cols
            && (self.ns_res - other.ns_res).abs() < tol
            && (self.ew_res - other.ew_res).abs() < tol
            && (self.extent.west - other.extent.west).abs() < tol
            && (self.extent.north - other.extent.north).abs() < tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_snaps_to_whole_cells() {
        let region = Region::new(Extent::new(0.0, 10.5, 0.0, 4.0), 1.0, 2.0).unwrap();
        assert_eq!(region.shape(), (4, 6));
        assert_eq!(region.extent().east, 12.0);
        assert_eq!(region.extent().south, 0.0);
    }

    #[test]
    fn test_covering_uses_union_and_finest_resolution() {
        let high = Region::new(Extent::new(0.0, 10.0, 0.0, 10.0), 1.0, 1.0).unwrap();
        let low = Region::new(Extent::new(0.0, 20.0, 0.0, 10.0), 2.0, 2.0).unwrap();
        let region = Region::covering([&high, &low]).unwrap();

        assert_eq!(region.shape(), (10, 20));
        assert_eq!(region.cell_side(), 1.0);
        assert_eq!(*region.extent(), Extent::new(0.0, 20.0, 0.0, 10.0));
    }

    #[test]
    fn test_covering_snaps_to_first_region_grid() {
        let high = Region::new(Extent::new(0.5, 10.5, 0.25, 10.25), 1.0, 1.0).unwrap();
        let low = Region::new(Extent::new(0.0, 20.0, 0.0, 10.0), 2.0, 2.0).unwrap();
        let region = Region::covering([&high, &low]).unwrap();

        assert_eq!(*region.extent(), Extent::new(-0.5, 20.5, -0.75, 10.25));
        assert_eq!(region.shape(), (11, 21));
        // Every high cell centre is a working cell centre.
        let (x, y) = high.cell_center(0, 0);
        let (row, col) = region.cell_at(x, y).unwrap();
        assert_eq!(region.cell_center(row, col), (x, y));
    }

    #[test]
    fn test_cell_side_is_larger_resolution() {
        let region = Region::new(Extent::new(0.0, 10.0, 0.0, 10.0), 2.0, 1.0).unwrap();
        assert_eq!(region.cell_side(), 2.0);
    }

    #[test]
    fn test_cell_center_and_lookup_agree() {
        let region = Region::new(Extent::new(100.0, 110.0, 50.0, 55.0), 1.0, 1.0).unwrap();
        let (x, y) = region.cell_center(2, 7);
        assert_eq!((x, y), (107.5, 52.5));
        assert_eq!(region.cell_at(x, y), Some((2, 7)));
        assert_eq!(region.cell_at(99.0, 52.0), None);
    }

    #[test]
    fn test_from_geotransform() {
        let gt = [10.0, 2.0, 0.0, 20.0, 0.0, -2.0];
        let region = Region::from_geotransform(&gt, 5, 3).unwrap();
        assert_eq!(*region.extent(), Extent::new(10.0, 20.0, 14.0, 20.0));
        assert_eq!(region.geotransform(), gt);
    }

    #[test]
    fn test_rotated_geotransform_rejected() {
        let gt = [0.0, 1.0, 0.1, 0.0, 0.0, -1.0];
        assert!(matches!(
            Region::from_geotransform(&gt, 4, 4),
            Err(BlendError::UnsupportedGeoTransform(_))
        ));
    }

    #[test]
    fn test_invalid_resolution() {
        let extent = Extent::new(0.0, 1.0, 0.0, 1.0);
        assert!(Region::new(extent, 0.0, 1.0).is_err());
        assert!(Region::new(extent, 1.0, -1.0).is_err());
    }
}
