//! Vector-side artifacts of a blend: coverage areas and point samples.
//!
//! Areas are traced from raster cells, so their boundaries always follow cell
//! edges of the working region. An [`AreaSet`] therefore stores the cells it
//! covers rather than polygon rings; overlay and buffering operate on that
//! cell set.

use crate::error::{BlendError, Result};
use crate::region::Region;
use ndarray::Array2;

/// Dissolved polygon set on the working grid.
#[derive(Debug, Clone)]
pub struct AreaSet {
    region: Region,
    cells: Array2<bool>,
}

impl AreaSet {
    pub fn new(region: Region, cells: Array2<bool>) -> Result<Self> {
        if cells.dim() != region.shape() {
            return Err(BlendError::RegionMismatch(
                "area mask does not match its region".to_string(),
            ));
        }
        Ok(Self { region, cells })
    }

    pub fn empty(region: Region) -> Self {
        let cells = Array2::from_elem(region.shape(), false);
        Self { region, cells }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn cells(&self) -> &Array2<bool> {
        &self.cells
    }

    pub fn contains_cell(&self, row: usize, col: usize) -> bool {
        self.cells.get((row, col)).copied().unwrap_or(false)
    }

    /// Whether a map coordinate falls inside the area.
    pub fn covers(&self, x: f64, y: f64) -> bool {
        self.region
            .cell_at(x, y)
            .map(|(row, col)| self.cells[[row, col]])
            .unwrap_or(false)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|c| *c)
    }

    /// Covered surface in squared map units.
    pub fn area(&self) -> f64 {
        self.cell_count() as f64 * self.region.ns_res() * self.region.ew_res()
    }
}

/// A location with one scalar attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSample {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl PointSample {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    pub fn distance_squared(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: Vec<PointSample>,
}

impl PointSet {
    pub fn new(points: Vec<PointSample>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PointSample] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointSample> {
        self.points.iter()
    }

    /// Keep the points whose attribute satisfies `predicate`.
    pub fn select_where<F>(&self, predicate: F) -> PointSet
    where
        F: Fn(f64) -> bool,
    {
        self.points
            .iter()
            .filter(|p| predicate(p.value))
            .copied()
            .collect()
    }

    /// Overwrite the attribute of every point.
    pub fn set_value(&mut self, value: f64) {
        for point in &mut self.points {
            point.value = value;
        }
    }

    /// Append another set, keeping each point's own attribute.
    pub fn merge(mut self, other: PointSet) -> PointSet {
        self.points.extend(other.points);
        self
    }
}

impl FromIterator<PointSample> for PointSet {
    fn from_iter<I: IntoIterator<Item = PointSample>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a PointSample;
    type IntoIter = std::slice::Iter<'a, PointSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
