//! Geoprocessing primitives consumed by the blend pipeline.
//!
//! Every primitive is a pure function from input artifacts to a new artifact,
//! so the pipeline can run against [`GridEngine`] or any substitute that
//! implements [`GeoEngine`].

mod grid;
pub mod idw;
pub mod morphology;

pub use grid::GridEngine;
pub use idw::IdwParams;

use crate::error::Result;
use crate::geometry::{AreaSet, PointSet};
use crate::raster::Raster;
use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResampleMethod {
    /// Take the value of the source cell containing the target cell centre.
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaOverlay {
    /// Parts of `a` not covered by `b`.
    Not,
    /// Parts covered by both.
    And,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialRelation {
    Overlap,
    Disjoint,
}

/// Cell-wise raster expressions.
#[derive(Debug, Clone, Copy)]
pub enum MapExpr<'a> {
    /// `minuend - subtrahend`; no-data in either operand gives no-data.
    Difference {
        minuend: &'a Raster,
        subtrahend: &'a Raster,
    },
    /// `base + correction`; where the correction is no-data the base passes
    /// through unchanged.
    Correct {
        base: &'a Raster,
        correction: &'a Raster,
    },
    /// `if(mask, value)`: value where the mask is set and non-zero.
    Mask {
        mask: &'a Raster,
        value: &'a Raster,
    },
}

impl MapExpr<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            MapExpr::Difference { .. } => "difference",
            MapExpr::Correct { .. } => "correct",
            MapExpr::Mask { .. } => "mask",
        }
    }
}

pub trait GeoEngine {
    /// Union extent of the rasters at their finest resolution, on grid lines
    /// aligned with the first raster.
    fn working_region(&self, rasters: &[&Raster]) -> Result<Region>;

    fn resample(&self, raster: &Raster, region: &Region, method: ResampleMethod) -> Result<Raster>;

    /// Trace the valid cells of a raster into a single dissolved footprint.
    fn vectorize_area(&self, raster: &Raster) -> Result<AreaSet>;

    /// One point per valid cell centre, carrying the cell value.
    fn vectorize_points(&self, raster: &Raster) -> Result<PointSet>;

    fn overlay(&self, a: &AreaSet, b: &AreaSet, operator: AreaOverlay) -> Result<AreaSet>;

    /// Signed buffer: positive grows the area, negative shrinks it.
    fn buffer(&self, area: &AreaSet, distance: f64) -> Result<AreaSet>;

    fn select_by_location(
        &self,
        points: &PointSet,
        area: &AreaSet,
        relation: SpatialRelation,
    ) -> Result<PointSet>;

    fn map_algebra(&self, expr: MapExpr<'_>) -> Result<Raster>;

    /// Distance from every cell to the nearest valid cell of `raster`.
    fn distance_transform(&self, raster: &Raster) -> Result<Raster>;

    /// Linear rescale of the valid value range onto `to`.
    fn rescale(&self, raster: &Raster, to: (f64, f64)) -> Result<Raster>;

    fn idw_interpolate(&self, points: &PointSet, region: &Region, params: IdwParams) -> Result<Raster>;

    fn rasterize(&self, area: &AreaSet, value: f64) -> Result<Raster>;

    /// First-non-missing-wins stack of rasters on one grid.
    fn composite(&self, layers: &[&Raster]) -> Result<Raster>;
}
