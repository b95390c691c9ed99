//! Correction samples along both edges of the gap area.
//!
//! The inner edge, next to the high-resolution footprint, carries the true
//! high/low difference. The outer edge, farthest from that footprint, carries
//! zero so the interpolated correction fades out across the gap.

use super::BlendConfig;
use crate::engine::{GeoEngine, MapExpr, SpatialRelation};
use crate::error::Result;
use crate::geometry::{AreaSet, PointSet};
use crate::raster::Raster;
use log::{debug, info};

/// Difference points within one cell of the gap area.
pub fn inner_edge<E>(
    engine: &E,
    difference_points: &PointSet,
    gap: &AreaSet,
    cell_side: f64,
) -> Result<PointSet>
where
    E: GeoEngine + ?Sized,
{
    let grown = engine.buffer(gap, cell_side)?;
    let edge = engine.select_by_location(difference_points, &grown, SpatialRelation::Overlap)?;
    debug!(
        "Inner edge: {} of {} difference points within {} of the gap",
        edge.len(),
        difference_points.len(),
        cell_side
    );
    Ok(edge)
}

/// Intermediates of the outer edge selection.
#[derive(Debug, Clone)]
pub struct OuterEdge {
    /// Low-resolution footprint as a 1/no-data raster.
    pub footprint: Raster,
    /// Distance to the nearest high-resolution cell, inside the footprint.
    pub distance: Raster,
    /// `distance` rescaled onto `[0, weight_max]`.
    pub weights: Raster,
    /// The gap shrunk by one cell.
    pub core: AreaSet,
    /// Far edge points, value forced to 0.
    pub points: PointSet,
}

/// Zero points on the far rim of the gap.
///
/// Distances are only kept inside the low-resolution footprint, so the
/// largest weights sit on the gap's own outer limit.
pub fn outer_edge<E>(
    engine: &E,
    high: &Raster,
    low: &AreaSet,
    gap: &AreaSet,
    cell_side: f64,
    config: &BlendConfig,
) -> Result<OuterEdge>
where
    E: GeoEngine + ?Sized,
{
    let footprint = engine.rasterize(low, 1.0)?;
    let full = engine.distance_transform(high)?;
    let distance = engine.map_algebra(MapExpr::Mask {
        mask: &footprint,
        value: &full,
    })?;
    let weights = engine.rescale(&distance, (0.0, config.weight_max))?;
    let weight_points = engine.vectorize_points(&weights)?;

    let core = engine.buffer(gap, -cell_side)?;
    let rim = engine.select_by_location(&weight_points, &core, SpatialRelation::Disjoint)?;

    let threshold = config.edge_weight;
    let mut points = rim.select_where(|w| w > threshold);
    points.set_value(0.0);

    debug!(
        "Outer edge: {} weight points, {} off the gap core, {} above {}",
        weight_points.len(),
        rim.len(),
        points.len(),
        threshold
    );

    Ok(OuterEdge {
        footprint,
        distance,
        weights,
        core,
        points,
    })
}

/// Both edge samples, kept apart for reporting.
#[derive(Debug, Clone)]
pub struct BoundarySamples {
    pub inner: PointSet,
    pub outer: PointSet,
}

impl BoundarySamples {
    /// One set; each point keeps its own correction value.
    pub fn merged(&self) -> PointSet {
        self.outer.clone().merge(self.inner.clone())
    }
}

pub fn sample<E>(
    engine: &E,
    difference_points: &PointSet,
    high: &Raster,
    low: &AreaSet,
    gap: &AreaSet,
    cell_side: f64,
    config: &BlendConfig,
) -> Result<(BoundarySamples, OuterEdge)>
where
    E: GeoEngine + ?Sized,
{
    let inner = inner_edge(engine, difference_points, gap, cell_side)?;
    let outer = outer_edge(engine, high, low, gap, cell_side, config)?;

    info!(
        "Boundary samples: {} inner edge, {} outer edge",
        inner.len(),
        outer.points.len()
    );

    let samples = BoundarySamples {
        inner,
        outer: outer.points.clone(),
    };
    Ok((samples, outer))
}
