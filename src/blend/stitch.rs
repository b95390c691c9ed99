use crate::engine::{GeoEngine, IdwParams, MapExpr};
use crate::error::{BlendError, Result};
use crate::geometry::{AreaSet, PointSet};
use crate::raster::Raster;
use crate::region::Region;
use log::info;

/// Correction surface and the rasters it was cut from.
#[derive(Debug, Clone)]
pub struct Stitching {
    /// Interpolation over the whole working region.
    pub full: Raster,
    /// Gap area burnt in as 1, no-data elsewhere.
    pub mask: Raster,
    /// `full` restricted to the gap area.
    pub correction: Raster,
}

pub fn interpolate<E>(
    engine: &E,
    samples: &PointSet,
    gap: &AreaSet,
    region: &Region,
    params: IdwParams,
) -> Result<Stitching>
where
    E: GeoEngine + ?Sized,
{
    if samples.is_empty() {
        return Err(BlendError::InsufficientSamples(0));
    }

    let full = engine.idw_interpolate(samples, region, params)?;
    let mask = engine.rasterize(gap, 1.0)?;
    let correction = engine.map_algebra(MapExpr::Mask {
        mask: &mask,
        value: &full,
    })?;

    info!(
        "Correction surface: {} cells from {} samples",
        correction.valid_count(),
        samples.len()
    );

    Ok(Stitching {
        full,
        mask,
        correction,
    })
}
