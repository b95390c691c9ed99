use crate::engine::{GeoEngine, MapExpr};
use crate::error::{BlendError, Result};
use crate::raster::Raster;
use log::{error, info};

fn composite_failed(e: BlendError) -> BlendError {
    error!("Failed to create smoothed raster: {}", e);
    match e {
        BlendError::CompositeFailed(_) => e,
        other => BlendError::CompositeFailed(other.to_string()),
    }
}

/// High-resolution values wherever present, `fill` elsewhere.
pub fn overlay<E>(engine: &E, high: &Raster, fill: &Raster) -> Result<Raster>
where
    E: GeoEngine + ?Sized,
{
    engine.composite(&[high, fill]).map_err(composite_failed)
}

/// Apply the correction to the low-resolution raster and put the
/// high-resolution raster on top. Returns `(smoothed_low, output)`.
pub fn apply<E>(
    engine: &E,
    high: &Raster,
    low_harmonized: &Raster,
    correction: &Raster,
) -> Result<(Raster, Raster)>
where
    E: GeoEngine + ?Sized,
{
    let smoothed = engine
        .map_algebra(MapExpr::Correct {
            base: low_harmonized,
            correction,
        })
        .map_err(composite_failed)?;
    let output = overlay(engine, high, &smoothed)?;

    info!("Composite: {} valid cells", output.valid_count());
    Ok((smoothed, output))
}
