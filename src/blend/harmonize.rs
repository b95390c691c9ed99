use crate::engine::{GeoEngine, ResampleMethod};
use crate::error::Result;
use crate::raster::Raster;
use crate::region::Region;
use log::info;

/// Bring the low-resolution raster onto the working grid.
///
/// Nearest sampling only: every harmonized value is one of the source values.
pub fn harmonize<E>(engine: &E, low: &Raster, region: &Region) -> Result<Raster>
where
    E: GeoEngine + ?Sized,
{
    let harmonized = engine.resample(low, region, ResampleMethod::Nearest)?;
    info!(
        "Harmonized low-resolution raster: {}x{} -> {}x{} ({} valid cells)",
        low.region().cols(),
        low.region().rows(),
        region.cols(),
        region.rows(),
        harmonized.valid_count()
    );
    Ok(harmonized)
}

/// Read the high-resolution raster into the working grid. When that grid is
/// the raster's own resolution and alignment the values are copied as is.
pub fn align<E>(engine: &E, high: &Raster, region: &Region) -> Result<Raster>
where
    E: GeoEngine + ?Sized,
{
    engine.resample(high, region, ResampleMethod::Nearest)
}
