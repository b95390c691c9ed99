use super::OverlayReason;
use crate::engine::{AreaOverlay, GeoEngine};
use crate::error::Result;
use crate::geometry::AreaSet;
use crate::raster::Raster;
use log::info;

/// Footprints of both rasters and the gap area between them.
#[derive(Debug, Clone)]
pub struct Coverage {
    pub high: AreaSet,
    pub low: AreaSet,
    /// Covered by the low-resolution raster only.
    pub gap: AreaSet,
    /// Covered by both.
    pub overlap: AreaSet,
}

impl Coverage {
    /// Reason to skip stitching, if the geometry leaves nothing to stitch.
    pub fn degenerate(&self) -> Option<OverlayReason> {
        if self.gap.is_empty() {
            Some(OverlayReason::EmptyGap)
        } else if self.overlap.is_empty() {
            Some(OverlayReason::DisjointFootprints)
        } else {
            None
        }
    }
}

/// Trace both footprints (both rasters already on the working grid) and
/// overlay them.
pub fn resolve<E>(engine: &E, high: &Raster, low: &Raster) -> Result<Coverage>
where
    E: GeoEngine + ?Sized,
{
    let high_area = engine.vectorize_area(high)?;
    let low_area = engine.vectorize_area(low)?;
    let gap = engine.overlay(&low_area, &high_area, AreaOverlay::Not)?;
    let overlap = engine.overlay(&low_area, &high_area, AreaOverlay::And)?;

    info!(
        "Footprints: high={} cells, low={} cells, gap={} cells ({} sq units), overlap={} cells",
        high_area.cell_count(),
        low_area.cell_count(),
        gap.cell_count(),
        gap.area(),
        overlap.cell_count()
    );

    Ok(Coverage {
        high: high_area,
        low: low_area,
        gap,
        overlap,
    })
}
