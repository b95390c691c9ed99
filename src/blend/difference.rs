use crate::engine::{GeoEngine, MapExpr};
use crate::error::Result;
use crate::geometry::PointSet;
use crate::raster::Raster;
use log::info;

/// Where, and by how much, the two sources disagree.
#[derive(Debug, Clone)]
pub struct DifferenceField {
    /// `high - low_harmonized`, valid only where both are.
    pub raster: Raster,
    /// One point per valid difference cell.
    pub points: PointSet,
}

pub fn build<E>(engine: &E, high: &Raster, low_harmonized: &Raster) -> Result<DifferenceField>
where
    E: GeoEngine + ?Sized,
{
    let raster = engine.map_algebra(MapExpr::Difference {
        minuend: high,
        subtrahend: low_harmonized,
    })?;
    let points = engine.vectorize_points(&raster)?;

    info!("Difference field: {} points", points.len());
    Ok(DifferenceField { raster, points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GridEngine;
    use crate::raster::NODATA;
    use crate::region::{Extent, Region};
    use ndarray::arr2;

    #[test]
    fn test_points_only_where_both_sources_exist() {
        let region = Region::new(Extent::new(0.0, 3.0, 0.0, 1.0), 1.0, 1.0).unwrap();
        let high = Raster::new(region.clone(), arr2(&[[5.0, 5.0, NODATA]])).unwrap();
        let low = Raster::new(region, arr2(&[[3.0, NODATA, 3.0]])).unwrap();

        let field = build(&GridEngine, &high, &low).unwrap();
        assert_eq!(field.points.len(), 1);
        let p = field.points.points()[0];
        assert_eq!((p.x, p.y, p.value), (0.5, 0.5, 2.0));
    }
}
