use crate::error::{BlendError, Result};
use gdal::spatial_ref::SpatialRef;
use log::{info, warn};

fn parse(projection_wkt: &str) -> Result<SpatialRef> {
    SpatialRef::from_wkt(projection_wkt)
        .map_err(|e| BlendError::CrsError(format!("failed to parse projection WKT: {}", e)))
}

/// Check that both rasters use the same coordinate reference system.
///
/// A raster without projection information cannot be checked; that case is
/// accepted with a warning.
pub fn ensure_same_crs(high_wkt: &str, low_wkt: &str) -> Result<()> {
    if high_wkt.is_empty() || low_wkt.is_empty() {
        warn!("Projection missing on at least one input, assuming both share one CRS");
        return Ok(());
    }
    if high_wkt == low_wkt {
        return Ok(());
    }

    let high = parse(high_wkt)?;
    let low = parse(low_wkt)?;
    if high == low {
        info!("Input projections differ in text but describe the same CRS");
        Ok(())
    } else {
        Err(BlendError::CrsMismatch)
    }
}

/// Warn when buffer distances will be expressed in degrees.
pub fn warn_if_geographic(projection_wkt: &str) {
    if projection_wkt.is_empty() {
        return;
    }

    let spatial_ref = match parse(projection_wkt) {
        Ok(sr) => sr,
        Err(e) => {
            warn!("{}", e);
            return;
        }
    };

    if spatial_ref.is_geographic() {
        warn!("Geographic CRS detected (lat/lon), cell side and buffers are in degrees");
    } else if spatial_ref.is_projected() {
        let linear_units = spatial_ref.linear_units();
        if (linear_units - 1.0).abs() < 0.01 {
            info!("Projected CRS with meter units (units={:.6})", linear_units);
        } else {
            warn!(
                "Projected CRS with non-meter units detected (units={:.6})",
                linear_units
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_is_same_crs() {
        let wkt = "LOCAL_CS[\"grid\"]";
        assert!(ensure_same_crs(wkt, wkt).is_ok());
    }

    #[test]
    fn test_missing_projection_is_accepted() {
        assert!(ensure_same_crs("", "").is_ok());
        assert!(ensure_same_crs("", "LOCAL_CS[\"grid\"]").is_ok());
    }

    #[test]
    fn test_unparseable_projection_is_an_error() {
        let result = ensure_same_crs("not a projection", "neither is this");
        assert!(matches!(result, Err(BlendError::CrsError(_))));
    }

    #[test]
    fn test_different_valid_crs_is_a_mismatch() {
        let wgs84 = SpatialRef::from_epsg(4326).unwrap().to_wkt().unwrap();
        let web_mercator = SpatialRef::from_epsg(3857).unwrap().to_wkt().unwrap();

        assert!(matches!(
            ensure_same_crs(&wgs84, &web_mercator),
            Err(BlendError::CrsMismatch)
        ));
        assert!(ensure_same_crs(&web_mercator, &web_mercator).is_ok());
    }
}
