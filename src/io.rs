use crate::error::{BlendError, Result};
use crate::raster::{Raster, NODATA};
use crate::region::Region;
use gdal::cpl::CslStringList;
use gdal::raster::RasterBand;
use gdal::{Dataset, DriverManager};
use log::{debug, info, warn};
use ndarray::Array2;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub geotransform: [f64; 6],
    pub projection: String,
    pub nodata: Option<f64>,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

/// Extract metadata from a dataset without reading any cells
pub fn extract_metadata_from_dataset(dataset: &Dataset) -> Result<RasterMetadata> {
    let rasterband: RasterBand = dataset.rasterband(1)?;

    let width = rasterband.x_size() as usize;
    let height = rasterband.y_size() as usize;

    if width == 0 || height == 0 {
        return Err(BlendError::InvalidDimensions(width, height));
    }

    let nodata = rasterband.no_data_value();
    let geotransform = dataset.geo_transform()?;
    let pixel_width = geotransform[1].abs();
    let pixel_height = geotransform[5].abs();

    if pixel_width <= 0.0 {
        return Err(BlendError::InvalidPixelSize(pixel_width));
    }
    if pixel_height <= 0.0 {
        return Err(BlendError::InvalidPixelSize(pixel_height));
    }

    Ok(RasterMetadata {
        width,
        height,
        geotransform,
        projection: dataset.projection(),
        nodata,
        pixel_width,
        pixel_height,
    })
}

/// Read band 1 of a raster as `f64`, mapping its no-data value to `NaN`.
///
/// `nodata_override` replaces whatever no-data value the file declares.
pub fn read_raster(path: &Path, nodata_override: Option<f64>) -> Result<Raster> {
    info!("Opening input raster: {}", path.display());
    let dataset = Dataset::open(path)?;
    let metadata = extract_metadata_from_dataset(&dataset)?;
    let (width, height) = (metadata.width, metadata.height);

    debug!("Raster dimensions: {}x{}", width, height);
    debug!(
        "Pixel size: {:.6} x {:.6}",
        metadata.pixel_width, metadata.pixel_height
    );

    if dataset.raster_count() > 1 {
        warn!(
            "{} has {} bands, only band 1 is used",
            path.display(),
            dataset.raster_count()
        );
    }

    let rasterband = dataset.rasterband(1)?;
    let buffer = rasterband.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
    let data_vec: Vec<f64> = buffer.into_iter().collect();
    let mut data = Array2::from_shape_vec((height, width), data_vec)?;

    if let Some(nd) = nodata_override.or(metadata.nodata) {
        debug!("Mapping nodata value {} to NaN", nd);
        // NaN is already the internal marker
        if !nd.is_nan() {
            data.mapv_inplace(|v| if v == nd { NODATA } else { v });
        }
    }

    let region = Region::from_geotransform(&metadata.geotransform, width, height)?;
    Ok(Raster::new(region, data)?.with_projection(metadata.projection))
}

/// Create a single-band float64 GeoTIFF for `raster`'s grid.
fn create_dataset(path: &Path, raster: &Raster, options: &[String]) -> Result<Dataset> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (height, width) = raster.region().shape();

    let dataset = if options.is_empty() {
        driver.create_with_band_type::<f64, _>(path, width, height, 1)?
    } else {
        let mut gdal_options = CslStringList::new();
        for opt in options {
            gdal_options.add_string(opt)?;
        }
        driver.create_with_band_type_with_options::<f64, _>(path, width, height, 1, &gdal_options)?
    };
    Ok(dataset)
}

fn write_into(path: &Path, raster: &Raster, options: &[String]) -> Result<()> {
    let mut dataset = create_dataset(path, raster, options)?;
    dataset.set_geo_transform(&raster.region().geotransform())?;
    if !raster.projection().is_empty() {
        dataset.set_projection(raster.projection())?;
    }

    let (height, width) = raster.region().shape();
    let mut raster_band = dataset.rasterband(1)?;

    // GDAL expects row-major data, which is how Array2 stores it
    let values: Vec<f64> = raster.data().iter().copied().collect();
    let mut buffer = gdal::raster::Buffer::new((width, height), values);
    raster_band.write((0, 0), (width, height), &mut buffer)?;
    raster_band.set_no_data_value(Some(f64::NAN))?;
    Ok(())
}

/// Write a raster as GeoTIFF. A failed write leaves no file behind.
pub fn write_raster(path: &Path, raster: &Raster, options: &[String]) -> Result<()> {
    info!("Creating output raster: {}", path.display());

    match write_into(path, raster, options) {
        Ok(()) => {
            debug!(
                "Wrote {} valid cells to {}",
                raster.valid_count(),
                path.display()
            );
            Ok(())
        }
        Err(e) => {
            if path.exists() {
                warn!("Removing partial output {}", path.display());
                if let Err(rm) = std::fs::remove_file(path) {
                    warn!("Could not remove {}: {}", path.display(), rm);
                }
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Extent;
    use ndarray::arr2;

    #[test]
    fn test_written_raster_reads_back_with_nodata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blend.tif");

        let region = Region::new(Extent::new(500.0, 503.0, 100.0, 102.0), 1.0, 1.0).unwrap();
        let raster = Raster::new(region, arr2(&[[1.0, NODATA, 3.0], [4.0, 5.0, 6.5]])).unwrap();
        write_raster(&path, &raster, &[]).unwrap();

        let back = read_raster(&path, None).unwrap();
        assert!(back.region().same_grid(raster.region()));
        assert_eq!(back.get(0, 0), Some(1.0));
        assert_eq!(back.get(0, 1), None);
        assert_eq!(back.get(1, 2), Some(6.5));
    }

    #[test]
    fn test_nodata_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.tif");

        let region = Region::new(Extent::new(0.0, 2.0, 0.0, 1.0), 1.0, 1.0).unwrap();
        let raster = Raster::new(region, arr2(&[[-9999.0, 2.0]])).unwrap();
        write_raster(&path, &raster, &[]).unwrap();

        let back = read_raster(&path, Some(-9999.0)).unwrap();
        assert_eq!(back.valid_count(), 1);
        assert_eq!(back.get(0, 1), Some(2.0));
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_raster(&dir.path().join("absent.tif"), None).is_err());
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let region = Region::new(Extent::new(0.0, 2.0, 0.0, 2.0), 1.0, 1.0).unwrap();

        // The dataset is created, then setting the projection fails.
        let path = dir.path().join("bad_projection.tif");
        let raster = Raster::filled(region.clone(), 1.0).with_projection("not a projection");
        assert!(write_raster(&path, &raster, &[]).is_err());
        assert!(!path.exists());

        let missing = dir.path().join("no_such_dir").join("out.tif");
        assert!(write_raster(&missing, &Raster::filled(region, 1.0), &[]).is_err());
        assert!(!missing.exists());
    }
}
