use raster_blend::scratch::ScratchConfig;
use raster_blend::{read_raster, write_raster, BlendConfig, Blender, Extent, GridEngine, Raster, Region};

#[test]
fn test_blend_geotiff_files() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let high_path = dir.path().join("high.tif");
    let low_path = dir.path().join("low.tif");
    let out_path = dir.path().join("blended.tif");
    let scratch_dir = dir.path().join("scratch");

    let high_region = Region::new(Extent::new(0.0, 10.0, 0.0, 10.0), 1.0, 1.0).unwrap();
    let low_region = Region::new(Extent::new(0.0, 20.0, 0.0, 10.0), 2.0, 2.0).unwrap();
    write_raster(&high_path, &Raster::filled(high_region, 5.0), &[]).expect("Failed to write high");
    write_raster(&low_path, &Raster::filled(low_region, 3.0), &[]).expect("Failed to write low");

    let high = read_raster(&high_path, None).expect("Failed to read high");
    let low = read_raster(&low_path, None).expect("Failed to read low");

    let blender = Blender::new(&GridEngine, BlendConfig::default())
        .unwrap()
        .with_scratch(ScratchConfig {
            dir: Some(scratch_dir.clone()),
            keep: false,
        });
    let blended = blender.blend(&high, &low).expect("Blend failed");
    write_raster(&out_path, &blended.raster, &["COMPRESS=DEFLATE".to_string()]).expect("Failed to write output");

    // Every intermediate written during the run is gone again.
    let leftovers = std::fs::read_dir(&scratch_dir).unwrap().count();
    assert_eq!(leftovers, 0);

    let out = read_raster(&out_path, None).expect("Failed to read output");
    assert_eq!(out.region().shape(), (10, 20));
    assert_eq!(out.get(4, 0), Some(5.0));
    assert!((out.get(4, 19).unwrap() - 3.0).abs() < 1e-9);
    assert!(out.get(4, 10).unwrap() > 4.0);
}
