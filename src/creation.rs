//! GeoTIFF creation options for the blended output.

use crate::error::{BlendError, Result};

/// Codecs accepted for the blended GeoTIFF.
pub const COMPRESSIONS: [&str; 4] = ["NONE", "DEFLATE", "LZW", "ZSTD"];

pub fn validate_compression(compression: &str) -> Result<()> {
    if COMPRESSIONS.contains(&compression) {
        Ok(())
    } else {
        Err(BlendError::InvalidCompression(compression.to_string()))
    }
}

/// GTiff block sizes must be positive multiples of 16.
pub fn validate_tile_size(tile_size: usize) -> Result<()> {
    match tile_size {
        size if size > 0 && size % 16 == 0 => Ok(()),
        size => Err(BlendError::InvalidTileSize(size)),
    }
}

/// Build GTiff creation options. No options at all means GDAL's defaults
/// (striped, uncompressed).
pub fn creation_options(compression: &str, tile_size: Option<usize>) -> Result<Vec<String>> {
    validate_compression(compression)?;

    let mut options = Vec::new();
    if compression != "NONE" {
        options.push(format!("COMPRESS={}", compression));
        // Floating point predictor
        options.push("PREDICTOR=3".to_string());
    }
    if let Some(size) = tile_size {
        validate_tile_size(size)?;
        options.push("TILED=YES".to_string());
        options.push(format!("BLOCKXSIZE={}", size));
        options.push(format!("BLOCKYSIZE={}", size));
    }
    if !options.is_empty() {
        options.push("BIGTIFF=IF_SAFER".to_string());
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codecs_accepted() {
        for codec in COMPRESSIONS {
            assert!(validate_compression(codec).is_ok(), "{}", codec);
        }
        assert!(matches!(
            validate_compression("deflate"),
            Err(BlendError::InvalidCompression(_))
        ));
        assert!(validate_compression("JPEG").is_err());
    }

    #[test]
    fn test_block_sizes() {
        assert!(validate_tile_size(16).is_ok());
        assert!(validate_tile_size(512).is_ok());
        assert!(validate_tile_size(0).is_err());
        assert!(validate_tile_size(250).is_err());
    }

    #[test]
    fn test_default_output_has_no_options() {
        assert!(creation_options("NONE", None).unwrap().is_empty());
    }

    #[test]
    fn test_tiled_deflate_options() {
        let opts = creation_options("DEFLATE", Some(512)).unwrap();
        assert!(opts.contains(&"COMPRESS=DEFLATE".to_string()));
        assert!(opts.contains(&"TILED=YES".to_string()));
        assert!(opts.contains(&"BLOCKXSIZE=512".to_string()));
        assert!(opts.contains(&"BLOCKYSIZE=512".to_string()));
        assert!(opts.contains(&"BIGTIFF=IF_SAFER".to_string()));
    }

    #[test]
    fn test_bad_tile_size_rejected() {
        assert!(matches!(
            creation_options("LZW", Some(100)),
            Err(BlendError::InvalidTileSize(100))
        ));
    }
}
