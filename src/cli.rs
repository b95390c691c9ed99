use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "raster-blend")]
#[command(about = "Blend a high-resolution raster into a low-resolution raster without a visible seam")]
#[command(version)]
pub struct Args {
    /// High-resolution input raster (kept exactly where it has data)
    #[arg(long, value_name = "FILE")]
    pub high: PathBuf,

    /// Low-resolution input raster (corrected near the seam)
    #[arg(long, value_name = "FILE")]
    pub low: PathBuf,

    /// Output GeoTIFF path (float64)
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// IDW distance exponent
    #[arg(long, default_value_t = 2.0, value_name = "P")]
    pub power: f64,

    /// Nearest edge samples used per interpolated cell
    #[arg(long, default_value_t = 50, value_name = "N")]
    pub neighbors: usize,

    /// Distance weight (0-10000) above which gap cells count as the far edge
    #[arg(long, default_value_t = 9500.0, value_name = "WEIGHT")]
    pub edge_weight: f64,

    /// Override nodata value of both inputs (default: read from each input)
    #[arg(long, value_name = "VALUE")]
    pub nodata: Option<f64>,

    /// Output compression (DEFLATE, LZW, ZSTD, NONE)
    #[arg(long, default_value = "NONE")]
    pub compress: String,

    /// Write a tiled output with this block size (multiple of 16)
    #[arg(long, value_name = "PIXELS")]
    pub tile_size: Option<usize>,

    /// Directory for intermediate rasters
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Keep intermediate rasters after the run
    #[arg(long, requires = "scratch_dir")]
    pub keep_scratch: bool,

    /// Number of threads (default: all available)
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
