use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlendError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Input raster has invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error("Pixel size is non-positive: {0}")]
    InvalidPixelSize(f64),

    #[error("Rotated or sheared geotransforms are not supported: {0:?}")]
    UnsupportedGeoTransform([f64; 6]),

    #[error("Input raster has no valid cells: {0}")]
    EmptyInput(String),

    #[error("Coordinate systems of the input rasters differ")]
    CrsMismatch,

    #[error("CRS error: {0}")]
    CrsError(String),

    #[error("Rasters are not on the same grid: {0}")]
    RegionMismatch(String),

    #[error("Not enough sample points for interpolation: {0}")]
    InsufficientSamples(usize),

    #[error("Invalid IDW power: {0} (must be positive)")]
    InvalidPower(f64),

    #[error("Invalid neighbor count: {0} (must be positive)")]
    InvalidNeighbors(usize),

    #[error("Invalid edge weight: {0} (must lie strictly between 0 and {1})")]
    InvalidEdgeWeight(f64, f64),

    #[error("Invalid compression type: {0}")]
    InvalidCompression(String),

    #[error("Invalid tile size: {0} (must be multiple of 16)")]
    InvalidTileSize(usize),

    #[error("Failed to create smoothed raster: {0}")]
    CompositeFailed(String),
}

pub type Result<T> = std::result::Result<T, BlendError>;
