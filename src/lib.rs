// Library exports for testing and reuse

pub mod blend;
pub mod cli;
pub mod creation;
pub mod crs;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod io;
pub mod raster;
pub mod region;
pub mod scratch;

// Re-export commonly used types
pub use blend::{BlendConfig, BlendReport, Blended, Blender, OverlayReason, StitchMode};
pub use engine::{GeoEngine, GridEngine};
pub use error::{BlendError, Result};
pub use io::{read_raster, write_raster};
pub use raster::Raster;
pub use region::{Extent, Region};
pub use scratch::ScratchConfig;
