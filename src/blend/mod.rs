//! Blending of a high-resolution raster into a low-resolution one.
//!
//! Stages run strictly in order, each consuming the previous product:
//!
//! 1. [`harmonize`]: low-resolution raster onto the working grid
//! 2. [`extent`]: footprints and the gap area to interpolate
//! 3. [`difference`]: `high - low` as points
//! 4. [`boundary`]: correction samples on the inner and outer edge of the gap
//! 5. [`stitch`]: IDW correction surface masked to the gap
//! 6. [`composite`]: corrected low-resolution raster under the high-resolution one

pub mod boundary;
pub mod composite;
pub mod difference;
pub mod extent;
pub mod harmonize;
pub mod stitch;

use crate::crs;
use crate::engine::{GeoEngine, IdwParams};
use crate::error::{BlendError, Result};
use crate::raster::Raster;
use crate::region::Region;
use crate::scratch::{ScratchConfig, ScratchSpace};
use log::{info, warn};
use std::fmt;

/// Upper bound of the distance weights.
pub const WEIGHT_MAX: f64 = 10_000.0;

/// Weights above this mark the far edge of the gap area.
pub const EDGE_WEIGHT: f64 = 9_500.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BlendConfig {
    pub idw: IdwParams,
    pub weight_max: f64,
    pub edge_weight: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            idw: IdwParams::default(),
            weight_max: WEIGHT_MAX,
            edge_weight: EDGE_WEIGHT,
        }
    }
}

impl BlendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.idw.power = power;
        self
    }

    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.idw.neighbors = neighbors;
        self
    }

    pub fn with_edge_weight(mut self, edge_weight: f64) -> Self {
        self.edge_weight = edge_weight;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.idw.validate()?;
        if !(self.edge_weight > 0.0 && self.edge_weight < self.weight_max) {
            return Err(BlendError::InvalidEdgeWeight(self.edge_weight, self.weight_max));
        }
        Ok(())
    }
}

/// Why a blend fell back to a plain overlay without stitching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayReason {
    /// The low-resolution footprint adds nothing outside the high one.
    EmptyGap,
    /// The footprints do not touch, so there is no seam.
    DisjointFootprints,
    /// No difference point lies next to the gap.
    NoSeamSamples,
}

impl fmt::Display for OverlayReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayReason::EmptyGap => write!(f, "gap area is empty"),
            OverlayReason::DisjointFootprints => write!(f, "footprints are disjoint"),
            OverlayReason::NoSeamSamples => write!(f, "no difference samples along the seam"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchMode {
    Stitched,
    DirectOverlay(OverlayReason),
}

#[derive(Debug, Clone)]
pub struct BlendReport {
    pub region: Region,
    pub cell_side: f64,
    pub gap_cells: usize,
    pub inner_samples: usize,
    pub outer_samples: usize,
    pub mode: StitchMode,
    /// Intermediates created (and released) during the run.
    pub artifacts: usize,
}

#[derive(Debug, Clone)]
pub struct Blended {
    pub raster: Raster,
    pub report: BlendReport,
}

pub struct Blender<'e, E: GeoEngine + ?Sized> {
    engine: &'e E,
    config: BlendConfig,
    scratch: ScratchConfig,
}

impl<'e, E: GeoEngine + ?Sized> Blender<'e, E> {
    pub fn new(engine: &'e E, config: BlendConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            config,
            scratch: ScratchConfig::default(),
        })
    }

    pub fn with_scratch(mut self, scratch: ScratchConfig) -> Self {
        self.scratch = scratch;
        self
    }

    pub fn config(&self) -> &BlendConfig {
        &self.config
    }

    /// Blend `high` over `low`.
    ///
    /// Intermediates live in a scratch space owned by this call and are
    /// released before it returns, on success and on error alike.
    pub fn blend(&self, high: &Raster, low: &Raster) -> Result<Blended> {
        check_inputs(high, low)?;
        let mut scratch = ScratchSpace::new(self.scratch.clone())?;
        self.run(high, low, &mut scratch)
    }

    fn run(&self, high: &Raster, low: &Raster, scratch: &mut ScratchSpace) -> Result<Blended> {
        let engine = self.engine;

        let region = engine.working_region(&[high, low])?;
        let cell_side = region.cell_side();
        info!(
            "Working region: {}x{} cells, nsres={} ewres={}, cell side {}",
            region.cols(),
            region.rows(),
            region.ns_res(),
            region.ew_res(),
            cell_side
        );

        let low_h = harmonize::harmonize(engine, low, &region)?;
        scratch.track_raster("low_harmonized", &low_h)?;
        let high_h = harmonize::align(engine, high, &region)?;
        scratch.track_raster("high_aligned", &high_h)?;

        let coverage = extent::resolve(engine, &high_h, &low_h)?;
        scratch.track_area("high_extent", &coverage.high)?;
        scratch.track_area("low_extent", &coverage.low)?;
        scratch.track_area("interpolation_area", &coverage.gap)?;

        let mut report = BlendReport {
            region: region.clone(),
            cell_side,
            gap_cells: coverage.gap.cell_count(),
            inner_samples: 0,
            outer_samples: 0,
            mode: StitchMode::Stitched,
            artifacts: 0,
        };

        if let Some(reason) = coverage.degenerate() {
            match reason {
                OverlayReason::EmptyGap => info!("Nothing to stitch: {}", reason),
                _ => warn!("Nothing to stitch: {}", reason),
            }
            return self.direct_overlay(&high_h, &low_h, report, reason, scratch);
        }

        let difference = difference::build(engine, &high_h, &low_h)?;
        scratch.track_raster("difference", &difference.raster)?;
        scratch.track_points("difference_points", &difference.points);

        let (samples, outer) = boundary::sample(
            engine,
            &difference.points,
            &high_h,
            &coverage.low,
            &coverage.gap,
            cell_side,
            &self.config,
        )?;
        scratch.track_raster("low_footprint", &outer.footprint)?;
        scratch.track_raster("distance_to_high", &outer.distance)?;
        scratch.track_raster("weights", &outer.weights)?;
        scratch.track_area("interpolation_area_core", &outer.core)?;
        scratch.track_points("inner_edge_points", &samples.inner);
        scratch.track_points("outer_edge_points", &samples.outer);
        report.inner_samples = samples.inner.len();
        report.outer_samples = samples.outer.len();

        if samples.inner.is_empty() {
            let reason = OverlayReason::NoSeamSamples;
            warn!("Nothing to stitch: {}", reason);
            return self.direct_overlay(&high_h, &low_h, report, reason, scratch);
        }
        if samples.outer.is_empty() {
            warn!("No outer edge samples, correction will not fade out across the gap");
        }

        let merged = samples.merged();
        scratch.track_points("edge_points", &merged);

        let stitching = stitch::interpolate(engine, &merged, &coverage.gap, &region, self.config.idw)?;
        scratch.track_raster("stitching_full", &stitching.full)?;
        scratch.track_raster("interpolation_area_mask", &stitching.mask)?;
        scratch.track_raster("stitching", &stitching.correction)?;

        let (smoothed, output) = composite::apply(engine, &high_h, &low_h, &stitching.correction)?;
        scratch.track_raster("smoothed_low", &smoothed)?;

        report.artifacts = scratch.len();
        info!("Smoothed raster created");
        Ok(Blended {
            raster: output.with_projection(high.projection()),
            report,
        })
    }

    fn direct_overlay(
        &self,
        high: &Raster,
        low: &Raster,
        mut report: BlendReport,
        reason: OverlayReason,
        scratch: &ScratchSpace,
    ) -> Result<Blended> {
        let output = composite::overlay(self.engine, high, low)?;
        report.mode = StitchMode::DirectOverlay(reason);
        report.artifacts = scratch.len();
        Ok(Blended {
            raster: output.with_projection(high.projection()),
            report,
        })
    }
}

/// Input errors, raised before any geoprocessing runs.
fn check_inputs(high: &Raster, low: &Raster) -> Result<()> {
    if high.valid_count() == 0 {
        return Err(BlendError::EmptyInput("high".to_string()));
    }
    if low.valid_count() == 0 {
        return Err(BlendError::EmptyInput("low".to_string()));
    }
    crs::ensure_same_crs(high.projection(), low.projection())?;
    crs::warn_if_geographic(high.projection());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GridEngine;
    use crate::region::Extent;

    #[test]
    fn test_default_config_is_valid() {
        let config = BlendConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.idw.power, 2.0);
        assert_eq!(config.idw.neighbors, 50);
        assert_eq!(config.edge_weight, 9500.0);
    }

    #[test]
    fn test_edge_weight_must_be_inside_range() {
        assert!(BlendConfig::new().with_edge_weight(0.0).validate().is_err());
        assert!(BlendConfig::new().with_edge_weight(WEIGHT_MAX).validate().is_err());
        assert!(Blender::new(&GridEngine, BlendConfig::new().with_neighbors(0)).is_err());
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let region = Region::new(Extent::new(0.0, 2.0, 0.0, 2.0), 1.0, 1.0).unwrap();
        let empty = Raster::empty(region.clone());
        let full = Raster::filled(region, 1.0);
        let blender = Blender::new(&GridEngine, BlendConfig::default()).unwrap();

        assert!(matches!(blender.blend(&empty, &full), Err(BlendError::EmptyInput(_))));
        assert!(matches!(blender.blend(&full, &empty), Err(BlendError::EmptyInput(_))));
    }
}
