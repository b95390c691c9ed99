use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use raster_blend::blend::{BlendConfig, Blender, StitchMode};
use raster_blend::cli::Args;
use raster_blend::engine::GridEngine;
use raster_blend::error::Result;
use raster_blend::scratch::ScratchConfig;
use raster_blend::{creation, io};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("=== Raster Resolution Blend ===");

    // Set thread pool size if specified
    if let Some(n_threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build_global()?;
        info!("Using {} threads", n_threads);
    } else {
        info!("Using all available threads");
    }

    // Validate everything before touching the inputs
    let config = BlendConfig::new()
        .with_power(args.power)
        .with_neighbors(args.neighbors)
        .with_edge_weight(args.edge_weight);
    let engine = GridEngine::new();
    let blender = Blender::new(&engine, config)?.with_scratch(ScratchConfig {
        dir: args.scratch_dir.clone(),
        keep: args.keep_scratch,
    });
    let options = creation::creation_options(&args.compress, args.tile_size)?;
    let config = blender.config();
    info!(
        "IDW power {}, {} neighbors, edge weight {}",
        config.idw.power, config.idw.neighbors, config.edge_weight
    );

    info!("Reading high-resolution raster: {}", args.high.display());
    let high = io::read_raster(&args.high, args.nodata)?;
    info!("Reading low-resolution raster: {}", args.low.display());
    let low = io::read_raster(&args.low, args.nodata)?;

    info!(
        "High: {}x{} at {:.6} x {:.6}",
        high.region().cols(),
        high.region().rows(),
        high.region().ew_res(),
        high.region().ns_res()
    );
    info!(
        "Low: {}x{} at {:.6} x {:.6}",
        low.region().cols(),
        low.region().rows(),
        low.region().ew_res(),
        low.region().ns_res()
    );
    if high.region().cell_side() > low.region().cell_side() {
        warn!("The --high raster is coarser than the --low raster");
    }

    let blended = blender.blend(&high, &low)?;
    match blended.report.mode {
        StitchMode::Stitched => info!(
            "Stitched {} gap cells from {} inner and {} outer edge samples",
            blended.report.gap_cells, blended.report.inner_samples, blended.report.outer_samples
        ),
        StitchMode::DirectOverlay(reason) => info!("Plain overlay ({})", reason),
    }

    info!("Writing output: {}", args.output.display());
    io::write_raster(&args.output, &blended.raster, &options)?;

    info!("=== Done! ===");
    Ok(())
}
