//! pcv
//!
//! Point cloud viewer for delimited text files.
//!
//! Features:
//! - Per-source line templates and offsets from one JSON config
//! - Color by explicit channels or by class id
//! - Random fraction or voxel grid reduction of the rendered cloud
//! - Background export to `.npy`

mod app;
mod discover;
mod error;
mod render;
mod signal;
mod validate;

use app::{App, LoggingConfig, init_logging};
use clap::Parser;
use error::AppError;
use pcv_data::CancellationToken;
use std::path::PathBuf;
use tracing::{error, info, warn};
use validate::Options;

/// pcv - Point Cloud Viewer
#[derive(Parser, Debug)]
#[command(name = "pcv")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print debug messages
    #[arg(short, long)]
    verbose: bool,

    /// Color points by class id even when colors are parsed
    #[arg(short = 'i', long)]
    cbid: bool,

    /// Path to the JSON config, searched for in the working directory when omitted
    #[arg(short, long, value_name = "PATH")]
    cfg: Option<PathBuf>,

    /// Fraction of the points to render, in (0, 1]
    #[arg(short, long, value_name = "FRAC")]
    frac: Option<f64>,

    /// Voxel size for grid downsampling of the rendered cloud
    #[arg(long, value_name = "SIZE")]
    voxel_size: Option<f64>,

    /// Save the reduced cloud instead of the full one
    #[arg(short, long)]
    downsample: bool,

    /// Save the point cloud as a .npy array
    #[arg(short, long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Create the parent directory of the save path
    #[arg(short = 'p', long)]
    make_parent: bool,

    /// Do not open the viewer
    #[arg(long)]
    no_exe: bool,

    /// Save positions only
    #[arg(long)]
    no_color: bool,

    /// Sources to load, e.g. "1,3-5,<=2" (1-based)
    #[arg(long, value_name = "SEL")]
    only: Option<String>,

    /// Seed for the random fraction
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
}

fn main() {
    let args = Args::parse();
    init_logging(&LoggingConfig::from_verbosity(args.verbose));

    let result = Options::from_args(&args)
        .map_err(AppError::from)
        .and_then(|options| {
            let cancel = CancellationToken::new();
            if let Err(e) = signal::listen(cancel.clone()) {
                warn!("Failed to register signal handlers: {}", e);
            }
            App::new(options).with_cancellation(cancel).run()
        });

    match result {
        Ok(summary) => {
            info!(
                "Done: {} points from {}",
                summary.points,
                summary.config.display()
            );
            if let Some(rendered) = summary.rendered {
                info!("Rendered {} points", rendered);
            }
            if let Some(saved) = summary.saved {
                info!("Saved to {}", saved.display());
            }
        }
        Err(AppError::Cancelled) => {
            warn!("Interrupted, exiting");
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(e.exit_code());
        }
    }
}
