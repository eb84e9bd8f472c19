//! Command line option validation.
//!
//! Every check runs before any source is opened. Combinations that would have
//! no effect are rejected rather than silently ignored.

use crate::Args;
use pcv_data::{ColorMode, Selection, SelectionError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Conflicting or nonsensical option combinations.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Passing --cbid with --no-exe will have no effect")]
    CbidWithoutRender,

    #[error("Passing --frac with --no-exe but without --downsample will have no effect")]
    FracWithoutEffect,

    #[error("Invalid value for --frac : {0} (should be > 0 and <= 1)")]
    FracOutOfRange(f64),

    #[error("Passing --voxel-size with --no-exe but without --downsample will have no effect")]
    VoxelSizeWithoutEffect,

    #[error("Invalid value for --voxel-size : {0} (should be > 0)")]
    VoxelSizeNotPositive(f64),

    #[error("Passing --downsample without --frac or --voxel-size will have no effect")]
    DownsampleWithoutReduction,

    #[error("--frac and --voxel-size are mutually exclusive")]
    FracAndVoxelSize,

    #[error("Invalid save path supplied : {} is a directory", .0.display())]
    SaveIsDirectory(PathBuf),

    #[error("Passing --make-parent without --save will do nothing")]
    MakeParentWithoutSave,

    #[error("Invalid save path supplied : parent directory of {} does not exist", .0.display())]
    MissingSaveParent(PathBuf),

    #[error("Passing --no-exe without --save will do nothing")]
    NoExeWithoutSave,

    #[error("Passing --no-color without --save will do nothing")]
    NoColorWithoutSave,

    #[error("Invalid value for --only : {0}")]
    Selection(#[from] SelectionError),
}

/// Validated run options.
#[derive(Debug, Clone)]
pub struct Options {
    pub force_color_by_id: bool,
    pub cfg: Option<PathBuf>,
    pub fraction: Option<f64>,
    pub voxel_size: Option<f64>,
    /// Save the reduced cloud instead of the canonical one.
    pub save_reduced: bool,
    pub save: Option<PathBuf>,
    /// Parent directory to create before saving.
    pub create_parent: Option<PathBuf>,
    pub render: bool,
    pub color_mode: ColorMode,
    pub only: Option<Selection>,
    pub seed: Option<u64>,
}

impl Options {
    pub fn from_args(args: &Args) -> Result<Self, ValidationError> {
        let downsample = args.downsample;
        let no_exe = args.no_exe;

        if args.cbid && no_exe {
            return Err(ValidationError::CbidWithoutRender);
        }
        if args.frac.is_some() && no_exe && !downsample {
            return Err(ValidationError::FracWithoutEffect);
        }
        if let Some(frac) = args.frac {
            if !(frac > 0.0 && frac <= 1.0) {
                return Err(ValidationError::FracOutOfRange(frac));
            }
        }
        if args.voxel_size.is_some() && no_exe && !downsample {
            return Err(ValidationError::VoxelSizeWithoutEffect);
        }
        if let Some(size) = args.voxel_size {
            if !(size > 0.0 && size.is_finite()) {
                return Err(ValidationError::VoxelSizeNotPositive(size));
            }
        }
        if downsample && args.frac.is_none() && args.voxel_size.is_none() {
            return Err(ValidationError::DownsampleWithoutReduction);
        }
        if args.frac.is_some() && args.voxel_size.is_some() {
            return Err(ValidationError::FracAndVoxelSize);
        }

        let mut create_parent = None;
        match &args.save {
            Some(save) => {
                if save.is_dir() {
                    return Err(ValidationError::SaveIsDirectory(save.clone()));
                }
                let parent = parent_dir(save);
                if !parent.exists() {
                    if args.make_parent {
                        create_parent = Some(parent.to_path_buf());
                    } else {
                        return Err(ValidationError::MissingSaveParent(save.clone()));
                    }
                }
            }
            None => {
                if args.make_parent {
                    return Err(ValidationError::MakeParentWithoutSave);
                }
                if no_exe {
                    return Err(ValidationError::NoExeWithoutSave);
                }
                if args.no_color {
                    return Err(ValidationError::NoColorWithoutSave);
                }
            }
        }

        let only = args.only.as_deref().map(str::parse::<Selection>).transpose()?;

        Ok(Self {
            force_color_by_id: args.cbid,
            cfg: args.cfg.clone(),
            fraction: args.frac,
            voxel_size: args.voxel_size,
            save_reduced: downsample,
            save: args.save.clone(),
            create_parent,
            render: !no_exe,
            color_mode: if args.no_color {
                ColorMode::PositionsOnly
            } else {
                ColorMode::Rgb
            },
            only,
            seed: args.seed,
        })
    }
}

/// Directory a file would be written to; a bare file name lives in the working directory.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
