use crate::discover::DiscoveryError;
use crate::render::RenderError;
use crate::validate::ValidationError;
use pcv_data::{ConfigError, LoadError, SampleError, SaveError};
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can end a run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(LoadError),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error("Failed to create {}: {source}", path.display())]
    CreateParent {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Interrupted")]
    Cancelled,
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Cancelled => AppError::Cancelled,
            other => AppError::Load(other),
        }
    }
}

impl AppError {
    /// Process exit code for this outcome. An interrupt is a clean exit.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Cancelled => 0,
            _ => 1,
        }
    }
}
