//! PCV Data Crate
//!
//! Ingestion pipeline for delimited point files: line templates, point offset
//! algebra, color resolution, multi-source aggregation, sampling and
//! serialization. This crate knows nothing about windows or rendering.

pub mod aggregate;
pub mod cancel;
pub mod cloud;
pub mod color;
pub mod config;
pub mod error;
pub mod loader;
pub mod pattern;
pub mod sample;
pub mod selection;
pub mod serialize;
pub mod types;

pub use aggregate::{Aggregator, Points, SourceSummary};
pub use cancel::CancellationToken;
pub use cloud::{ColoredCloud, SceneBounds};
pub use color::{ColorResolver, infer_rgb};
pub use config::{DEFAULT_PATTERN, SourceConfig, load_configs, parse_configs};
pub use error::{
    ConfigError, LoadError, ParseError, PatternError, SampleError, SaveError, SelectionError,
};
pub use loader::{FileLoader, SourceReader};
pub use pattern::Pattern;
pub use sample::{GridDownsampler, Sampler, VoxelDownsampler, sample_fraction};
pub use selection::Selection;
pub use serialize::{ColorMode, NpyWriter, PersistenceSink, Rows, SaveHandle, spawn_save};
pub use types::Point;
