//! Application pipeline with builder pattern.
//!
//! One run goes config -> ingestion -> reduction -> render and save. The
//! reduced cloud feeds the renderer; the save path gets either the canonical
//! cloud or, with `--downsample`, the reduced one.

use crate::discover::discover_config;
use crate::error::AppError;
use crate::render::{HeadlessSink, RenderFrame, RenderSink};
use crate::validate::Options;
use indicatif::{ProgressBar, ProgressStyle};
use pcv_data::{
    Aggregator, CancellationToken, ColorResolver, ColoredCloud, FileLoader, GridDownsampler,
    NpyWriter, Point, Rows, Sampler, SaveHandle, load_configs, spawn_save,
};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Logging configuration.
pub struct LoggingConfig {
    pub level: String,
    #[cfg_attr(not(feature = "tracy"), allow(dead_code))]
    pub enable_tracy: bool,
}

impl LoggingConfig {
    pub fn from_verbosity(verbose: bool) -> Self {
        Self {
            level: if verbose { "debug" } else { "info" }.to_string(),
            ..Self::default()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_tracy: cfg!(feature = "tracy"),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) {
    #[cfg(feature = "tracy")]
    {
        if config.enable_tracy {
            use tracing_subscriber::Layer;
            use tracing_subscriber::layer::SubscriberExt;
            use tracing_subscriber::util::SubscriberInitExt;
            tracing_subscriber::registry()
                .with(tracing_tracy::TracyLayer::default())
                .with(
                    tracing_subscriber::fmt::layer().with_target(false).with_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env()
                            .unwrap_or_else(|_| config.level.clone().into()),
                    ),
                )
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level)),
        )
        .with_target(false)
        .init();
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub config: PathBuf,
    /// Size of the canonical cloud.
    pub points: usize,
    /// Size of the cloud handed to the renderer.
    pub rendered: Option<usize>,
    pub saved: Option<PathBuf>,
}

/// Configured run of the viewer.
pub struct App {
    options: Options,
    config_root: PathBuf,
    cancel: CancellationToken,
    renderer: Box<dyn RenderSink>,
}

impl App {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            config_root: PathBuf::from("."),
            cancel: CancellationToken::new(),
            renderer: Box::new(HeadlessSink::default()),
        }
    }

    /// Directory searched for a config when none was given.
    pub fn with_config_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config_root = root.into();
        self
    }

    /// Share a cancellation token, usually the one signals cancel.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replace the default headless renderer.
    pub fn with_renderer(mut self, renderer: impl RenderSink + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    fn check_cancelled(&self) -> Result<(), AppError> {
        if self.cancel.is_cancelled() {
            Err(AppError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn colorize(
        &self,
        points: &[Point],
        resolver: &mut ColorResolver,
    ) -> Result<ColoredCloud, AppError> {
        ColoredCloud::from_points(points, resolver, self.options.force_color_by_id, &self.cancel)
            .ok_or(AppError::Cancelled)
    }

    fn progress_bar(len: usize) -> ProgressBar {
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.green/blue}] {pos}/{len} sources {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏"),
        );
        pb
    }

    /// Run the pipeline to completion.
    ///
    /// A pending save is always waited on, even when presenting fails.
    #[tracing::instrument(skip_all)]
    pub fn run(mut self) -> Result<RunSummary, AppError> {
        if let Some(parent) = &self.options.create_parent {
            fs::create_dir_all(parent).map_err(|source| AppError::CreateParent {
                path: parent.clone(),
                source,
            })?;
            info!("Created directory {}", parent.display());
        }

        let config = match &self.options.cfg {
            Some(path) => path.clone(),
            None => discover_config(&self.config_root)?,
        };
        debug!("Received json config file path {}", config.display());

        let aggregator = Aggregator::new(load_configs(&config)?)
            .with_selection(self.options.only.as_ref());
        info!("Ingesting {} sources", aggregator.len());

        let loader = FileLoader::with_cancellation(self.cancel.clone());
        let progress = Self::progress_bar(aggregator.len());
        let points = aggregator.collect_with(&loader, |source| {
            progress.set_message(source.path.display().to_string());
            progress.inc(1);
        });
        progress.finish_and_clear();
        let points = points?;
        self.check_cancelled()?;
        if points.is_empty() {
            warn!("No points were loaded");
        }

        let force_by_id = self.options.force_color_by_id;
        let mut resolver = ColorResolver::new();
        resolver.prime(&points, force_by_id);

        let mut sampler = Sampler::new(
            self.options.fraction,
            self.options.voxel_size,
            self.options.seed,
        )?;
        if sampler.is_identity() {
            debug!("No reduction requested");
        } else {
            debug!(
                "Reducing with fraction {:?} and voxel size {:?}",
                sampler.fraction(),
                sampler.voxel_size()
            );
        }
        let wants_reduced =
            self.options.render || (self.options.save.is_some() && self.options.save_reduced);
        let reduced = if wants_reduced {
            let sampled = sampler.sample_points(&points);
            let cloud = self.colorize(&sampled, &mut resolver)?;
            Some(sampler.downsample_cloud(cloud, &GridDownsampler))
        } else {
            None
        };
        self.check_cancelled()?;

        let save_handle: Option<SaveHandle> = match &self.options.save {
            Some(path) => {
                let mode = self.options.color_mode;
                let rows = match reduced.as_ref().filter(|_| self.options.save_reduced) {
                    Some(cloud) => Rows::from_cloud(cloud, mode),
                    None => Rows::from_cloud(&self.colorize(&points, &mut resolver)?, mode),
                };
                Some(spawn_save(NpyWriter, path.clone(), rows)?)
            }
            None => None,
        };

        let rendered = match reduced.as_ref().filter(|_| self.options.render) {
            Some(cloud) => {
                let frame = RenderFrame::from_cloud(cloud);
                let len = frame.len();
                self.renderer.present(frame).map(|_| Some(len))
            }
            None => Ok(None),
        };

        if save_handle.as_ref().is_some_and(|handle| !handle.is_finished()) {
            info!("Waiting for the save to finish");
        }
        let saved = save_handle.map(SaveHandle::wait).transpose();
        let rendered = rendered?;
        let saved = saved?;

        Ok(RunSummary {
            config,
            points: points.len(),
            rendered,
            saved,
        })
    }
}
