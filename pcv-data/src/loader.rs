//! Streaming source loader.
//!
//! [`FileLoader::load`] opens one source and returns a [`SourceReader`], a
//! lazy iterator that reads a single line per step, parses it with the
//! source's compiled pattern and moves it by the source offset.

use crate::cancel::CancellationToken;
use crate::config::SourceConfig;
use crate::error::LoadError;
use crate::pattern::Pattern;
use crate::types::Point;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Opens sources and hands out readers sharing one cancellation token.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    cancel: CancellationToken,
}

impl FileLoader {
    /// Create a loader that is never cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader whose readers stop once `cancel` fires.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Open a source, treating a missing file as an empty source.
    #[tracing::instrument(skip_all, fields(path = %config.file_path.display()))]
    pub fn load(&self, config: &SourceConfig) -> Result<SourceReader, LoadError> {
        match self.open(config) {
            Err(LoadError::SourceNotFound { path }) => {
                warn!("Skipping unknown file: {}", path.display());
                Ok(SourceReader::empty(path))
            }
            other => other,
        }
    }

    /// Open a source, reporting a missing file as [`LoadError::SourceNotFound`].
    pub fn open(&self, config: &SourceConfig) -> Result<SourceReader, LoadError> {
        let path = config.file_path.clone();
        let pattern = Pattern::compile(&config.pattern).map_err(|source| LoadError::Pattern {
            path: path.clone(),
            source,
        })?;

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LoadError::SourceNotFound { path });
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };

        let offset = Point::offset(config.source_xyz);
        debug!("Loading file: \u{2026}/{}", basename(&path));
        debug!("Offset: {}", offset);
        debug!(
            "Pattern: {} ({} ignored field(s))",
            pattern.template(),
            pattern.wildcard_count()
        );

        Ok(SourceReader {
            path,
            open: Some(OpenSource {
                lines: BufReader::new(file).lines(),
                pattern,
            }),
            offset,
            skip_first_line: config.skip_first_line,
            line_number: 0,
            points_read: 0,
            cancel: self.cancel.clone(),
        })
    }
}

struct OpenSource {
    lines: Lines<BufReader<File>>,
    pattern: Pattern,
}

/// Lazy, single-pass sequence of the points of one source.
///
/// The first error ends the sequence. The file handle is dropped as soon as
/// the reader is exhausted, fails or is cancelled.
pub struct SourceReader {
    path: PathBuf,
    open: Option<OpenSource>,
    offset: Point,
    skip_first_line: bool,
    line_number: usize,
    points_read: usize,
    cancel: CancellationToken,
}

impl SourceReader {
    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            open: None,
            offset: Point::default(),
            skip_first_line: false,
            line_number: 0,
            points_read: 0,
            cancel: CancellationToken::new(),
        }
    }

    /// Path of the source being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Points yielded so far.
    pub fn points_read(&self) -> usize {
        self.points_read
    }

    fn close(&mut self) {
        if self.open.take().is_some() {
            debug!(
                "Loaded {} points from file: \u{2026}/{}",
                self.points_read,
                basename(&self.path)
            );
        }
    }
}

impl Iterator for SourceReader {
    type Item = Result<Point, LoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let open = self.open.as_mut()?;

            if self.cancel.is_cancelled() {
                self.open = None;
                return Some(Err(LoadError::Cancelled));
            }

            let line = match open.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(source)) => {
                    self.open = None;
                    return Some(Err(LoadError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
                None => {
                    self.close();
                    return None;
                }
            };
            self.line_number += 1;

            if self.line_number == 1 && self.skip_first_line {
                continue;
            }
            match open.pattern.parse(&line) {
                Ok(point) => {
                    self.points_read += 1;
                    return Some(Ok(point.offset_by(&self.offset)));
                }
                Err(source) => {
                    self.open = None;
                    return Some(Err(LoadError::Line {
                        path: self.path.clone(),
                        line: self.line_number,
                        source,
                    }));
                }
            }
        }
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
