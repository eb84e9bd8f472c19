//! Flattening clouds into rows and persisting them.
//!
//! [`Rows`] is a dense, headerless, row-major table of `f64`, either
//! `[x, y, z, r, g, b]` or `[x, y, z]` per point. [`NpyWriter`] stores it as a
//! NumPy `.npy` array; [`spawn_save`] runs a sink on a background thread and
//! returns a [`SaveHandle`] to wait on.

use crate::cloud::ColoredCloud;
use crate::error::SaveError;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info};

/// Which columns end up in each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// `[x, y, z, r, g, b]`
    #[default]
    Rgb,
    /// `[x, y, z]`
    PositionsOnly,
}

impl ColorMode {
    pub fn width(self) -> usize {
        match self {
            ColorMode::Rgb => 6,
            ColorMode::PositionsOnly => 3,
        }
    }
}

/// Fixed-width numeric rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Rows {
    width: usize,
    data: Vec<f64>,
}

impl Rows {
    pub fn from_cloud(cloud: &ColoredCloud, mode: ColorMode) -> Self {
        let width = mode.width();
        let mut data = Vec::with_capacity(cloud.len() * width);
        for (position, color) in cloud.iter() {
            data.extend_from_slice(&position.to_array());
            if mode == ColorMode::Rgb {
                data.extend_from_slice(&color.to_array());
            }
        }
        Self { width, data }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    /// Row-major values.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

/// Destination for flattened rows.
pub trait PersistenceSink {
    /// Write `rows` to `path`, returning the path actually written.
    fn write(&self, path: &Path, rows: &Rows) -> Result<PathBuf, SaveError>;
}

/// Writes rows as a NumPy `.npy` (format 1.0, little-endian `f8`, C order).
#[derive(Debug, Clone, Copy, Default)]
pub struct NpyWriter;

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_ALIGN: usize = 64;

impl NpyWriter {
    /// `path` with `.npy` appended unless it already ends with it.
    pub fn target_path(path: &Path) -> PathBuf {
        if path.extension().is_some_and(|ext| ext == "npy") {
            path.to_path_buf()
        } else {
            let mut name = path.as_os_str().to_owned();
            name.push(".npy");
            PathBuf::from(name)
        }
    }

    fn header(rows: &Rows) -> Vec<u8> {
        let dict = format!(
            "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
            rows.len(),
            rows.width()
        );
        // magic + version + u16 length + dict + newline, padded to the alignment
        let unpadded = NPY_MAGIC.len() + 2 + 2 + dict.len() + 1;
        let padding = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
        let header_len = dict.len() + padding + 1;

        let mut header = Vec::with_capacity(unpadded + padding);
        header.extend_from_slice(NPY_MAGIC);
        header.extend_from_slice(&[1, 0]);
        header.extend_from_slice(&(header_len as u16).to_le_bytes());
        header.extend_from_slice(dict.as_bytes());
        header.extend(std::iter::repeat_n(b' ', padding));
        header.push(b'\n');
        header
    }

    /// Encode rows into any writer.
    pub fn encode<W: io::Write>(&self, mut out: W, rows: &Rows) -> io::Result<()> {
        out.write_all(&Self::header(rows))?;
        for value in rows.as_slice() {
            out.write_all(&value.to_le_bytes())?;
        }
        out.flush()
    }
}

impl PersistenceSink for NpyWriter {
    fn write(&self, path: &Path, rows: &Rows) -> Result<PathBuf, SaveError> {
        let path = Self::target_path(path);
        let io_err = |source| SaveError::Io {
            path: path.clone(),
            source,
        };
        let file = File::create(&path).map_err(io_err)?;
        self.encode(BufWriter::new(file), rows).map_err(io_err)?;
        Ok(path)
    }
}

/// Completion handle of a background save.
#[derive(Debug)]
pub struct SaveHandle {
    handle: JoinHandle<Result<PathBuf, SaveError>>,
}

impl SaveHandle {
    /// Whether the save has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the save completes.
    pub fn wait(self) -> Result<PathBuf, SaveError> {
        self.handle.join().map_err(|_| SaveError::WorkerPanicked)?
    }
}

/// Persist `rows` on a background thread.
pub fn spawn_save<S>(sink: S, path: PathBuf, rows: Rows) -> Result<SaveHandle, SaveError>
where
    S: PersistenceSink + Send + 'static,
{
    debug!("Saving {} rows of width {} in the background", rows.len(), rows.width());
    let handle = thread::Builder::new()
        .name("pcv-save".to_string())
        .spawn(move || {
            let start = Instant::now();
            let written = sink.write(&path, &rows)?;
            info!(
                "Saved point cloud to {} in {:.3} s",
                written.display(),
                start.elapsed().as_secs_f64()
            );
            Ok(written)
        })
        .map_err(|source| SaveError::Io {
            path: PathBuf::new(),
            source,
        })?;
    Ok(SaveHandle { handle })
}
