//! Point reduction for the render path.
//!
//! Two knobs are available: a random fraction of the points, and a voxel grid
//! that merges every point falling into the same cell. Both produce new data
//! and leave their input untouched.

use crate::cloud::ColoredCloud;
use crate::error::SampleError;
use crate::types::Point;
use glam::DVec3;
use hashbrown::HashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::info;

/// Pick `floor(len * fraction)` points uniformly without replacement.
///
/// Picked points keep their relative input order. This is a single bounded
/// pass over memory already loaded, so it does not poll for cancellation.
pub fn sample_fraction<R: Rng + ?Sized>(points: &[Point], fraction: f64, rng: &mut R) -> Vec<Point> {
    let amount = ((points.len() as f64 * fraction).floor() as usize).min(points.len());
    let mut picked = rand::seq::index::sample(rng, points.len(), amount).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| points[i]).collect()
}

/// Spatial downsampling of a colored cloud.
pub trait VoxelDownsampler {
    fn downsample(&self, cloud: &ColoredCloud, voxel_size: f64) -> ColoredCloud;
}

#[derive(Default, Clone, Copy)]
struct VoxelAccum {
    position: DVec3,
    color: DVec3,
    n: usize,
}

/// Replaces the points of each occupied voxel by their centroid and mean color.
///
/// Voxels are emitted in ascending grid order. Non-finite positions are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridDownsampler;

impl VoxelDownsampler for GridDownsampler {
    fn downsample(&self, cloud: &ColoredCloud, voxel_size: f64) -> ColoredCloud {
        let mut bins: HashMap<(i64, i64, i64), VoxelAccum> = HashMap::new();

        for (position, color) in cloud.iter() {
            if !position.is_finite() {
                continue;
            }
            let cell = (position / voxel_size).floor();
            let entry = bins
                .entry((cell.x as i64, cell.y as i64, cell.z as i64))
                .or_default();
            entry.position += position;
            entry.color += color;
            entry.n += 1;
        }

        let mut keys: Vec<(i64, i64, i64)> = bins.keys().copied().collect();
        keys.sort_unstable();

        let mut out = ColoredCloud::new();
        for key in keys {
            let accum = bins[&key];
            let denom = accum.n as f64;
            out.push(accum.position / denom, accum.color / denom);
        }
        out
    }
}

/// Reduction settings for the render path.
#[derive(Debug, Clone)]
pub struct Sampler {
    fraction: Option<f64>,
    voxel_size: Option<f64>,
    rng: StdRng,
}

impl Sampler {
    /// Create a sampler. `seed` fixes the fractional draw; `None` seeds from entropy.
    pub fn new(
        fraction: Option<f64>,
        voxel_size: Option<f64>,
        seed: Option<u64>,
    ) -> Result<Self, SampleError> {
        if let Some(f) = fraction {
            if !(f > 0.0 && f <= 1.0) {
                return Err(SampleError::InvalidFraction(f));
            }
        }
        if let Some(v) = voxel_size {
            if !(v > 0.0 && v.is_finite()) {
                return Err(SampleError::InvalidVoxelSize(v));
            }
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            fraction,
            voxel_size,
            rng,
        })
    }

    pub fn fraction(&self) -> Option<f64> {
        self.fraction
    }

    pub fn voxel_size(&self) -> Option<f64> {
        self.voxel_size
    }

    /// Whether this sampler reduces anything.
    pub fn is_identity(&self) -> bool {
        self.fraction.is_none() && self.voxel_size.is_none()
    }

    /// Apply the fractional knob, if set, to a copy of `points`.
    pub fn sample_points(&mut self, points: &[Point]) -> Vec<Point> {
        let Some(fraction) = self.fraction else {
            return points.to_vec();
        };
        let start = Instant::now();
        let sampled = sample_fraction(points, fraction, &mut self.rng);
        info!(
            "Pulled {} points randomly in {:.3} s",
            sampled.len(),
            start.elapsed().as_secs_f64()
        );
        sampled
    }

    /// Apply the voxel knob, if set.
    pub fn downsample_cloud(
        &self,
        cloud: ColoredCloud,
        downsampler: &dyn VoxelDownsampler,
    ) -> ColoredCloud {
        let Some(voxel_size) = self.voxel_size else {
            return cloud;
        };
        let start = Instant::now();
        let reduced = downsampler.downsample(&cloud, voxel_size);
        info!(
            "Downsampled point cloud geometry to {} points in {:.3} s",
            reduced.len(),
            start.elapsed().as_secs_f64()
        );
        reduced
    }
}
