//! Materialized clouds handed to the renderer and the serializer.

use crate::cancel::CancellationToken;
use crate::color::ColorResolver;
use crate::types::Point;
use glam::DVec3;
use std::time::Instant;
use tracing::{debug, info};

/// Points resolved between two cancellation checks.
const CANCEL_STRIDE: usize = 4096;

/// Axis-aligned bounds of a cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneBounds {
    pub min: DVec3,
    pub max: DVec3,
    pub center: DVec3,
    pub radius: f64,
}

impl SceneBounds {
    pub fn from_positions(positions: impl IntoIterator<Item = DVec3>) -> Self {
        let mut min = DVec3::splat(f64::MAX);
        let mut max = DVec3::splat(f64::MIN);
        let mut count = 0usize;

        for pos in positions {
            min = min.min(pos);
            max = max.max(pos);
            count += 1;
        }

        if count == 0 {
            return Self {
                min: DVec3::ZERO,
                max: DVec3::ZERO,
                center: DVec3::ZERO,
                radius: 1.0,
            };
        }

        let center = (min + max) * 0.5;
        let radius = (max - min).length().max(1.0);
        Self {
            min,
            max,
            center,
            radius,
        }
    }
}

/// Parallel position and color arrays.
///
/// Colors are in `[0, 1]`. Both arrays always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColoredCloud {
    positions: Vec<DVec3>,
    colors: Vec<DVec3>,
}

impl ColoredCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cloud from matching position and color arrays.
    ///
    /// Returns `None` when the lengths differ.
    #[cfg(test)]
    pub(crate) fn from_parts(positions: Vec<DVec3>, colors: Vec<DVec3>) -> Option<Self> {
        (positions.len() == colors.len()).then_some(Self { positions, colors })
    }

    /// Resolve the color of every point.
    ///
    /// Returns `None` once `cancel` fires. The token is polled every few
    /// thousand points.
    pub fn from_points(
        points: &[Point],
        resolver: &mut ColorResolver,
        force_by_id: bool,
        cancel: &CancellationToken,
    ) -> Option<Self> {
        let start = Instant::now();
        let mut cloud = Self {
            positions: Vec::with_capacity(points.len()),
            colors: Vec::with_capacity(points.len()),
        };
        for chunk in points.chunks(CANCEL_STRIDE) {
            if cancel.is_cancelled() {
                debug!("Color pass cancelled after {} points", cloud.len());
                return None;
            }
            for point in chunk {
                cloud.push(point.xyz(), resolver.resolve(point, force_by_id));
            }
        }
        info!(
            "Created point cloud geometry in {:.3} s",
            start.elapsed().as_secs_f64()
        );
        Some(cloud)
    }

    pub fn push(&mut self, position: DVec3, color: DVec3) {
        self.positions.push(position);
        self.colors.push(color);
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[DVec3] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn bounds(&self) -> SceneBounds {
        SceneBounds::from_positions(self.positions.iter().copied())
    }

    /// Iterate `(position, color)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (DVec3, DVec3)> + '_ {
        self.positions.iter().copied().zip(self.colors.iter().copied())
    }
}
