//! Hand-off of the reduced cloud to a renderer.
//!
//! The window and GPU lifecycle lives behind [`RenderSink`]. The binary ships
//! [`HeadlessSink`], which reports what would be drawn.

use glam::Vec3;
use pcv_data::{ColoredCloud, SceneBounds};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Renderer rejected frame: {0}")]
    Rejected(String),
}

/// Vertex data for one presentation, narrowed to the `f32` a GPU consumes.
#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub bounds: SceneBounds,
}

impl RenderFrame {
    pub fn from_cloud(cloud: &ColoredCloud) -> Self {
        Self {
            positions: cloud.positions().iter().map(|p| p.as_vec3()).collect(),
            colors: cloud.colors().iter().map(|c| c.as_vec3()).collect(),
            bounds: cloud.bounds(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Anything that can present a frame. Blocks until the viewer is closed.
pub trait RenderSink {
    fn present(&mut self, frame: RenderFrame) -> Result<(), RenderError>;
}

/// Logs the frame instead of opening a window.
pub struct HeadlessSink {
    title: String,
}

impl HeadlessSink {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Default for HeadlessSink {
    fn default() -> Self {
        Self::new("pcv")
    }
}

impl RenderSink for HeadlessSink {
    fn present(&mut self, frame: RenderFrame) -> Result<(), RenderError> {
        if frame.positions.len() != frame.colors.len() {
            return Err(RenderError::Rejected(format!(
                "{} positions but {} colors",
                frame.positions.len(),
                frame.colors.len()
            )));
        }
        if frame.is_empty() {
            warn!("{}: nothing to draw", self.title);
            return Ok(());
        }
        let bounds = &frame.bounds;
        info!(
            "{}: {} points, bounds {:?} .. {:?}, center {:?}, radius {:.3}",
            self.title,
            frame.len(),
            bounds.min.to_array(),
            bounds.max.to_array(),
            bounds.center.to_array(),
            bounds.radius
        );
        Ok(())
    }
}
