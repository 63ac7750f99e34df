use nalgebra::{Matrix4, Point3};

use crate::host::ViewportSize;
use crate::scene::Color;

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    pub clear: Color,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub view_proj: Matrix4<f32>,
    pub eye: Point3<f32>,
    pub visible_nodes: usize,
}

/// A drawing surface bound to one host element.
pub trait RenderSurface {
    /// Identifier of the host element this surface draws into.
    fn id(&self) -> &str;

    fn set_shadow_map_enabled(&mut self, enabled: bool);

    /// Resizes the output buffers. Zero sizes are accepted and defer reconfiguration.
    fn resize(&mut self, size: ViewportSize);

    fn draw(&mut self, frame: &FrameData) -> anyhow::Result<()>;
}
