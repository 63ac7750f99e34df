//! Rendering front-end.
//!
//! [`Renderer`] owns exactly one [`RenderSurface`] and turns the scene root plus
//! camera into per-frame [`FrameData`]. Surfaces own the graphics resources;
//! the production surface is `device::GpuSurface`.

mod renderer;
mod surface;

pub use renderer::{Renderer, RendererParams};
pub use surface::{FrameData, RenderSurface};
