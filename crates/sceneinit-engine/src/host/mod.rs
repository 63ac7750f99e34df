//! Host environment capability.
//!
//! The bootstrap never reaches for ambient window/document state. Everything it
//! needs from the embedding environment goes through [`Host`]:
//! - viewport size
//! - drawing-surface lookup and GPU resource acquisition
//! - the display tree (element attachment)
//! - resize subscription
//! - one-shot frame-presentation callbacks
//!
//! The production implementation is `window::WinitHost`.

#[cfg(test)]
pub(crate) mod fake;

use crate::render::{RenderSurface, RendererParams};

/// Drawable viewport size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width / height.
    ///
    /// A zero height is treated as one pixel so the result stays finite.
    #[inline]
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Elements the bootstrap places in the host display tree.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum DisplayElement {
    /// The renderer's output surface, by identifier.
    Canvas(String),
    /// The frame-timing overlay.
    StatsOverlay,
}

/// Handle for a pending frame callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameRequestId(pub u64);

/// Environment contract consumed by `bootstrap::SceneBootstrap`.
///
/// Dispatch rules every implementation follows:
/// - a frame request fires exactly once, at the next presentation opportunity,
///   unless cancelled first
/// - resize notifications reach the app only after `add_resize_listener`
pub trait Host {
    /// A located, not yet initialized drawing surface.
    type Canvas;

    /// A drawing surface with acquired rendering resources.
    type Surface: RenderSurface;

    /// Current viewport size.
    fn viewport(&self) -> ViewportSize;

    /// Locates a pre-existing drawing surface by identifier.
    fn find_surface(&mut self, id: &str) -> Option<Self::Canvas>;

    /// Acquires rendering resources for a located surface.
    fn create_surface(
        &mut self,
        canvas: Self::Canvas,
        params: &RendererParams,
    ) -> anyhow::Result<Self::Surface>;

    fn is_attached(&self, element: &DisplayElement) -> bool;

    fn append_child(&mut self, element: DisplayElement);

    /// Subscribes the running app to viewport resize notifications.
    fn add_resize_listener(&mut self);

    /// Requests a single callback at the next presentation opportunity.
    fn request_animation_frame(&mut self) -> FrameRequestId;

    fn cancel_animation_frame(&mut self, id: FrameRequestId);

    /// Presents the stats overlay's current readout.
    fn set_overlay_text(&mut self, text: &str);
}
