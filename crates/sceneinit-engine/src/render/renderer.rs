use anyhow::Result;

use crate::host::{DisplayElement, ViewportSize};
use crate::scene::{PerspectiveCamera, SceneRoot};

use super::{FrameData, RenderSurface};

/// Creation-time renderer configuration.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct RendererParams {
    /// Multisampled color output.
    pub antialias: bool,
    pub shadow_map_enabled: bool,
}

/// Draws a scene from a camera onto one surface.
pub struct Renderer<S> {
    surface: S,
    params: RendererParams,
    size: ViewportSize,
    frames: u64,
}

impl<S: RenderSurface> Renderer<S> {
    pub fn new(surface: S, params: RendererParams) -> Self {
        Self {
            surface,
            params,
            size: ViewportSize::default(),
            frames: 0,
        }
    }

    pub fn params(&self) -> RendererParams {
        self.params
    }

    pub fn set_shadow_map_enabled(&mut self, enabled: bool) {
        self.params.shadow_map_enabled = enabled;
        self.surface.set_shadow_map_enabled(enabled);
    }

    /// Sets the output size. Calling it again with the same size is a no-op.
    pub fn set_size(&mut self, size: ViewportSize) {
        if self.size == size {
            return;
        }
        self.size = size;
        self.surface.resize(size);
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    /// Display-tree element for this renderer's output.
    pub fn dom_element(&self) -> DisplayElement {
        DisplayElement::Canvas(self.surface.id().to_string())
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn render(&mut self, scene: &SceneRoot, camera: &PerspectiveCamera) -> Result<()> {
        let view = camera.view_matrix();
        let projection = *camera.projection_matrix();

        let frame = FrameData {
            clear: scene.background,
            view,
            projection,
            view_proj: projection * view,
            eye: camera.position,
            visible_nodes: scene.visible_count(),
        };

        self.surface.draw(&frame)?;
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeSurface;
    use crate::scene::SceneNode;

    #[test]
    fn set_size_forwards_only_changes() {
        let (surface, log) = FakeSurface::new("c");
        let mut renderer = Renderer::new(surface, RendererParams::default());

        renderer.set_size(ViewportSize::new(800, 600));
        renderer.set_size(ViewportSize::new(800, 600));
        renderer.set_size(ViewportSize::new(1024, 768));

        assert_eq!(
            log.borrow().resizes,
            vec![ViewportSize::new(800, 600), ViewportSize::new(1024, 768)]
        );
        assert_eq!(renderer.size(), ViewportSize::new(1024, 768));
    }

    #[test]
    fn render_passes_camera_and_background() {
        let (surface, log) = FakeSurface::new("c");
        let mut renderer = Renderer::new(surface, RendererParams::default());
        let scene = SceneRoot::new();
        let camera = PerspectiveCamera::new(45.0, 1.0, 1.0, 1000.0);

        renderer.render(&scene, &camera).unwrap();

        let log = log.borrow();
        assert_eq!(log.frames.len(), 1);
        assert_eq!(log.frames[0].clear, scene.background);
        assert_eq!(log.frames[0].view_proj, camera.view_projection());
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn render_counts_only_visible_nodes() {
        let (surface, log) = FakeSurface::new("c");
        let mut renderer = Renderer::new(surface, RendererParams::default());
        let mut scene = SceneRoot::new();
        scene.add(SceneNode::new("a"));
        scene.add(SceneNode::new("b"));
        let mut hidden = SceneNode::new("hidden");
        hidden.visible = false;
        scene.add(hidden);

        renderer.render(&scene, &PerspectiveCamera::new(45.0, 1.0, 1.0, 1000.0)).unwrap();

        assert_eq!(log.borrow().frames[0].visible_nodes, 2);
    }

    #[test]
    fn surface_errors_propagate() {
        let (surface, log) = FakeSurface::new("c");
        log.borrow_mut().fail_draws = true;
        let mut renderer = Renderer::new(surface, RendererParams::default());

        let err = renderer
            .render(&SceneRoot::new(), &PerspectiveCamera::new(45.0, 1.0, 1.0, 1000.0))
            .unwrap_err();
        assert!(err.to_string().contains("draw failed"));
        assert_eq!(renderer.frames(), 0);
    }

    #[test]
    fn dom_element_names_the_surface() {
        let (surface, _) = FakeSurface::new("myCanvas");
        let renderer = Renderer::new(surface, RendererParams::default());
        assert_eq!(renderer.dom_element(), DisplayElement::Canvas("myCanvas".into()));
    }
}
