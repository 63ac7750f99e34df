use nalgebra::Point3;

use crate::controls::OrbitControls;
use crate::core::{App, AppControl};
use crate::host::{DisplayElement, FrameRequestId, Host};
use crate::input::InputEvent;
use crate::render::{RenderSurface, Renderer, RendererParams};
use crate::scene::{PerspectiveCamera, SceneRoot};
use crate::stats::Stats;
use crate::time::FrameClock;

use super::{AnimationHandle, BootstrapError, SceneConfig};

// Clip distances used when the camera is created. The stored
// `SceneConfig::near_plane`/`far_plane` are not consulted.
const CAMERA_NEAR: f32 = 1.0;
const CAMERA_FAR: f32 = 1000.0;

/// Above and behind the origin.
const CAMERA_POSITION: [f32; 3] = [0.0, 30.0, 20.0];

struct Parts<S> {
    scene: SceneRoot,
    camera: PerspectiveCamera,
    renderer: Renderer<S>,
    controls: OrbitControls,
    stats: Stats,
    clock: FrameClock,
}

/// Owns the scene root, camera, renderer, orbit controls and stats overlay,
/// and drives them once per presented frame.
///
/// Usage:
/// 1. `SceneBootstrap::new("myCanvas")` (no side effects)
/// 2. `initialize(host)` acquires everything
/// 3. `animate(host)` once; afterwards the host's frame callbacks keep it going
///
/// Through [`App`], a host runtime performs steps 2 and 3 in `init`.
pub struct SceneBootstrap<S> {
    config: SceneConfig,
    parts: Option<Parts<S>>,
    animation: AnimationHandle,
    pending_frame: Option<FrameRequestId>,
}

impl<S: RenderSurface> SceneBootstrap<S> {
    pub fn new(surface_id: impl Into<String>) -> Self {
        Self::with_config(SceneConfig::new(surface_id))
    }

    pub fn with_config(config: SceneConfig) -> Self {
        Self {
            config,
            parts: None,
            animation: AnimationHandle::default(),
            pending_frame: None,
        }
    }

    /// Creates the scene, camera, renderer, controls and stats, and subscribes
    /// to viewport resizes.
    ///
    /// Fails with [`BootstrapError::SurfaceNotFound`] before any renderer is
    /// created when the surface identifier does not resolve.
    pub fn initialize<H>(&mut self, host: &mut H) -> Result<(), BootstrapError>
    where
        H: Host<Surface = S>,
    {
        if self.parts.is_some() {
            return Err(BootstrapError::AlreadyInitialized);
        }

        let viewport = host.viewport();
        let scene = SceneRoot::new();

        let mut camera = PerspectiveCamera::new(self.config.fov, viewport.aspect(), CAMERA_NEAR, CAMERA_FAR);
        camera.position = Point3::from(CAMERA_POSITION);

        let id = self.config.surface_id.clone();
        let canvas = host
            .find_surface(&id)
            .ok_or_else(|| BootstrapError::SurfaceNotFound { id: id.clone() })?;

        let params = RendererParams {
            antialias: true,
            shadow_map_enabled: false,
        };
        let surface = host.create_surface(canvas, &params)?;

        let mut renderer = Renderer::new(surface, params);
        renderer.set_size(viewport);
        renderer.set_shadow_map_enabled(true);

        let element = renderer.dom_element();
        if !host.is_attached(&element) {
            host.append_child(element);
        }

        let controls = OrbitControls::with_params(&mut camera, id.as_str(), viewport, self.config.orbit.clone());

        let stats = Stats::new();
        host.append_child(DisplayElement::StatsOverlay);

        host.add_resize_listener();

        log::info!(
            "scene initialized on `{id}` ({}x{}, fov {}°)",
            viewport.width,
            viewport.height,
            camera.fov
        );

        self.parts = Some(Parts {
            scene,
            camera,
            renderer,
            controls,
            stats,
            clock: FrameClock::new(),
        });
        Ok(())
    }

    /// One frame of the loop: requests the next frame, renders, then updates
    /// stats and controls, in that order.
    ///
    /// Does nothing once the loop is cancelled through [`AnimationHandle`].
    pub fn animate<H>(&mut self, host: &mut H) -> Result<(), BootstrapError>
    where
        H: Host<Surface = S>,
    {
        if self.parts.is_none() {
            return Err(BootstrapError::NotInitialized);
        }

        if self.animation.is_cancelled() {
            if self.pending_frame.take().is_some() {
                log::debug!("animation loop stopped");
            }
            return Ok(());
        }

        self.pending_frame = Some(host.request_animation_frame());

        self.render()?;

        let parts = self.parts.as_mut().ok_or(BootstrapError::NotInitialized)?;
        let ft = parts.clock.tick();

        parts.stats.update();
        if let Some(readout) = parts.stats.take_readout() {
            log::trace!("stats: {readout}");
            host.set_overlay_text(&readout);
        }

        parts.controls.update(&mut parts.camera, ft.dt);
        Ok(())
    }

    /// Draws the scene from the current camera.
    pub fn render(&mut self) -> Result<(), BootstrapError> {
        let parts = self.parts.as_mut().ok_or(BootstrapError::NotInitialized)?;
        parts.renderer.render(&parts.scene, &parts.camera)?;
        Ok(())
    }

    /// Re-derives camera aspect, projection and renderer size from the
    /// current viewport. Safe to call any number of times.
    pub fn on_resize<H>(&mut self, host: &H)
    where
        H: Host<Surface = S>,
    {
        let Some(parts) = self.parts.as_mut() else {
            return;
        };

        let viewport = host.viewport();
        parts.camera.aspect = viewport.aspect();
        parts.camera.update_projection_matrix();
        parts.renderer.set_size(viewport);
        parts.controls.set_viewport(viewport);

        log::debug!("resized to {}x{}", viewport.width, viewport.height);
    }

    /// Forwards pointer input to the orbit controls.
    pub fn handle_input(&mut self, event: &InputEvent) {
        if let Some(parts) = self.parts.as_mut() {
            parts.controls.handle_event(event, &parts.camera);
        }
    }

    /// Handle that stops the loop at its next frame.
    pub fn animation_handle(&self) -> AnimationHandle {
        self.animation.clone()
    }

    /// Stops the loop now, withdrawing the pending frame request.
    pub fn stop<H>(&mut self, host: &mut H)
    where
        H: Host<Surface = S>,
    {
        self.animation.cancel();
        if let Some(id) = self.pending_frame.take() {
            host.cancel_animation_frame(id);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.parts.is_some()
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn scene(&self) -> Option<&SceneRoot> {
        self.parts.as_ref().map(|p| &p.scene)
    }

    pub fn scene_mut(&mut self) -> Option<&mut SceneRoot> {
        self.parts.as_mut().map(|p| &mut p.scene)
    }

    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.parts.as_ref().map(|p| &p.camera)
    }

    pub fn renderer(&self) -> Option<&Renderer<S>> {
        self.parts.as_ref().map(|p| &p.renderer)
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.parts.as_ref().map(|p| &p.controls)
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.parts.as_mut().map(|p| &mut p.controls)
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.parts.as_ref().map(|p| &p.stats)
    }
}

impl<S, H> App<H> for SceneBootstrap<S>
where
    S: RenderSurface,
    H: Host<Surface = S>,
{
    /// `initialize` followed by the first `animate`.
    fn init(&mut self, host: &mut H) -> anyhow::Result<()> {
        self.initialize(host)?;
        self.animate(host)?;
        Ok(())
    }

    fn on_resize(&mut self, host: &mut H) {
        SceneBootstrap::on_resize(self, host);
    }

    fn on_input(&mut self, event: &InputEvent) {
        self.handle_input(event);
    }

    fn on_animation_frame(&mut self, host: &mut H) -> anyhow::Result<AppControl> {
        self.animate(host)?;
        Ok(AppControl::Continue)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    use super::*;
    use crate::host::ViewportSize;
    use crate::host::fake::{FakeHost, FakeSurface};
    use crate::input::{Modifiers, MouseButton, MouseButtonState, MouseWheelDelta, PointerButtonEvent, PointerMoveEvent};

    type Bootstrap = SceneBootstrap<FakeSurface>;

    fn host() -> FakeHost {
        FakeHost::new(800, 600).with_canvas("myCanvas")
    }

    fn started(host: &mut FakeHost) -> Bootstrap {
        let mut b = Bootstrap::new("myCanvas");
        App::init(&mut b, host).unwrap();
        b
    }

    #[test]
    fn construction_has_no_side_effects() {
        let b = Bootstrap::new("myCanvas");
        assert!(!b.is_initialized());
        assert!(b.camera().is_none());
        assert_eq!(b.config().fov, 45.0);
        assert_eq!(b.config().near_plane, 1.0);
        assert_eq!(b.config().far_plane, 1000.0);
    }

    #[test]
    fn initialize_creates_one_of_each_and_attaches_overlay() {
        let mut host = host();
        let mut b = Bootstrap::new("myCanvas");
        b.initialize(&mut host).unwrap();

        assert!(b.is_initialized());
        assert_eq!(host.created.len(), 1);
        assert_eq!(host.created[0].0, "myCanvas");
        assert!(host.created[0].1.antialias);

        // The canvas was already in the display tree; it is not added again.
        assert_eq!(host.count_attached(&DisplayElement::Canvas("myCanvas".into())), 1);
        assert_eq!(host.count_attached(&DisplayElement::StatsOverlay), 1);
        assert_eq!(host.resize_listeners, 1);

        let renderer = b.renderer().unwrap();
        assert!(renderer.params().antialias);
        assert!(renderer.params().shadow_map_enabled);
        assert_eq!(renderer.size(), ViewportSize::new(800, 600));

        let log = host.surface_log("myCanvas");
        assert!(log.borrow().shadow_map_enabled);
        assert_eq!(log.borrow().resizes, vec![ViewportSize::new(800, 600)]);

        assert_eq!(b.controls().unwrap().element(), "myCanvas");
        assert!(b.scene().unwrap().is_empty());
        // initialize alone does not start the loop
        assert!(!host.has_pending_frame());
    }

    #[test]
    fn detached_canvas_is_attached_once() {
        let mut host = FakeHost::new(800, 600).with_detached_canvas("myCanvas");
        let mut b = Bootstrap::new("myCanvas");
        b.initialize(&mut host).unwrap();

        assert_eq!(host.count_attached(&DisplayElement::Canvas("myCanvas".into())), 1);
    }

    #[test]
    fn missing_surface_fails_without_creating_a_renderer() {
        let mut host = FakeHost::new(800, 600);
        let mut b = Bootstrap::new("myCanvas");

        let err = b.initialize(&mut host).unwrap_err();
        assert!(matches!(err, BootstrapError::SurfaceNotFound { ref id } if id == "myCanvas"));
        assert!(host.created.is_empty());
        assert!(host.attached.is_empty());
        assert_eq!(host.resize_listeners, 0);
        assert!(!b.is_initialized());
    }

    #[test]
    fn surface_creation_failure_propagates_unmodified() {
        let mut host = host();
        host.fail_surface_creation = true;
        let mut b = Bootstrap::new("myCanvas");

        let err = b.initialize(&mut host).unwrap_err();
        assert!(matches!(err, BootstrapError::Other(_)));
        assert_eq!(err.to_string(), "no adapter for myCanvas");
        assert!(!b.is_initialized());
    }

    #[test]
    fn initialize_twice_is_rejected() {
        let mut host = host();
        let mut b = Bootstrap::new("myCanvas");
        b.initialize(&mut host).unwrap();

        assert!(matches!(b.initialize(&mut host), Err(BootstrapError::AlreadyInitialized)));
        assert_eq!(host.created.len(), 1);
    }

    #[test]
    fn camera_starts_above_and_behind_origin() {
        let mut host = host();
        let mut b = Bootstrap::new("myCanvas");
        b.initialize(&mut host).unwrap();

        let camera = b.camera().unwrap();
        assert_relative_eq!(camera.aspect, 800.0 / 600.0, epsilon = 1e-6);
        assert_relative_eq!(camera.position, Point3::new(0.0, 30.0, 20.0), epsilon = 1e-4);
        assert_eq!(camera.fov, 45.0);
        assert_eq!(camera.near, 1.0);
        assert_eq!(camera.far, 1000.0);
        assert_eq!(camera.target(), Point3::origin());
    }

    #[test]
    fn stored_clip_planes_do_not_reach_the_camera() {
        let mut config = SceneConfig::new("myCanvas");
        config.near_plane = 5.0;
        config.far_plane = 50.0;

        let mut host = host();
        let mut b = Bootstrap::with_config(config);
        b.initialize(&mut host).unwrap();

        let camera = b.camera().unwrap();
        assert_eq!(camera.near, 1.0);
        assert_eq!(camera.far, 1000.0);
    }

    #[test]
    fn resize_recomputes_aspect_and_renderer_size() {
        let mut host = host();
        let mut b = started(&mut host);

        host.viewport = ViewportSize::new(1024, 768);
        assert_relative_eq!(b.camera().unwrap().aspect, 1.333, epsilon = 1e-3);

        host.resize(&mut b, 1024, 768);
        assert_relative_eq!(b.camera().unwrap().aspect, 1024.0 / 768.0, epsilon = 1e-6);
        assert_eq!(b.renderer().unwrap().size(), ViewportSize::new(1024, 768));
    }

    #[test]
    fn resize_is_idempotent() {
        let mut host = host();
        let mut b = started(&mut host);

        host.resize(&mut b, 640, 480);
        let aspect = b.camera().unwrap().aspect;
        let projection = *b.camera().unwrap().projection_matrix();
        let size = b.renderer().unwrap().size();

        SceneBootstrap::on_resize(&mut b, &host);

        assert_eq!(b.camera().unwrap().aspect, aspect);
        assert_eq!(*b.camera().unwrap().projection_matrix(), projection);
        assert_eq!(b.renderer().unwrap().size(), size);
    }

    #[test]
    fn last_resize_wins() {
        let mut host = host();
        let mut b = started(&mut host);

        for (w, h) in [(1920, 1080), (300, 900), (1280, 720), (500, 500)] {
            host.resize(&mut b, w, h);
        }

        assert_relative_eq!(b.camera().unwrap().aspect, 1.0, epsilon = 1e-6);
        assert_eq!(b.renderer().unwrap().size(), ViewportSize::new(500, 500));
    }

    #[test]
    fn resize_projection_matches_a_fresh_camera() {
        let mut host = host();
        let mut b = started(&mut host);
        host.resize(&mut b, 1920, 1080);

        let fresh = PerspectiveCamera::new(45.0, 1920.0 / 1080.0, 1.0, 1000.0);
        assert_relative_eq!(
            *b.camera().unwrap().projection_matrix(),
            *fresh.projection_matrix(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn resize_before_initialize_is_ignored() {
        let mut host = host();
        let mut b = Bootstrap::new("myCanvas");

        host.resize(&mut b, 1024, 768);
        SceneBootstrap::on_resize(&mut b, &host);
        assert!(b.camera().is_none());
    }

    #[test]
    fn loop_renders_once_per_frame_callback() {
        let mut host = host();
        let mut b = started(&mut host);
        let log = host.surface_log("myCanvas");

        assert_eq!(log.borrow().frames.len(), 1);
        assert!(host.has_pending_frame());

        for _ in 0..3 {
            let control = host.present_frame(&mut b).unwrap();
            assert_eq!(control, Some(AppControl::Continue));
        }

        assert_eq!(log.borrow().frames.len(), 4);
        assert_eq!(host.frame_requests, 4);
        assert!(host.has_pending_frame());
        assert_eq!(b.renderer().unwrap().frames(), 4);
    }

    #[test]
    fn stats_update_once_per_animate() {
        let mut host = host();
        let mut b = started(&mut host);
        for _ in 0..4 {
            host.present_frame(&mut b).unwrap();
        }

        assert_eq!(b.stats().unwrap().ms().history().len(), 5);
    }

    #[test]
    fn controls_update_after_render() {
        let mut host = host();
        let mut b = started(&mut host);
        b.controls_mut().unwrap().params.enable_damping = true;

        let press = InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
            x: 100.0,
            y: 100.0,
            modifiers: Modifiers::default(),
        });
        b.handle_input(&press);
        b.handle_input(&InputEvent::PointerMoved(PointerMoveEvent { x: 200.0, y: 100.0 }));

        let before = b.camera().unwrap().position;
        host.present_frame(&mut b).unwrap();

        let log = host.surface_log("myCanvas");
        // The frame shows the camera as it was; controls moved it afterwards.
        assert_eq!(log.borrow().frames.last().unwrap().eye, before);
        assert!((b.camera().unwrap().position - before).norm() > 1e-3);
    }

    #[test]
    fn wheel_input_reaches_the_camera() {
        let mut host = host();
        let mut b = started(&mut host);
        let distance = b.controls().unwrap().distance(b.camera().unwrap());

        b.handle_input(&InputEvent::MouseWheel {
            delta: MouseWheelDelta::Line { x: 0.0, y: 1.0 },
            modifiers: Modifiers::default(),
        });
        host.present_frame(&mut b).unwrap();

        let after = b.controls().unwrap().distance(b.camera().unwrap());
        assert_relative_eq!(after, distance * 0.95, epsilon = 1e-3);
    }

    #[test]
    fn cancelled_loop_stops_at_next_frame() {
        let mut host = host();
        let mut b = started(&mut host);
        let handle = b.animation_handle();

        handle.cancel();
        host.present_frame(&mut b).unwrap();

        assert_eq!(host.surface_log("myCanvas").borrow().frames.len(), 1);
        assert_eq!(host.frame_requests, 1);
        assert!(!host.has_pending_frame());
    }

    #[test]
    fn stop_withdraws_the_pending_request() {
        let mut host = host();
        let mut b = started(&mut host);

        b.stop(&mut host);

        assert!(!host.has_pending_frame());
        assert!(b.animation_handle().is_cancelled());
        assert_eq!(host.present_frame(&mut b).unwrap(), None);
    }

    #[test]
    fn render_failure_propagates_from_animate() {
        let mut host = host();
        let mut b = started(&mut host);
        host.surface_log("myCanvas").borrow_mut().fail_draws = true;

        let err = b.animate(&mut host).unwrap_err();
        assert_eq!(err.to_string(), "draw failed on myCanvas");
    }

    #[test]
    fn operations_before_initialize_fail() {
        let mut host = host();
        let mut b = Bootstrap::new("myCanvas");

        assert!(matches!(b.render(), Err(BootstrapError::NotInitialized)));
        assert!(matches!(b.animate(&mut host), Err(BootstrapError::NotInitialized)));
        assert!(!host.has_pending_frame());
    }

    #[test]
    fn missing_surface_fails_app_init() {
        let mut host = FakeHost::new(800, 600);
        let mut b = Bootstrap::new("myCanvas");

        let err = App::init(&mut b, &mut host).unwrap_err();
        assert_eq!(err.to_string(), "drawing surface `myCanvas` not found");
        assert!(!host.has_pending_frame());
    }
}
