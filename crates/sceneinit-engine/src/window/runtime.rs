use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl};
use crate::device::{GpuInit, GpuSurface};
use crate::host::{DisplayElement, FrameRequestId, Host, ViewportSize};
use crate::input::InputState;
use crate::input::platform::translate_window_event;
use crate::render::RendererParams;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Identifier under which the window's drawing surface is found.
    pub surface_id: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "sceneinit".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            surface_id: "myCanvas".to_string(),
        }
    }
}

/// [`Host`] backed by a single winit window.
///
/// The window is the only drawing surface and is part of the display tree from
/// the start. The stats overlay is presented in the window title.
pub struct WinitHost {
    config: RuntimeConfig,
    gpu_init: GpuInit,

    window: Option<Arc<Window>>,
    surface_taken: bool,

    attached: Vec<DisplayElement>,
    resize_listeners: usize,
    overlay: Option<String>,

    pending_frame: Option<FrameRequestId>,
    next_frame_id: u64,
}

impl WinitHost {
    fn new(config: RuntimeConfig, gpu_init: GpuInit) -> Self {
        Self {
            config,
            gpu_init,
            window: None,
            surface_taken: false,
            attached: Vec::new(),
            resize_listeners: 0,
            overlay: None,
            pending_frame: None,
            next_frame_id: 1,
        }
    }

    fn attach_window(&mut self, window: Arc<Window>) {
        self.attached.push(DisplayElement::Canvas(self.config.surface_id.clone()));
        self.window = Some(window);
    }

    fn window_id(&self) -> Option<WindowId> {
        self.window.as_ref().map(|w| w.id())
    }

    /// Consumes the pending frame request, if any. A request fires once.
    fn take_pending_frame(&mut self) -> Option<FrameRequestId> {
        self.pending_frame.take()
    }

    fn wants_resize(&self) -> bool {
        self.resize_listeners > 0
    }

    /// The window's surface can be handed out once, under its configured id.
    fn surface_available(&self, id: &str) -> bool {
        id == self.config.surface_id && !self.surface_taken
    }
}

impl Host for WinitHost {
    type Canvas = Arc<Window>;
    type Surface = GpuSurface;

    fn viewport(&self) -> ViewportSize {
        self.window
            .as_ref()
            .map(|w| {
                let size = w.inner_size();
                ViewportSize::new(size.width, size.height)
            })
            .unwrap_or_default()
    }

    fn find_surface(&mut self, id: &str) -> Option<Arc<Window>> {
        if !self.surface_available(id) {
            return None;
        }
        self.window.clone()
    }

    fn create_surface(&mut self, canvas: Arc<Window>, params: &RendererParams) -> Result<GpuSurface> {
        let surface = pollster::block_on(GpuSurface::new(
            self.config.surface_id.clone(),
            canvas,
            &self.gpu_init,
            params,
        ))?;
        self.surface_taken = true;
        Ok(surface)
    }

    fn is_attached(&self, element: &DisplayElement) -> bool {
        self.attached.contains(element)
    }

    fn append_child(&mut self, element: DisplayElement) {
        log::debug!("attached {element:?}");
        self.attached.push(element);
    }

    fn add_resize_listener(&mut self) {
        self.resize_listeners += 1;
    }

    fn request_animation_frame(&mut self) -> FrameRequestId {
        let id = FrameRequestId(self.next_frame_id);
        self.next_frame_id = self.next_frame_id.wrapping_add(1);
        self.pending_frame = Some(id);

        if let Some(window) = &self.window {
            window.request_redraw();
        }
        id
    }

    fn cancel_animation_frame(&mut self, id: FrameRequestId) {
        if self.pending_frame == Some(id) {
            self.pending_frame = None;
        }
    }

    fn set_overlay_text(&mut self, text: &str) {
        if !self.attached.contains(&DisplayElement::StatsOverlay) {
            return;
        }
        let title = format!("{} | {text}", self.config.title);
        if self.overlay.as_deref() == Some(title.as_str()) {
            return;
        }
        if let Some(window) = &self.window {
            window.set_title(&title);
        }
        self.overlay = Some(title);
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and drives `app` until the window closes.
    ///
    /// A failure from `App::init` or a frame callback ends the loop and is
    /// returned here.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App<WinitHost> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(WinitHost::new(config, gpu_init), app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct AppState<A> {
    host: WinitHost,
    app: A,
    input: InputState,
    error: Option<anyhow::Error>,
}

impl<A: App<WinitHost>> AppState<A> {
    fn new(host: WinitHost, app: A) -> Self {
        Self {
            host,
            app,
            input: InputState::default(),
            error: None,
        }
    }

    /// Delivers a resize only once the app has subscribed. Returns whether it was delivered.
    fn dispatch_resize(&mut self) -> bool {
        if !self.host.wants_resize() {
            return false;
        }
        self.app.on_resize(&mut self.host);
        true
    }

    /// Runs the frame callback if a frame request is pending.
    fn dispatch_frame(&mut self) -> Option<Result<AppControl>> {
        self.host.take_pending_frame()?;
        Some(self.app.on_animation_frame(&mut self.host))
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.host.config.title.clone())
            .with_inner_size(self.host.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        self.host.attach_window(Arc::new(window));
        Ok(())
    }
}

impl<A: App<WinitHost>> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.window.is_some() {
            return;
        }

        let started = self
            .create_window(event_loop)
            .and_then(|()| self.app.init(&mut self.host));

        if let Err(err) = started {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Redraws are requested by frame requests only.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.host.window_id() != Some(window_id) {
            return;
        }

        match &event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.dispatch_resize();
            }

            WindowEvent::RedrawRequested => match self.dispatch_frame() {
                None | Some(Ok(AppControl::Continue)) => {}
                Some(Ok(AppControl::Exit)) => event_loop.exit(),
                Some(Err(err)) => self.fail(event_loop, err),
            },

            _ => {
                if let Some(ev) = translate_window_event(&self.input, &event) {
                    self.input.apply_event(&ev);
                    self.app.on_input(&ev);
                }
            }
        }
    }
}
