//! In-memory host for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::{Result, bail};

use crate::core::{App, AppControl};
use crate::render::{FrameData, RenderSurface, RendererParams};

use super::{DisplayElement, FrameRequestId, Host, ViewportSize};

/// What a [`FakeSurface`] was asked to do.
#[derive(Debug, Default)]
pub(crate) struct SurfaceLog {
    pub resizes: Vec<ViewportSize>,
    pub frames: Vec<FrameData>,
    pub shadow_map_enabled: bool,
    pub fail_draws: bool,
}

pub(crate) struct FakeSurface {
    id: String,
    log: Rc<RefCell<SurfaceLog>>,
}

impl FakeSurface {
    pub fn new(id: &str) -> (Self, Rc<RefCell<SurfaceLog>>) {
        let log = Rc::new(RefCell::new(SurfaceLog::default()));
        (
            Self {
                id: id.to_string(),
                log: log.clone(),
            },
            log,
        )
    }
}

impl RenderSurface for FakeSurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_shadow_map_enabled(&mut self, enabled: bool) {
        self.log.borrow_mut().shadow_map_enabled = enabled;
    }

    fn resize(&mut self, size: ViewportSize) {
        self.log.borrow_mut().resizes.push(size);
    }

    fn draw(&mut self, frame: &FrameData) -> Result<()> {
        let mut log = self.log.borrow_mut();
        if log.fail_draws {
            bail!("draw failed on {}", self.id);
        }
        log.frames.push(frame.clone());
        Ok(())
    }
}

pub(crate) struct FakeHost {
    pub viewport: ViewportSize,
    pub attached: Vec<DisplayElement>,
    pub resize_listeners: usize,
    pub frame_requests: usize,
    pub overlay: Option<String>,
    pub created: Vec<(String, RendererParams)>,
    pub fail_surface_creation: bool,

    canvases: HashSet<String>,
    logs: HashMap<String, Rc<RefCell<SurfaceLog>>>,
    pending_frame: Option<FrameRequestId>,
    next_frame_id: u64,
}

impl FakeHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: ViewportSize::new(width, height),
            attached: Vec::new(),
            resize_listeners: 0,
            frame_requests: 0,
            overlay: None,
            created: Vec::new(),
            fail_surface_creation: false,
            canvases: HashSet::new(),
            logs: HashMap::new(),
            pending_frame: None,
            next_frame_id: 1,
        }
    }

    /// Adds a canvas that is already part of the display tree.
    pub fn with_canvas(mut self, id: &str) -> Self {
        self.canvases.insert(id.to_string());
        self.attached.push(DisplayElement::Canvas(id.to_string()));
        self
    }

    /// Adds a canvas that exists but is not attached yet.
    pub fn with_detached_canvas(mut self, id: &str) -> Self {
        self.canvases.insert(id.to_string());
        self
    }

    pub fn surface_log(&self, id: &str) -> Rc<RefCell<SurfaceLog>> {
        self.logs[id].clone()
    }

    pub fn count_attached(&self, element: &DisplayElement) -> usize {
        self.attached.iter().filter(|e| *e == element).count()
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Fires the pending frame request, if any.
    pub fn present_frame<A: App<Self>>(&mut self, app: &mut A) -> Result<Option<AppControl>> {
        match self.pending_frame.take() {
            Some(_) => app.on_animation_frame(self).map(Some),
            None => Ok(None),
        }
    }

    /// Changes the viewport and notifies the app if it listens.
    pub fn resize<A: App<Self>>(&mut self, app: &mut A, width: u32, height: u32) {
        self.viewport = ViewportSize::new(width, height);
        if self.resize_listeners > 0 {
            app.on_resize(self);
        }
    }
}

impl Host for FakeHost {
    type Canvas = String;
    type Surface = FakeSurface;

    fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    fn find_surface(&mut self, id: &str) -> Option<String> {
        self.canvases.get(id).cloned()
    }

    fn create_surface(&mut self, canvas: String, params: &RendererParams) -> Result<FakeSurface> {
        if self.fail_surface_creation {
            bail!("no adapter for {canvas}");
        }
        let (surface, log) = FakeSurface::new(&canvas);
        self.logs.insert(canvas.clone(), log);
        self.created.push((canvas, *params));
        Ok(surface)
    }

    fn is_attached(&self, element: &DisplayElement) -> bool {
        self.attached.contains(element)
    }

    fn append_child(&mut self, element: DisplayElement) {
        self.attached.push(element);
    }

    fn add_resize_listener(&mut self) {
        self.resize_listeners += 1;
    }

    fn request_animation_frame(&mut self) -> FrameRequestId {
        let id = FrameRequestId(self.next_frame_id);
        self.next_frame_id += 1;
        self.frame_requests += 1;
        self.pending_frame = Some(id);
        id
    }

    fn cancel_animation_frame(&mut self, id: FrameRequestId) {
        if self.pending_frame == Some(id) {
            self.pending_frame = None;
        }
    }

    fn set_overlay_text(&mut self, text: &str) {
        self.overlay = Some(text.to_string());
    }
}
