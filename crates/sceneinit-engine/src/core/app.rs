use anyhow::Result;

use crate::host::Host;
use crate::input::InputEvent;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by a host runtime.
pub trait App<H: Host> {
    /// Called once, after the host's display tree and surfaces exist.
    fn init(&mut self, host: &mut H) -> Result<()>;

    /// Called for viewport resizes, once the app registered a resize listener.
    fn on_resize(&mut self, host: &mut H) {
        let _ = host;
    }

    /// Called for pointer input on the drawing surface.
    fn on_input(&mut self, event: &InputEvent) {
        let _ = event;
    }

    /// Called when a frame requested through `Host::request_animation_frame` fires.
    fn on_animation_frame(&mut self, host: &mut H) -> Result<AppControl>;
}
