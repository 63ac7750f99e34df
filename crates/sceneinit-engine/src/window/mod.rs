//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the window, exposes them to the app as a
//! [`Host`](crate::host::Host) and dispatches resize, input and frame callbacks.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, WinitHost};
