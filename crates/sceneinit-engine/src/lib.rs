//! Scene bootstrap engine.
//!
//! Sets up a perspective camera, a renderer bound to a named drawing surface,
//! orbit controls and a stats overlay, then drives them from the host's frame
//! callbacks. The host environment is injected through [`host::Host`]; the
//! `window` module provides the winit + wgpu implementation.

pub mod bootstrap;
pub mod controls;
pub mod core;
pub mod device;
pub mod host;
pub mod input;
pub mod logging;
pub mod render;
pub mod scene;
pub mod stats;
pub mod time;
pub mod window;

pub use bootstrap::{AnimationHandle, BootstrapError, SceneBootstrap, SceneConfig};
