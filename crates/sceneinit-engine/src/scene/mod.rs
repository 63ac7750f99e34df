//! Scene graph root and camera.
//!
//! The scene holds what is drawn; the camera describes where it is seen from.
//! Neither owns GPU resources.

mod camera;
mod color;
mod root;

pub use camera::PerspectiveCamera;
pub use color::Color;
pub use root::{SceneNode, SceneRoot};
