//! Camera controls.
//!
//! Controls never own the camera; they receive it by reference on every input
//! event and every update so the bootstrap stays the single owner.

mod orbit;

pub use orbit::{OrbitControls, OrbitParams};
