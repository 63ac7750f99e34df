//! Scene bootstrap: camera, renderer, orbit controls, stats and the frame loop.

mod config;
mod error;
mod handle;
mod scene_bootstrap;

pub use config::SceneConfig;
pub use error::BootstrapError;
pub use handle::AnimationHandle;
pub use scene_bootstrap::SceneBootstrap;
