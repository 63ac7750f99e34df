use anyhow::Result;
use sceneinit_engine::SceneBootstrap;
use sceneinit_engine::device::{GpuInit, GpuSurface};
use sceneinit_engine::logging::{LoggingConfig, init_logging};
use sceneinit_engine::window::{Runtime, RuntimeConfig};

/// Name of the window's drawing surface.
const SURFACE_ID: &str = "myCanvas";

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "sceneinit demo".to_string(),
        surface_id: SURFACE_ID.to_string(),
        ..RuntimeConfig::default()
    };

    let scene: SceneBootstrap<GpuSurface> = SceneBootstrap::new(SURFACE_ID);

    log::info!("starting scene on `{SURFACE_ID}`");
    Runtime::run(config, GpuInit::default(), scene)
}
