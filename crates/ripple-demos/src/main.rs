mod camera;
mod config;
mod geometry;
mod scenes;

use anyhow::Result;

use ripple_engine::logging::init_logging;
use ripple_engine::window::Runtime;

use config::DemoConfig;
use scenes::WavesScene;

fn main() -> Result<()> {
    let (config, source) = DemoConfig::load()?;
    init_logging(config.logging_config());
    log::info!("using {source}");

    log::info!(
        "ripple demos: {}x{} waves, edge effect {}",
        config.wave.rows,
        config.wave.cols,
        if config.post.enabled { "on" } else { "off" }
    );
    log::info!("keys: arrows/drag orbit, wheel zoom, space disturb, E edges, P pause, Esc quit");

    Runtime::run(config.runtime_config(), config.gpu_init(), WavesScene::new(config))
}
