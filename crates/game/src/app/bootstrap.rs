use std::path::PathBuf;

use engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::GameConfig;
use super::gameplay::{
    ContentError, DialogCatalog, MapDocument, MapLoadError, PortfolioScene, SceneBuildError,
};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) asset_root: PathBuf,
    pub(crate) scene: Box<dyn Scene>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Map(#[from] MapLoadError),
    #[error(transparent)]
    Scene(#[from] SceneBuildError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "startup");

    let paths = resolve_app_paths()?;
    let game = GameConfig::from_env();
    info!(
        root = %paths.root.display(),
        player_speed = game.player_speed,
        touch_policy = ?game.touch_policy,
        touch_controls = game.touch_controls,
        "config_resolved"
    );

    let catalog = DialogCatalog::load(&paths.base_content_dir.join(&game.dialogs_file))?;
    info!(entries = catalog.len(), "dialogs_loaded");

    let map = MapDocument::load(&paths.base_content_dir.join(&game.map_file))?;
    info!(
        width_tiles = map.width_tiles,
        height_tiles = map.height_tiles,
        boundaries = map.boundaries.len(),
        "map_loaded"
    );

    let scene = PortfolioScene::new(&map, catalog, game.scene_settings())?;
    let config = LoopConfig {
        touch_controls: game.touch_controls,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        asset_root: paths.assets_dir,
        scene: Box::new(scene),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
