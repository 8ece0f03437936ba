use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
mod sprite_keys;

pub use app::{
    dialog_layout, hint_rect, run_app, screen_to_world_px, touch_pad_layout, world_to_screen_px,
    AppError, Camera2D, DialogLayout, DialogPanel, Entity, EntityId, InputAction, InputSnapshot,
    LoopConfig, PadButton, RenderableDesc, RenderableKind, Renderer, Scene, SceneCommand,
    SceneWorld, ScreenRect, Tilemap, TilemapError, Transform, Vec2, Viewport, ZoneMarker,
    PLACEHOLDER_HALF_SIZE_PX,
};
pub use sprite_keys::{validate_sprite_key, SpriteKeyError};

pub const ROOT_ENV_VAR: &str = "FOLIO_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
    pub base_content_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "FOLIO_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/folio\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(app_paths_for_root(root))
}

fn app_paths_for_root(root: PathBuf) -> AppPaths {
    let assets_dir = root.join("assets");
    let base_content_dir = assets_dir.join("base");
    AppPaths {
        root,
        assets_dir,
        base_content_dir,
    }
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("assets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let cwd = env::current_dir().expect("cwd");
        assert!(!is_repo_marker(&cwd.join("definitely_not_a_marker")));
    }

    #[test]
    fn repo_marker_requires_assets_dir() {
        let temp = TempDir::new().expect("temp dir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write manifest");
        assert!(!is_repo_marker(temp.path()));

        fs::create_dir_all(temp.path().join("assets")).expect("assets dir");
        assert!(is_repo_marker(temp.path()));
    }

    #[test]
    fn app_paths_point_at_base_content() {
        let paths = app_paths_for_root(PathBuf::from("/srv/folio"));
        assert_eq!(paths.assets_dir, PathBuf::from("/srv/folio/assets"));
        assert_eq!(
            paths.base_content_dir,
            PathBuf::from("/srv/folio/assets/base")
        );
    }
}
