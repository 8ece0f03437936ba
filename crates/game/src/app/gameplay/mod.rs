mod dialog;
mod grid;
mod interaction;
mod map;
mod movement;
mod nav;
mod scene;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub(crate) use dialog::{ContentError, DialogCatalog};
pub(crate) use map::{MapDocument, MapLoadError};
pub(crate) use movement::TouchPathPolicy;
pub(crate) use scene::{PortfolioScene, SceneBuildError, SceneSettings};

const ROOT_LOCATION: &str = "<root>";

/// JSON decode failure with the path of the offending value.
#[derive(Debug, Error)]
#[error("at {location}: {source}")]
pub(crate) struct JsonPathError {
    pub(crate) location: String,
    #[source]
    pub(crate) source: serde_json::Error,
}

pub(crate) fn parse_json_with_path<T: DeserializeOwned>(raw: &str) -> Result<T, JsonPathError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let source = error.into_inner();
        let location = if path.is_empty() || path == "." {
            ROOT_LOCATION.to_string()
        } else {
            path
        };
        JsonPathError { location, source }
    })
}
