use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use engine::Vec2;
use serde::Deserialize;
use thiserror::Error;

use super::dialog::DialogCatalog;
use super::grid::MapRect;
use super::interaction::InteractiveZone;
use super::{parse_json_with_path, JsonPathError};

pub(crate) const BOUNDARIES_LAYER: &str = "boundaries";
pub(crate) const SPAWNPOINTS_LAYER: &str = "spawnpoints";
pub(crate) const PLAYER_SPAWNPOINT: &str = "player";

#[derive(Debug, Error)]
pub(crate) enum MapLoadError {
    #[error("failed to read map {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse map {} {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: JsonPathError,
    },
    #[error("map size must be at least one tile, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("tile size must be positive and finite, got {width}x{height}")]
    InvalidTileSize { width: f32, height: f32 },
    #[error("tiles must be square, got {width}x{height}")]
    NonSquareTiles { width: f32, height: f32 },
    #[error("layer '{layer}' has no '{name}' spawnpoint")]
    MissingSpawnpoint {
        layer: &'static str,
        name: &'static str,
    },
}

#[derive(Debug, Deserialize)]
struct TiledMap {
    width: u32,
    height: u32,
    tilewidth: f32,
    tileheight: f32,
    #[serde(default)]
    layers: Vec<TiledLayer>,
}

#[derive(Debug, Deserialize)]
struct TiledLayer {
    name: String,
    #[serde(default)]
    objects: Vec<TiledObject>,
}

#[derive(Debug, Deserialize)]
struct TiledObject {
    #[serde(default)]
    name: String,
    x: f32,
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
}

/// Boundary object; `name` is empty for plain walls.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Boundary {
    pub(crate) name: String,
    pub(crate) rect: MapRect,
}

/// The parts of a Tiled map the game uses, in unscaled map pixels.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MapDocument {
    pub(crate) width_tiles: u32,
    pub(crate) height_tiles: u32,
    pub(crate) tile_size: f32,
    pub(crate) boundaries: Vec<Boundary>,
    pub(crate) spawnpoints: BTreeMap<String, Vec2>,
}

impl MapDocument {
    pub(crate) fn load(path: &Path) -> Result<Self, MapLoadError> {
        let raw = fs::read_to_string(path).map_err(|source| MapLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }

    pub(crate) fn from_json_str(raw: &str, origin: &Path) -> Result<Self, MapLoadError> {
        let tiled: TiledMap = parse_json_with_path(raw).map_err(|source| MapLoadError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        Self::from_tiled(tiled)
    }

    fn from_tiled(tiled: TiledMap) -> Result<Self, MapLoadError> {
        if tiled.width == 0 || tiled.height == 0 {
            return Err(MapLoadError::InvalidDimensions {
                width: tiled.width,
                height: tiled.height,
            });
        }
        let tile_ok = |value: f32| value.is_finite() && value > 0.0;
        if !tile_ok(tiled.tilewidth) || !tile_ok(tiled.tileheight) {
            return Err(MapLoadError::InvalidTileSize {
                width: tiled.tilewidth,
                height: tiled.tileheight,
            });
        }
        if tiled.tilewidth != tiled.tileheight {
            return Err(MapLoadError::NonSquareTiles {
                width: tiled.tilewidth,
                height: tiled.tileheight,
            });
        }

        let mut boundaries = Vec::new();
        let mut spawnpoints = BTreeMap::new();
        for layer in tiled.layers {
            match layer.name.as_str() {
                BOUNDARIES_LAYER => {
                    boundaries.extend(layer.objects.into_iter().map(|object| Boundary {
                        name: object.name,
                        rect: MapRect::new(object.x, object.y, object.width, object.height),
                    }));
                }
                SPAWNPOINTS_LAYER => {
                    for object in layer.objects {
                        spawnpoints.insert(
                            object.name,
                            Vec2 {
                                x: object.x,
                                y: object.y,
                            },
                        );
                    }
                }
                _ => {}
            }
        }

        if !spawnpoints.contains_key(PLAYER_SPAWNPOINT) {
            return Err(MapLoadError::MissingSpawnpoint {
                layer: SPAWNPOINTS_LAYER,
                name: PLAYER_SPAWNPOINT,
            });
        }

        Ok(Self {
            width_tiles: tiled.width,
            height_tiles: tiled.height,
            tile_size: tiled.tilewidth,
            boundaries,
            spawnpoints,
        })
    }

    pub(crate) fn width_px(&self) -> f32 {
        self.width_tiles as f32 * self.tile_size
    }

    pub(crate) fn height_px(&self) -> f32 {
        self.height_tiles as f32 * self.tile_size
    }

    /// Every boundary rectangle, named or not, in map pixels.
    pub(crate) fn obstacles(&self) -> Vec<MapRect> {
        self.boundaries.iter().map(|boundary| boundary.rect).collect()
    }

    pub(crate) fn player_spawn_world(&self, scale_factor: f32) -> Vec2 {
        let spawn = self
            .spawnpoints
            .get(PLAYER_SPAWNPOINT)
            .copied()
            .unwrap_or_default();
        Vec2 {
            x: spawn.x * scale_factor,
            y: spawn.y * scale_factor,
        }
    }

    /// Named boundaries that have dialog content, scaled to world units.
    pub(crate) fn interactive_zones(
        &self,
        catalog: &DialogCatalog,
        scale_factor: f32,
    ) -> Vec<InteractiveZone> {
        self.boundaries
            .iter()
            .filter(|boundary| catalog.contains(&boundary.name) && boundary.rect.is_well_formed())
            .map(|boundary| InteractiveZone {
                name: boundary.name.clone(),
                bounds: boundary.rect.scaled(scale_factor),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::app::gameplay::dialog::DialogEntry;

    fn fixture() -> Value {
        json!({
            "width": 10,
            "height": 8,
            "tilewidth": 16,
            "tileheight": 16,
            "layers": [
                { "name": "floor", "data": [0, 1, 2] },
                {
                    "name": "boundaries",
                    "objects": [
                        { "name": "", "x": 0, "y": 0, "width": 160, "height": 16 },
                        { "name": "pc", "x": 32, "y": 48, "width": 24, "height": 16 },
                        { "name": "plant", "x": 96, "y": 48, "width": 16, "height": 16 }
                    ]
                },
                {
                    "name": "spawnpoints",
                    "objects": [ { "name": "player", "x": 80, "y": 100 } ]
                }
            ]
        })
    }

    fn parse(value: &Value) -> Result<MapDocument, MapLoadError> {
        MapDocument::from_json_str(&value.to_string(), Path::new("map.json"))
    }

    #[test]
    fn parses_layers_and_spawn() {
        let map = parse(&fixture()).expect("map");
        assert_eq!(map.width_px(), 160.0);
        assert_eq!(map.height_px(), 128.0);
        assert_eq!(map.obstacles().len(), 3);
        assert_eq!(map.player_spawn_world(4.0), Vec2 { x: 320.0, y: 400.0 });
    }

    #[test]
    fn only_catalogued_names_become_zones() {
        let map = parse(&fixture()).expect("map");
        let catalog: DialogCatalog = [(
            "pc".to_string(),
            DialogEntry {
                title: "PC".to_string(),
                content: "hi".to_string(),
            },
        )]
        .into_iter()
        .collect();
        let zones = map.interactive_zones(&catalog, 4.0);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].name, "pc");
        assert_eq!(zones[0].bounds, MapRect::new(128.0, 192.0, 96.0, 64.0));
    }

    #[test]
    fn type_errors_report_json_path() {
        let mut value = fixture();
        value["layers"][1]["objects"][1]["x"] = json!("left");
        match parse(&value) {
            Err(MapLoadError::Parse { source, .. }) => {
                assert_eq!(source.location, "layers[1].objects[1].x");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_player_spawn_is_rejected() {
        let mut value = fixture();
        value["layers"][2]["objects"][0]["name"] = json!("npc");
        assert!(matches!(
            parse(&value),
            Err(MapLoadError::MissingSpawnpoint { name: "player", .. })
        ));
    }

    #[test]
    fn tile_geometry_is_validated() {
        let mut zero = fixture();
        zero["tilewidth"] = json!(0);
        assert!(matches!(parse(&zero), Err(MapLoadError::InvalidTileSize { .. })));

        let mut uneven = fixture();
        uneven["tileheight"] = json!(8);
        assert!(matches!(parse(&uneven), Err(MapLoadError::NonSquareTiles { .. })));

        let mut empty = fixture();
        empty["width"] = json!(0);
        assert!(matches!(parse(&empty), Err(MapLoadError::InvalidDimensions { .. })));
    }
}
