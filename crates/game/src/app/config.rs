use std::env;

use tracing::warn;

use super::gameplay::{SceneSettings, TouchPathPolicy};

pub(crate) const PLAYER_SPEED_ENV_VAR: &str = "FOLIO_PLAYER_SPEED";
pub(crate) const TOUCH_POLICY_ENV_VAR: &str = "FOLIO_TOUCH_POLICY";
pub(crate) const TOUCH_CONTROLS_ENV_VAR: &str = "FOLIO_TOUCH_CONTROLS";

const DEFAULT_SCALE_FACTOR: f32 = 4.0;
const DEFAULT_PLAYER_SPEED: f32 = 250.0;
const DEFAULT_ARRIVAL_THRESHOLD: f32 = 5.0;
const DEFAULT_ZONE_CONTACT_MARGIN: f32 = 8.0;
const DEFAULT_TYPEWRITER_MS: u64 = 40;
const DEFAULT_MAP_FILE: &str = "map.json";
const DEFAULT_DIALOGS_FILE: &str = "dialogs.json";

/// Gameplay tunables plus the content file names under `assets/base`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GameConfig {
    pub(crate) scale_factor: f32,
    pub(crate) player_speed: f32,
    pub(crate) arrival_threshold: f32,
    pub(crate) zone_contact_margin: f32,
    pub(crate) typewriter_ms: u64,
    pub(crate) touch_policy: TouchPathPolicy,
    pub(crate) touch_controls: bool,
    pub(crate) map_file: String,
    pub(crate) dialogs_file: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            player_speed: DEFAULT_PLAYER_SPEED,
            arrival_threshold: DEFAULT_ARRIVAL_THRESHOLD,
            zone_contact_margin: DEFAULT_ZONE_CONTACT_MARGIN,
            typewriter_ms: DEFAULT_TYPEWRITER_MS,
            touch_policy: TouchPathPolicy::default(),
            touch_controls: true,
            map_file: DEFAULT_MAP_FILE.to_string(),
            dialogs_file: DEFAULT_DIALOGS_FILE.to_string(),
        }
    }
}

impl GameConfig {
    pub(crate) fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            player_speed: env_override(PLAYER_SPEED_ENV_VAR, defaults.player_speed, parse_speed),
            touch_policy: env_override(
                TOUCH_POLICY_ENV_VAR,
                defaults.touch_policy,
                parse_touch_policy,
            ),
            touch_controls: env_override(
                TOUCH_CONTROLS_ENV_VAR,
                defaults.touch_controls,
                parse_flag,
            ),
            ..defaults
        }
    }

    pub(crate) fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            scale_factor: self.scale_factor,
            player_speed: self.player_speed,
            arrival_threshold: self.arrival_threshold,
            touch_policy: self.touch_policy,
            touch_controls: self.touch_controls,
            zone_contact_margin: self.zone_contact_margin,
            typewriter_ms: self.typewriter_ms,
        }
    }
}

fn env_override<T: Copy>(name: &'static str, default: T, parse: fn(&str) -> Option<T>) -> T {
    match env::var(name) {
        Ok(raw) => match parse(raw.trim()) {
            Some(value) => value,
            None => {
                warn!(
                    env_var = name,
                    value = raw.as_str(),
                    "invalid env override; falling back to config"
                );
                default
            }
        },
        Err(env::VarError::NotPresent) => default,
        Err(err) => {
            warn!(env_var = name, error = %err, "unreadable env override; falling back to config");
            default
        }
    }
}

pub(crate) fn parse_speed(raw: &str) -> Option<f32> {
    raw.parse::<f32>()
        .ok()
        .filter(|speed| speed.is_finite() && *speed > 0.0)
}

pub(crate) fn parse_touch_policy(raw: &str) -> Option<TouchPathPolicy> {
    match raw.to_ascii_lowercase().as_str() {
        "cancel" | "cancels" | "cancels_path" => Some(TouchPathPolicy::CancelsPath),
        "yield" | "yields" | "yields_to_path" => Some(TouchPathPolicy::YieldsToPath),
        _ => None,
    }
}

pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
