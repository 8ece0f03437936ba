use engine::{
    dialog_layout, hint_rect, screen_to_world_px, EntityId, InputAction, InputSnapshot, PadButton,
    RenderableDesc, RenderableKind, Scene, SceneCommand, SceneWorld, Tilemap, TilemapError,
    Transform, Vec2, ZoneMarker,
};
use thiserror::Error;
use tracing::{debug, info};

use super::dialog::{DialogBox, DialogCatalog, DialogKeyOutcome};
use super::grid::{Grid, GridError};
use super::interaction::{ConfirmOutcome, InteractionCoordinator, ZoneEvent, ZoneTracker};
use super::map::MapDocument;
use super::movement::{
    AnimState, Direction, DirectionSet, Footprint, MovementController, MovementInput,
    MovementSettings, ObstacleCollider, SpriteAnimator, TouchPathPolicy,
};
use super::nav::find_path;

pub(crate) const HINT_TEXT: &str = "Press ENTER to interact";
const PLAYER_DEBUG_NAME: &str = "player";
/// Player collision box in unscaled map pixels, relative to the sprite centre.
const PLAYER_BODY_OFFSET_Y_PX: f32 = 3.0;
const PLAYER_BODY_SIZE_PX: f32 = 10.0;
const CAMERA_LEAD_Y: f32 = 100.0;
const CAMERA_ZOOM_PORTRAIT: f32 = 1.0;
const CAMERA_ZOOM_LANDSCAPE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SceneSettings {
    pub(crate) scale_factor: f32,
    pub(crate) player_speed: f32,
    pub(crate) arrival_threshold: f32,
    pub(crate) touch_policy: TouchPathPolicy,
    pub(crate) touch_controls: bool,
    pub(crate) zone_contact_margin: f32,
    pub(crate) typewriter_ms: u64,
}

impl SceneSettings {
    fn movement(&self) -> MovementSettings {
        MovementSettings {
            speed: self.player_speed,
            arrival_threshold: self.arrival_threshold,
            touch_policy: self.touch_policy,
        }
    }

    fn footprint(&self) -> Footprint {
        let half = PLAYER_BODY_SIZE_PX * self.scale_factor * 0.5;
        Footprint {
            offset: Vec2 {
                x: 0.0,
                y: PLAYER_BODY_OFFSET_Y_PX * self.scale_factor,
            },
            half_extents: Vec2 { x: half, y: half },
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum SceneBuildError {
    #[error("failed to build walkability grid: {0}")]
    Grid(#[from] GridError),
    #[error("failed to build tilemap overlay: {0}")]
    Tilemap(#[from] TilemapError),
}

/// The single explorable room: click-to-walk, keyboard and d-pad movement,
/// and furniture that opens dialog panels.
pub(crate) struct PortfolioScene {
    settings: SceneSettings,
    grid: Grid,
    tilemap: Tilemap,
    collider: ObstacleCollider,
    footprint: Footprint,
    spawn: Vec2,
    controller: MovementController,
    coordinator: InteractionCoordinator,
    dialogs: DialogBox,
    zones: ZoneTracker,
    player_id: Option<EntityId>,
    last_anim: Option<AnimState>,
    animator: SpriteAnimator,
}

impl PortfolioScene {
    pub(crate) fn new(
        map: &MapDocument,
        catalog: DialogCatalog,
        settings: SceneSettings,
    ) -> Result<Self, SceneBuildError> {
        let scale = settings.scale_factor;
        let obstacles = map.obstacles();
        let grid = Grid::build(
            map.width_px(),
            map.height_px(),
            map.tile_size,
            &obstacles,
            scale,
        )?;
        let tilemap = Tilemap::new(
            grid.cols(),
            grid.rows(),
            grid.world_tile_size(),
            grid.tile_ids(),
        )?;
        let footprint = settings.footprint();
        let collider = ObstacleCollider::new(
            obstacles.iter().map(|rect| rect.scaled(scale)).collect(),
            footprint,
        );
        let zones = ZoneTracker::new(
            map.interactive_zones(&catalog, scale),
            settings.zone_contact_margin,
        );
        let spawn = map.player_spawn_world(scale);
        let coordinator = InteractionCoordinator::new();
        let controller = MovementController::new(spawn, coordinator.gate(), settings.movement());

        info!(
            cols = grid.cols(),
            rows = grid.rows(),
            blocked = grid.blocked_count(),
            zones = zones.zones().len(),
            "scene_built"
        );

        Ok(Self {
            settings,
            grid,
            tilemap,
            collider,
            footprint,
            spawn,
            controller,
            coordinator,
            dialogs: DialogBox::new(catalog, settings.typewriter_ms),
            zones,
            player_id: None,
            last_anim: None,
            animator: SpriteAnimator::default(),
        })
    }

    fn handle_interact(&mut self) {
        if self.dialogs.is_open() {
            match self.dialogs.press_enter() {
                DialogKeyOutcome::Skipped => debug!("dialog_typewriter_skipped"),
                DialogKeyOutcome::Closed | DialogKeyOutcome::NotOpen => {}
            }
            return;
        }
        if self.coordinator.confirm(&mut self.dialogs) == ConfirmOutcome::Refused {
            debug!(zone = self.coordinator.current_zone(), "interact_refused");
        }
    }

    fn handle_click(&mut self, cursor: Vec2, window_size: (u32, u32), world: &SceneWorld) {
        if self.dialogs.is_open() {
            let layout = dialog_layout(window_size);
            if layout.close_button.contains(cursor) {
                self.dialogs.close();
            } else if layout.panel.contains(cursor) {
                self.dialogs.skip_typewriter();
            }
            return;
        }

        if self.coordinator.hint_visible() && hint_rect(window_size, HINT_TEXT).contains(cursor) {
            self.coordinator.confirm(&mut self.dialogs);
            return;
        }

        let target = screen_to_world_px(world.camera(), window_size, cursor);
        let start = self.controller.position();
        match find_path(&self.grid, start, target) {
            Some(path) => {
                let waypoints = path.len();
                if self.controller.follow_path(path) {
                    info!(x = target.x, y = target.y, waypoints, "path_found");
                } else {
                    debug!(x = target.x, y = target.y, "path_ignored");
                }
            }
            None => debug!(x = target.x, y = target.y, "path_rejected"),
        }
    }

    fn movement_input(&self, input: &InputSnapshot) -> MovementInput {
        let keyboard = DirectionSet::default()
            .with(Direction::Up, input.is_down(InputAction::MoveUp))
            .with(Direction::Down, input.is_down(InputAction::MoveDown))
            .with(Direction::Left, input.is_down(InputAction::MoveLeft))
            .with(Direction::Right, input.is_down(InputAction::MoveRight));
        let touch = if self.settings.touch_controls {
            DirectionSet::default()
                .with(Direction::Up, input.is_pad_down(PadButton::Up))
                .with(Direction::Down, input.is_pad_down(PadButton::Down))
                .with(Direction::Left, input.is_pad_down(PadButton::Left))
                .with(Direction::Right, input.is_pad_down(PadButton::Right))
        } else {
            DirectionSet::default()
        };
        MovementInput { keyboard, touch }
    }

    fn apply_zone_events(&mut self) {
        let body = self.footprint.rect_at(self.controller.position());
        for event in self.zones.update(&body) {
            match event {
                ZoneEvent::Left(zone) => {
                    debug!(zone = zone.as_str(), "zone_left");
                    self.coordinator.on_collide_zone_end(&zone);
                }
                ZoneEvent::Entered(zone) => {
                    debug!(zone = zone.as_str(), "zone_entered");
                    self.coordinator.on_collide_zone(&zone, &self.dialogs);
                }
            }
        }
    }

    fn sync_world(&mut self, input: &InputSnapshot, world: &mut SceneWorld, dt_seconds: f32) {
        let position = self.controller.position();
        let anim = self.controller.anim_state();
        if self.last_anim != Some(anim) {
            debug!(anim = anim.as_str(), "anim_changed");
        }
        self.last_anim = Some(anim);
        let frame_key = self.animator.advance(anim, dt_seconds);
        if let Some(entity) = self.player_id.and_then(|id| world.find_entity_mut(id)) {
            entity.transform.position = position;
            entity.renderable.mirrored_x = self.controller.is_mirrored();
            if let Some(key) = frame_key {
                entity.renderable.kind = RenderableKind::Sprite(key);
            }
        }

        let (width, height) = input.window_size();
        let camera = world.camera_mut();
        camera.position = Vec2 {
            x: position.x,
            y: position.y - CAMERA_LEAD_Y,
        };
        let portrait = height > 0 && (width as f32 / height as f32) < 1.0;
        camera.set_zoom_clamped(if portrait {
            CAMERA_ZOOM_PORTRAIT
        } else {
            CAMERA_ZOOM_LANDSCAPE
        });

        world.set_path_markers(self.controller.remaining_waypoints());
        let show_hint = self.coordinator.hint_visible() && !self.dialogs.is_open();
        world.set_hint(show_hint.then_some(HINT_TEXT));
        world.set_dialog(self.dialogs.panel());
        world.set_touch_pad(self.settings.touch_controls.then(|| {
            [
                input.is_pad_down(PadButton::Up),
                input.is_pad_down(PadButton::Down),
                input.is_pad_down(PadButton::Left),
                input.is_pad_down(PadButton::Right),
            ]
        }));

        let current = self.coordinator.current_zone();
        for marker in world.zones_mut() {
            marker.highlighted = current == Some(marker.name.as_str());
        }
    }
}

impl Scene for PortfolioScene {
    fn load(&mut self, world: &mut SceneWorld) {
        world.set_tilemap(self.tilemap.clone());
        world.set_zones(
            self.zones
                .zones()
                .iter()
                .map(|zone| ZoneMarker {
                    name: zone.name.clone(),
                    min: zone.bounds.min(),
                    max: zone.bounds.max(),
                    highlighted: false,
                })
                .collect(),
        );

        let anim = self.controller.anim_state();
        self.animator.reset();
        let sprite = self
            .animator
            .advance(anim, 0.0)
            .unwrap_or_else(|| anim.sprite_key(0));
        let player_id = world.spawn(
            Transform {
                position: self.controller.position(),
            },
            RenderableDesc {
                kind: RenderableKind::Sprite(sprite),
                debug_name: PLAYER_DEBUG_NAME,
                scale: self.settings.scale_factor,
                mirrored_x: self.controller.is_mirrored(),
            },
        );
        world.apply_pending();
        self.player_id = Some(player_id);
        self.last_anim = Some(anim);
        self.sync_world(&InputSnapshot::empty(), world, 0.0);

        info!(
            x = self.spawn.x,
            y = self.spawn.y,
            zones = self.zones.zones().len(),
            "player_spawned"
        );
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.dismiss_pressed() && self.dialogs.close() {
            debug!("dialog_dismissed");
        }
        if input.interact_pressed() {
            self.handle_interact();
        }
        if input.left_click_pressed() {
            if let Some(cursor) = input.cursor_position_px() {
                self.handle_click(cursor, input.window_size(), world);
            }
        }

        let movement = self.movement_input(input);
        self.controller
            .tick(&movement, fixed_dt_seconds, &self.collider);
        self.apply_zone_events();
        self.dialogs.tick(fixed_dt_seconds);

        self.sync_world(input, world, fixed_dt_seconds);
        SceneCommand::None
    }

    fn render(&mut self, _world: &SceneWorld) {}

    fn unload(&mut self, world: &mut SceneWorld) {
        info!(entity_count = world.entity_count(), "scene_unload");
        self.dialogs.close();
        self.controller.cancel_path();
        self.zones.reset();
        self.player_id = None;
        self.last_anim = None;
        self.animator.reset();
        world.clear();
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        let player = self.player_id.and_then(|id| world.find_entity(id))?;
        let tile = self.grid.world_to_tile(player.transform.position);
        Some(format!(
            "Folio | Player ({:.0}, {:.0}) | Tile ({}, {}) | Zone {} | Waypoints {}",
            player.transform.position.x,
            player.transform.position.y,
            tile.col,
            tile.row,
            self.coordinator.current_zone().unwrap_or("-"),
            self.controller.remaining_waypoints().len()
        ))
    }
}
