use thiserror::Error;
use tracing::info;

use super::input::{ActionStates, InputAction, PadStates};
use super::PadButton;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    pad: PadStates,
    cursor_position_px: Option<Vec2>,
    left_click_pressed: bool,
    interact_pressed: bool,
    dismiss_pressed: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        pad: PadStates,
        cursor_position_px: Option<Vec2>,
        left_click_pressed: bool,
        interact_pressed: bool,
        dismiss_pressed: bool,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            pad,
            cursor_position_px,
            left_click_pressed,
            interact_pressed,
            dismiss_pressed,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn is_pad_down(&self, button: PadButton) -> bool {
        self.pad.is_down(button)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_pad_down(mut self, button: PadButton, is_down: bool) -> Self {
        self.pad.set(button, is_down);
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_left_click_pressed(mut self, left_click_pressed: bool) -> Self {
        self.left_click_pressed = left_click_pressed;
        self
    }

    pub fn with_interact_pressed(mut self, interact_pressed: bool) -> Self {
        self.interact_pressed = interact_pressed;
        self
    }

    pub fn with_dismiss_pressed(mut self, dismiss_pressed: bool) -> Self {
        self.dismiss_pressed = dismiss_pressed;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    /// Enter went down this tick.
    pub fn interact_pressed(&self) -> bool {
        self.interact_pressed
    }

    /// Escape went down this tick.
    pub fn dismiss_pressed(&self) -> bool {
        self.dismiss_pressed
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

/// World coordinates are scaled map pixels with y growing downward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.25;
pub const CAMERA_ZOOM_MAX: f32 = 4.0;

#[derive(Debug, Clone, Copy)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2::default(),
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }
}

impl Camera2D {
    pub fn effective_zoom(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec2,
}

/// Collision overlay drawn under the entities.
///
/// Tile (x, y) covers `[x, x + 1) * tile_size_world` horizontally (same for y) with
/// the map's top-left corner at the world origin. Tile id 0 is floor, anything else is blocked.
#[derive(Debug, Clone, PartialEq)]
pub struct Tilemap {
    width: u32,
    height: u32,
    tile_size_world: f32,
    tiles: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TilemapError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile size must be finite and positive, got {0}")]
    InvalidTileSize(f32),
}

impl Tilemap {
    pub fn new(
        width: u32,
        height: u32,
        tile_size_world: f32,
        tiles: Vec<u16>,
    ) -> Result<Self, TilemapError> {
        if !tile_size_world.is_finite() || tile_size_world <= 0.0 {
            return Err(TilemapError::InvalidTileSize(tile_size_world));
        }
        let expected = width as usize * height as usize;
        let actual = tiles.len();
        if expected != actual {
            return Err(TilemapError::TileCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            tile_size_world,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size_world(&self) -> f32 {
        self.tile_size_world
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<u16> {
        self.index_of(x, y)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Top-left corner of the tile in world space.
    pub fn tile_origin_world(&self, x: u32, y: u32) -> Option<Vec2> {
        self.index_of(x, y)?;
        Some(Vec2 {
            x: x as f32 * self.tile_size_world,
            y: y as f32 * self.tile_size_world,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableKind {
    Placeholder,
    Sprite(String),
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub debug_name: &'static str,
    /// World units per sprite pixel.
    pub scale: f32,
    pub mirrored_x: bool,
}

impl RenderableDesc {
    pub fn placeholder(debug_name: &'static str, scale: f32) -> Self {
        Self {
            kind: RenderableKind::Placeholder,
            debug_name,
            scale,
            mirrored_x: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub renderable: RenderableDesc,
}

/// Interactive area drawn as an outline; `min`/`max` are world-space corners.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMarker {
    pub name: String,
    pub min: Vec2,
    pub max: Vec2,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogPanel {
    pub title: String,
    pub body: String,
    pub show_cursor: bool,
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    camera: Camera2D,
    tilemap: Option<Tilemap>,
    zones: Vec<ZoneMarker>,
    path_markers: Vec<Vec2>,
    hint: Option<String>,
    dialog: Option<DialogPanel>,
    touch_pad: Option<[bool; 4]>,
}

impl SceneWorld {
    pub fn spawn(&mut self, transform: Transform, renderable: RenderableDesc) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            renderable,
        });
        id
    }

    pub fn apply_pending(&mut self) {
        self.entities.append(&mut self.pending_spawns);
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.camera = Camera2D::default();
        self.tilemap = None;
        self.zones.clear();
        self.path_markers.clear();
        self.hint = None;
        self.dialog = None;
        self.touch_pad = None;
    }

    pub fn set_tilemap(&mut self, tilemap: Tilemap) {
        self.tilemap = Some(tilemap);
    }

    pub fn tilemap(&self) -> Option<&Tilemap> {
        self.tilemap.as_ref()
    }

    pub fn set_zones(&mut self, zones: Vec<ZoneMarker>) {
        self.zones = zones;
    }

    pub fn zones(&self) -> &[ZoneMarker] {
        &self.zones
    }

    pub fn zones_mut(&mut self) -> &mut [ZoneMarker] {
        &mut self.zones
    }

    pub fn set_path_markers(&mut self, markers: &[Vec2]) {
        self.path_markers.clear();
        self.path_markers.extend_from_slice(markers);
    }

    pub fn path_markers(&self) -> &[Vec2] {
        &self.path_markers
    }

    pub fn set_hint(&mut self, hint: Option<&str>) {
        if self.hint.as_deref() != hint {
            self.hint = hint.map(str::to_string);
        }
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn set_dialog(&mut self, dialog: Option<DialogPanel>) {
        self.dialog = dialog;
    }

    pub fn dialog(&self) -> Option<&DialogPanel> {
        self.dialog.as_ref()
    }

    /// `None` hides the pad; otherwise one pressed flag per [`PadButton::ALL`] entry.
    pub fn set_touch_pad(&mut self, pressed: Option<[bool; 4]>) {
        self.touch_pad = pressed;
    }

    pub fn touch_pad(&self) -> Option<[bool; 4]> {
        self.touch_pad
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn render(&mut self, world: &SceneWorld);
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

/// Owns the single active scene together with its world.
pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.world.apply_pending();
        self.is_loaded = true;
        info!(entity_count = self.world.entity_count(), "scene_loaded");
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        let command = self.scene.update(fixed_dt_seconds, input, &mut self.world);
        self.world.apply_pending();
        command
    }

    pub(crate) fn render(&mut self) {
        self.scene.render(&self.world);
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn shutdown(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.world);
        self.world.clear();
        self.is_loaded = false;
        info!("scene_unloaded");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct CountingScene {
        loads: Rc<Cell<u32>>,
        unloads: Rc<Cell<u32>>,
        quit_after: u32,
        ticks: u32,
    }

    impl Scene for CountingScene {
        fn load(&mut self, world: &mut SceneWorld) {
            self.loads.set(self.loads.get() + 1);
            world.spawn(
                Transform::default(),
                RenderableDesc::placeholder("counter", 1.0),
            );
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            _world: &mut SceneWorld,
        ) -> SceneCommand {
            self.ticks += 1;
            if self.ticks >= self.quit_after {
                SceneCommand::Quit
            } else {
                SceneCommand::None
            }
        }

        fn render(&mut self, _world: &SceneWorld) {}

        fn unload(&mut self, _world: &mut SceneWorld) {
            self.unloads.set(self.unloads.get() + 1);
        }
    }

    fn counting_runtime(quit_after: u32) -> (SceneRuntime, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let loads = Rc::new(Cell::new(0));
        let unloads = Rc::new(Cell::new(0));
        let scene = CountingScene {
            loads: Rc::clone(&loads),
            unloads: Rc::clone(&unloads),
            quit_after,
            ticks: 0,
        };
        (SceneRuntime::new(Box::new(scene)), loads, unloads)
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
    }

    #[test]
    fn spawned_entities_appear_after_apply_pending() {
        let mut world = SceneWorld::default();
        let id = world.spawn(
            Transform::default(),
            RenderableDesc::placeholder("spawned", 1.0),
        );
        assert_eq!(world.entity_count(), 0);
        assert!(world.find_entity(id).is_none());

        world.apply_pending();
        assert_eq!(world.entity_count(), 1);
        assert_eq!(
            world.find_entity(id).map(|entity| entity.renderable.debug_name),
            Some("spawned")
        );
    }

    #[test]
    fn runtime_loads_once_and_unloads_on_shutdown() {
        let (mut runtime, loads, unloads) = counting_runtime(3);
        runtime.load();
        runtime.load();
        assert_eq!(loads.get(), 1);
        assert_eq!(runtime.world().entity_count(), 1);

        runtime.shutdown();
        runtime.shutdown();
        assert_eq!(unloads.get(), 1);
        assert_eq!(runtime.world().entity_count(), 0);
    }

    #[test]
    fn runtime_forwards_scene_commands() {
        let (mut runtime, _, _) = counting_runtime(2);
        runtime.load();
        let input = InputSnapshot::empty();
        assert_eq!(runtime.update(1.0 / 60.0, &input), SceneCommand::None);
        assert_eq!(runtime.update(1.0 / 60.0, &input), SceneCommand::Quit);
    }

    #[test]
    fn camera_zoom_is_clamped_and_sanitized() {
        let mut camera = Camera2D::default();
        camera.set_zoom_clamped(100.0);
        assert!((camera.zoom - CAMERA_ZOOM_MAX).abs() < 0.0001);
        camera.set_zoom_clamped(f32::NAN);
        assert!((camera.zoom - CAMERA_ZOOM_DEFAULT).abs() < 0.0001);
        camera.zoom = 0.0;
        assert!((camera.effective_zoom() - CAMERA_ZOOM_MIN).abs() < 0.0001);
    }

    #[test]
    fn tilemap_new_rejects_invalid_tile_count() {
        let err = Tilemap::new(2, 2, 16.0, vec![0, 1, 2]).expect_err("err");
        assert_eq!(
            err,
            TilemapError::TileCountMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn tilemap_new_rejects_non_positive_tile_size() {
        let err = Tilemap::new(1, 1, 0.0, vec![0]).expect_err("err");
        assert_eq!(err, TilemapError::InvalidTileSize(0.0));
    }

    #[test]
    fn tilemap_indexing_and_bounds() {
        let tilemap = Tilemap::new(2, 2, 64.0, vec![0, 1, 0, 1]).expect("tilemap");
        assert_eq!(tilemap.index_of(1, 1), Some(3));
        assert_eq!(tilemap.tile_at(1, 0), Some(1));
        assert_eq!(tilemap.tile_at(2, 0), None);
        assert_eq!(
            tilemap.tile_origin_world(1, 1),
            Some(Vec2 { x: 64.0, y: 64.0 })
        );
        assert_eq!(tilemap.tile_origin_world(0, 2), None);
    }

    #[test]
    fn hud_state_is_cleared_with_world() {
        let mut world = SceneWorld::default();
        world.set_hint(Some("Press ENTER"));
        world.set_path_markers(&[Vec2 { x: 1.0, y: 2.0 }]);
        world.set_touch_pad(Some([false; 4]));
        world.set_dialog(Some(DialogPanel {
            title: "> T".to_string(),
            body: String::new(),
            show_cursor: true,
        }));
        world.clear();
        assert!(world.hint().is_none());
        assert!(world.path_markers().is_empty());
        assert!(world.touch_pad().is_none());
        assert!(world.dialog().is_none());
    }

    #[test]
    fn snapshot_builders_round_trip() {
        let snapshot = InputSnapshot::empty()
            .with_action_down(InputAction::MoveLeft, true)
            .with_pad_down(PadButton::Down, true)
            .with_interact_pressed(true)
            .with_window_size((640, 480));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.is_down(InputAction::MoveRight));
        assert!(snapshot.is_pad_down(PadButton::Down));
        assert!(snapshot.interact_pressed());
        assert!(!snapshot.dismiss_pressed());
        assert_eq!(snapshot.window_size(), (640, 480));
    }
}
