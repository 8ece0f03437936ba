mod hud;
mod input;
mod loop_runner;
mod rendering;
mod scene;
mod touch;

pub use hud::{dialog_layout, hint_rect, touch_pad_layout, DialogLayout, ScreenRect};
pub use input::{InputAction, PadButton};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{
    screen_to_world_px, world_to_screen_px, Renderer, Viewport, PLACEHOLDER_HALF_SIZE_PX,
};
pub use scene::{
    Camera2D, DialogPanel, Entity, EntityId, InputSnapshot, RenderableDesc, RenderableKind, Scene,
    SceneCommand, SceneWorld, Tilemap, TilemapError, Transform, Vec2, ZoneMarker,
};
