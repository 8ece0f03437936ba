use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::hud::{dialog_layout, hint_rect, touch_pad_layout, ScreenRect};
use crate::app::{Camera2D, DialogPanel, RenderableKind, SceneWorld, Tilemap, Vec2};
use crate::sprite_keys::validate_sprite_key;

use super::text::{draw_text_clipped, text_width_px, wrap_text, GLYPH_HEIGHT, LINE_ADVANCE, TEXT_SCALE};
use super::{world_to_screen_px, write_pixel_rgba_clipped, Viewport, PLACEHOLDER_HALF_SIZE_PX};

const CLEAR_COLOR: [u8; 4] = [10, 14, 23, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const FLOOR_COLOR_EVEN: [u8; 4] = [34, 38, 52, 255];
const FLOOR_COLOR_ODD: [u8; 4] = [38, 43, 58, 255];
const BLOCKED_COLOR: [u8; 4] = [70, 52, 66, 255];
const ZONE_COLOR: [u8; 4] = [0, 170, 190, 255];
const ZONE_HIGHLIGHT_COLOR: [u8; 4] = [0, 240, 255, 255];
const PATH_MARKER_COLOR: [u8; 4] = [255, 210, 70, 255];
const PATH_MARKER_HALF_SIZE_PX: i32 = 2;
const PATH_GOAL_HALF_SIZE_PX: i32 = 6;
const PANEL_BG_COLOR: [u8; 4] = [12, 16, 26, 255];
const PANEL_BORDER_COLOR: [u8; 4] = [0, 240, 255, 255];
const TEXT_PRIMARY_COLOR: [u8; 4] = [232, 244, 252, 255];
const TEXT_TITLE_COLOR: [u8; 4] = [0, 240, 255, 255];
const PAD_COLOR: [u8; 4] = [40, 46, 62, 255];
const PAD_PRESSED_COLOR: [u8; 4] = [0, 150, 170, 255];
const VIEW_CULL_PADDING_PX: f32 = 16.0;
const DIALOG_CURSOR: char = '_';

struct WorldBounds {
    min_x: f32,
    max_x: f32,
    min_y: f32,
    max_y: f32,
}

#[derive(Debug, PartialEq, Eq)]
struct TileRectInclusive {
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
}

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: HashSet<String>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sprite_cache: HashMap::new(),
            warned_missing_sprite_keys: HashSet::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            self.viewport = Viewport { width, height };
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        let width = self.viewport.width;
        let height = self.viewport.height;
        if width == 0 || height == 0 {
            return Ok(());
        }

        let asset_root = self.asset_root.as_path();
        let sprite_cache = &mut self.sprite_cache;
        let warned_missing_sprite_keys = &mut self.warned_missing_sprite_keys;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        let camera = world.camera();
        if let Some(tilemap) = world.tilemap() {
            draw_tilemap(frame, width, height, camera, tilemap);
        }
        draw_zones(frame, width, height, world);
        draw_path_markers(frame, width, height, camera, world.path_markers());

        for entity in world.entities() {
            let (sx, sy) = world_to_screen_px(camera, (width, height), entity.transform.position);
            let scale = entity.renderable.scale * camera.effective_zoom();
            let sprite = match &entity.renderable.kind {
                RenderableKind::Sprite(key) => resolve_cached_sprite(
                    sprite_cache,
                    warned_missing_sprite_keys,
                    asset_root,
                    key,
                ),
                RenderableKind::Placeholder => None,
            };
            match sprite {
                Some(sprite) => draw_sprite_centered_scaled(
                    frame,
                    width,
                    height,
                    sx,
                    sy,
                    sprite,
                    scale,
                    entity.renderable.mirrored_x,
                ),
                None => {
                    let half_size = (PLACEHOLDER_HALF_SIZE_PX as f32 * scale).round() as i32;
                    draw_square(frame, width, height, sx, sy, half_size, PLACEHOLDER_COLOR);
                }
            }
        }

        if let Some(pressed) = world.touch_pad() {
            draw_touch_pad(frame, width, height, pressed);
        }
        if let Some(hint) = world.hint() {
            draw_hint(frame, width, height, hint);
        }
        if let Some(panel) = world.dialog() {
            draw_dialog(frame, width, height, panel);
        }

        self.pixels.render()
    }
}

fn view_bounds_world(camera: &Camera2D, window_size: (u32, u32), padding_px: f32) -> WorldBounds {
    let zoom = camera.effective_zoom();
    let half_w = (window_size.0 as f32 * 0.5 + padding_px) / zoom;
    let half_h = (window_size.1 as f32 * 0.5 + padding_px) / zoom;
    WorldBounds {
        min_x: camera.position.x - half_w,
        max_x: camera.position.x + half_w,
        min_y: camera.position.y - half_h,
        max_y: camera.position.y + half_h,
    }
}

fn visible_tile_rect(tilemap: &Tilemap, bounds: &WorldBounds) -> Option<TileRectInclusive> {
    if tilemap.width() == 0 || tilemap.height() == 0 {
        return None;
    }
    let tile_size = tilemap.tile_size_world();
    let max_tile_x = tilemap.width() as i64 - 1;
    let max_tile_y = tilemap.height() as i64 - 1;
    let min_x = ((bounds.min_x / tile_size).floor() as i64).max(0);
    let max_x = ((bounds.max_x / tile_size).floor() as i64).min(max_tile_x);
    let min_y = ((bounds.min_y / tile_size).floor() as i64).max(0);
    let max_y = ((bounds.max_y / tile_size).floor() as i64).min(max_tile_y);
    if min_x > max_x || min_y > max_y {
        return None;
    }
    Some(TileRectInclusive {
        min_x: min_x as u32,
        max_x: max_x as u32,
        min_y: min_y as u32,
        max_y: max_y as u32,
    })
}

fn draw_tilemap(frame: &mut [u8], width: u32, height: u32, camera: &Camera2D, tilemap: &Tilemap) {
    let bounds = view_bounds_world(camera, (width, height), VIEW_CULL_PADDING_PX);
    let Some(visible) = visible_tile_rect(tilemap, &bounds) else {
        return;
    };
    let tile_size = tilemap.tile_size_world();
    for y in visible.min_y..=visible.max_y {
        for x in visible.min_x..=visible.max_x {
            let (Some(tile_id), Some(origin)) = (tilemap.tile_at(x, y), tilemap.tile_origin_world(x, y))
            else {
                continue;
            };
            let (left, top) = world_to_screen_px(camera, (width, height), origin);
            let (right, bottom) = world_to_screen_px(
                camera,
                (width, height),
                Vec2 {
                    x: origin.x + tile_size,
                    y: origin.y + tile_size,
                },
            );
            let color = if tile_id != 0 {
                BLOCKED_COLOR
            } else if (x + y) % 2 == 0 {
                FLOOR_COLOR_EVEN
            } else {
                FLOOR_COLOR_ODD
            };
            draw_filled_rect(
                frame,
                width,
                height,
                ScreenRect {
                    x: left,
                    y: top,
                    width: right - left,
                    height: bottom - top,
                },
                color,
            );
        }
    }
}

fn draw_zones(frame: &mut [u8], width: u32, height: u32, world: &SceneWorld) {
    let camera = world.camera();
    for zone in world.zones() {
        let (left, top) = world_to_screen_px(camera, (width, height), zone.min);
        let (right, bottom) = world_to_screen_px(camera, (width, height), zone.max);
        let rect = ScreenRect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        };
        let color = if zone.highlighted {
            ZONE_HIGHLIGHT_COLOR
        } else {
            ZONE_COLOR
        };
        draw_rect_outline(frame, width, height, rect, color);
        if zone.highlighted {
            let label_y = top - LINE_ADVANCE;
            draw_text_clipped(frame, width, height, left, label_y, &zone.name, color);
        }
    }
}

fn draw_path_markers(frame: &mut [u8], width: u32, height: u32, camera: &Camera2D, markers: &[Vec2]) {
    let Some((goal, steps)) = markers.split_last() else {
        return;
    };
    for marker in steps {
        let (x, y) = world_to_screen_px(camera, (width, height), *marker);
        draw_square(frame, width, height, x, y, PATH_MARKER_HALF_SIZE_PX, PATH_MARKER_COLOR);
    }
    let (x, y) = world_to_screen_px(camera, (width, height), *goal);
    draw_square_outline(frame, width, x, y, PATH_GOAL_HALF_SIZE_PX, PATH_MARKER_COLOR);
}

fn draw_touch_pad(frame: &mut [u8], width: u32, height: u32, pressed: [bool; 4]) {
    for (button, rect) in touch_pad_layout((width, height)) {
        let is_pressed = pressed.get(button.index()).copied().unwrap_or(false);
        let fill = if is_pressed { PAD_PRESSED_COLOR } else { PAD_COLOR };
        draw_filled_rect(frame, width, height, rect, fill);
        draw_rect_outline(frame, width, height, rect, PANEL_BORDER_COLOR);
        let label = button.label();
        let (cx, cy) = rect.center();
        draw_text_clipped(
            frame,
            width,
            height,
            cx - text_width_px(label) / 2,
            cy - GLYPH_HEIGHT * TEXT_SCALE / 2,
            label,
            TEXT_PRIMARY_COLOR,
        );
    }
}

fn draw_hint(frame: &mut [u8], width: u32, height: u32, hint: &str) {
    let rect = hint_rect((width, height), hint);
    draw_filled_rect(frame, width, height, rect, PANEL_BG_COLOR);
    draw_rect_outline(frame, width, height, rect, PANEL_BORDER_COLOR);
    let text_x = rect.x + (rect.width - text_width_px(hint)) / 2;
    let text_y = rect.y + (rect.height - GLYPH_HEIGHT * TEXT_SCALE) / 2;
    draw_text_clipped(frame, width, height, text_x, text_y, hint, TEXT_PRIMARY_COLOR);
}

fn draw_dialog(frame: &mut [u8], width: u32, height: u32, panel: &DialogPanel) {
    let layout = dialog_layout((width, height));
    if layout.panel.width == 0 || layout.panel.height == 0 {
        return;
    }
    draw_filled_rect(frame, width, height, layout.panel, PANEL_BG_COLOR);
    draw_rect_outline(frame, width, height, layout.panel, PANEL_BORDER_COLOR);

    let (title_x, title_y) = layout.title_origin;
    draw_text_clipped(frame, width, height, title_x, title_y, &panel.title, TEXT_TITLE_COLOR);

    draw_rect_outline(frame, width, height, layout.close_button, PANEL_BORDER_COLOR);
    let (close_x, close_y) = layout.close_button.center();
    draw_text_clipped(
        frame,
        width,
        height,
        close_x - text_width_px("x") / 2,
        close_y - GLYPH_HEIGHT * TEXT_SCALE / 2,
        "x",
        TEXT_PRIMARY_COLOR,
    );

    let body_lines = dialog_body_lines(panel, layout.body_columns(), layout.body_rows());
    for (row, line) in body_lines.iter().enumerate() {
        let y = layout.body.y + row as i32 * LINE_ADVANCE;
        draw_text_clipped(frame, width, height, layout.body.x, y, line, TEXT_PRIMARY_COLOR);
    }
}

/// Wrapped body lines, scrolled so the most recently revealed text stays visible.
fn dialog_body_lines(panel: &DialogPanel, columns: usize, rows: usize) -> Vec<String> {
    let mut body = panel.body.clone();
    if panel.show_cursor {
        body.push(DIALOG_CURSOR);
    }
    let mut lines = wrap_text(&body, columns);
    if lines.len() > rows {
        lines.drain(..lines.len() - rows);
    }
    lines
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: &mut HashSet<String>,
    asset_root: &Path,
    key: &str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(key) {
        let sprite = match resolve_sprite_image_path(asset_root, key) {
            Ok(path) => match load_sprite_rgba(&path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    warn_sprite_load_once(warned_missing_sprite_keys, key, Some(&path), &reason);
                    None
                }
            },
            Err(reason) => {
                warn_sprite_load_once(warned_missing_sprite_keys, key, None, &reason);
                None
            }
        };
        cache.insert(key.to_string(), sprite);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn resolve_sprite_image_path(asset_root: &Path, key: &str) -> Result<PathBuf, String> {
    validate_sprite_key(key).map_err(|error| format!("invalid_key:{error}"))?;
    Ok(asset_root
        .join("base")
        .join("sprites")
        .join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

fn draw_filled_rect(frame: &mut [u8], width: u32, height: u32, rect: ScreenRect, color: [u8; 4]) {
    let start_x = rect.x.max(0);
    let start_y = rect.y.max(0);
    let end_x = rect.right().min(width as i32);
    let end_y = rect.bottom().min(height as i32);
    for y in start_y..end_y {
        for x in start_x..end_x {
            write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    }
}

fn draw_rect_outline(frame: &mut [u8], width: u32, height: u32, rect: ScreenRect, color: [u8; 4]) {
    if rect.width <= 1 || rect.height <= 1 {
        return;
    }
    let edges = [
        ScreenRect { height: 1, ..rect },
        ScreenRect {
            y: rect.bottom() - 1,
            height: 1,
            ..rect
        },
        ScreenRect { width: 1, ..rect },
        ScreenRect {
            x: rect.right() - 1,
            width: 1,
            ..rect
        },
    ];
    for edge in edges {
        draw_filled_rect(frame, width, height, edge, color);
    }
}

fn draw_square(
    frame: &mut [u8],
    width: u32,
    height: u32,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    let rect = ScreenRect {
        x: cx - half_size,
        y: cy - half_size,
        width: 2 * half_size + 1,
        height: 2 * half_size + 1,
    };
    draw_filled_rect(frame, width, height, rect, color);
}

fn draw_square_outline(
    frame: &mut [u8],
    width: u32,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    let left = cx - half_size;
    let right = cx + half_size;
    let top = cy - half_size;
    let bottom = cy + half_size;

    for x in left..=right {
        write_pixel_rgba_clipped(frame, width as usize, x, top, color);
        write_pixel_rgba_clipped(frame, width as usize, x, bottom, color);
    }
    for y in top..=bottom {
        write_pixel_rgba_clipped(frame, width as usize, left, y, color);
        write_pixel_rgba_clipped(frame, width as usize, right, y, color);
    }
}

fn normalized_sprite_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn scaled_sprite_dimensions(sprite: &LoadedSprite, scale: f32) -> (u32, u32) {
    let scale = normalized_sprite_scale(scale);
    let width = (sprite.width as f32 * scale).round().max(1.0) as u32;
    let height = (sprite.height as f32 * scale).round().max(1.0) as u32;
    (width, height)
}

#[allow(clippy::too_many_arguments)]
fn draw_sprite_centered_scaled(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center_x: i32,
    center_y: i32,
    sprite: &LoadedSprite,
    scale: f32,
    mirrored_x: bool,
) {
    if sprite.width == 0 || sprite.height == 0 || width == 0 || height == 0 {
        return;
    }
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len {
        return;
    }

    let scale = normalized_sprite_scale(scale);
    let inv_scale = scale.recip();
    let (scaled_w, scaled_h) = scaled_sprite_dimensions(sprite, scale);
    let left = center_x - (scaled_w as i32 / 2);
    let top = center_y - (scaled_h as i32 / 2);
    let right = left + scaled_w as i32;
    let bottom = top + scaled_h as i32;

    let draw_left = left.max(0);
    let draw_top = top.max(0);
    let draw_right = right.min(width as i32);
    let draw_bottom = bottom.min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let frame_width = width as usize;
    let sprite_width = sprite.width as usize;

    for out_y in draw_top..draw_bottom {
        let dy = out_y - top;
        let src_y = ((dy as f32) * inv_scale).floor() as u32;
        let src_y = src_y.min(sprite.height - 1) as usize;
        let src_row_offset = src_y * sprite_width * 4;
        let dst_row_offset = out_y as usize * frame_width * 4;

        for out_x in draw_left..draw_right {
            let dx = out_x - left;
            let src_x = ((dx as f32) * inv_scale).floor() as u32;
            let mut src_x = src_x.min(sprite.width - 1) as usize;
            if mirrored_x {
                src_x = sprite_width - 1 - src_x;
            }
            let src_offset = src_row_offset + src_x * 4;
            let alpha = sprite.rgba[src_offset + 3];
            if alpha == 0 {
                continue;
            }
            let dst_offset = dst_row_offset + out_x as usize * 4;
            frame[dst_offset..dst_offset + 3].copy_from_slice(&sprite.rgba[src_offset..src_offset + 3]);
            frame[dst_offset + 3] = alpha;
        }
    }
}
