//! Screen-space layout of the HUD widgets.
//!
//! The renderer draws from these rects and scenes hit-test clicks against them.

use super::rendering::text::{text_width_px, GLYPH_ADVANCE, GLYPH_HEIGHT, LINE_ADVANCE, TEXT_SCALE};
use super::{PadButton, Vec2};

const PAD_BUTTON_SIZE_PX: i32 = 56;
const PAD_GAP_PX: i32 = 6;
const PAD_MARGIN_PX: i32 = 24;
const HINT_PADDING_PX: i32 = 8;
const HINT_BOTTOM_MARGIN_PX: i32 = 40;
const DIALOG_MARGIN_PX: i32 = 24;
const DIALOG_MAX_WIDTH_PX: i32 = 720;
const DIALOG_MAX_HEIGHT_PX: i32 = 400;
const DIALOG_INSET_PX: i32 = 14;
const DIALOG_CLOSE_SIZE_PX: i32 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl ScreenRect {
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x as f32
            && point.y >= self.y as f32
            && point.x < (self.x + self.width) as f32
            && point.y < (self.y + self.height) as f32
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// D-pad anchored to the bottom-left corner, laid out as a cross.
pub fn touch_pad_layout(window_size: (u32, u32)) -> [(PadButton, ScreenRect); 4] {
    let step = PAD_BUTTON_SIZE_PX + PAD_GAP_PX;
    let origin_x = PAD_MARGIN_PX;
    let origin_y = window_size.1 as i32 - PAD_MARGIN_PX - 3 * PAD_BUTTON_SIZE_PX - 2 * PAD_GAP_PX;
    let button = |col: i32, row: i32| ScreenRect {
        x: origin_x + col * step,
        y: origin_y + row * step,
        width: PAD_BUTTON_SIZE_PX,
        height: PAD_BUTTON_SIZE_PX,
    };
    [
        (PadButton::Up, button(1, 0)),
        (PadButton::Down, button(1, 2)),
        (PadButton::Left, button(0, 1)),
        (PadButton::Right, button(2, 1)),
    ]
}

pub(crate) fn pad_button_at(window_size: (u32, u32), point: Vec2) -> Option<PadButton> {
    touch_pad_layout(window_size)
        .into_iter()
        .find(|(_, rect)| rect.contains(point))
        .map(|(button, _)| button)
}

/// Interaction hint, centred horizontally above the bottom edge.
pub fn hint_rect(window_size: (u32, u32), text: &str) -> ScreenRect {
    let width = text_width_px(text) + 2 * HINT_PADDING_PX;
    let height = GLYPH_HEIGHT * TEXT_SCALE + 2 * HINT_PADDING_PX;
    ScreenRect {
        x: (window_size.0 as i32 - width) / 2,
        y: window_size.1 as i32 - HINT_BOTTOM_MARGIN_PX - height,
        width,
        height,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogLayout {
    pub panel: ScreenRect,
    pub close_button: ScreenRect,
    pub title_origin: (i32, i32),
    pub body: ScreenRect,
}

impl DialogLayout {
    pub fn body_columns(&self) -> usize {
        (self.body.width / GLYPH_ADVANCE).max(1) as usize
    }

    pub fn body_rows(&self) -> usize {
        (self.body.height / LINE_ADVANCE).max(0) as usize
    }
}

pub fn dialog_layout(window_size: (u32, u32)) -> DialogLayout {
    let window_w = window_size.0 as i32;
    let window_h = window_size.1 as i32;
    let width = (window_w - 2 * DIALOG_MARGIN_PX).clamp(0, DIALOG_MAX_WIDTH_PX);
    let height = (window_h - 2 * DIALOG_MARGIN_PX).clamp(0, DIALOG_MAX_HEIGHT_PX);
    let panel = ScreenRect {
        x: (window_w - width) / 2,
        y: (window_h - height) / 2,
        width,
        height,
    };
    let close_button = ScreenRect {
        x: panel.right() - DIALOG_INSET_PX - DIALOG_CLOSE_SIZE_PX,
        y: panel.y + DIALOG_INSET_PX / 2,
        width: DIALOG_CLOSE_SIZE_PX,
        height: DIALOG_CLOSE_SIZE_PX,
    };
    let title_origin = (panel.x + DIALOG_INSET_PX, panel.y + DIALOG_INSET_PX);
    let body_top = title_origin.1 + 2 * LINE_ADVANCE;
    let body = ScreenRect {
        x: panel.x + DIALOG_INSET_PX,
        y: body_top,
        width: (panel.width - 2 * DIALOG_INSET_PX).max(0),
        height: (panel.bottom() - DIALOG_INSET_PX - body_top).max(0),
    };
    DialogLayout {
        panel,
        close_button,
        title_origin,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rects_overlap(a: ScreenRect, b: ScreenRect) -> bool {
        a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
    }

    #[test]
    fn screen_rect_contains_is_half_open() {
        let rect = ScreenRect {
            x: 10,
            y: 20,
            width: 5,
            height: 5,
        };
        assert!(rect.contains(Vec2 { x: 10.0, y: 20.0 }));
        assert!(rect.contains(Vec2 { x: 14.9, y: 24.9 }));
        assert!(!rect.contains(Vec2 { x: 15.0, y: 22.0 }));
        assert!(!rect.contains(Vec2 { x: 12.0, y: 19.9 }));
    }

    #[test]
    fn pad_buttons_fit_window_and_do_not_overlap() {
        let layout = touch_pad_layout((1280, 720));
        for (_, rect) in layout {
            assert!(rect.x >= 0 && rect.right() <= 1280);
            assert!(rect.y >= 0 && rect.bottom() <= 720);
        }
        for (i, (_, a)) in layout.iter().enumerate() {
            for (_, b) in layout.iter().skip(i + 1) {
                assert!(!rects_overlap(*a, *b));
            }
        }
    }

    #[test]
    fn pad_hit_test_finds_buttons_and_ignores_centre() {
        let window = (800, 600);
        for (button, rect) in touch_pad_layout(window) {
            let (cx, cy) = rect.center();
            let point = Vec2 {
                x: cx as f32,
                y: cy as f32,
            };
            assert_eq!(pad_button_at(window, point), Some(button));
        }
        assert_eq!(pad_button_at(window, Vec2 { x: 400.0, y: 100.0 }), None);
    }

    #[test]
    fn hint_is_centred_horizontally() {
        let rect = hint_rect((800, 600), "Press ENTER");
        let (cx, _) = rect.center();
        assert!((cx - 400).abs() <= 1);
        assert!(rect.bottom() < 600);
    }

    #[test]
    fn dialog_close_button_sits_inside_panel() {
        let layout = dialog_layout((1280, 720));
        assert!(layout.close_button.x >= layout.panel.x);
        assert!(layout.close_button.right() <= layout.panel.right());
        assert!(layout.close_button.y >= layout.panel.y);
        assert!(layout.body.y > layout.title_origin.1);
        assert!(layout.body_columns() > 20);
        assert!(layout.body_rows() > 5);
    }

    #[test]
    fn tiny_window_produces_empty_but_valid_dialog() {
        let layout = dialog_layout((10, 10));
        assert_eq!(layout.panel.width, 0);
        assert_eq!(layout.panel.height, 0);
        assert_eq!(layout.body_rows(), 0);
        assert_eq!(layout.body_columns(), 1);
    }
}
