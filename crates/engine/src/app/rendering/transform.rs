use crate::app::{Camera2D, Vec2};

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// The camera position maps to the viewport centre; one world unit is `zoom` pixels.
pub fn world_to_screen_px(camera: &Camera2D, window_size: (u32, u32), world: Vec2) -> (i32, i32) {
    let zoom = camera.effective_zoom();
    let x = (world.x - camera.position.x) * zoom + window_size.0 as f32 * 0.5;
    let y = (world.y - camera.position.y) * zoom + window_size.1 as f32 * 0.5;
    (x.round() as i32, y.round() as i32)
}

pub fn screen_to_world_px(camera: &Camera2D, window_size: (u32, u32), screen_px: Vec2) -> Vec2 {
    let zoom = camera.effective_zoom();
    Vec2 {
        x: camera.position.x + (screen_px.x - window_size.0 as f32 * 0.5) / zoom,
        y: camera.position.y + (screen_px.y - window_size.1 as f32 * 0.5) / zoom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_position_maps_to_viewport_center() {
        let camera = Camera2D {
            position: Vec2 { x: 40.0, y: -8.0 },
            zoom: 1.5,
        };
        let (x, y) = world_to_screen_px(&camera, (800, 600), camera.position);
        assert_eq!((x, y), (400, 300));
    }

    #[test]
    fn y_grows_downward_and_zoom_scales_offsets() {
        let camera = Camera2D {
            position: Vec2 { x: 0.0, y: 0.0 },
            zoom: 2.0,
        };
        let (x, y) = world_to_screen_px(&camera, (800, 600), Vec2 { x: 10.0, y: 5.0 });
        assert_eq!((x, y), (420, 310));
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen() {
        let camera = Camera2D {
            position: Vec2 { x: 512.0, y: 300.0 },
            zoom: 1.5,
        };
        let world = Vec2 { x: 560.0, y: 240.0 };
        let (sx, sy) = world_to_screen_px(&camera, (1280, 720), world);
        let back = screen_to_world_px(
            &camera,
            (1280, 720),
            Vec2 {
                x: sx as f32,
                y: sy as f32,
            },
        );
        assert!((back.x - world.x).abs() < 1.0);
        assert!((back.y - world.y).abs() < 1.0);
    }
}
