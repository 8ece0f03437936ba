use engine::Vec2;
use thiserror::Error;

/// Axis-aligned rectangle in unscaled map pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MapRect {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl MapRect {
    pub(crate) fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    pub(crate) fn scaled(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    pub(crate) fn offset(&self, by: Vec2) -> Self {
        Self {
            x: self.x + by.x,
            y: self.y + by.y,
            ..*self
        }
    }

    pub(crate) fn inflate(&self, margin: f32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    /// Strict overlap: rectangles that only share an edge do not overlap.
    pub(crate) fn overlaps(&self, other: &MapRect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    pub(crate) fn min(&self) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y,
        }
    }

    pub(crate) fn max(&self) -> Vec2 {
        Vec2 {
            x: self.x + self.width,
            y: self.y + self.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TileCoord {
    pub(crate) col: i32,
    pub(crate) row: i32,
}

impl TileCoord {
    pub(crate) const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub(crate) fn manhattan(self, other: TileCoord) -> u32 {
        self.col
            .abs_diff(other.col)
            .saturating_add(self.row.abs_diff(other.row))
    }

    /// Up, down, left, right. A step past the `i32` range is `None`.
    pub(crate) fn neighbours(self) -> [Option<TileCoord>; 4] {
        [
            self.row.checked_sub(1).map(|row| TileCoord::new(self.col, row)),
            self.row.checked_add(1).map(|row| TileCoord::new(self.col, row)),
            self.col.checked_sub(1).map(|col| TileCoord::new(col, self.row)),
            self.col.checked_add(1).map(|col| TileCoord::new(col, self.row)),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cell {
    Walkable,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum GridError {
    #[error("tile size must be positive and finite, got {0}")]
    InvalidTileSize(f32),
    #[error("scale factor must be positive and finite, got {0}")]
    InvalidScaleFactor(f32),
    #[error("map size must be positive and finite, got {width}x{height}")]
    InvalidMapSize { width: f32, height: f32 },
}

/// Static walkability grid rasterized from map obstacles.
///
/// Cells are addressed in tile space; world coordinates are map pixels times
/// `scale_factor`. Nothing mutates a grid after [`Grid::build`].
#[derive(Debug, Clone)]
pub(crate) struct Grid {
    cols: u32,
    rows: u32,
    tile_size: f32,
    scale_factor: f32,
    cells: Vec<Cell>,
}

impl Grid {
    pub(crate) fn build(
        map_width_px: f32,
        map_height_px: f32,
        tile_size: f32,
        obstacles: &[MapRect],
        scale_factor: f32,
    ) -> Result<Self, GridError> {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(GridError::InvalidTileSize(tile_size));
        }
        if !(scale_factor.is_finite() && scale_factor > 0.0) {
            return Err(GridError::InvalidScaleFactor(scale_factor));
        }
        let map_size_ok = |value: f32| value.is_finite() && value > 0.0;
        if !map_size_ok(map_width_px) || !map_size_ok(map_height_px) {
            return Err(GridError::InvalidMapSize {
                width: map_width_px,
                height: map_height_px,
            });
        }

        let cols = tiles_spanning(map_width_px, tile_size);
        let rows = tiles_spanning(map_height_px, tile_size);
        let mut grid = Self {
            cols,
            rows,
            tile_size,
            scale_factor,
            cells: vec![Cell::Walkable; cols as usize * rows as usize],
        };
        for obstacle in obstacles.iter().filter(|rect| rect.is_well_formed()) {
            grid.rasterize(obstacle);
        }
        Ok(grid)
    }

    fn rasterize(&mut self, obstacle: &MapRect) {
        let start_col = clip_index((obstacle.x / self.tile_size).floor(), self.cols);
        let end_col = clip_index(((obstacle.x + obstacle.width) / self.tile_size).ceil(), self.cols);
        let start_row = clip_index((obstacle.y / self.tile_size).floor(), self.rows);
        let end_row = clip_index(
            ((obstacle.y + obstacle.height) / self.tile_size).ceil(),
            self.rows,
        );
        for row in start_row..end_row {
            for col in start_col..end_col {
                let index = row as usize * self.cols as usize + col as usize;
                self.cells[index] = Cell::Blocked;
            }
        }
    }

    pub(crate) fn cols(&self) -> u32 {
        self.cols
    }

    pub(crate) fn rows(&self) -> u32 {
        self.rows
    }

    /// Edge length of one tile in world units.
    pub(crate) fn world_tile_size(&self) -> f32 {
        self.tile_size * self.scale_factor
    }

    pub(crate) fn world_to_tile(&self, world: Vec2) -> TileCoord {
        let size = self.world_tile_size();
        TileCoord::new(
            world_axis_to_index(world.x, size),
            world_axis_to_index(world.y, size),
        )
    }

    pub(crate) fn tile_to_world(&self, tile: TileCoord) -> Vec2 {
        let size = self.world_tile_size();
        Vec2 {
            x: (tile.col as f32 + 0.5) * size,
            y: (tile.row as f32 + 0.5) * size,
        }
    }

    pub(crate) fn cell(&self, tile: TileCoord) -> Option<Cell> {
        self.index_of(tile).map(|index| self.cells[index])
    }

    pub(crate) fn is_walkable(&self, tile: TileCoord) -> bool {
        self.cell(tile) == Some(Cell::Walkable)
    }

    pub(crate) fn blocked_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| **cell == Cell::Blocked)
            .count()
    }

    /// Row-major tile ids for the renderer: `0` walkable, `1` blocked.
    pub(crate) fn tile_ids(&self) -> Vec<u16> {
        self.cells
            .iter()
            .map(|cell| match cell {
                Cell::Walkable => 0,
                Cell::Blocked => 1,
            })
            .collect()
    }

    fn index_of(&self, tile: TileCoord) -> Option<usize> {
        let col = u32::try_from(tile.col).ok()?;
        let row = u32::try_from(tile.row).ok()?;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(row as usize * self.cols as usize + col as usize)
    }
}

fn tiles_spanning(length_px: f32, tile_size: f32) -> u32 {
    let tiles = (length_px / tile_size).ceil();
    if tiles >= u32::MAX as f32 {
        u32::MAX
    } else {
        (tiles as u32).max(1)
    }
}

fn clip_index(value: f32, limit: u32) -> u32 {
    if value <= 0.0 {
        0
    } else if value >= limit as f32 {
        limit
    } else {
        value as u32
    }
}

fn world_axis_to_index(coord: f32, tile_size_world: f32) -> i32 {
    if !coord.is_finite() {
        return i32::MIN;
    }
    // `as` saturates, so far-away points still land out of bounds.
    (coord / tile_size_world).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_blocked(rect: &MapRect, tile_size: f32, col: u32, row: u32) -> bool {
        let tile = MapRect::new(
            col as f32 * tile_size,
            row as f32 * tile_size,
            tile_size,
            tile_size,
        );
        rect.is_well_formed() && rect.overlaps(&tile)
    }

    #[test]
    fn dimensions_round_up_partial_tiles() {
        let grid = Grid::build(33.0, 16.0, 16.0, &[], 4.0).expect("grid");
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.rows(), 1);
        assert_eq!(grid.blocked_count(), 0);
    }

    #[test]
    fn build_rejects_invalid_geometry() {
        assert_eq!(
            Grid::build(64.0, 64.0, 0.0, &[], 4.0).unwrap_err(),
            GridError::InvalidTileSize(0.0)
        );
        assert!(matches!(
            Grid::build(64.0, 64.0, 16.0, &[], f32::NAN),
            Err(GridError::InvalidScaleFactor(_))
        ));
        assert!(matches!(
            Grid::build(-1.0, 64.0, 16.0, &[], 4.0),
            Err(GridError::InvalidMapSize { .. })
        ));
    }

    #[test]
    fn rasterization_matches_brute_force_intersection() {
        let tile_size = 16.0;
        let rects = [
            MapRect::new(0.0, 0.0, 16.0, 16.0),
            MapRect::new(20.0, 5.0, 30.0, 2.0),
            MapRect::new(47.5, 47.5, 1.0, 1.0),
            MapRect::new(-30.0, 60.0, 50.0, 100.0),
            MapRect::new(100.0, 100.0, 500.0, 3.0),
            MapRect::new(64.0, 16.0, 16.0, 32.0),
        ];
        for rect in rects {
            let grid = Grid::build(128.0, 112.0, tile_size, &[rect], 4.0).expect("grid");
            for row in 0..grid.rows() {
                for col in 0..grid.cols() {
                    let expected = brute_force_blocked(&rect, tile_size, col, row);
                    let tile = TileCoord::new(col as i32, row as i32);
                    assert_eq!(
                        grid.cell(tile) == Some(Cell::Blocked),
                        expected,
                        "rect={rect:?} col={col} row={row}"
                    );
                }
            }
        }
    }

    #[test]
    fn malformed_obstacles_are_ignored() {
        let rects = [
            MapRect::new(0.0, 0.0, -16.0, 16.0),
            MapRect::new(0.0, 0.0, 16.0, 0.0),
            MapRect::new(f32::NAN, 0.0, 16.0, 16.0),
            MapRect::new(0.0, 0.0, f32::INFINITY, 16.0),
        ];
        let grid = Grid::build(64.0, 64.0, 16.0, &rects, 4.0).expect("grid");
        assert_eq!(grid.blocked_count(), 0);
    }

    #[test]
    fn tile_centres_round_trip() {
        let grid = Grid::build(160.0, 96.0, 16.0, &[], 4.0).expect("grid");
        for row in 0..grid.rows() as i32 {
            for col in 0..grid.cols() as i32 {
                let tile = TileCoord::new(col, row);
                assert_eq!(grid.world_to_tile(grid.tile_to_world(tile)), tile);
            }
        }
        assert_eq!(
            grid.tile_to_world(TileCoord::new(1, 2)),
            Vec2 { x: 96.0, y: 160.0 }
        );
    }

    #[test]
    fn world_to_tile_floors_negative_and_rejects_non_finite() {
        let grid = Grid::build(64.0, 64.0, 16.0, &[], 4.0).expect("grid");
        assert_eq!(
            grid.world_to_tile(Vec2 { x: -0.5, y: 63.9 }),
            TileCoord::new(-1, 0)
        );
        let far = grid.world_to_tile(Vec2 {
            x: f32::NAN,
            y: f32::INFINITY,
        });
        assert!(!grid.is_walkable(far));
    }

    #[test]
    fn out_of_bounds_tiles_are_not_walkable() {
        let grid = Grid::build(32.0, 32.0, 16.0, &[], 1.0).expect("grid");
        assert!(grid.is_walkable(TileCoord::new(1, 1)));
        assert!(!grid.is_walkable(TileCoord::new(2, 0)));
        assert!(!grid.is_walkable(TileCoord::new(0, -1)));
        assert!(!grid.is_walkable(TileCoord::new(i32::MAX, i32::MIN)));
    }

    #[test]
    fn tile_ids_follow_row_major_cells() {
        let grid = Grid::build(
            48.0,
            32.0,
            16.0,
            &[MapRect::new(16.0, 16.0, 16.0, 16.0)],
            1.0,
        )
        .expect("grid");
        assert_eq!(grid.tile_ids(), vec![0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn neighbours_saturate_at_integer_edges() {
        let corner = TileCoord::new(i32::MIN, i32::MAX);
        let [up, down, left, right] = corner.neighbours();
        assert_eq!(up, Some(TileCoord::new(i32::MIN, i32::MAX - 1)));
        assert_eq!(down, None);
        assert_eq!(left, None);
        assert_eq!(right, Some(TileCoord::new(i32::MIN + 1, i32::MAX)));
    }
}
