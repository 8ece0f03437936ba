use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};

use engine::Vec2;

use super::grid::{Grid, TileCoord};

/// World-space tile centres from the start tile to the goal tile.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Path {
    waypoints: Vec<Vec2>,
}

impl Path {
    pub(crate) fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub(crate) fn waypoint(&self, index: usize) -> Option<Vec2> {
        self.waypoints.get(index).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Start and goal share a tile; there is nothing to walk.
    pub(crate) fn is_degenerate(&self) -> bool {
        self.waypoints.len() <= 1
    }

    pub(crate) fn goal(&self) -> Option<Vec2> {
        self.waypoints.last().copied()
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeRecord {
    g: u32,
    parent: Option<TileCoord>,
    closed: bool,
}

/// Heap entry ordered so the max-heap pops the lowest `f`, then lowest `h`,
/// then the earliest insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    f: Reverse<u32>,
    h: Reverse<u32>,
    order: Reverse<u64>,
    tile: TileCoord,
}

/// A* over the grid between two world positions.
///
/// Returns `None` when the goal tile is blocked, off the map, or unreachable.
/// The start tile itself does not need to be walkable.
pub(crate) fn find_path(grid: &Grid, start_world: Vec2, goal_world: Vec2) -> Option<Path> {
    let start = grid.world_to_tile(start_world);
    let goal = grid.world_to_tile(goal_world);
    let tiles = find_tile_path(grid, start, goal)?;
    Some(Path {
        waypoints: tiles.into_iter().map(|tile| grid.tile_to_world(tile)).collect(),
    })
}

pub(crate) fn find_tile_path(grid: &Grid, start: TileCoord, goal: TileCoord) -> Option<Vec<TileCoord>> {
    if !grid.is_walkable(goal) {
        return None;
    }

    let mut nodes: HashMap<TileCoord, NodeRecord> = HashMap::new();
    let mut open = BinaryHeap::new();
    let mut next_order = 0u64;

    nodes.insert(
        start,
        NodeRecord {
            g: 0,
            parent: None,
            closed: false,
        },
    );
    let start_h = start.manhattan(goal);
    open.push(OpenEntry {
        f: Reverse(start_h),
        h: Reverse(start_h),
        order: Reverse(next_order),
        tile: start,
    });

    while let Some(entry) = open.pop() {
        let current = entry.tile;
        let current_g = match nodes.get_mut(&current) {
            Some(record) if !record.closed => {
                record.closed = true;
                record.g
            }
            _ => continue,
        };

        if current == goal {
            return Some(reconstruct(&nodes, goal));
        }

        for neighbour in current.neighbours().into_iter().flatten() {
            if !grid.is_walkable(neighbour) {
                continue;
            }
            let tentative_g = current_g.saturating_add(1);
            match nodes.entry(neighbour) {
                Entry::Occupied(mut occupied) => {
                    let record = occupied.get_mut();
                    if record.closed || tentative_g >= record.g {
                        continue;
                    }
                    record.g = tentative_g;
                    record.parent = Some(current);
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(NodeRecord {
                        g: tentative_g,
                        parent: Some(current),
                        closed: false,
                    });
                }
            }

            next_order = next_order.saturating_add(1);
            let h = neighbour.manhattan(goal);
            open.push(OpenEntry {
                f: Reverse(tentative_g.saturating_add(h)),
                h: Reverse(h),
                order: Reverse(next_order),
                tile: neighbour,
            });
        }
    }

    None
}

fn reconstruct(nodes: &HashMap<TileCoord, NodeRecord>, goal: TileCoord) -> Vec<TileCoord> {
    let mut tiles = vec![goal];
    let mut cursor = goal;
    while let Some(parent) = nodes.get(&cursor).and_then(|record| record.parent) {
        tiles.push(parent);
        cursor = parent;
    }
    tiles.reverse();
    tiles
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::app::gameplay::grid::MapRect;

    const TILE: f32 = 16.0;

    /// Deterministic generator for the random-grid comparison.
    struct Lcg(u64);

    impl Lcg {
        fn next_u32(&mut self) -> u32 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (self.0 >> 33) as u32
        }
    }

    fn grid_from_rows(rows: &[&str]) -> Grid {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        let mut obstacles = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                if ch == '#' {
                    obstacles.push(MapRect::new(
                        col as f32 * TILE,
                        row as f32 * TILE,
                        TILE,
                        TILE,
                    ));
                }
            }
        }
        Grid::build(
            width as f32 * TILE,
            height as f32 * TILE,
            TILE,
            &obstacles,
            1.0,
        )
        .expect("grid")
    }

    fn bfs_distance(grid: &Grid, start: TileCoord, goal: TileCoord) -> Option<usize> {
        if !grid.is_walkable(goal) {
            return None;
        }
        let mut distances = HashMap::from([(start, 0usize)]);
        let mut queue = VecDeque::from([start]);
        while let Some(tile) = queue.pop_front() {
            let distance = distances[&tile];
            if tile == goal {
                return Some(distance);
            }
            for neighbour in tile.neighbours().into_iter().flatten() {
                if grid.is_walkable(neighbour) && !distances.contains_key(&neighbour) {
                    distances.insert(neighbour, distance + 1);
                    queue.push_back(neighbour);
                }
            }
        }
        None
    }

    fn assert_valid_steps(grid: &Grid, start: TileCoord, goal: TileCoord, tiles: &[TileCoord]) {
        assert_eq!(tiles.first(), Some(&start));
        assert_eq!(tiles.last(), Some(&goal));
        for pair in tiles.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1, "non-adjacent step {pair:?}");
            assert!(grid.is_walkable(pair[1]), "stepped onto blocked {:?}", pair[1]);
        }
    }

    #[test]
    fn path_detours_around_wall() {
        let grid = grid_from_rows(&[
            ".......", //
            "...#...", //
            "...#...", //
            "...#...", //
            ".......",
        ]);
        let start = TileCoord::new(1, 2);
        let goal = TileCoord::new(5, 2);
        let tiles = find_tile_path(&grid, start, goal).expect("reachable");
        assert_valid_steps(&grid, start, goal, &tiles);
        assert_eq!(tiles.len() - 1, 8);
    }

    #[test]
    fn world_path_starts_and_ends_on_tile_centres() {
        let grid = grid_from_rows(&["....", "....", "...."]);
        let path = find_path(&grid, Vec2 { x: 3.0, y: 3.0 }, Vec2 { x: 60.0, y: 40.0 })
            .expect("reachable");
        assert_eq!(path.waypoint(0), Some(Vec2 { x: 8.0, y: 8.0 }));
        assert_eq!(path.goal(), Some(Vec2 { x: 56.0, y: 40.0 }));
        assert_eq!(path.len(), 6);
        assert!(!path.is_degenerate());
    }

    #[test]
    fn blocked_goal_yields_none() {
        let grid = grid_from_rows(&["..#", "..."]);
        assert!(find_tile_path(&grid, TileCoord::new(0, 0), TileCoord::new(2, 0)).is_none());
    }

    #[test]
    fn off_map_goal_yields_none() {
        let grid = grid_from_rows(&["...", "..."]);
        assert!(find_path(&grid, Vec2 { x: 8.0, y: 8.0 }, Vec2 { x: -4.0, y: 8.0 }).is_none());
        assert!(find_path(&grid, Vec2 { x: 8.0, y: 8.0 }, Vec2 { x: 8.0, y: 500.0 }).is_none());
    }

    #[test]
    fn walled_off_goal_yields_none() {
        let grid = grid_from_rows(&[
            ".....", //
            "..###", //
            "..#..", //
            "..###",
        ]);
        assert!(find_tile_path(&grid, TileCoord::new(0, 0), TileCoord::new(3, 2)).is_none());
    }

    #[test]
    fn start_equal_to_goal_is_degenerate() {
        let grid = grid_from_rows(&["...", "..."]);
        let path = find_path(&grid, Vec2 { x: 20.0, y: 20.0 }, Vec2 { x: 30.0, y: 30.0 })
            .expect("same tile");
        assert_eq!(path.len(), 1);
        assert!(path.is_degenerate());
    }

    #[test]
    fn blocked_start_tile_may_still_leave() {
        let grid = grid_from_rows(&["#..", "..."]);
        let start = TileCoord::new(0, 0);
        let goal = TileCoord::new(2, 1);
        let tiles = find_tile_path(&grid, start, goal).expect("reachable");
        assert_valid_steps(&grid, start, goal, &tiles);
        assert_eq!(tiles.len() - 1, 3);
    }

    #[test]
    fn path_length_matches_bfs_on_generated_grids() {
        let mut rng = Lcg(0x5eed);
        for _ in 0..40 {
            let width = 4 + (rng.next_u32() % 9) as usize;
            let height = 4 + (rng.next_u32() % 9) as usize;
            let rows: Vec<String> = (0..height)
                .map(|_| {
                    (0..width)
                        .map(|_| if rng.next_u32() % 100 < 30 { '#' } else { '.' })
                        .collect()
                })
                .collect();
            let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
            let grid = grid_from_rows(&row_refs);

            for _ in 0..10 {
                let start = TileCoord::new(
                    (rng.next_u32() % width as u32) as i32,
                    (rng.next_u32() % height as u32) as i32,
                );
                let goal = TileCoord::new(
                    (rng.next_u32() % width as u32) as i32,
                    (rng.next_u32() % height as u32) as i32,
                );
                let expected = bfs_distance(&grid, start, goal);
                let found = find_tile_path(&grid, start, goal);
                match (expected, found) {
                    (Some(distance), Some(tiles)) => {
                        assert_eq!(tiles.len() - 1, distance, "grid={rows:?}");
                        assert_valid_steps(&grid, start, goal, &tiles);
                    }
                    (None, None) => {}
                    (expected, found) => {
                        panic!("bfs={expected:?} astar={found:?} grid={rows:?}")
                    }
                }
            }
        }
    }
}
