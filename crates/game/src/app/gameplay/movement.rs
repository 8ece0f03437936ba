//! Per-tick player motion.
//!
//! One [`MovementController`] owns the player's position and facing and decides,
//! each tick, which input source is allowed to move it. Precedence is: dialogue
//! gate, keyboard, touch (when it cancels paths), path following, touch (when it
//! yields to paths), idle.

use engine::Vec2;
use tracing::{debug, info};

use super::grid::MapRect;
use super::interaction::DialogueGate;
use super::nav::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub(crate) const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step in world space (y grows downward).
    pub(crate) fn unit(self) -> Vec2 {
        match self {
            Direction::Up => Vec2 { x: 0.0, y: -1.0 },
            Direction::Down => Vec2 { x: 0.0, y: 1.0 },
            Direction::Left => Vec2 { x: -1.0, y: 0.0 },
            Direction::Right => Vec2 { x: 1.0, y: 0.0 },
        }
    }

    /// Dominant axis of `delta`; horizontal wins ties. A zero delta keeps `fallback`.
    pub(crate) fn toward(delta: Vec2, fallback: Direction) -> Direction {
        if delta.x == 0.0 && delta.y == 0.0 {
            return fallback;
        }
        if delta.x.abs() >= delta.y.abs() {
            if delta.x > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if delta.y > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Direction::Up => 1,
            Direction::Down => 1 << 1,
            Direction::Left => 1 << 2,
            Direction::Right => 1 << 3,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum AnimState {
    IdleDown,
    IdleUp,
    IdleSide,
    WalkDown,
    WalkUp,
    WalkSide,
}

impl AnimState {
    pub(crate) fn derive(direction: Direction, moving: bool) -> Self {
        match (direction, moving) {
            (Direction::Down, false) => AnimState::IdleDown,
            (Direction::Up, false) => AnimState::IdleUp,
            (Direction::Left | Direction::Right, false) => AnimState::IdleSide,
            (Direction::Down, true) => AnimState::WalkDown,
            (Direction::Up, true) => AnimState::WalkUp,
            (Direction::Left | Direction::Right, true) => AnimState::WalkSide,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            AnimState::IdleDown => "player/idle_down",
            AnimState::IdleUp => "player/idle_up",
            AnimState::IdleSide => "player/idle_side",
            AnimState::WalkDown => "player/walk_down",
            AnimState::WalkUp => "player/walk_up",
            AnimState::WalkSide => "player/walk_side",
        }
    }

    pub(crate) fn is_walking(self) -> bool {
        matches!(
            self,
            AnimState::WalkDown | AnimState::WalkUp | AnimState::WalkSide
        )
    }

    /// Idle states are a single still sprite; walk states loop over
    /// `{state}_0` to `{state}_3`.
    pub(crate) fn sprite_key(self, frame: usize) -> String {
        if self.is_walking() {
            format!("{}_{}", self.as_str(), frame % WALK_FRAME_COUNT)
        } else {
            self.as_str().to_string()
        }
    }
}

pub(crate) const WALK_FRAME_COUNT: usize = 4;
pub(crate) const WALK_FRAMES_PER_SECOND: f32 = 8.0;

/// Frame clock for the player sprite. Restarts whenever the state changes.
#[derive(Debug, Default)]
pub(crate) struct SpriteAnimator {
    shown: Option<(AnimState, usize)>,
    elapsed: f32,
}

impl SpriteAnimator {
    /// Returns the new sprite key when the visible frame changed.
    pub(crate) fn advance(&mut self, anim: AnimState, dt_seconds: f32) -> Option<String> {
        let cycle = WALK_FRAME_COUNT as f32 / WALK_FRAMES_PER_SECOND;
        if self.shown.map(|(state, _)| state) == Some(anim) {
            self.elapsed = (self.elapsed + dt_seconds.max(0.0)) % cycle;
        } else {
            self.elapsed = 0.0;
        }
        let frame = if anim.is_walking() {
            (self.elapsed * WALK_FRAMES_PER_SECOND) as usize % WALK_FRAME_COUNT
        } else {
            0
        };
        if self.shown == Some((anim, frame)) {
            return None;
        }
        self.shown = Some((anim, frame));
        Some(anim.sprite_key(frame))
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Set of held directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DirectionSet {
    bits: u8,
}

impl DirectionSet {
    pub(crate) fn with(mut self, direction: Direction, held: bool) -> Self {
        if held {
            self.bits |= direction.bit();
        } else {
            self.bits &= !direction.bit();
        }
        self
    }

    pub(crate) fn contains(self, direction: Direction) -> bool {
        self.bits & direction.bit() != 0
    }

    pub(crate) fn is_empty(self) -> bool {
        self.bits == 0
    }

    pub(crate) fn len(self) -> u32 {
        self.bits.count_ones()
    }

    /// The held direction when exactly one is held.
    pub(crate) fn single(self) -> Option<Direction> {
        if self.len() != 1 {
            return None;
        }
        Direction::ALL
            .into_iter()
            .find(|direction| self.contains(*direction))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MovementInput {
    pub(crate) keyboard: DirectionSet,
    pub(crate) touch: DirectionSet,
}

/// How held touch directions interact with an active click path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum TouchPathPolicy {
    /// Touch behaves like the keyboard and cancels the path.
    #[default]
    CancelsPath,
    /// Touch only moves the player when no path is active.
    YieldsToPath,
}

pub(crate) trait Collider {
    fn is_blocked(&self, position: Vec2) -> bool;
}

/// Collider with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct OpenField;

impl Collider for OpenField {
    fn is_blocked(&self, _position: Vec2) -> bool {
        false
    }
}

/// Collision box relative to the player's position, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Footprint {
    pub(crate) offset: Vec2,
    pub(crate) half_extents: Vec2,
}

impl Footprint {
    pub(crate) fn rect_at(&self, position: Vec2) -> MapRect {
        MapRect::new(
            position.x + self.offset.x - self.half_extents.x,
            position.y + self.offset.y - self.half_extents.y,
            2.0 * self.half_extents.x,
            2.0 * self.half_extents.y,
        )
    }
}

/// Rejects positions whose footprint overlaps any obstacle. Obstacles are in world units.
#[derive(Debug, Clone)]
pub(crate) struct ObstacleCollider {
    obstacles: Vec<MapRect>,
    footprint: Footprint,
}

impl ObstacleCollider {
    pub(crate) fn new(obstacles: Vec<MapRect>, footprint: Footprint) -> Self {
        Self {
            obstacles: obstacles
                .into_iter()
                .filter(MapRect::is_well_formed)
                .collect(),
            footprint,
        }
    }
}

impl Collider for ObstacleCollider {
    fn is_blocked(&self, position: Vec2) -> bool {
        let body = self.footprint.rect_at(position);
        self.obstacles.iter().any(|obstacle| obstacle.overlaps(&body))
    }
}

/// What drove the player on a tick. `Idle` also covers ambiguous input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MotionSource {
    Gated,
    Keyboard,
    Touch,
    Path,
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MovementSettings {
    pub(crate) speed: f32,
    pub(crate) arrival_threshold: f32,
    pub(crate) touch_policy: TouchPathPolicy,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            speed: 250.0,
            arrival_threshold: 5.0,
            touch_policy: TouchPathPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct ActivePath {
    path: Path,
    cursor: usize,
}

#[derive(Debug)]
pub(crate) struct MovementController {
    position: Vec2,
    direction: Direction,
    moving: bool,
    active_path: Option<ActivePath>,
    gate: DialogueGate,
    settings: MovementSettings,
}

impl MovementController {
    pub(crate) fn new(position: Vec2, gate: DialogueGate, settings: MovementSettings) -> Self {
        Self {
            position,
            direction: Direction::Down,
            moving: false,
            active_path: None,
            gate,
            settings,
        }
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn is_moving(&self) -> bool {
        self.moving
    }

    pub(crate) fn anim_state(&self) -> AnimState {
        AnimState::derive(self.direction, self.moving)
    }

    /// Left reuses the side sprite flipped horizontally.
    pub(crate) fn is_mirrored(&self) -> bool {
        self.direction == Direction::Left
    }

    pub(crate) fn has_path(&self) -> bool {
        self.active_path.is_some()
    }

    /// Waypoints not yet reached, next target first.
    pub(crate) fn remaining_waypoints(&self) -> &[Vec2] {
        match &self.active_path {
            Some(active) => active
                .path
                .waypoints()
                .get(active.cursor..)
                .unwrap_or_default(),
            None => &[],
        }
    }

    /// Installs `path`, replacing any current one. Refused during dialogue or
    /// when the path has nowhere to go.
    ///
    /// Following starts at the second waypoint: the first is the centre of the
    /// tile the player already stands on, which can sit closer to a wall than
    /// the player's own position.
    pub(crate) fn follow_path(&mut self, path: Path) -> bool {
        if self.gate.is_open() || path.is_degenerate() {
            return false;
        }
        self.active_path = Some(ActivePath { path, cursor: 1 });
        true
    }

    /// Returns true when a path was dropped.
    pub(crate) fn cancel_path(&mut self) -> bool {
        self.active_path.take().is_some()
    }

    pub(crate) fn tick(
        &mut self,
        input: &MovementInput,
        dt_seconds: f32,
        collider: &dyn Collider,
    ) -> MotionSource {
        if self.gate.is_open() {
            return MotionSource::Gated;
        }

        if !input.keyboard.is_empty() {
            if self.cancel_path() {
                info!(source = "keyboard", "path_cancelled");
            }
            return self.step_direct(input.keyboard, dt_seconds, collider, MotionSource::Keyboard);
        }

        let touch_cancels = self.settings.touch_policy == TouchPathPolicy::CancelsPath;
        if touch_cancels && !input.touch.is_empty() {
            if self.cancel_path() {
                info!(source = "touch", "path_cancelled");
            }
            return self.step_direct(input.touch, dt_seconds, collider, MotionSource::Touch);
        }

        if self.active_path.is_some() {
            return self.advance_along_path(dt_seconds, collider);
        }

        if !input.touch.is_empty() {
            return self.step_direct(input.touch, dt_seconds, collider, MotionSource::Touch);
        }

        self.moving = false;
        MotionSource::Idle
    }

    fn step_direct(
        &mut self,
        held: DirectionSet,
        dt_seconds: f32,
        collider: &dyn Collider,
        source: MotionSource,
    ) -> MotionSource {
        let Some(direction) = held.single() else {
            return MotionSource::Idle;
        };
        self.direction = direction;
        self.moving = true;

        let distance = self.settings.speed * dt_seconds;
        let unit = direction.unit();
        let next = Vec2 {
            x: self.position.x + unit.x * distance,
            y: self.position.y + unit.y * distance,
        };
        if collider.is_blocked(next) {
            debug!(direction = direction.as_str(), "movement_blocked");
        } else {
            self.position = next;
        }
        source
    }

    /// Steps toward the current waypoint. Reaching the last one snaps onto it
    /// exactly; a step the collider refuses drops the path.
    fn advance_along_path(&mut self, dt_seconds: f32, collider: &dyn Collider) -> MotionSource {
        let max_step = self.settings.speed * dt_seconds;
        let threshold = self.settings.arrival_threshold;
        let Some(active) = self.active_path.as_mut() else {
            self.moving = false;
            return MotionSource::Idle;
        };
        let Some(target) = active.path.waypoint(active.cursor) else {
            self.active_path = None;
            self.moving = false;
            return MotionSource::Idle;
        };

        let delta = Vec2 {
            x: target.x - self.position.x,
            y: target.y - self.position.y,
        };
        self.direction = Direction::toward(delta, self.direction);
        let next = step_toward(self.position, target, max_step);
        if collider.is_blocked(next) && !collider.is_blocked(self.position) {
            self.active_path = None;
            self.moving = false;
            info!(x = target.x, y = target.y, "path_blocked");
            return MotionSource::Idle;
        }
        self.position = next;
        self.moving = true;

        if distance(self.position, target) < threshold {
            active.cursor += 1;
            if active.cursor >= active.path.len() {
                self.position = target;
                self.active_path = None;
                self.moving = false;
                debug!(x = target.x, y = target.y, "path_completed");
            }
        }
        MotionSource::Path
    }
}

/// Moves from `current` toward `target` by at most `max_step` without overshooting.
pub(crate) fn step_toward(current: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    let dx = target.x - current.x;
    let dy = target.y - current.y;
    let remaining = (dx * dx + dy * dy).sqrt();
    if remaining <= max_step.max(0.0) || remaining == 0.0 {
        return target;
    }
    let scale = max_step.max(0.0) / remaining;
    Vec2 {
        x: current.x + dx * scale,
        y: current.y + dy * scale,
    }
}

fn distance(a: Vec2, b: Vec2) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}
