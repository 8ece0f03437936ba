use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowBuilder;

use super::input::{action_for_key, is_dismiss_key, is_interact_key, ActionStates, PadStates};
use super::scene::SceneRuntime;
use super::touch::{TouchTracker, MOUSE_CONTACT_ID};
use super::{InputSnapshot, Renderer, Scene, SceneCommand, Vec2};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub max_render_fps: Option<u32>,
    /// Route presses on the on-screen pad to pad buttons instead of clicks.
    pub touch_controls: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Folio".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            max_render_fps: None,
            touch_controls: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    asset_root: PathBuf,
    scene: Box<dyn Scene>,
) -> Result<(), AppError> {
    let mut runtime = SceneRuntime::new(scene);

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer =
        Renderer::new(Arc::clone(&window), asset_root).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let initial_size = window.inner_size();
    let mut input_collector = InputCollector::new(initial_size.width, initial_size.height)
        .with_touch_controls(config.touch_controls);
    runtime.load();

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        render_fps_cap = %format_render_cap(effective_render_cap),
        touch_controls = config.touch_controls,
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    input_collector.set_window_size(new_size.width, new_size.height);
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    input_collector.set_window_size(size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => {
                    input_collector.release_all();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position_px(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.clear_cursor_position();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_mouse_input(button, state);
                }
                WindowEvent::Touch(touch) => {
                    input_collector.handle_touch(touch);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_key(event.physical_key, event.state);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        match runtime.update(fixed_dt_seconds, &input_snapshot) {
                            SceneCommand::Quit => {
                                info!(reason = "scene_quit", "shutdown_requested");
                                window_target.exit();
                                break;
                            }
                            SceneCommand::None => {}
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    runtime.render();
                    if let Err(error) = renderer.render_world(runtime.world()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = runtime.debug_title();
                    if next_title != last_applied_title {
                        window.set_title(next_title.as_deref().unwrap_or(&config.window_title));
                        last_applied_title = next_title;
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                runtime.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    touch_controls: bool,
    action_states: ActionStates,
    touches: TouchTracker,
    cursor_position_px: Option<Vec2>,
    left_mouse_is_down: bool,
    left_click_pressed_edge: bool,
    interact_key_is_down: bool,
    interact_pressed_edge: bool,
    dismiss_key_is_down: bool,
    dismiss_pressed_edge: bool,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    fn with_touch_controls(mut self, touch_controls: bool) -> Self {
        self.touch_controls = touch_controls;
        self
    }

    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }

    fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some(Vec2 { x, y });
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    /// Drops every held key, button and contact. Edges already recorded survive.
    fn release_all(&mut self) {
        self.action_states = ActionStates::default();
        self.touches.clear();
        self.left_mouse_is_down = false;
        self.interact_key_is_down = false;
        self.dismiss_key_is_down = false;
    }

    fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let is_pressed = state == ElementState::Pressed;
        if let Some(action) = action_for_key(key) {
            self.action_states.set(action, is_pressed);
        } else if is_interact_key(key) {
            record_edge(
                &mut self.interact_key_is_down,
                &mut self.interact_pressed_edge,
                is_pressed,
            );
        } else if is_dismiss_key(key) {
            record_edge(
                &mut self.dismiss_key_is_down,
                &mut self.dismiss_pressed_edge,
                is_pressed,
            );
        }
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if self.left_mouse_is_down {
                    return;
                }
                self.left_mouse_is_down = true;
                if self.claim_pad_contact(MOUSE_CONTACT_ID, self.cursor_position_px) {
                    return;
                }
                self.left_click_pressed_edge = true;
            }
            ElementState::Released => {
                self.left_mouse_is_down = false;
                self.touches.contact_ended(MOUSE_CONTACT_ID);
            }
        }
    }

    fn handle_touch(&mut self, touch: Touch) {
        let position = Vec2 {
            x: touch.location.x as f32,
            y: touch.location.y as f32,
        };
        match touch.phase {
            TouchPhase::Started => {
                self.cursor_position_px = Some(position);
                if !self.claim_pad_contact(touch.id, Some(position)) {
                    self.left_click_pressed_edge = true;
                }
            }
            TouchPhase::Moved => {
                if !self.touches.is_tracking(touch.id) {
                    self.cursor_position_px = Some(position);
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.touches.contact_ended(touch.id);
            }
        }
    }

    fn claim_pad_contact(&mut self, id: u64, position: Option<Vec2>) -> bool {
        if !self.touch_controls {
            return false;
        }
        let Some(position) = position else {
            return false;
        };
        let window_size = self.window_size();
        self.touches
            .contact_started(id, position, window_size)
            .is_some()
    }

    fn pad_states(&self) -> PadStates {
        if self.touch_controls {
            self.touches.pad_states()
        } else {
            PadStates::default()
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.quit_requested,
            self.action_states,
            self.pad_states(),
            self.cursor_position_px,
            self.left_click_pressed_edge,
            self.interact_pressed_edge,
            self.dismiss_pressed_edge,
            self.window_width,
            self.window_height,
        );
        self.left_click_pressed_edge = false;
        self.interact_pressed_edge = false;
        self.dismiss_pressed_edge = false;
        snapshot
    }
}

fn record_edge(is_down: &mut bool, pressed_edge: &mut bool, is_pressed: bool) {
    if is_pressed && !*is_down {
        *pressed_edge = true;
    }
    *is_down = is_pressed;
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::replace(&mut accumulator, Duration::ZERO)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
