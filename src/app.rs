//! Application event loop.
//!
//! [`App`] implements winit's `ApplicationHandler`: it creates the window, the GPU
//! [`Context`] and the [`Scene`] once the event loop resumes, forwards input to the
//! orbit camera and the clock, and drives one update and render per redraw.
//!
//! Input:
//! - left mouse drag orbits the camera
//! - the mouse wheel zooms
//! - arrow keys orbit at a fixed rate while the clock runs
//! - `P` pauses and resumes the clock, `T` logs timing data, `Escape` quits

use std::{collections::HashSet, sync::Arc};

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{config::AppConfig, context::Context, scene::Scene};

/// Distance factor for one wheel notch towards the user.
const ZOOM_OUT: f32 = 1.2;
/// Distance factor for one wheel notch away from the user.
const ZOOM_IN: f32 = 0.9;
/// Arrow key rotation per fixed step, in radians.
const KEY_ROTATE_STEP: f32 = 0.02;

/// Window-bound state, created on `resumed`.
#[derive(Debug)]
struct AppState {
    ctx: Context,
    scene: Scene,
}

impl AppState {
    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.scene.resize(width, height);
        }
    }

    fn reconfigure(&mut self) {
        let size = self.ctx.window().inner_size();
        self.resize(size.width, size.height);
    }
}

/// Orbit angles in radians produced by one input event or one batch of fixed steps.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Rotation {
    elevation: f32,
    yaw: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyAction {
    Exit,
    ToggleClock,
    ReportTiming,
}

/// Mouse button and arrow keys currently held.
#[derive(Debug, Default)]
struct InputState {
    left_pressed: bool,
    held_keys: HashSet<KeyCode>,
}

impl InputState {
    /// Track arrow keys and map fresh key presses to actions. Repeats only refresh
    /// held arrow keys.
    fn key(&mut self, code: KeyCode, pressed: bool, repeat: bool) -> Option<KeyAction> {
        match code {
            KeyCode::ArrowLeft | KeyCode::ArrowRight | KeyCode::ArrowUp | KeyCode::ArrowDown => {
                if pressed {
                    self.held_keys.insert(code);
                } else {
                    self.held_keys.remove(&code);
                }
                None
            }
            _ if !pressed || repeat => None,
            KeyCode::Escape => Some(KeyAction::Exit),
            KeyCode::KeyP => Some(KeyAction::ToggleClock),
            KeyCode::KeyT => Some(KeyAction::ReportTiming),
            _ => None,
        }
    }

    fn clear(&mut self) {
        self.left_pressed = false;
        self.held_keys.clear();
    }

    /// Mouse motion orbits only while the left button is held.
    fn drag_rotation(&self, dx: f32, dy: f32, speed: f32) -> Option<Rotation> {
        self.left_pressed.then_some(Rotation {
            elevation: -dy * speed,
            yaw: -dx * speed,
        })
    }

    fn held_rotation(&self, steps: u32) -> Option<Rotation> {
        if steps == 0 || self.held_keys.is_empty() {
            return None;
        }
        let angle = KEY_ROTATE_STEP * steps as f32;
        let mut rotation = Rotation {
            elevation: 0.0,
            yaw: 0.0,
        };
        for key in &self.held_keys {
            match key {
                KeyCode::ArrowLeft => rotation.yaw += angle,
                KeyCode::ArrowRight => rotation.yaw -= angle,
                KeyCode::ArrowUp => rotation.elevation += angle,
                KeyCode::ArrowDown => rotation.elevation -= angle,
                _ => {}
            }
        }
        Some(rotation)
    }
}

/// Distance factor of one wheel event; towards the user (negative) zooms out.
fn zoom_factor(dy: f32) -> Option<f32> {
    if dy < 0.0 {
        Some(ZOOM_OUT)
    } else if dy > 0.0 {
        Some(ZOOM_IN)
    } else {
        None
    }
}

pub struct App {
    config: AppConfig,
    async_runtime: tokio::runtime::Runtime,
    state: Option<AppState>,
    input: InputState,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            config,
            async_runtime,
            state: None,
            input: InputState::default(),
            error: None,
        })
    }

    /// The error that stopped the event loop, if any.
    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn init(&self, window: Arc<Window>) -> anyhow::Result<AppState> {
        let config = &self.config;
        self.async_runtime.block_on(async move {
            let ctx = Context::new(window).await?;
            let scene = Scene::new(&ctx, config).await?;
            Ok(AppState { ctx, scene })
        })
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;
        match self.input.key(code, pressed, event.repeat) {
            Some(KeyAction::Exit) => event_loop.exit(),
            Some(KeyAction::ToggleClock) => {
                if let Some(state) = &mut self.state {
                    let clock = state.scene.clock_mut();
                    clock.toggle();
                    log::info!("clock {}", if clock.is_running() { "resumed" } else { "paused" });
                }
            }
            Some(KeyAction::ReportTiming) => {
                if let Some(state) = &self.state {
                    state.scene.clock().report_timing_data();
                }
            }
            None => {}
        }
    }

    fn apply_held_keys(&mut self, steps: u32) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let Some(rotation) = self.input.held_rotation(steps) {
            let orbit = state.scene.orbit_mut();
            orbit.rotate_elevation(rotation.elevation);
            orbit.rotate_on_y_axis(rotation.yaw);
        }
    }

    fn redraw(&mut self) {
        let Some(state) = &mut self.state else {
            return;
        };
        state.ctx.window().request_redraw();

        // Minimised windows have no surface to draw to
        if !state.ctx.is_surface_configured() {
            return;
        }

        let steps = state.scene.update(&state.ctx.queue);
        match state.scene.render(&state.ctx) {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.reconfigure(),
            Err(e) => log::error!("Unable to render {}", e),
        }
        self.apply_held_keys(steps);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match self.init(window) {
            Ok(state) => {
                state.ctx.window().request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e.context("initialisation failed")),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            let speed = self.config.camera.rotate_speed;
            if let Some(rotation) = self.input.drag_rotation(dx as f32, dy as f32, speed) {
                let orbit = state.scene.orbit_mut();
                orbit.rotate_elevation(rotation.elevation);
                orbit.rotate_on_y_axis(rotation.yaw);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.state.is_none() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(state) = &mut self.state {
                    state.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => self.input.left_pressed = button_state.is_pressed(),
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32,
                };
                if let (Some(state), Some(factor)) = (&mut self.state, zoom_factor(dy)) {
                    state.scene.orbit_mut().zoom(factor);
                }
            }
            WindowEvent::Focused(false) => self.input.clear(),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.scene.clock().report_timing_data();
        }
    }
}

/// Load the configuration from `config/` and run until the window closes.
pub fn run() -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };
    let config = AppConfig::load()?;
    run_with_config(config)
}

pub fn run_with_config(config: AppConfig) -> anyhow::Result<()> {
    log::info!(
        "starting {} ({}x{})",
        config.window.title,
        config.window.width,
        config.window.height
    );
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::assert_abs_diff_eq;

    #[test]
    fn wheel_towards_the_user_zooms_out() {
        assert_eq!(zoom_factor(-1.0), Some(1.2));
        assert_eq!(zoom_factor(-0.1), Some(1.2));
        assert_eq!(zoom_factor(3.0), Some(0.9));
        assert_eq!(zoom_factor(0.0), None);
    }

    #[test]
    fn drag_needs_the_left_button() {
        let mut input = InputState::default();
        assert_eq!(input.drag_rotation(10.0, 5.0, 0.01), None);

        input.left_pressed = true;
        let rotation = input.drag_rotation(10.0, 5.0, 0.01).unwrap();
        assert_abs_diff_eq!(rotation.elevation, -0.05, epsilon = 1e-6);
        assert_abs_diff_eq!(rotation.yaw, -0.1, epsilon = 1e-6);
    }

    #[test]
    fn held_arrows_rotate_per_fixed_step() {
        let mut input = InputState::default();
        assert_eq!(input.key(KeyCode::ArrowLeft, true, false), None);
        assert_eq!(input.key(KeyCode::ArrowUp, true, false), None);

        assert_eq!(input.held_rotation(0), None);
        let rotation = input.held_rotation(3).unwrap();
        assert_abs_diff_eq!(rotation.yaw, 0.06, epsilon = 1e-6);
        assert_abs_diff_eq!(rotation.elevation, 0.06, epsilon = 1e-6);

        input.key(KeyCode::ArrowLeft, false, false);
        input.key(KeyCode::ArrowDown, true, false);
        let rotation = input.held_rotation(1).unwrap();
        assert_abs_diff_eq!(rotation.yaw, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rotation.elevation, 0.0, epsilon = 1e-6);

        input.key(KeyCode::ArrowUp, false, false);
        let rotation = input.held_rotation(1).unwrap();
        assert_abs_diff_eq!(rotation.elevation, -0.02, epsilon = 1e-6);
    }

    #[test]
    fn repeats_and_releases_trigger_no_action() {
        let mut input = InputState::default();
        assert_eq!(input.key(KeyCode::KeyP, true, false), Some(KeyAction::ToggleClock));
        assert_eq!(input.key(KeyCode::KeyP, true, true), None);
        assert_eq!(input.key(KeyCode::KeyP, false, false), None);
        assert_eq!(input.key(KeyCode::KeyT, true, false), Some(KeyAction::ReportTiming));
        assert_eq!(input.key(KeyCode::Escape, true, false), Some(KeyAction::Exit));
        assert_eq!(input.key(KeyCode::KeyQ, true, false), None);

        // A repeated arrow press keeps the key held.
        input.key(KeyCode::ArrowRight, true, false);
        input.key(KeyCode::ArrowRight, true, true);
        let rotation = input.held_rotation(1).unwrap();
        assert_abs_diff_eq!(rotation.yaw, -0.02, epsilon = 1e-6);
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut input = InputState::default();
        input.left_pressed = true;
        input.key(KeyCode::ArrowLeft, true, false);
        input.clear();
        assert_eq!(input.held_rotation(5), None);
        assert_eq!(input.drag_rotation(1.0, 1.0, 0.01), None);
    }
}
