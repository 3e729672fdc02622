//! Frame driver
//!
//! Owns the simulation, the pausable clock, the follow camera and the
//! viewport. Input events are routed through here so that picking always
//! uses the current viewport and camera, and so that nothing moves while
//! the game is paused.

use glam::Vec2;

use crate::camera::{CameraFollow, CameraPose};
use crate::clock::PausableClock;
use crate::projection::{Viewport, screen_to_world};
use crate::sim::state::SimulationState;
use crate::sim::tick::SimEvent;
use crate::sim::turn::{self, TurnOutcome};
use crate::snapshot::{HudSnapshot, RenderSnapshot};
use crate::tuning::Tuning;

/// One game session
#[derive(Debug, Clone)]
pub struct Game {
    state: SimulationState,
    clock: PausableClock,
    camera: CameraFollow,
    viewport: Viewport,
}

impl Game {
    /// Start a session with the opening layout placed
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let camera = CameraFollow::new(&tuning, seed.wrapping_add(1));
        Self {
            state: SimulationState::new_game(tuning, seed),
            clock: PausableClock::new(),
            camera,
            viewport: Viewport::default(),
        }
    }

    /// Start a session from optional JSON overrides, falling back to the
    /// default balance when they don't load
    pub fn with_tuning_json(json: Option<&str>, seed: u64) -> Self {
        let tuning = match json.map(Tuning::from_json) {
            Some(Ok(tuning)) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Some(Err(e)) => {
                log::warn!("Ignoring tuning overrides: {}", e);
                Tuning::default()
            }
            None => Tuning::default(),
        };
        Self::new(tuning, seed)
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn camera_pose(&self) -> CameraPose {
        self.camera.pose()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    /// Page pixels to the play plane, using the current viewport and camera
    fn pick(&self, x: f32, y: f32) -> Option<Vec2> {
        screen_to_world(x, y, &self.viewport, &self.camera.pose())
    }

    fn accepts_input(&self) -> bool {
        !self.clock.is_paused() && !self.state.is_game_over()
    }

    // === Input ===

    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        if !self.accepts_input() {
            return false;
        }
        match self.pick(x, y) {
            Some(world) => turn::begin_aim(&mut self.state, world),
            None => false,
        }
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        if !self.accepts_input() {
            return false;
        }
        match self.pick(x, y) {
            Some(world) => turn::update_aim(&mut self.state, world),
            None => false,
        }
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) -> bool {
        if !self.accepts_input() {
            return false;
        }
        // Off-plane release: keep the last tracked point
        let world = self
            .pick(x, y)
            .or_else(|| self.state.turn.aim.map(|aim| aim.current));
        match world {
            Some(world) => turn::release_aim(&mut self.state, world, self.clock.now()),
            None => false,
        }
    }

    pub fn cancel_aim(&mut self) -> bool {
        turn::cancel_aim(&mut self.state)
    }

    pub fn toggle_turbo(&mut self) -> Option<bool> {
        if !self.accepts_input() {
            return None;
        }
        let turbo = turn::toggle_turbo(&mut self.state)?;
        log::info!("Turbo {}", if turbo { "on" } else { "off" });
        Some(turbo)
    }

    /// Returns the new paused state
    pub fn toggle_pause(&mut self) -> bool {
        if self.state.is_game_over() {
            return self.clock.is_paused();
        }
        let paused = self.clock.toggle();
        // The release of a held gesture would be swallowed while paused
        if paused && turn::cancel_aim(&mut self.state) {
            log::debug!("Aim cancelled by pause");
        }
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
        paused
    }

    pub fn force_end_turn(&mut self) -> Option<TurnOutcome> {
        if self.state.is_game_over() {
            return None;
        }
        let outcome = turn::force_end_turn(&mut self.state)?;
        self.camera.reset();
        Some(outcome)
    }

    /// New canvas rectangle; picking uses it from the next event on
    pub fn resize(&mut self, viewport: Viewport) {
        log::debug!(
            "Viewport {}x{} at ({}, {})",
            viewport.width,
            viewport.height,
            viewport.left,
            viewport.top
        );
        self.viewport = viewport;
    }

    // === Frame ===

    /// Run one frame: advance the clock, fire due launches, step the
    /// simulation, resolve a finished turn, then let the camera observe.
    pub fn frame(&mut self, raw_dt: f64) -> Vec<SimEvent> {
        if self.state.is_game_over() {
            return Vec::new();
        }
        let dt = self.clock.advance(raw_dt);
        if self.clock.is_paused() {
            return Vec::new();
        }

        let now = self.clock.now();
        let (events, _) = turn::advance(&mut self.state, now);
        self.camera.update(&self.state, now, dt as f32);
        events
    }

    // === Output ===

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot::capture(&self.state, self.clock.is_paused())
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        RenderSnapshot::capture(
            &self.state,
            self.camera.pose(),
            turn::aim_preview(&self.state),
        )
    }
}
