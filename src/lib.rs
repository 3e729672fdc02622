//! Ball Drop - a turn-based ball launcher / block breaker
//!
//! Core modules:
//! - `sim`: Simulation (entities, layout, turn state machine, physics step)
//! - `camera`: Ball-follow camera, a read-only observer of the simulation
//! - `projection`: Viewport and screen-to-world picking
//! - `clock`: Pausable clock that gates every time delta
//! - `game`: Frame driver that routes input and publishes snapshots
//! - `snapshot`: HUD and render snapshots handed to the browser shell
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod camera;
pub mod clock;
pub mod game;
pub mod platform;
pub mod projection;
pub mod sim;
pub mod snapshot;
pub mod tuning;

pub use game::Game;
pub use snapshot::{HudSnapshot, RenderSnapshot};
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Arena dimensions (world units, centered on the origin)
    pub const GAME_WIDTH: f32 = 10.0;
    pub const GAME_HEIGHT: f32 = 15.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 0.3;
    /// Distance travelled per tick at normal speed
    pub const BALL_SPEED: f32 = 0.125;
    /// Speed multiplier while turbo is on
    pub const TURBO_MULTIPLIER: f32 = 3.0;
    /// Delay between consecutive launches in a volley (seconds)
    pub const LAUNCH_INTERVAL: f64 = 0.1;
    /// Smallest |vy| a ball direction may have, keeps every ball draining
    pub const MIN_VERTICAL_DIRECTION: f32 = 0.1;

    /// Block defaults
    pub const BLOCK_SIZE: f32 = 1.0;
    /// Gap between grid cells as a fraction of block size
    pub const BLOCK_SPACING: f32 = 0.1;
    pub const BLOCK_SCORE: u64 = 100;
    pub const INITIAL_OBSTACLES: usize = 5;
    /// Base and per-turn obstacle count of a freshly spawned row
    pub const ROW_BASE_COUNT: usize = 5;
    pub const ROW_COUNT_PER_TURN: usize = 2;
    /// A row never fills more than this fraction of the grid columns
    pub const ROW_MAX_FILL: f32 = 0.9;

    /// Power-up defaults
    pub const POWER_UP_CHANCE: f64 = 0.2;
    pub const POWER_UP_RADIUS: f32 = 0.5;

    /// Aim preview line is clamped to this length
    pub const MAX_AIM_LENGTH: f32 = 5.0;

    /// Camera stays on the overview for this long after a launch (seconds)
    pub const CAMERA_FOLLOW_DELAY: f64 = 2.0;
    /// Vertical field of view of the scene camera (radians)
    pub const CAMERA_FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
    /// Camera distance from the play plane at rest
    pub const CAMERA_REST_DISTANCE: f32 = 25.0;
}

/// Point the ball launches from (and returns to), for an arena of the given height
#[inline]
pub fn launch_point(game_height: f32) -> Vec2 {
    Vec2::new(0.0, -game_height / 2.0 + 1.0)
}

/// Linear interpolation factor for a per-frame lerp tuned at 60 fps,
/// rescaled to an arbitrary frame delta
#[inline]
pub fn frame_lerp(factor_at_60hz: f32, dt: f32) -> f32 {
    1.0 - (1.0 - factor_at_60hz.clamp(0.0, 1.0)).powf(dt * 60.0)
}
