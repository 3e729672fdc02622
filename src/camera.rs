//! Ball-follow camera
//!
//! A read-only observer of the simulation. It never mutates
//! `SimulationState`; all easing state (zoom, roll/pitch/yaw, handoff blend)
//! lives here. Every per-frame lerp factor is tuned at 60 fps and rescaled
//! to the pausable clock's delta with [`crate::frame_lerp`].

use glam::{Quat, Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{CAMERA_FOV_Y, CAMERA_REST_DISTANCE};
use crate::frame_lerp;
use crate::sim::state::{Projectile, SimulationState};
use crate::tuning::Tuning;

/// Follow zoom limits
const MIN_ZOOM: f32 = 10.0;
const MAX_ZOOM: f32 = 60.0;
/// Obstacles closer than this pull the zoom in
const PROXIMITY_RANGE: f32 = 4.0;
/// Length of the blend when switching to another ball (seconds)
const HANDOFF_DURATION: f64 = 0.5;
/// Rotation easing per 60 Hz frame
const ROTATION_EASE: f32 = 0.02;
const MAX_PITCH: f32 = 0.3;
const MAX_YAW: f32 = 0.25;

/// What the renderer needs to place the scene camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view (radians)
    pub fov_y: f32,
}

impl CameraPose {
    /// Overview pose: the whole arena, slightly from below
    pub fn rest(tuning: &Tuning) -> Self {
        Self {
            eye: Vec3::new(0.0, -tuning.game_height / 2.0 + 8.0, CAMERA_REST_DISTANCE),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: CAMERA_FOV_Y,
        }
    }
}

/// Cubic ease-out (GSAP's `power2.out`)
#[inline]
fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Blend from the pose held when the followed ball changed
#[derive(Debug, Clone, Copy)]
struct Handoff {
    from_target: Vec3,
    started: f64,
}

/// Camera controller that tracks one ball in flight
#[derive(Debug, Clone)]
pub struct CameraFollow {
    pose: CameraPose,
    rest: CameraPose,
    followed: Option<u32>,
    handoff: Option<Handoff>,
    zoom: f32,
    roll: f32,
    pitch: f32,
    yaw: f32,
    last_velocity: Vec2,
    /// Picks the next ball to follow; separate from level generation
    rng: Pcg32,
}

impl CameraFollow {
    pub fn new(tuning: &Tuning, seed: u64) -> Self {
        let rest = CameraPose::rest(tuning);
        Self {
            pose: rest,
            rest,
            followed: None,
            handoff: None,
            zoom: CAMERA_REST_DISTANCE,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            last_velocity: Vec2::ZERO,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Current pose
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    /// ID of the ball being followed, if any
    pub fn followed(&self) -> Option<u32> {
        self.followed
    }

    /// Snap back to the overview and forget the followed ball
    pub fn reset(&mut self) {
        self.pose = self.rest;
        self.followed = None;
        self.handoff = None;
        self.zoom = CAMERA_REST_DISTANCE;
        self.roll = 0.0;
        self.pitch = 0.0;
        self.yaw = 0.0;
        self.last_velocity = Vec2::ZERO;
    }

    /// Advance the camera by one frame.
    ///
    /// `now` and `dt` come from the pausable clock, so a paused game freezes
    /// the camera too.
    pub fn update(&mut self, state: &SimulationState, now: f64, dt: f32) -> CameraPose {
        if !state.turn.in_progress() {
            if self.followed.is_some() || self.pose != self.rest {
                self.reset();
            }
            return self.pose;
        }

        // Overview for the first moments of a volley
        if now - state.turn.launched_at < state.tuning.camera_follow_delay {
            return self.pose;
        }

        let current = self
            .followed
            .and_then(|id| state.projectile(id))
            .filter(|p| p.active);

        let ball = match current {
            Some(ball) => ball,
            None => match self.pick_active(state) {
                Some(ball) => {
                    log::debug!("Camera now following ball {}", ball.id);
                    self.followed = Some(ball.id);
                    self.handoff = Some(Handoff {
                        from_target: self.pose.target,
                        started: now,
                    });
                    self.last_velocity = ball_velocity(state, ball);
                    ball
                }
                None => {
                    self.reset();
                    return self.pose;
                }
            },
        };

        self.follow(state, ball, now, dt);
        self.pose
    }

    /// Uniformly random active ball
    fn pick_active<'a>(&mut self, state: &'a SimulationState) -> Option<&'a Projectile> {
        let active: Vec<&Projectile> = state.active_projectiles().collect();
        if active.is_empty() {
            return None;
        }
        let pick = self.rng.random_range(0..active.len());
        Some(active[pick])
    }

    fn follow(&mut self, state: &SimulationState, ball: &Projectile, now: f64, dt: f32) {
        let tuning = &state.tuning;
        let t = now as f32;
        let velocity = ball_velocity(state, ball);
        let ball_pos = ball.pos.extend(0.0);

        // Zoom target
        let velocity_change = velocity.distance(self.last_velocity);
        self.last_velocity = velocity;
        let distance_from_center = ball.pos.length();
        let height_factor = ball.pos.y.abs() / (tuning.game_height / 2.0);
        let proximity: f32 = state
            .obstacles
            .iter()
            .map(|o| o.pos.distance(ball.pos))
            .filter(|d| *d < PROXIMITY_RANGE)
            .map(|d| (PROXIMITY_RANGE - d) * 3.0)
            .sum();

        let target_zoom = (CAMERA_REST_DISTANCE
            + velocity_change * 20.0
            + distance_from_center * 1.2
            + height_factor * 12.0
            - proximity
            + (t * 1.5).sin())
        .clamp(MIN_ZOOM, MAX_ZOOM);

        let zoom_ease = (0.02 + (target_zoom - self.zoom).abs() * 0.002).min(0.04);
        self.zoom += (target_zoom - self.zoom) * frame_lerp(zoom_ease, dt);

        // Rotation targets
        let roll_target = velocity.x * 0.15 + (t * 0.8).sin() * 0.08;
        let pitch_target = velocity.y * 0.12 + (t * 0.5).sin() * 0.06;
        let yaw_target = velocity.x * 0.08 + (t * 0.3).sin() * 0.08;

        let ease = frame_lerp(ROTATION_EASE, dt);
        self.roll += (roll_target - self.roll) * ease;
        self.pitch += (pitch_target - self.pitch) * ease;
        self.yaw += (yaw_target - self.yaw) * ease;

        self.roll = (self.roll + std::f32::consts::PI).rem_euclid(std::f32::consts::TAU)
            - std::f32::consts::PI;
        self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        self.yaw = self.yaw.clamp(-MAX_YAW, MAX_YAW);

        // Eye offset, rolled about the view axis
        let zoom_factor = self.zoom / CAMERA_REST_DISTANCE;
        let offset = Vec3::new(
            self.yaw.sin() * 3.0,
            -5.0 * zoom_factor.powf(1.1) + self.pitch.sin() * 5.0,
            self.zoom,
        );
        let roll = Quat::from_rotation_z(self.roll);
        let desired_eye = ball_pos + roll * offset;

        // Later turns follow more tightly
        let turn_speed = (0.1 + 0.05 * state.turn_number as f32).min(1.0);
        let lerp = frame_lerp(0.015 * turn_speed, dt);

        let mut target = self.pose.target.lerp(ball_pos, lerp);
        if let Some(handoff) = self.handoff {
            let progress = ((now - handoff.started) / HANDOFF_DURATION).clamp(0.0, 1.0) as f32;
            target = handoff.from_target.lerp(ball_pos, ease_out_cubic(progress));
            if progress >= 1.0 {
                self.handoff = None;
            }
        }

        self.pose = CameraPose {
            eye: self.pose.eye.lerp(desired_eye, lerp),
            target,
            up: roll * Vec3::Y,
            fov_y: self.rest.fov_y,
        };
    }
}

/// Per-tick displacement of a ball, turbo included
fn ball_velocity(state: &SimulationState, ball: &Projectile) -> Vec2 {
    let turbo = if state.turn.turbo_active {
        state.tuning.turbo_multiplier
    } else {
        1.0
    };
    ball.vel * state.tuning.ball_speed * turbo
}
