//! Simulation module
//!
//! All gameplay logic lives here:
//! - One step per unpaused frame, fixed distance per step
//! - A seeded RNG for level generation only
//! - Balls and obstacles processed in collection order
//! - No rendering or platform dependencies

pub mod collision;
pub mod launch;
pub mod layout;
pub mod state;
pub mod tick;
pub mod turn;

pub use collision::{
    circle_circle_collision, circle_rect_collision, contact_normal, enforce_min_vertical,
    reflect_velocity,
};
pub use launch::{LaunchQueue, ScheduledLaunch};
pub use layout::{column_positions, place_initial_layout, spawn_row};
pub use state::{Obstacle, ObstacleKind, PowerUpEffect, Projectile, SimulationState};
pub use tick::{SimEvent, step};
pub use turn::{AimState, TurnOutcome, TurnPhase, TurnState};
