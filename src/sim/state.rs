//! Game state and core simulation types
//!
//! `SimulationState` is the single owner of every entity and every session
//! counter. The turn machine and the tick step borrow it mutably; the
//! camera only ever gets a shared reference.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::turn::TurnState;
use crate::tuning::Tuning;

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    /// Unit travel direction; speed comes from tuning
    pub vel: Vec2,
    /// In flight this turn (false = parked at the launch point)
    pub active: bool,
}

impl Projectile {
    pub fn new(id: u32, start: Vec2) -> Self {
        Self {
            id,
            pos: start,
            vel: Vec2::ZERO,
            active: false,
        }
    }

    /// Park the ball back at the launch point
    pub fn park(&mut self, launch_point: Vec2) {
        self.active = false;
        self.pos = launch_point;
        self.vel = Vec2::ZERO;
    }

    /// Fire the ball from the launch point along `dir`
    pub fn launch(&mut self, launch_point: Vec2, dir: Vec2) {
        self.pos = launch_point;
        self.vel = dir;
        self.active = true;
    }
}

/// What a power-up does when collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpEffect {
    /// One more ball from the next turn on
    ExtraProjectile,
}

/// Obstacle variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Solid square; removed when health reaches zero
    Block { health: u32, spawned_turn: u32 },
    /// Collected on contact, never deflects the ball
    PowerUp { effect: PowerUpEffect },
}

/// A block or power-up sitting on the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub pos: Vec2,
    pub kind: ObstacleKind,
}

impl Obstacle {
    /// Remaining health for blocks, `None` for power-ups
    pub fn health(&self) -> Option<u32> {
        match self.kind {
            ObstacleKind::Block { health, .. } => Some(health),
            ObstacleKind::PowerUp { .. } => None,
        }
    }
}

/// Block health for a given turn: the turn number itself, never below 1
#[inline]
pub fn block_health_for_turn(turn: u32) -> u32 {
    turn.max(1)
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub tuning: Tuning,
    /// Balls, in creation order
    pub projectiles: Vec<Projectile>,
    /// Live obstacles (blocks with health > 0 and uncollected power-ups)
    pub obstacles: Vec<Obstacle>,
    /// Turn lifecycle
    pub turn: TurnState,
    /// Score (only ever grows)
    pub score: u64,
    /// Balls the player owns; fixed for a turn once launched
    pub projectile_count: u32,
    /// Current turn, 1-based
    pub turn_number: u32,
    /// Level generation RNG
    pub rng: Pcg32,
    /// Next entity ID
    next_id: u32,
}

impl SimulationState {
    /// Create an empty board with a single parked ball
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let mut state = Self {
            tuning,
            projectiles: Vec::new(),
            obstacles: Vec::new(),
            turn: TurnState::default(),
            score: 0,
            projectile_count: 1,
            turn_number: 1,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        };
        let start = state.tuning.launch_point();
        state.create_projectile(start);
        state
    }

    /// New session with the opening layout already placed
    pub fn new_game(tuning: Tuning, seed: u64) -> Self {
        let mut state = Self::new(tuning, seed);
        super::layout::place_initial_layout(&mut state);
        log::info!(
            "New game (seed {}): {} opening obstacles",
            seed,
            state.obstacles.len()
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add a parked ball
    pub fn create_projectile(&mut self, start: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.projectiles.push(Projectile::new(id, start));
        id
    }

    /// Add a block whose health scales with `turn`
    pub fn create_block(&mut self, x: f32, y: f32, turn: u32) -> u32 {
        let id = self.next_entity_id();
        self.obstacles.push(Obstacle {
            id,
            pos: Vec2::new(x, y),
            kind: ObstacleKind::Block {
                health: block_health_for_turn(turn),
                spawned_turn: turn,
            },
        });
        id
    }

    /// Add an extra-ball power-up
    pub fn create_power_up(&mut self, x: f32, y: f32) -> u32 {
        let id = self.next_entity_id();
        self.obstacles.push(Obstacle {
            id,
            pos: Vec2::new(x, y),
            kind: ObstacleKind::PowerUp {
                effect: PowerUpEffect::ExtraProjectile,
            },
        });
        id
    }

    pub fn projectile(&self, id: u32) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    pub fn obstacle(&self, id: u32) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    /// Balls currently in flight
    pub fn active_projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter().filter(|p| p.active)
    }

    pub fn is_game_over(&self) -> bool {
        self.turn.phase == super::turn::TurnPhase::GameOver
    }

    /// Every live block must still have health
    pub fn debug_check_invariants(&self) {
        debug_assert!(
            self.obstacles.iter().all(|o| o.health() != Some(0)),
            "dead block left in the live list"
        );
        debug_assert!(
            self.turn.returned_projectiles <= self.turn.total_projectiles,
            "more balls returned than launched"
        );
        debug_assert!(self.projectiles.len() as u32 == self.projectile_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_one_parked_ball() {
        let state = SimulationState::new(Tuning::default(), 1);
        assert_eq!(state.projectiles.len(), 1);
        assert_eq!(state.projectile_count, 1);
        assert_eq!(state.turn_number, 1);
        let ball = &state.projectiles[0];
        assert!(!ball.active);
        assert_eq!(ball.pos, Tuning::default().launch_point());
        assert!(state.obstacles.is_empty());
    }

    #[test]
    fn test_entity_ids_are_unique() {
        let mut state = SimulationState::new(Tuning::default(), 1);
        let a = state.create_block(0.0, 1.0, 1);
        let b = state.create_power_up(1.0, 1.0);
        let c = state.create_projectile(Vec2::ZERO);
        assert!(a != b && b != c && a != c);
        assert!(state.obstacle(a).unwrap().health().is_some());
        assert_eq!(state.obstacle(b).unwrap().health(), None);
        assert!(state.projectile(c).is_some());
    }

    #[test]
    fn test_block_health_scales_with_turn() {
        let mut state = SimulationState::new(Tuning::default(), 1);
        let id = state.create_block(0.0, 0.0, 7);
        assert_eq!(state.obstacle(id).unwrap().health(), Some(7));
        assert_eq!(block_health_for_turn(0), 1);
    }

    #[test]
    fn test_new_game_places_opening_layout() {
        let state = SimulationState::new_game(Tuning::default(), 42);
        assert_eq!(state.obstacles.len(), Tuning::default().initial_obstacles);
    }
}
