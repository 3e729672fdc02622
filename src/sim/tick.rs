//! Per-frame simulation step
//!
//! Advances every ball in flight by one tick: move, bounce off the walls,
//! drain at the bottom, then resolve at most one obstacle contact.

use glam::Vec2;

use super::collision::{
    circle_circle_collision, circle_rect_collision, contact_normal, enforce_min_vertical,
    reflect_velocity,
};
use super::state::{ObstacleKind, PowerUpEffect, SimulationState};

/// Something that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    /// Ball reached the drain and is parked again
    ProjectileReturned { projectile_id: u32 },
    /// Block lost one health point and survived
    BlockDamaged { obstacle_id: u32, projectile_id: u32, health: u32 },
    /// Block lost its last health point and was removed
    BlockDestroyed { obstacle_id: u32, projectile_id: u32, points: u64 },
    /// Power-up removed and applied
    PowerUpCollected { obstacle_id: u32, projectile_id: u32, effect: PowerUpEffect },
}

/// Per-tick constants pulled out of the tuning
struct StepParams {
    speed: f32,
    radius: f32,
    half_width: f32,
    half_height: f32,
    launch_point: Vec2,
    block_extent: Vec2,
    power_up_radius: f32,
    min_vertical: f32,
    block_score: u64,
}

impl StepParams {
    fn from_state(state: &SimulationState) -> Self {
        let t = &state.tuning;
        let turbo = if state.turn.turbo_active {
            t.turbo_multiplier
        } else {
            1.0
        };
        Self {
            speed: t.ball_speed * turbo,
            radius: t.ball_radius,
            half_width: t.game_width / 2.0,
            half_height: t.game_height / 2.0,
            launch_point: t.launch_point(),
            block_extent: Vec2::splat(t.block_size),
            power_up_radius: t.power_up_radius,
            min_vertical: t.min_vertical_direction,
            block_score: t.block_score,
        }
    }
}

/// Advance all active balls by one tick
pub fn step(state: &mut SimulationState) -> Vec<SimEvent> {
    let params = StepParams::from_state(state);
    let mut events = Vec::new();

    // Power-up balls join parked; the pre-tick count covers every mover
    let count = state.projectiles.len();
    for i in 0..count {
        let ball = &mut state.projectiles[i];
        if !ball.active {
            continue;
        }

        // Integrate
        ball.pos += ball.vel * params.speed;

        // Side walls: clamp and point back inward
        let min_x = -params.half_width + params.radius;
        let max_x = params.half_width - params.radius;
        if ball.pos.x <= min_x {
            ball.pos.x = min_x;
            ball.vel.x = ball.vel.x.abs();
        } else if ball.pos.x >= max_x {
            ball.pos.x = max_x;
            ball.vel.x = -ball.vel.x.abs();
        }

        // Top wall
        let max_y = params.half_height - params.radius;
        if ball.pos.y >= max_y {
            ball.pos.y = max_y;
            ball.vel.y = -ball.vel.y.abs();
        }

        // Drain
        if ball.pos.y <= -params.half_height + params.radius {
            ball.park(params.launch_point);
            state.turn.returned_projectiles += 1;
            events.push(SimEvent::ProjectileReturned {
                projectile_id: ball.id,
            });
            continue;
        }

        let (pos, vel, projectile_id) = (ball.pos, ball.vel, ball.id);

        // First obstacle contact only
        let Some(idx) = find_contact(state, &params, pos, vel) else {
            continue;
        };

        let obstacle = &mut state.obstacles[idx];
        let obstacle_id = obstacle.id;
        match obstacle.kind {
            ObstacleKind::PowerUp { effect } => {
                state.obstacles.remove(idx);
                apply_power_up(state, effect, params.launch_point);
                events.push(SimEvent::PowerUpCollected {
                    obstacle_id,
                    projectile_id,
                    effect,
                });
            }
            ObstacleKind::Block {
                health,
                spawned_turn,
            } => {
                let normal = contact_normal(pos, obstacle.pos);
                let remaining = health.saturating_sub(1);
                if remaining == 0 {
                    state.obstacles.remove(idx);
                    state.score += params.block_score;
                    events.push(SimEvent::BlockDestroyed {
                        obstacle_id,
                        projectile_id,
                        points: params.block_score,
                    });
                } else {
                    obstacle.kind = ObstacleKind::Block {
                        health: remaining,
                        spawned_turn,
                    };
                    events.push(SimEvent::BlockDamaged {
                        obstacle_id,
                        projectile_id,
                        health: remaining,
                    });
                }

                let bounced = reflect_velocity(vel, normal);
                state.projectiles[i].vel = enforce_min_vertical(bounced, params.min_vertical);
                log::debug!(
                    "Ball {} hit block {} ({} hp left)",
                    projectile_id,
                    obstacle_id,
                    remaining
                );
            }
        }
    }

    state.debug_check_invariants();
    events
}

/// Index of the first obstacle the ball touches this tick.
///
/// Blocks only count while the ball is heading into them; a ball that is
/// still overlapping after a bounce is already leaving.
fn find_contact(state: &SimulationState, params: &StepParams, pos: Vec2, vel: Vec2) -> Option<usize> {
    state.obstacles.iter().position(|o| match o.kind {
        ObstacleKind::Block { .. } => {
            circle_rect_collision(pos, params.radius, o.pos, params.block_extent)
                && vel.dot(contact_normal(pos, o.pos)) < 0.0
        }
        ObstacleKind::PowerUp { .. } => {
            circle_circle_collision(pos, params.radius, o.pos, params.power_up_radius)
        }
    })
}

fn apply_power_up(state: &mut SimulationState, effect: PowerUpEffect, launch_point: Vec2) {
    match effect {
        PowerUpEffect::ExtraProjectile => {
            // Joins from the next turn; this turn's total is already fixed
            state.projectile_count += 1;
            state.create_projectile(launch_point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    /// Empty board with one ball already flying along `dir` from `pos`
    fn flying(pos: Vec2, dir: Vec2) -> SimulationState {
        let mut state = SimulationState::new(Tuning::default(), 7);
        state.turn.total_projectiles = 1;
        let ball = &mut state.projectiles[0];
        ball.pos = pos;
        ball.vel = dir;
        ball.active = true;
        state
    }

    #[test]
    fn test_straight_up_reflects_and_drains() {
        let start = Tuning::default().launch_point();
        let mut state = flying(start, Vec2::Y);

        // (7.2 - (-6.5)) / 0.125 = 109.6 ticks to the top wall
        for _ in 0..109 {
            step(&mut state);
        }
        assert!(state.projectiles[0].vel.y > 0.0);
        step(&mut state);
        assert!(state.projectiles[0].vel.y < 0.0, "ball should bounce off the top wall");
        assert!(state.projectiles[0].pos.y <= 7.2 + 1e-4);

        // Roughly the same distance back down to the drain
        for _ in 0..115 {
            let events = step(&mut state);
            assert!(events.is_empty());
        }
        assert!(state.projectiles[0].active);
        let events = step(&mut state);
        assert_eq!(events, vec![SimEvent::ProjectileReturned { projectile_id: state.projectiles[0].id }]);
        assert!(!state.projectiles[0].active);
        assert_eq!(state.projectiles[0].pos, start);
        assert_eq!(state.turn.returned_projectiles, 1);
    }

    #[test]
    fn test_side_wall_clamps_and_reflects() {
        let mut state = flying(Vec2::new(4.65, 0.0), Vec2::new(0.8, 0.6));
        step(&mut state);
        let ball = &state.projectiles[0];
        assert!((ball.pos.x - 4.7).abs() < 1e-5);
        assert!(ball.vel.x < 0.0);
        assert!(ball.vel.y > 0.0);
    }

    #[test]
    fn test_turbo_multiplies_speed() {
        let mut state = flying(Vec2::ZERO, Vec2::Y);
        state.turn.turbo_active = true;
        step(&mut state);
        assert!((state.projectiles[0].pos.y - 0.375).abs() < 1e-6);
    }

    #[test]
    fn test_block_health_decrements_then_removes() {
        let mut state = flying(Vec2::new(0.0, -0.9), Vec2::Y);
        let block = state.create_block(0.0, 0.0, 2);

        // Ball bottom at -0.6 -> first tick overlaps the block face at -0.5
        let events = step(&mut state);
        assert_eq!(
            events,
            vec![SimEvent::BlockDamaged {
                obstacle_id: block,
                projectile_id: state.projectiles[0].id,
                health: 1
            }]
        );
        assert!(state.projectiles[0].vel.y < 0.0);
        assert_eq!(state.score, 0);

        // Send it back in
        state.projectiles[0].pos = Vec2::new(0.0, -0.9);
        state.projectiles[0].vel = Vec2::Y;
        let events = step(&mut state);
        assert!(matches!(events[0], SimEvent::BlockDestroyed { points: 100, .. }));
        assert!(state.obstacle(block).is_none());
        assert_eq!(state.score, 100);
    }

    #[test]
    fn test_leaving_ball_does_not_rehit() {
        // Overlapping but moving away from the block center
        let mut state = flying(Vec2::new(0.0, -0.6), Vec2::NEG_Y);
        let block = state.create_block(0.0, 0.0, 3);
        let events = step(&mut state);
        // Still within reach of the bottom face after the move
        assert!(circle_rect_collision(state.projectiles[0].pos, 0.3, Vec2::ZERO, Vec2::ONE));
        assert!(events.is_empty());
        assert_eq!(state.obstacle(block).unwrap().health(), Some(3));
    }

    #[test]
    fn test_at_most_one_collision_per_tick() {
        // Ball sits between two blocks, heading up into both
        let mut state = flying(Vec2::new(0.55, -0.7), Vec2::Y);
        let left = state.create_block(0.0, 0.0, 5);
        let right = state.create_block(1.1, 0.0, 5);

        let events = step(&mut state);
        assert_eq!(events.len(), 1);
        let hp = |id| state.obstacle(id).unwrap().health().unwrap();
        assert_eq!(hp(left) + hp(right), 9);
        // Collection order decides
        assert_eq!(hp(left), 4);
    }

    #[test]
    fn test_power_up_never_reflects() {
        let dir = Vec2::new(0.6, 0.8);
        let mut state = flying(Vec2::new(-0.3, -0.6), dir);
        let power_up = state.create_power_up(0.0, 0.0);

        let events = step(&mut state);
        assert!(matches!(events[0], SimEvent::PowerUpCollected { obstacle_id, .. } if obstacle_id == power_up));
        assert_eq!(state.projectiles[0].vel, dir);
        assert!(state.obstacle(power_up).is_none());

        // Extra ball joins parked, not counted in this turn
        assert_eq!(state.projectile_count, 2);
        assert_eq!(state.projectiles.len(), 2);
        assert!(!state.projectiles[1].active);
        assert_eq!(state.turn.total_projectiles, 1);
    }

    #[test]
    fn test_drained_ball_skips_obstacles() {
        let launch = Tuning::default().launch_point();
        let mut state = flying(Vec2::new(0.0, -7.1), Vec2::NEG_Y);
        state.create_power_up(0.0, -7.4);
        let events = step(&mut state);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SimEvent::ProjectileReturned { .. }));
        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.projectiles[0].pos, launch);
    }

    #[test]
    fn test_parked_balls_do_not_move() {
        let mut state = SimulationState::new(Tuning::default(), 1);
        let before = state.projectiles[0].pos;
        step(&mut state);
        assert_eq!(state.projectiles[0].pos, before);
    }

    proptest! {
        #[test]
        fn prop_balls_stay_inside_walls(
            angle in 0.05f32..(std::f32::consts::PI - 0.05),
            turbo in any::<bool>(),
            ticks in 1usize..2000,
        ) {
            let dir = Vec2::new(angle.cos(), angle.sin());
            let mut state = flying(Tuning::default().launch_point(), dir);
            state.turn.turbo_active = turbo;
            state.create_block(0.0, 2.2, 50);
            state.create_block(-2.2, 4.4, 50);

            for _ in 0..ticks {
                step(&mut state);
                for ball in state.active_projectiles() {
                    prop_assert!(ball.pos.x >= -5.0 && ball.pos.x <= 5.0);
                    prop_assert!(ball.pos.y < 7.5);
                    prop_assert!((ball.vel.length() - 1.0).abs() < 1e-3);
                }
                if state.turn.returned_projectiles == 1 {
                    break;
                }
            }
        }
    }
}
