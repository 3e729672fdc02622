//! Turn state machine
//!
//! Idle -> Aiming -> Launching -> InFlight -> Resolving -> Idle, with
//! GameOver as the terminal state. Input that arrives in the wrong phase is
//! ignored; every entry point reports whether it did anything.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::enforce_min_vertical;
use super::launch::LaunchQueue;
use super::layout::spawn_row;
use super::state::SimulationState;
use super::tick::{SimEvent, step};

/// Current phase of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Balls parked, waiting for the player
    #[default]
    Idle,
    /// Pointer held, drag vector being tracked
    Aiming,
    /// Volley fired, some balls still waiting for their slot
    Launching,
    /// Every ball launched, waiting for them to drain
    InFlight,
    /// All balls back, board advancing
    Resolving,
    /// An obstacle reached the bottom
    GameOver,
}

/// Aim gesture in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimState {
    /// Where the pointer went down
    pub start: Vec2,
    /// Where the pointer is now
    pub current: Vec2,
}

impl AimState {
    /// Slingshot drag: pulling down aims up
    #[inline]
    pub fn drag(&self) -> Vec2 {
        self.start - self.current
    }
}

/// How a resolved turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Board advanced, next turn number
    Continue { turn: u32 },
    /// An obstacle crossed the bottom line
    GameOver { final_score: u64 },
}

/// Mutable turn record shared by the state machine and the tick step
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    pub phase: TurnPhase,
    /// Balls launched (or queued) this turn
    pub total_projectiles: u32,
    /// Balls back at the drain this turn
    pub returned_projectiles: u32,
    /// Speed boost; resets every turn
    pub turbo_active: bool,
    /// Active aim gesture (Aiming only)
    pub aim: Option<AimState>,
    /// Volley launches not yet fired
    pub launches: LaunchQueue,
    /// Game-clock time the current volley was released
    pub launched_at: f64,
}

impl TurnState {
    /// Balls are (or are about to be) in flight
    #[inline]
    pub fn in_progress(&self) -> bool {
        matches!(self.phase, TurnPhase::Launching | TurnPhase::InFlight)
    }
}

/// Launch direction for a drag vector. A zero-length drag shoots straight up.
pub fn launch_direction(drag: Vec2, min_vertical: f32) -> Vec2 {
    match drag.try_normalize() {
        Some(dir) => enforce_min_vertical(dir, min_vertical),
        None => Vec2::Y,
    }
}

/// Pointer down: start aiming. A press while already aiming restarts the
/// gesture, so a lost pointer-up never strands the turn in Aiming.
pub fn begin_aim(state: &mut SimulationState, world: Vec2) -> bool {
    if !matches!(state.turn.phase, TurnPhase::Idle | TurnPhase::Aiming) {
        return false;
    }
    state.turn.aim = Some(AimState {
        start: world,
        current: world,
    });
    state.turn.phase = TurnPhase::Aiming;
    true
}

/// Pointer move: track the drag (Aiming only)
pub fn update_aim(state: &mut SimulationState, world: Vec2) -> bool {
    if state.turn.phase != TurnPhase::Aiming {
        return false;
    }
    match state.turn.aim.as_mut() {
        Some(aim) => {
            aim.current = world;
            true
        }
        None => false,
    }
}

/// Abandon the aim gesture without launching
pub fn cancel_aim(state: &mut SimulationState) -> bool {
    if state.turn.phase != TurnPhase::Aiming {
        return false;
    }
    state.turn.aim = None;
    state.turn.phase = TurnPhase::Idle;
    true
}

/// Aim preview segment (launch point, clamped end point)
pub fn aim_preview(state: &SimulationState) -> Option<(Vec2, Vec2)> {
    if state.turn.phase != TurnPhase::Aiming {
        return None;
    }
    let aim = state.turn.aim?;
    let drag = aim.drag();
    let dir = launch_direction(drag, state.tuning.min_vertical_direction);
    let length = drag.length().min(state.tuning.max_aim_length);
    let origin = state.tuning.launch_point();
    Some((origin, origin + dir * length))
}

/// Pointer up: commit the volley (Aiming only)
pub fn release_aim(state: &mut SimulationState, world: Vec2, now: f64) -> bool {
    if state.turn.phase != TurnPhase::Aiming {
        return false;
    }
    let Some(mut aim) = state.turn.aim.take() else {
        state.turn.phase = TurnPhase::Idle;
        return false;
    };
    aim.current = world;
    let dir = launch_direction(aim.drag(), state.tuning.min_vertical_direction);

    let launch_point = state.tuning.launch_point();
    for ball in &mut state.projectiles {
        ball.park(launch_point);
    }
    let ids: Vec<u32> = state.projectiles.iter().map(|p| p.id).collect();

    let turn = &mut state.turn;
    turn.total_projectiles = ids.len() as u32;
    turn.returned_projectiles = 0;
    turn.turbo_active = false;
    turn.launched_at = now;
    turn.launches
        .schedule_volley(&ids, dir, now, state.tuning.launch_interval);
    turn.phase = TurnPhase::Launching;

    log::info!(
        "Turn {}: launching {} ball(s) toward ({:.2}, {:.2})",
        state.turn_number,
        ids.len(),
        dir.x,
        dir.y
    );

    fire_due_launches(state, now);
    true
}

/// Fire every queued launch that is due. Launching becomes InFlight once
/// the queue is empty.
pub fn fire_due_launches(state: &mut SimulationState, now: f64) {
    if state.turn.phase != TurnPhase::Launching {
        return;
    }
    let launch_point = state.tuning.launch_point();
    for launch in state.turn.launches.drain_due(now) {
        if let Some(ball) = state
            .projectiles
            .iter_mut()
            .find(|p| p.id == launch.projectile_id)
        {
            ball.launch(launch_point, launch.dir);
        }
    }
    if state.turn.launches.is_empty() {
        state.turn.phase = TurnPhase::InFlight;
    }
}

/// Turbo toggle (InFlight only). Returns the new turbo state when honored.
pub fn toggle_turbo(state: &mut SimulationState) -> Option<bool> {
    if state.turn.phase != TurnPhase::InFlight {
        return None;
    }
    state.turn.turbo_active = !state.turn.turbo_active;
    Some(state.turn.turbo_active)
}

/// Run one frame of an active turn: due launches, one simulation tick, then
/// resolution once every ball is back.
pub fn advance(state: &mut SimulationState, now: f64) -> (Vec<SimEvent>, Option<TurnOutcome>) {
    if !state.turn.in_progress() {
        return (Vec::new(), None);
    }

    fire_due_launches(state, now);
    let events = step(state);

    let outcome = if state.turn.phase == TurnPhase::InFlight
        && state.turn.returned_projectiles >= state.turn.total_projectiles
    {
        Some(resolve_turn(state))
    } else {
        None
    };
    (events, outcome)
}

/// Escape hatch: recall every ball and resolve immediately
pub fn force_end_turn(state: &mut SimulationState) -> Option<TurnOutcome> {
    if !state.turn.in_progress() {
        return None;
    }
    let cancelled = state.turn.launches.cancel();
    let launch_point = state.tuning.launch_point();
    for ball in &mut state.projectiles {
        ball.park(launch_point);
    }
    state.turn.returned_projectiles = state.turn.total_projectiles;
    log::info!(
        "Turn {} ended early ({} launch(es) cancelled)",
        state.turn_number,
        cancelled
    );
    Some(resolve_turn(state))
}

/// Advance the board: shift everything down a row, check for game over,
/// spawn the next row.
pub fn resolve_turn(state: &mut SimulationState) -> TurnOutcome {
    state.turn.phase = TurnPhase::Resolving;
    state.turn.turbo_active = false;
    state.turn.aim = None;
    state.turn.launches.cancel();

    let drop = state.tuning.block_size;
    let line = state.tuning.game_over_line();
    let mut crossed = false;
    for obstacle in &mut state.obstacles {
        obstacle.pos.y -= drop;
        if obstacle.pos.y <= line {
            crossed = true;
        }
    }

    if crossed {
        state.turn.phase = TurnPhase::GameOver;
        log::info!(
            "Game over on turn {} with score {}",
            state.turn_number,
            state.score
        );
        return TurnOutcome::GameOver {
            final_score: state.score,
        };
    }

    let next_turn = state.turn_number + 1;
    spawn_row(state, next_turn);
    state.turn_number = next_turn;
    state.turn.phase = TurnPhase::Idle;
    log::info!(
        "Turn {} ready: {} obstacle(s), {} ball(s), score {}",
        next_turn,
        state.obstacles.len(),
        state.projectile_count,
        state.score
    );
    TurnOutcome::Continue { turn: next_turn }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::ObstacleKind;
    use crate::tuning::Tuning;

    const FRAME: f64 = 1.0 / 60.0;

    fn empty_board() -> SimulationState {
        SimulationState::new(Tuning::default(), 11)
    }

    /// Aim straight up from a pull-down drag and release at `now`
    fn launch_up(state: &mut SimulationState, now: f64) {
        assert!(begin_aim(state, Vec2::new(0.0, 0.0)));
        assert!(update_aim(state, Vec2::new(0.0, -2.0)));
        assert!(release_aim(state, Vec2::new(0.0, -2.0), now));
    }

    /// Run frames until the turn resolves; returns (frames, outcome)
    fn run_until_resolved(state: &mut SimulationState, mut now: f64) -> (usize, TurnOutcome) {
        for frame in 1..10_000 {
            now += FRAME;
            let (_, outcome) = advance(state, now);
            if let Some(outcome) = outcome {
                return (frame, outcome);
            }
        }
        panic!("turn never resolved");
    }

    #[test]
    fn test_zero_drag_shoots_straight_up() {
        assert_eq!(launch_direction(Vec2::ZERO, 0.1), Vec2::Y);
        let dir = launch_direction(Vec2::new(3.0, 4.0), 0.1);
        assert!((dir - Vec2::new(0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_aim_only_from_idle() {
        let mut state = empty_board();
        assert!(!update_aim(&mut state, Vec2::ONE));
        assert!(!release_aim(&mut state, Vec2::ONE, 0.0));
        launch_up(&mut state, 0.0);
        assert!(state.turn.in_progress());
        // New gestures are ignored mid-turn
        assert!(!begin_aim(&mut state, Vec2::ZERO));
        assert!(!cancel_aim(&mut state));
    }

    #[test]
    fn test_new_press_restarts_aim() {
        let mut state = empty_board();
        assert!(begin_aim(&mut state, Vec2::new(1.0, 1.0)));
        update_aim(&mut state, Vec2::new(1.0, -1.0));
        // Release never arrived; the next press starts over
        assert!(begin_aim(&mut state, Vec2::new(-2.0, 0.0)));
        assert_eq!(state.turn.phase, TurnPhase::Aiming);
        let aim = state.turn.aim.unwrap();
        assert_eq!(aim.start, Vec2::new(-2.0, 0.0));
        assert_eq!(aim.drag(), Vec2::ZERO);
    }

    #[test]
    fn test_cancel_aim_returns_to_idle() {
        let mut state = empty_board();
        begin_aim(&mut state, Vec2::ZERO);
        assert!(cancel_aim(&mut state));
        assert_eq!(state.turn.phase, TurnPhase::Idle);
        assert!(state.turn.aim.is_none());
        assert!(state.projectiles.iter().all(|p| !p.active));
    }

    #[test]
    fn test_aim_preview_is_clamped() {
        let mut state = empty_board();
        assert!(aim_preview(&state).is_none());
        begin_aim(&mut state, Vec2::new(0.0, 0.0));
        update_aim(&mut state, Vec2::new(0.0, -20.0));
        let (from, to) = aim_preview(&state).unwrap();
        assert_eq!(from, state.tuning.launch_point());
        assert!(((to - from).length() - state.tuning.max_aim_length).abs() < 1e-5);
        assert!(to.y > from.y);
    }

    #[test]
    fn test_single_ball_turn_completes_once() {
        let mut state = empty_board();
        launch_up(&mut state, 0.0);
        // One ball: fired on release, nothing left queued
        assert_eq!(state.turn.phase, TurnPhase::InFlight);
        assert!(state.projectiles[0].active);

        let (frames, outcome) = run_until_resolved(&mut state, 0.0);
        // 110 ticks up, 116 down
        assert_eq!(frames, 226);
        assert_eq!(outcome, TurnOutcome::Continue { turn: 2 });
        assert_eq!(state.turn.phase, TurnPhase::Idle);
        assert_eq!(state.turn.returned_projectiles, 1);
        assert_eq!(state.turn_number, 2);

        // Idle frames do nothing further
        let (events, outcome) = advance(&mut state, 100.0);
        assert!(events.is_empty() && outcome.is_none());
        assert_eq!(state.turn_number, 2);
    }

    #[test]
    fn test_volley_is_staggered_and_counted() {
        let mut state = empty_board();
        state.create_projectile(state.tuning.launch_point());
        state.create_projectile(state.tuning.launch_point());
        state.projectile_count = 3;

        launch_up(&mut state, 0.0);
        assert_eq!(state.turn.total_projectiles, 3);
        assert_eq!(state.active_projectiles().count(), 1);

        // 0.1 s later the second one goes
        advance(&mut state, 0.1);
        assert_eq!(state.active_projectiles().count(), 2);
        assert_eq!(state.turn.phase, TurnPhase::Launching);
        advance(&mut state, 0.2);
        assert_eq!(state.active_projectiles().count(), 3);
        assert_eq!(state.turn.phase, TurnPhase::InFlight);

        let (_, outcome) = run_until_resolved(&mut state, 0.2);
        assert_eq!(outcome, TurnOutcome::Continue { turn: 2 });
        assert_eq!(state.turn.returned_projectiles, 3);
    }

    #[test]
    fn test_turbo_only_in_flight_and_resets() {
        let mut state = empty_board();
        assert_eq!(toggle_turbo(&mut state), None);

        state.create_projectile(state.tuning.launch_point());
        state.projectile_count = 2;
        launch_up(&mut state, 0.0);
        // Still launching
        assert_eq!(toggle_turbo(&mut state), None);
        advance(&mut state, 0.1);
        assert_eq!(toggle_turbo(&mut state), Some(true));

        force_end_turn(&mut state);
        assert!(!state.turn.turbo_active);
    }

    #[test]
    fn test_force_end_cancels_pending_launches() {
        let mut state = empty_board();
        for _ in 0..4 {
            state.create_projectile(state.tuning.launch_point());
        }
        state.projectile_count = 5;
        launch_up(&mut state, 0.0);
        advance(&mut state, 0.1);

        let outcome = force_end_turn(&mut state);
        assert_eq!(outcome, Some(TurnOutcome::Continue { turn: 2 }));
        assert!(state.turn.launches.is_empty());
        assert_eq!(state.turn.returned_projectiles, 5);
        assert!(state.projectiles.iter().all(|p| !p.active && p.pos == state.tuning.launch_point()));

        // A late frame must not wake a cancelled ball
        advance(&mut state, 5.0);
        assert_eq!(state.active_projectiles().count(), 0);

        // Not in a turn: no-op
        assert_eq!(force_end_turn(&mut state), None);
    }

    #[test]
    fn test_resolution_shifts_and_spawns() {
        let mut state = empty_board();
        let block = state.create_block(0.0, 3.0, 1);
        launch_up(&mut state, 0.0);
        // The ball will hit the block on its way up; just end the turn
        let outcome = force_end_turn(&mut state).unwrap();
        assert_eq!(outcome, TurnOutcome::Continue { turn: 2 });

        let moved = state.obstacle(block).unwrap();
        assert!((moved.pos.y - 2.0).abs() < 1e-6);
        // New row for turn 2: min(5 + 4, 7) obstacles
        assert_eq!(state.obstacles.len(), 1 + 7);
        for o in state.obstacles.iter().filter(|o| o.id != block) {
            if let ObstacleKind::Block { health, .. } = o.kind {
                assert_eq!(health, 2);
            }
        }
    }

    #[test]
    fn test_game_over_when_obstacle_reaches_bottom() {
        let mut state = empty_board();
        // One row above the line: -7.0 + 1.0 = -6.0 drops to -7.0
        state.create_power_up(3.3, -6.0);
        launch_up(&mut state, 0.0);
        let outcome = force_end_turn(&mut state).unwrap();

        assert_eq!(outcome, TurnOutcome::GameOver { final_score: 0 });
        assert!(state.is_game_over());
        // No further turns
        assert_eq!(state.turn_number, 1);
        assert!(!begin_aim(&mut state, Vec2::ZERO));
        assert_eq!(advance(&mut state, 10.0).1, None);
    }
}
