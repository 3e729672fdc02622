//! Per-frame output handed to the browser shell
//!
//! Both snapshots are plain serde structs; the shell serializes them to
//! JSON for the JS renderer and HUD.

use glam::Vec2;
use serde::Serialize;

use crate::camera::CameraPose;
use crate::sim::state::{ObstacleKind, SimulationState};

/// HUD values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub projectile_count: u32,
    pub turn: u32,
    pub turn_in_progress: bool,
    pub is_turbo: bool,
    pub is_paused: bool,
    pub is_game_over: bool,
    /// Score at game over, `None` while playing
    pub final_score: Option<u64>,
}

impl HudSnapshot {
    pub fn capture(state: &SimulationState, paused: bool) -> Self {
        let game_over = state.is_game_over();
        Self {
            score: state.score,
            projectile_count: state.projectile_count,
            turn: state.turn_number,
            turn_in_progress: state.turn.in_progress(),
            is_turbo: state.turn.turbo_active,
            is_paused: paused,
            is_game_over: game_over,
            final_score: game_over.then_some(state.score),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub id: u32,
    pub position: Vec2,
    pub active: bool,
}

/// Obstacle type tag for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleTag {
    Block,
    PowerUp,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObstacleView {
    pub id: u32,
    pub kind: ObstacleTag,
    pub position: Vec2,
    /// Remaining health, blocks only
    pub health: Option<u32>,
}

/// Everything the renderer draws this frame
#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub projectiles: Vec<ProjectileView>,
    pub obstacles: Vec<ObstacleView>,
    pub camera: CameraPose,
    /// Aim preview segment (launch point, end point) while aiming
    pub aim_line: Option<[Vec2; 2]>,
}

impl RenderSnapshot {
    pub fn capture(
        state: &SimulationState,
        camera: CameraPose,
        aim_line: Option<(Vec2, Vec2)>,
    ) -> Self {
        let projectiles = state
            .projectiles
            .iter()
            .map(|p| ProjectileView {
                id: p.id,
                position: p.pos,
                active: p.active,
            })
            .collect();

        let obstacles = state
            .obstacles
            .iter()
            .map(|o| ObstacleView {
                id: o.id,
                kind: match o.kind {
                    ObstacleKind::Block { .. } => ObstacleTag::Block,
                    ObstacleKind::PowerUp { .. } => ObstacleTag::PowerUp,
                },
                position: o.pos,
                health: o.health(),
            })
            .collect();

        Self {
            projectiles,
            obstacles,
            camera,
            aim_line: aim_line.map(|(from, to)| [from, to]),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    #[test]
    fn test_hud_reflects_state() {
        let mut state = SimulationState::new(Tuning::default(), 1);
        state.score = 300;
        let hud = HudSnapshot::capture(&state, true);
        assert_eq!(hud.score, 300);
        assert_eq!(hud.turn, 1);
        assert_eq!(hud.projectile_count, 1);
        assert!(hud.is_paused);
        assert!(!hud.turn_in_progress);
        assert_eq!(hud.final_score, None);
    }

    #[test]
    fn test_render_snapshot_json() {
        let mut state = SimulationState::new(Tuning::default(), 1);
        state.create_block(1.1, 2.2, 3);
        state.create_power_up(-1.1, 2.2);
        let camera = CameraPose::rest(&state.tuning);
        let snap = RenderSnapshot::capture(&state, camera, Some((Vec2::ZERO, Vec2::Y)));

        assert_eq!(snap.projectiles.len(), 1);
        assert_eq!(snap.obstacles[0].health, Some(3));
        assert_eq!(snap.obstacles[1].kind, ObstacleTag::PowerUp);

        let json = snap.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["obstacles"][0]["kind"], "block");
        assert_eq!(value["obstacles"][1]["kind"], "power_up");
        assert!(value["obstacles"][1]["health"].is_null());
        assert!(value["aim_line"].is_array());
        assert!(value["camera"]["eye"].is_array());
    }
}
