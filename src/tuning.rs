//! Data-driven game balance
//!
//! Every knob the simulation reads lives here. Defaults come from
//! [`crate::consts`]; a JSON blob may override any subset of fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Errors produced while loading tuning overrides
#[derive(Debug)]
pub enum TuningError {
    /// JSON was malformed or had wrongly typed fields
    Parse(serde_json::Error),
    /// JSON parsed but a value is out of range
    Invalid(&'static str),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "tuning parse error: {}", e),
            TuningError::Invalid(msg) => write!(f, "invalid tuning: {}", msg),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

/// Game balance parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    pub game_width: f32,
    pub game_height: f32,

    // === Balls ===
    pub ball_radius: f32,
    /// Distance per tick at normal speed
    pub ball_speed: f32,
    pub turbo_multiplier: f32,
    /// Seconds between launches in a volley
    pub launch_interval: f64,
    pub min_vertical_direction: f32,

    // === Obstacles ===
    pub block_size: f32,
    pub block_spacing: f32,
    pub block_score: u64,
    pub initial_obstacles: usize,
    pub row_base_count: usize,
    pub row_count_per_turn: usize,
    pub row_max_fill: f32,
    pub power_up_chance: f64,
    pub power_up_radius: f32,

    // === Aim / camera ===
    pub max_aim_length: f32,
    pub camera_follow_delay: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            game_width: GAME_WIDTH,
            game_height: GAME_HEIGHT,

            ball_radius: BALL_RADIUS,
            ball_speed: BALL_SPEED,
            turbo_multiplier: TURBO_MULTIPLIER,
            launch_interval: LAUNCH_INTERVAL,
            min_vertical_direction: MIN_VERTICAL_DIRECTION,

            block_size: BLOCK_SIZE,
            block_spacing: BLOCK_SPACING,
            block_score: BLOCK_SCORE,
            initial_obstacles: INITIAL_OBSTACLES,
            row_base_count: ROW_BASE_COUNT,
            row_count_per_turn: ROW_COUNT_PER_TURN,
            row_max_fill: ROW_MAX_FILL,
            power_up_chance: POWER_UP_CHANCE,
            power_up_radius: POWER_UP_RADIUS,

            max_aim_length: MAX_AIM_LENGTH,
            camera_follow_delay: CAMERA_FOLLOW_DELAY,
        }
    }
}

/// Absorbs f32 rounding in cell-count ratios (9.9 / 1.1 is 8.999999 in f32)
const CELL_EPSILON: f32 = 1e-4;

/// Whole grid cells in `ratio`, tolerant of rounding just below an integer
#[inline]
fn whole_cells(ratio: f32) -> f32 {
    (ratio + CELL_EPSILON).floor()
}

impl Tuning {
    /// Parse overrides from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.game_width > 0.0 && self.game_height > 0.0) {
            return Err(TuningError::Invalid("arena dimensions must be positive"));
        }
        if !(self.ball_radius > 0.0) || self.ball_radius * 2.0 >= self.game_width {
            return Err(TuningError::Invalid("ball radius must fit inside the arena"));
        }
        // A ball faster than its own diameter could skip through a block
        if !(self.ball_speed > 0.0) || self.ball_speed * self.turbo_multiplier >= self.ball_radius * 2.0 {
            return Err(TuningError::Invalid("ball speed must be below one ball diameter per tick"));
        }
        if !(self.turbo_multiplier >= 1.0) {
            return Err(TuningError::Invalid("turbo multiplier must be at least 1"));
        }
        if !(self.launch_interval >= 0.0) {
            return Err(TuningError::Invalid("launch interval must not be negative"));
        }
        if !(0.0..1.0).contains(&self.min_vertical_direction) {
            return Err(TuningError::Invalid("min vertical direction must be in [0, 1)"));
        }
        if !(self.block_size > 0.0) || !(self.block_spacing >= 0.0) {
            return Err(TuningError::Invalid("block size must be positive"));
        }
        if self.grid_columns() == 0 {
            return Err(TuningError::Invalid("arena too narrow for a single block column"));
        }
        if !(0.0..=1.0).contains(&self.power_up_chance) {
            return Err(TuningError::Invalid("power-up chance must be a probability"));
        }
        if !(0.0..=1.0).contains(&self.row_max_fill) {
            return Err(TuningError::Invalid("row fill must be a fraction"));
        }
        if !(self.power_up_radius > 0.0) || !(self.max_aim_length > 0.0) {
            return Err(TuningError::Invalid("radii and lengths must be positive"));
        }
        Ok(())
    }

    /// Grid cell pitch (block plus gap)
    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.block_size * (1.0 + self.block_spacing)
    }

    /// Number of block columns that fit between the walls
    pub fn grid_columns(&self) -> usize {
        let spacing = self.block_size * self.block_spacing;
        let fit = whole_cells((self.game_width - spacing) / self.cell_size()) as i64 - 1;
        fit.max(0) as usize
    }

    /// Number of rows in the upper band used by the opening layout
    pub fn grid_rows(&self) -> usize {
        whole_cells(self.game_height / 2.0 / self.cell_size()).max(0.0) as usize
    }

    /// Launch point for this arena
    #[inline]
    pub fn launch_point(&self) -> glam::Vec2 {
        crate::launch_point(self.game_height)
    }

    /// Obstacles at or below this height end the game
    #[inline]
    pub fn game_over_line(&self) -> f32 {
        -self.game_height / 2.0 + self.block_size / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grid() {
        let t = Tuning::default();
        assert!(t.validate().is_ok());
        // (10 - 0.1) / 1.1 = 9, minus one column of margin
        assert_eq!(t.grid_columns(), 8);
        // 7.5 / 1.1 = 6.8
        assert_eq!(t.grid_rows(), 6);
        assert!((t.launch_point().y - (-6.5)).abs() < 1e-6);
    }

    #[test]
    fn test_exact_fit_is_not_lost_to_rounding() {
        let t = Tuning::default();
        let spacing = t.block_size * t.block_spacing;
        // The raw f32 ratio lands just below 9
        assert!((t.game_width - spacing) / t.cell_size() < 9.0);
        assert_eq!(t.grid_columns(), 8);

        // Arena wide enough for exactly 11 cells plus one gap
        let wide = Tuning {
            game_width: 12.2,
            ..Default::default()
        };
        assert_eq!(wide.grid_columns(), 10);

        let tall = Tuning {
            game_height: 13.2,
            ..Default::default()
        };
        assert_eq!(tall.grid_rows(), 6);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let t = Tuning::from_json(r#"{ "turbo_multiplier": 2.0, "block_score": 50 }"#).unwrap();
        assert_eq!(t.turbo_multiplier, 2.0);
        assert_eq!(t.block_score, 50);
        assert_eq!(t.game_width, GAME_WIDTH);
    }

    #[test]
    fn test_malformed_json() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_rejects_tunneling_speed() {
        let err = Tuning::from_json(r#"{ "ball_speed": 0.5 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
        assert!(err.to_string().contains("ball speed"));
    }

    #[test]
    fn test_rejects_bad_probability() {
        let t = Tuning {
            power_up_chance: 1.5,
            ..Default::default()
        };
        assert!(t.validate().is_err());
    }
}
