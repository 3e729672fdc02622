//! Obstacle layout generation
//!
//! Obstacles sit on a fixed grid of `grid_columns` columns. The opening
//! layout scatters a handful over the upper half of the arena; every
//! resolved turn adds one row along the top, growing denser with the turn
//! number. Slots are drawn without replacement so no two obstacles share one.

use rand::Rng;

use super::state::SimulationState;
use crate::tuning::Tuning;

/// X coordinate of every grid column, left to right
pub fn column_positions(tuning: &Tuning) -> Vec<f32> {
    let columns = tuning.grid_columns();
    let cell = tuning.cell_size();
    // Centered: first and last column are equidistant from the walls
    let start_x = -(columns.saturating_sub(1) as f32 * cell) / 2.0;
    (0..columns).map(|i| start_x + i as f32 * cell).collect()
}

/// Y coordinate a freshly spawned row is placed at
#[inline]
pub fn new_row_y(tuning: &Tuning) -> f32 {
    tuning.game_height / 2.0 - tuning.cell_size()
}

/// How many obstacles the row spawned for `turn` holds
pub fn row_obstacle_count(tuning: &Tuning, turn: u32) -> usize {
    let max_per_row = (tuning.grid_columns() as f32 * tuning.row_max_fill).floor() as usize;
    let wanted = tuning.row_base_count + tuning.row_count_per_turn * turn as usize;
    wanted.min(max_per_row).min(tuning.grid_columns())
}

/// Place either a power-up or a block at (x, y)
fn place_obstacle(state: &mut SimulationState, x: f32, y: f32, turn: u32) {
    let chance = state.tuning.power_up_chance;
    if state.rng.random_bool(chance) {
        state.create_power_up(x, y);
    } else {
        state.create_block(x, y, turn);
    }
}

/// Scatter the opening obstacles over the upper band of the arena
pub fn place_initial_layout(state: &mut SimulationState) {
    let columns = column_positions(&state.tuning);
    let cell = state.tuning.cell_size();
    let rows = state.tuning.grid_rows();

    let mut slots = Vec::with_capacity(columns.len() * rows);
    for &x in &columns {
        for row in 1..=rows {
            slots.push((x, row as f32 * cell));
        }
    }

    for _ in 0..state.tuning.initial_obstacles {
        if slots.is_empty() {
            break;
        }
        let pick = state.rng.random_range(0..slots.len());
        let (x, y) = slots.swap_remove(pick);
        place_obstacle(state, x, y, 1);
    }
}

/// Spawn the top row for `turn`
pub fn spawn_row(state: &mut SimulationState, turn: u32) {
    let mut columns = column_positions(&state.tuning);
    let count = row_obstacle_count(&state.tuning, turn);
    let y = new_row_y(&state.tuning);

    for _ in 0..count {
        if columns.is_empty() {
            break;
        }
        let pick = state.rng.random_range(0..columns.len());
        let x = columns.swap_remove(pick);
        place_obstacle(state, x, y, turn);
    }

    log::debug!("Turn {}: spawned row of {} at y={:.2}", turn, count, y);
}
