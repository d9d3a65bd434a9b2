// Turns grid cells into playback triggers. Each on-cell becomes one trigger
// at 0.25 * column beats lasting a sixteenth; the transport asks for the
// triggers at a step and the middle layer turns them into audio commands.

use std::collections::BTreeMap;

use crate::shared::{BEATS_PER_STEP, STEPS_PER_ROW, row_note};

use super::project::Grid;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trigger {
    pub row: usize,
    pub column: usize,
    pub note: u8,
    pub position_beats: f64,
    pub duration_beats: f64,
}

impl Trigger {
    pub fn new(row: usize, column: usize) -> Self {
        Self {
            row,
            column,
            note: row_note(row),
            position_beats: BEATS_PER_STEP * column as f64,
            duration_beats: BEATS_PER_STEP,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schedule {
    // keyed (column, row) so a step's triggers are contiguous
    triggers: BTreeMap<(usize, usize), Trigger>,
}

impl Schedule {
    pub fn from_grid(grid: &Grid) -> Self {
        let mut schedule = Self::default();
        for col in 0..STEPS_PER_ROW {
            for row in grid.active_rows_at(col) {
                schedule.add(row, col);
            }
        }
        schedule
    }

    pub fn add(&mut self, row: usize, col: usize) {
        if col < STEPS_PER_ROW {
            self.triggers.insert((col, row), Trigger::new(row, col));
        }
    }

    // Only this cell's trigger goes; other rows at the same column are kept.
    pub fn remove(&mut self, row: usize, col: usize) -> Option<Trigger> {
        self.triggers.remove(&(col, row))
    }

    pub fn apply_toggle(&mut self, row: usize, col: usize, now_on: bool) {
        if now_on {
            self.add(row, col);
        } else {
            self.remove(row, col);
        }
    }

    pub fn drop_row(&mut self, row: usize) {
        self.triggers.retain(|&(_, r), _| r != row);
    }

    pub fn at_step(&self, col: usize) -> impl Iterator<Item = &Trigger> {
        self.triggers
            .range((col, 0)..=(col, usize::MAX))
            .map(|(_, t)| t)
    }

    // number of on-cells across all rows
    pub fn active_steps(&self) -> usize {
        self.triggers.len()
    }
}
