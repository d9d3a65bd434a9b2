// The sequencer state middle.rs owns: the step grid, which sample each row
// plays, and the tempo.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::audio::SampleId;
use crate::shared::{DEFAULT_BPM, MAX_BPM, MAX_ROWS, MIN_BPM, STEPS_PER_ROW};

/// One lane of the loop: a sixteenth-note step per column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub steps: [bool; STEPS_PER_ROW],
}

/// Rows of 16 steps. Always at least one row; rows are only ever appended
/// or removed at the end, so every row keeps exactly 16 columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    rows: Vec<Row>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::with_rows(1)
    }
}

impl Grid {
    pub fn with_rows(n: usize) -> Self {
        Self {
            rows: vec![Row::default(); n.clamp(1, MAX_ROWS)],
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Flip a cell and return its new value, or `None` when out of range.
    pub fn toggle(&mut self, row: usize, col: usize) -> Option<bool> {
        let cell = self.rows.get_mut(row)?.steps.get_mut(col)?;
        *cell = !*cell;
        Some(*cell)
    }

    pub fn add_row(&mut self) -> bool {
        if self.rows.len() >= MAX_ROWS {
            return false;
        }
        self.rows.push(Row::default());
        true
    }

    pub fn remove_row(&mut self) -> bool {
        if self.rows.len() <= 1 {
            return false;
        }
        self.rows.pop();
        true
    }

    pub fn active_rows_at(&self, col: usize) -> impl Iterator<Item = usize> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.steps.get(col).copied().unwrap_or(false))
            .map(|(i, _)| i)
    }
}

/// A sample assigned to a row. The handle is whatever id the engine knows
/// the decoded buffer by, so it is rebuilt on every launch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowSound {
    pub sample_path: String,
    #[serde(skip)]
    pub sample_id: Option<SampleId>,
}

impl RowSound {
    pub fn is_loaded(&self) -> bool {
        self.sample_id.is_some()
    }

    pub fn label(&self) -> String {
        std::path::Path::new(&self.sample_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.sample_path.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub grid: Grid,
    pub sounds: BTreeMap<usize, RowSound>, // row -> sample; at most one per row
    pub bpm: f32,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            grid: Grid::default(),
            sounds: BTreeMap::new(),
            bpm: DEFAULT_BPM,
        }
    }
}

impl ProjectState {
    pub fn set_bpm(&mut self, bpm: f32) {
        if bpm.is_finite() {
            self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        }
    }

    pub fn nudge_bpm(&mut self, delta: f32) {
        self.set_bpm(self.bpm + delta);
    }

    /// Map a sample to a row, returning the mapping it replaced.
    pub fn assign_sound(&mut self, row: usize, sound: RowSound) -> Option<RowSound> {
        if row >= self.grid.num_rows() {
            return None;
        }
        self.sounds.insert(row, sound)
    }

    pub fn unmap_row(&mut self, row: usize) -> Option<RowSound> {
        self.sounds.remove(&row)
    }

    /// Drop the last row along with its mapping, which is handed back so
    /// the caller can release the engine's buffer.
    pub fn remove_last_row(&mut self) -> Option<Option<RowSound>> {
        let last = self.grid.num_rows() - 1;
        if !self.grid.remove_row() {
            return None;
        }
        Some(self.sounds.remove(&last))
    }

    /// Repair state loaded from disk: clamp tempo, drop mappings for rows
    /// that no longer exist.
    pub fn normalize(&mut self) {
        self.set_bpm(self.bpm);
        if !self.bpm.is_finite() {
            self.bpm = DEFAULT_BPM;
        }
        if self.grid.num_rows() == 0 {
            self.grid = Grid::default();
        }
        self.grid.rows.truncate(MAX_ROWS);
        let rows = self.grid.num_rows();
        self.sounds.retain(|row, _| *row < rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sound(path: &str) -> RowSound {
        RowSound { sample_path: path.into(), sample_id: None }
    }

    #[test]
    fn toggling_twice_restores_cell() {
        let mut grid = Grid::with_rows(2);
        assert_eq!(grid.toggle(1, 5), Some(true));
        assert!(grid.rows()[1].steps[5]);
        assert_eq!(grid.toggle(1, 5), Some(false));
        assert_eq!(grid, Grid::with_rows(2));
    }

    #[test]
    fn toggle_out_of_range_is_rejected() {
        let mut grid = Grid::default();
        assert_eq!(grid.toggle(1, 0), None);
        assert_eq!(grid.toggle(0, STEPS_PER_ROW), None);
    }

    #[test]
    fn rows_stay_rectangular_through_add_and_remove() {
        let mut grid = Grid::default();
        grid.toggle(0, 3);
        assert!(grid.add_row());
        assert!(grid.add_row());
        assert_eq!(grid.num_rows(), 3);
        assert!(grid.remove_row());
        assert_eq!(grid.num_rows(), 2);
        assert!(grid.rows().iter().all(|r| r.steps.len() == STEPS_PER_ROW));
        // first row untouched
        assert!(grid.rows()[0].steps[3]);
    }

    #[test]
    fn row_count_is_bounded() {
        let mut grid = Grid::default();
        assert!(!grid.remove_row());
        assert_eq!(grid.num_rows(), 1);

        while grid.add_row() {}
        assert_eq!(grid.num_rows(), MAX_ROWS);
    }

    #[test]
    fn active_rows_at_column() {
        let mut grid = Grid::with_rows(3);
        grid.toggle(0, 4);
        grid.toggle(2, 4);
        grid.toggle(1, 5);
        assert_eq!(grid.active_rows_at(4).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(grid.active_rows_at(15).count(), 0);
    }

    #[test]
    fn bpm_is_clamped() {
        let mut state = ProjectState::default();
        state.set_bpm(10.0);
        assert_eq!(state.bpm, MIN_BPM);
        state.nudge_bpm(1000.0);
        assert_eq!(state.bpm, MAX_BPM);
        state.set_bpm(f32::NAN);
        assert_eq!(state.bpm, MAX_BPM);
    }

    #[test]
    fn one_mapping_per_row_and_removed_with_row() {
        let mut state = ProjectState::default();
        state.grid.add_row();
        assert_eq!(state.assign_sound(1, sound("a.wav")), None);
        assert_eq!(state.assign_sound(1, sound("b.wav")), Some(sound("a.wav")));
        assert_eq!(state.sounds.len(), 1);

        // row 5 does not exist
        assert_eq!(state.assign_sound(5, sound("c.wav")), None);
        assert!(!state.sounds.contains_key(&5));

        assert_eq!(state.remove_last_row(), Some(Some(sound("b.wav"))));
        assert!(state.sounds.is_empty());
        assert_eq!(state.remove_last_row(), None);
    }

    #[test]
    fn normalize_drops_stale_mappings() {
        let mut state = ProjectState::default();
        state.sounds.insert(4, sound("ghost.wav"));
        state.bpm = 500.0;
        state.normalize();
        assert!(state.sounds.is_empty());
        assert_eq!(state.bpm, MAX_BPM);
    }

    #[test]
    fn label_is_file_name() {
        assert_eq!(sound("/tmp/takes/recording2.wav").label(), "recording2.wav");
    }
}
