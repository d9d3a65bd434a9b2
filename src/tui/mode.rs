use crate::shared::{DisplayState, STEPS_PER_ROW};

// State local to the TUI: where the cursor sits on the grid and in the
// library. Bounds are synced from DisplayState every frame.
#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub library_cursor: usize,
    pub num_rows: usize,
    pub library_len: usize,
    pub tempo_entry: Option<String>, // digits typed after 't', until Enter/Esc
}

impl TuiState {
    pub fn sync(&mut self, ds: &DisplayState) {
        self.num_rows = ds.rows.len();
        self.library_len = ds.library.len();
        self.cursor_row = self.cursor_row.min(self.num_rows.saturating_sub(1));
        self.cursor_col = self.cursor_col.min(STEPS_PER_ROW - 1);
        self.library_cursor = self.library_cursor.min(self.library_len.saturating_sub(1));
    }

    pub fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let max_row = self.num_rows.saturating_sub(1) as isize;
        self.cursor_row = (self.cursor_row as isize + d_row).clamp(0, max_row) as usize;
        self.cursor_col = (self.cursor_col as isize + d_col).clamp(0, STEPS_PER_ROW as isize - 1) as usize;
    }

    pub fn next_library_entry(&mut self) {
        if self.library_len > 0 {
            self.library_cursor = (self.library_cursor + 1) % self.library_len;
        }
    }
}
