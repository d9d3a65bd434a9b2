// Contract between the TUI and the middle layer.
//
// The TUI owns the cursor and turns key presses into semantic `InputEvent`s;
// the middle layer owns all sequencer state and hands back a `DisplayState`
// every frame. The TUI never interprets sequencer state on its own.
//
// Keys:
//   arrows        //  move the cursor over the grid / library
//   Enter         //  ToggleStep at the cursor
//   1 2 3 4 q w e r a s d f z x c v
//                 //  ToggleStep(cursor row, column 0..15)
//   Space         //  PlayPress
//   - / =         //  AdjustBpm(-1 / +1)
//   [ / ]         //  AdjustBpm(-10 / +10), the coarse "drag"
//   t 1 2 0 Enter //  SetBpm(120); Backspace edits, Esc cancels
//   o / p         //  AddRow / RemoveRow
//   b             //  RecordPress
//   Tab           //  next library entry
//   g / G         //  AssignSample to cursor row / UnmapRow
//   l             //  PreviewRow
//   u             //  RefreshLibrary
//   Esc           //  Quit

pub const STEPS_PER_ROW: usize = 16;
pub const BEATS_PER_LOOP: f64 = 4.0;
pub const BEATS_PER_STEP: f64 = BEATS_PER_LOOP / STEPS_PER_ROW as f64;

pub const MIN_BPM: f32 = 30.0;
pub const MAX_BPM: f32 = 240.0;
pub const DEFAULT_BPM: f32 = 120.0;

pub const MAX_ROWS: usize = 32;

// note per row for the built-in tone voice; wraps for rows past the table
pub const ROW_NOTES: [u8; 16] = [100, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51];

pub fn row_note(row: usize) -> u8 {
    ROW_NOTES[row % ROW_NOTES.len()]
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    ToggleStep { row: usize, col: usize },
    PlayPress,
    AdjustBpm(f32), // relative nudge
    SetBpm(f32),    // absolute, like a slider
    AddRow,
    RemoveRow,
    RecordPress,
    AssignSample { row: usize, index: usize }, // index into the library listing
    UnmapRow(usize),
    PreviewRow(usize),
    RefreshLibrary,
    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub rows: Vec<[LedState; STEPS_PER_ROW]>,
    pub row_labels: Vec<String>, // sample file name, or the tone note
    pub playing_step: Option<u8>,
    pub playing: bool,
    pub recording: bool,
    pub bpm: f32,
    pub library: Vec<String>,
    pub display_text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedState {
    Off,
    OnMedium, // step is on
    OnHigh,   // step is on and currently sounding
}
