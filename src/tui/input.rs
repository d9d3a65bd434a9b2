use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use super::mode::TuiState;
use crate::shared::InputEvent;

const BPM_FINE: f32 = 1.0;
const BPM_COARSE: f32 = 10.0;
const TEMPO_DIGITS: usize = 3;

// Poll for one key and resolve it against the cursor into semantic events
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts));
    }
    Ok(vec![])
}

pub fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    if ts.tempo_entry.is_some() {
        return tempo_entry_key(code, ts);
    }

    // the 4x4 pad block toggles a column on the cursor row
    if let Some(col) = pad_column(code) {
        ts.cursor_col = col;
        return vec![InputEvent::ToggleStep { row: ts.cursor_row, col }];
    }

    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],

        KeyCode::Up => {
            ts.move_cursor(-1, 0);
            vec![]
        }
        KeyCode::Down => {
            ts.move_cursor(1, 0);
            vec![]
        }
        KeyCode::Left => {
            ts.move_cursor(0, -1);
            vec![]
        }
        KeyCode::Right => {
            ts.move_cursor(0, 1);
            vec![]
        }
        KeyCode::Enter => vec![InputEvent::ToggleStep { row: ts.cursor_row, col: ts.cursor_col }],

        KeyCode::Char('-') => vec![InputEvent::AdjustBpm(-BPM_FINE)],
        KeyCode::Char('=') | KeyCode::Char('+') => vec![InputEvent::AdjustBpm(BPM_FINE)],
        KeyCode::Char('[') => vec![InputEvent::AdjustBpm(-BPM_COARSE)],
        KeyCode::Char(']') => vec![InputEvent::AdjustBpm(BPM_COARSE)],
        KeyCode::Char('t') => {
            ts.tempo_entry = Some(String::new());
            vec![]
        }

        KeyCode::Char('o') => vec![InputEvent::AddRow],
        KeyCode::Char('p') => vec![InputEvent::RemoveRow],
        KeyCode::Char('b') => vec![InputEvent::RecordPress],

        KeyCode::Tab => {
            ts.next_library_entry();
            vec![]
        }
        KeyCode::Char('g') if ts.library_len > 0 => {
            vec![InputEvent::AssignSample { row: ts.cursor_row, index: ts.library_cursor }]
        }
        KeyCode::Char('G') => vec![InputEvent::UnmapRow(ts.cursor_row)],
        KeyCode::Char('l') => vec![InputEvent::PreviewRow(ts.cursor_row)],
        KeyCode::Char('u') => vec![InputEvent::RefreshLibrary],

        _ => vec![],
    }
}

// While a tempo is being typed every other key is swallowed
fn tempo_entry_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    let Some(entry) = ts.tempo_entry.as_mut() else {
        return vec![];
    };
    match code {
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if entry.len() < TEMPO_DIGITS {
                entry.push(c);
            }
            vec![]
        }
        KeyCode::Backspace => {
            entry.pop();
            vec![]
        }
        KeyCode::Enter => {
            let typed = ts.tempo_entry.take().unwrap_or_default();
            match typed.parse::<f32>() {
                Ok(bpm) => vec![InputEvent::SetBpm(bpm)],
                Err(_) => vec![],
            }
        }
        KeyCode::Esc => {
            ts.tempo_entry = None;
            vec![]
        }
        _ => vec![],
    }
}

fn pad_column(code: KeyCode) -> Option<usize> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    let idx = match c {
        '1' => 0,
        '2' => 1,
        '3' => 2,
        '4' => 3,
        'q' => 4,
        'w' => 5,
        'e' => 6,
        'r' => 7,
        'a' => 8,
        's' => 9,
        'd' => 10,
        'f' => 11,
        'z' => 12,
        'x' => 13,
        'c' => 14,
        'v' => 15,
        _ => return None,
    };
    Some(idx)
}
