use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::shared::{DisplayState, LedState, STEPS_PER_ROW};

const LABEL_WIDTH: usize = 14;

// One line per row: the row's sound, then a pad per step. Beats are
// grouped in fours; the playhead column is marked above the pads.
pub fn draw_step_grid(frame: &mut Frame, area: Rect, ds: &DisplayState, cursor: (usize, usize)) {
    let mut lines = Vec::with_capacity(ds.rows.len() + 1);
    lines.push(playhead_line(ds.playing_step));

    for (row_idx, (leds, label)) in ds.rows.iter().zip(&ds.row_labels).enumerate() {
        let mut spans = vec![Span::styled(
            format!("{:<width$}", truncate(label, LABEL_WIDTH - 1), width = LABEL_WIDTH),
            Style::default().fg(Color::Gray),
        )];
        for (col, led) in leds.iter().enumerate() {
            let mut style = pad_style(*led, ds.playing_step == Some(col as u8));
            if cursor == (row_idx, col) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(pad_glyph(*led), style));
            spans.push(Span::raw(if col % 4 == 3 { "  " } else { " " }));
        }
        lines.push(Line::from(spans));
    }

    let block = Block::default().borders(Borders::ALL).title(" steps ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn playhead_line(step: Option<u8>) -> Line<'static> {
    let mut text = " ".repeat(LABEL_WIDTH);
    for col in 0..STEPS_PER_ROW {
        text.push(if step == Some(col as u8) { 'v' } else { ' ' });
        text.push_str(if col % 4 == 3 { "  " } else { " " });
    }
    Line::styled(text, Style::default().fg(Color::Yellow))
}

fn pad_glyph(led: LedState) -> &'static str {
    match led {
        LedState::Off => "□",
        LedState::OnMedium | LedState::OnHigh => "■",
    }
}

fn pad_style(led: LedState, on_playhead: bool) -> Style {
    match led {
        LedState::OnHigh => Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
        LedState::OnMedium => Style::default().fg(Color::LightBlue),
        LedState::Off if on_playhead => Style::default().fg(Color::Yellow),
        LedState::Off => Style::default().fg(Color::DarkGray),
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
