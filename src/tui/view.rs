use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::grid::draw_step_grid;
use super::mode::TuiState;
use crate::shared::DisplayState;

const HELP: &str = "space play  enter/pads toggle  -= [] t tempo  o/p row  b rec  tab/g/G sample  l preview  esc quit";

pub fn render(frame: &mut Frame, area: Rect, ds: &DisplayState, ts: &TuiState) {
    let library_height = (ds.library.len().clamp(1, 8) + 2) as u16;
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),              // transport + tempo
            Constraint::Min(4),                 // step grid
            Constraint::Length(library_height), // samples on disk
            Constraint::Length(1),              // key help
        ])
        .split(area);

    draw_header(frame, sections[0], ds, ts);
    draw_step_grid(frame, sections[1], ds, (ts.cursor_row, ts.cursor_col));
    draw_library(frame, sections[2], ds, ts);
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        sections[3],
    );
}

fn draw_header(frame: &mut Frame, area: Rect, ds: &DisplayState, ts: &TuiState) {
    let transport = if ds.playing {
        Span::styled("▶ PLAY", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("■ STOP", Style::default().fg(Color::Gray))
    };
    let rec = if ds.recording {
        Span::styled("  ● REC", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
    } else {
        Span::raw("")
    };
    let tempo = match &ts.tempo_entry {
        Some(typed) => Span::styled(
            format!("   Tempo: {typed}_ BPM"),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        None => Span::raw(format!("   Tempo: {} BPM", ds.bpm.round() as i32)),
    };
    let line = Line::from(vec![
        transport,
        rec,
        tempo,
        Span::styled(format!("   {}", ds.display_text), Style::default().fg(Color::Cyan)),
    ]);
    let block = Block::default().borders(Borders::ALL).title(" stepgrid ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_library(frame: &mut Frame, area: Rect, ds: &DisplayState, ts: &TuiState) {
    let lines: Vec<Line> = if ds.library.is_empty() {
        vec![Line::styled("no .wav files yet, press b to record", Style::default().fg(Color::DarkGray))]
    } else {
        // keep the selected entry in view
        let visible = area.height.saturating_sub(2).max(1) as usize;
        let first = ts.library_cursor.saturating_sub(visible - 1);
        ds.library
            .iter()
            .enumerate()
            .skip(first)
            .take(visible)
            .map(|(i, name)| {
                if i == ts.library_cursor {
                    Line::styled(format!("> {name}"), Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    Line::raw(format!("  {name}"))
                }
            })
            .collect()
    };
    let block = Block::default().borders(Borders::ALL).title(" samples ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
