mod audio;
mod audio_api;
mod config;
mod loader;
mod logging;
mod middle;
mod pipeline;
mod shared;
mod tui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::terminal;
use log::{error, info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use config::Config;
use middle::Middle;
use pipeline::persistence;
use pipeline::project::ProjectState;
use shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        error!("fatal: {e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dir: PathBuf = match std::env::args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let config = Config::load(&project_dir)?;
    logging::init_logger(&config.log_file(&project_dir))?;
    info!("project dir {}", project_dir.display());

    let mut audio = audio::start_audio()?;
    if !audio.has_input() {
        warn!("no microphone; recordings will be empty");
    }

    let state = persistence::load_project(&project_dir).unwrap_or_else(|| {
        let mut fresh = ProjectState {
            grid: pipeline::project::Grid::with_rows(config.initial_rows),
            ..ProjectState::default()
        };
        fresh.set_bpm(config.default_bpm);
        fresh
    });
    let mut middle = Middle::new(state, &config, &project_dir, audio.sample_rate());
    for cmd in middle.load_saved_sounds() {
        audio.send(cmd);
    }

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // restores the terminal however we leave
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let frame_rate = Duration::from_millis(16); // ~60fps, also the tick resolution
    let mut last_tick = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let ds = middle.display_state();
        tui_state.sync(&ds);
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &tui_state);
        })?;

        for event in tui::input::poll_input(frame_rate, &mut tui_state)? {
            if event == InputEvent::Quit {
                if middle.is_recording() {
                    finish_recording(&mut audio, &mut middle);
                }
                if let Err(e) = persistence::save_project(&project_dir, &middle.state) {
                    error!("could not save project: {e:#}");
                }
                info!("bye");
                return Ok(());
            }
            for cmd in middle.handle_input(event) {
                audio.send(cmd);
            }
        }

        if let Some(rec) = audio.poll_completed_recording() {
            if let Err(e) = middle.on_recording_complete(&rec.buffer) {
                error!("could not save recording: {e:#}");
            }
        }

        let elapsed = last_tick.elapsed().as_secs_f64();
        last_tick = Instant::now();
        for cmd in middle.tick(elapsed) {
            audio.send(cmd);
        }
    }
}

// Stop an in-progress take so it is written before we leave
fn finish_recording(audio: &mut audio::AudioHandle, middle: &mut Middle) {
    for cmd in middle.handle_input(InputEvent::RecordPress) {
        audio.send(cmd);
    }
    match audio.poll_completed_recording() {
        Some(rec) => {
            if let Err(e) = middle.on_recording_complete(&rec.buffer) {
                error!("could not save recording: {e:#}");
            }
        }
        None => warn!("recording lost on quit"),
    }
}

struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let _ = crossterm::execute!(std::io::stdout(), terminal::Clear(terminal::ClearType::All));
    }
}
