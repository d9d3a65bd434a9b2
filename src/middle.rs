// The middle layer owns every bit of sequencer state. The TUI feeds it
// InputEvents and draws whatever display_state() returns; the main loop
// forwards the AudioCommands it hands back to the engine.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::audio::SampleBuffer;
use crate::audio_api::{AudioCommand, TriggerParams, TriggerSound};
use crate::config::Config;
use crate::loader::sample_loader;
use crate::pipeline::project::{ProjectState, RowSound};
use crate::pipeline::schedule::Schedule;
use crate::pipeline::transport::Transport;
use crate::shared::{DisplayState, InputEvent, LedState, STEPS_PER_ROW, row_note};

pub struct Middle {
    pub state: ProjectState,
    schedule: Schedule,
    transport: Transport,
    recording: bool,
    library: Vec<PathBuf>,
    samples_dir: PathBuf,
    sample_rate: u32,
    sample_gain: f32,
    tone_gain: f32,
    status: String,
}

impl Middle {
    pub fn new(state: ProjectState, config: &Config, project_dir: &Path, sample_rate: u32) -> Self {
        let schedule = Schedule::from_grid(&state.grid);
        let mut middle = Self {
            state,
            schedule,
            transport: Transport::new(config.tick.into()),
            recording: false,
            library: Vec::new(),
            samples_dir: config.samples_dir(project_dir),
            sample_rate,
            sample_gain: config.sample_gain,
            tone_gain: config.tone_gain,
            status: String::new(),
        };
        middle.refresh_library();
        middle
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<AudioCommand> {
        match event {
            InputEvent::ToggleStep { row, col } => {
                match self.state.grid.toggle(row, col) {
                    Some(on) => {
                        self.schedule.apply_toggle(row, col, on);
                        debug!("step {row}:{col} -> {on}");
                        self.set_status(format!("{} steps on", self.schedule.active_steps()));
                    }
                    None => debug!("toggle outside grid {row}:{col}"),
                }
                vec![]
            }
            InputEvent::PlayPress => {
                if self.transport.is_playing() {
                    self.transport.stop();
                    self.set_status("stopped");
                    vec![AudioCommand::StopAll]
                } else {
                    self.transport.start();
                    self.set_status("playing");
                    vec![]
                }
            }
            InputEvent::AdjustBpm(delta) => {
                self.state.nudge_bpm(delta);
                vec![]
            }
            InputEvent::SetBpm(bpm) => {
                self.state.set_bpm(bpm);
                vec![]
            }
            InputEvent::AddRow => {
                if self.state.grid.add_row() {
                    self.set_status(format!("{} rows", self.state.grid.num_rows()));
                } else {
                    self.set_status("row limit reached");
                }
                vec![]
            }
            InputEvent::RemoveRow => self.remove_row(),
            InputEvent::RecordPress => self.toggle_recording(),
            InputEvent::AssignSample { row, index } => self.assign_sample(row, index),
            InputEvent::UnmapRow(row) => {
                let released = self.state.unmap_row(row).and_then(|s| s.sample_id);
                self.set_status(format!("row {} unmapped", row + 1));
                released.map(AudioCommand::ReleaseSample).into_iter().collect()
            }
            InputEvent::PreviewRow(row) => {
                if row < self.state.grid.num_rows() {
                    vec![AudioCommand::Trigger(self.trigger_for(row, row_note(row)))]
                } else {
                    vec![]
                }
            }
            InputEvent::RefreshLibrary => {
                self.refresh_library();
                vec![]
            }
            InputEvent::Quit => vec![],
        }
    }

    // Called once per frame with the wall time since the last call
    pub fn tick(&mut self, elapsed: f64) -> Vec<AudioCommand> {
        let steps = self.transport.advance(elapsed, self.state.bpm);
        let mut cmds = Vec::new();
        for step in steps {
            for trigger in self.schedule.at_step(step as usize) {
                debug!(
                    "row {} at beat {:.2} for {:.2}",
                    trigger.row, trigger.position_beats, trigger.duration_beats
                );
                cmds.push(AudioCommand::Trigger(self.trigger_for(trigger.row, trigger.note)));
            }
        }
        cmds
    }

    fn trigger_for(&self, row: usize, note: u8) -> TriggerParams {
        match self.state.sounds.get(&row).and_then(|s| s.sample_id) {
            Some(id) => TriggerParams {
                row,
                sound: TriggerSound::Sample(id),
                gain: self.sample_gain,
            },
            None => TriggerParams {
                row,
                sound: TriggerSound::Tone { note },
                gain: self.tone_gain,
            },
        }
    }

    fn remove_row(&mut self) -> Vec<AudioCommand> {
        let last = self.state.grid.num_rows() - 1;
        match self.state.remove_last_row() {
            Some(mapping) => {
                self.schedule.drop_row(last);
                self.set_status(format!("{} rows", self.state.grid.num_rows()));
                mapping
                    .and_then(|s| s.sample_id)
                    .map(AudioCommand::ReleaseSample)
                    .into_iter()
                    .collect()
            }
            None => {
                self.set_status("need at least one row");
                vec![]
            }
        }
    }

    fn toggle_recording(&mut self) -> Vec<AudioCommand> {
        self.recording = !self.recording;
        if self.recording {
            info!("recording started");
            self.set_status("recording");
            vec![AudioCommand::StartCapture]
        } else {
            info!("recording stopped");
            self.set_status("saving take");
            vec![AudioCommand::StopCapture]
        }
    }

    fn assign_sample(&mut self, row: usize, index: usize) -> Vec<AudioCommand> {
        if row >= self.state.grid.num_rows() {
            return vec![];
        }
        let Some(path) = self.library.get(index).cloned() else {
            self.set_status("no sample selected");
            return vec![];
        };
        let (id, buffer) = match sample_loader::load(&path, self.sample_rate) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("could not load {}: {e:#}", path.display());
                self.set_status("load failed");
                return vec![];
            }
        };

        let sound = RowSound {
            sample_path: path.to_string_lossy().into_owned(),
            sample_id: Some(id),
        };
        let label = sound.label();
        let replaced = self.state.assign_sound(row, sound);
        info!("row {row} -> {} as {id}", path.display());
        self.set_status(format!("row {} = {label}", row + 1));

        let mut cmds = vec![AudioCommand::RegisterSample { id, buffer }];
        if let Some(old) = replaced.and_then(|s| s.sample_id) {
            cmds.push(AudioCommand::ReleaseSample(old));
        }
        cmds
    }

    // Re-register the samples a loaded project points at
    pub fn load_saved_sounds(&mut self) -> Vec<AudioCommand> {
        let mut cmds = Vec::new();
        for (row, sound) in self.state.sounds.iter_mut() {
            if sound.is_loaded() {
                continue;
            }
            let path = Path::new(&sound.sample_path);
            match sample_loader::load(path, self.sample_rate) {
                Ok((id, buffer)) => {
                    debug!("row {row}: reloaded {} as {id}", path.display());
                    sound.sample_id = Some(id);
                    cmds.push(AudioCommand::RegisterSample { id, buffer });
                }
                Err(e) => warn!("row {row}: could not reload {}: {e:#}", path.display()),
            }
        }
        cmds
    }

    /// Write a finished take as the next numbered recording and rescan.
    pub fn on_recording_complete(&mut self, buffer: &SampleBuffer) -> anyhow::Result<Option<PathBuf>> {
        if buffer.is_empty() {
            warn!("recording finished with no audio");
            self.set_status("nothing recorded");
            return Ok(None);
        }
        std::fs::create_dir_all(&self.samples_dir)?;
        let path = sample_loader::next_recording_path(&self.samples_dir)?;
        buffer.save_wav(&path, self.sample_rate)?;
        info!(
            "saved {:.2}s take to {}",
            buffer.duration_secs(self.sample_rate),
            path.display()
        );
        self.refresh_library();
        self.set_status(format!("saved {}", file_label(&path)));
        Ok(Some(path))
    }

    pub fn refresh_library(&mut self) {
        self.library = match sample_loader::index_wav_in_dir(&self.samples_dir) {
            Ok(paths) => paths,
            Err(e) => {
                debug!("cannot list {}: {e}", self.samples_dir.display());
                Vec::new()
            }
        };
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
    }

    pub fn display_state(&self) -> DisplayState {
        let active = self.transport.active_step().map(|s| s as usize);
        let rows = self
            .state
            .grid
            .rows()
            .iter()
            .map(|row| {
                std::array::from_fn::<_, STEPS_PER_ROW, _>(|col| match (row.steps[col], active == Some(col)) {
                    (true, true) => LedState::OnHigh,
                    (true, false) => LedState::OnMedium,
                    (false, _) => LedState::Off,
                })
            })
            .collect();
        let row_labels = (0..self.state.grid.num_rows())
            .map(|row| match self.state.sounds.get(&row) {
                Some(sound) => sound.label(),
                None => format!("tone {}", row_note(row)),
            })
            .collect();

        DisplayState {
            rows,
            row_labels,
            playing_step: self.transport.active_step(),
            playing: self.transport.is_playing(),
            recording: self.recording,
            bpm: self.state.bpm,
            library: self.library.iter().map(|p| file_label(p)).collect(),
            display_text: self.status.clone(),
        }
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SampleId, StereoFrame};
    use crate::config::TickConfig;
    use crate::pipeline::persistence::{load_project, save_project};
    use crate::shared::{MAX_BPM, MIN_BPM};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stepgrid-middle-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn middle_with(state: ProjectState, dir: &Path) -> Middle {
        let config = Config {
            tick: TickConfig::Fixed { millis: 125 },
            ..Config::default()
        };
        Middle::new(state, &config, dir, 8000)
    }

    fn middle_in(dir: &Path) -> Middle {
        middle_with(ProjectState::default(), dir)
    }

    fn triggered_rows(cmds: &[AudioCommand]) -> Vec<usize> {
        cmds.iter()
            .filter_map(|c| match c {
                AudioCommand::Trigger(t) => Some(t.row),
                _ => None,
            })
            .collect()
    }

    fn toggle(m: &mut Middle, row: usize, col: usize) {
        m.handle_input(InputEvent::ToggleStep { row, col });
    }

    #[test]
    fn first_tick_plays_active_rows_at_step_zero() {
        let dir = scratch_dir("tick");
        let mut m = middle_in(&dir);
        m.handle_input(InputEvent::AddRow);
        toggle(&mut m, 0, 0);
        toggle(&mut m, 1, 0);
        toggle(&mut m, 1, 1);

        m.handle_input(InputEvent::PlayPress);
        let cmds = m.tick(0.0);
        assert_eq!(triggered_rows(&cmds), vec![0, 1]);
        assert_eq!(
            cmds[1],
            AudioCommand::Trigger(TriggerParams {
                row: 1,
                sound: TriggerSound::Tone { note: 37 },
                gain: Config::default().tone_gain,
            })
        );

        assert_eq!(triggered_rows(&m.tick(0.125)), vec![1]);
        assert!(m.tick(0.125).is_empty());
    }

    #[test]
    fn turning_a_step_off_silences_only_that_row() {
        let dir = scratch_dir("off");
        let mut m = middle_in(&dir);
        m.handle_input(InputEvent::AddRow);
        toggle(&mut m, 0, 0);
        toggle(&mut m, 1, 0);
        toggle(&mut m, 0, 0);

        m.handle_input(InputEvent::PlayPress);
        assert_eq!(triggered_rows(&m.tick(0.0)), vec![1]);
    }

    #[test]
    fn stop_clears_highlight_and_silences() {
        let dir = scratch_dir("stop");
        let mut m = middle_in(&dir);
        toggle(&mut m, 0, 0);
        m.handle_input(InputEvent::PlayPress);
        m.tick(0.0);

        let ds = m.display_state();
        assert_eq!(ds.playing_step, Some(0));
        assert_eq!(ds.rows[0][0], LedState::OnHigh);

        assert_eq!(m.handle_input(InputEvent::PlayPress), vec![AudioCommand::StopAll]);
        let ds = m.display_state();
        assert!(!ds.playing);
        assert_eq!(ds.playing_step, None);
        assert_eq!(ds.rows[0][0], LedState::OnMedium);
        assert!(m.tick(1.0).is_empty());
    }

    #[test]
    fn tempo_events_are_clamped() {
        let dir = scratch_dir("tempo");
        let mut m = middle_in(&dir);
        m.handle_input(InputEvent::SetBpm(1.0));
        assert_eq!(m.display_state().bpm, MIN_BPM);
        m.handle_input(InputEvent::AdjustBpm(10.0));
        assert_eq!(m.display_state().bpm, MIN_BPM + 10.0);
        m.handle_input(InputEvent::SetBpm(999.0));
        assert_eq!(m.display_state().bpm, MAX_BPM);
    }

    #[test]
    fn tempo_changes_reach_a_running_loop() {
        let dir = scratch_dir("live-tempo");
        let mut m = Middle::new(ProjectState::default(), &Config::default(), &dir, 8000);
        for col in 0..3 {
            toggle(&mut m, 0, col);
        }
        m.handle_input(InputEvent::PlayPress);
        assert_eq!(triggered_rows(&m.tick(0.0)), vec![0]);

        // 60 BPM doubles the sixteenth to 0.25s
        m.handle_input(InputEvent::SetBpm(60.0));
        assert!(m.tick(0.125).is_empty());
        assert_eq!(triggered_rows(&m.tick(0.125)), vec![0]);
        assert_eq!(m.display_state().playing_step, Some(1));

        m.handle_input(InputEvent::AdjustBpm(60.0));
        assert_eq!(triggered_rows(&m.tick(0.125)), vec![0]);
        assert_eq!(m.display_state().playing_step, Some(2));
    }

    #[test]
    fn saved_project_plays_its_grid() {
        let dir = scratch_dir("saved-grid");
        let mut state = ProjectState::default();
        state.grid.add_row();
        state.grid.add_row();
        state.grid.toggle(0, 0);
        state.grid.toggle(2, 0);
        state.grid.toggle(1, 1);
        save_project(&dir, &state).unwrap();

        let mut m = middle_with(load_project(&dir).unwrap(), &dir);
        m.handle_input(InputEvent::PlayPress);
        assert_eq!(triggered_rows(&m.tick(0.0)), vec![0, 2]);
        assert_eq!(triggered_rows(&m.tick(0.125)), vec![1]);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn removing_a_row_drops_its_steps_and_sample() {
        let dir = scratch_dir("remove");
        let mut m = middle_in(&dir);
        m.handle_input(InputEvent::AddRow);
        toggle(&mut m, 1, 0);
        m.state.sounds.insert(1, RowSound { sample_path: "x.wav".into(), sample_id: Some(SampleId(42)) });

        let cmds = m.handle_input(InputEvent::RemoveRow);
        assert_eq!(cmds, vec![AudioCommand::ReleaseSample(SampleId(42))]);
        assert_eq!(m.display_state().rows.len(), 1);

        // re-added row starts empty
        m.handle_input(InputEvent::AddRow);
        m.handle_input(InputEvent::PlayPress);
        assert!(m.tick(0.0).is_empty());

        // the last row cannot go
        m.handle_input(InputEvent::RemoveRow);
        assert!(m.handle_input(InputEvent::RemoveRow).is_empty());
        assert_eq!(m.state.grid.num_rows(), 1);
    }

    #[test]
    fn recorded_take_becomes_an_assignable_sample() {
        let dir = scratch_dir("record");
        let mut m = middle_in(&dir);

        assert_eq!(m.handle_input(InputEvent::RecordPress), vec![AudioCommand::StartCapture]);
        assert!(m.display_state().recording);
        assert_eq!(m.handle_input(InputEvent::RecordPress), vec![AudioCommand::StopCapture]);

        let take = SampleBuffer::from_frames(vec![StereoFrame::mono(0.3); 400]);
        let path = m.on_recording_complete(&take).unwrap().unwrap();
        assert_eq!(path, dir.join("recording1.wav"));
        assert_eq!(m.display_state().library, vec!["recording1.wav".to_string()]);

        let second = m.on_recording_complete(&take).unwrap().unwrap();
        assert_eq!(second, dir.join("recording2.wav"));

        let cmds = m.handle_input(InputEvent::AssignSample { row: 0, index: 0 });
        let Some(AudioCommand::RegisterSample { id, buffer }) = cmds.first() else {
            panic!("expected a registration, got {cmds:?}");
        };
        assert_eq!(buffer.len(), 400);
        assert_eq!(m.display_state().row_labels[0], "recording1.wav");

        toggle(&mut m, 0, 0);
        m.handle_input(InputEvent::PlayPress);
        let cmds = m.tick(0.0);
        assert_eq!(
            cmds,
            vec![AudioCommand::Trigger(TriggerParams {
                row: 0,
                sound: TriggerSound::Sample(*id),
                gain: Config::default().sample_gain,
            })]
        );

        // reassigning releases the previous handle
        let cmds = m.handle_input(InputEvent::AssignSample { row: 0, index: 1 });
        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[1], AudioCommand::ReleaseSample(*id));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn late_take_does_not_end_the_next_recording() {
        let dir = scratch_dir("late-take");
        let mut m = middle_in(&dir);
        m.handle_input(InputEvent::RecordPress);
        m.handle_input(InputEvent::RecordPress);
        assert_eq!(m.handle_input(InputEvent::RecordPress), vec![AudioCommand::StartCapture]);

        // the first take lands after the second one started
        let take = SampleBuffer::from_frames(vec![StereoFrame::mono(0.2); 50]);
        m.on_recording_complete(&take).unwrap();
        assert!(m.display_state().recording);
        assert_eq!(m.handle_input(InputEvent::RecordPress), vec![AudioCommand::StopCapture]);
        assert!(!m.is_recording());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_take_is_not_saved() {
        let dir = scratch_dir("empty");
        let mut m = middle_in(&dir);
        m.handle_input(InputEvent::RecordPress);
        m.handle_input(InputEvent::RecordPress);
        assert_eq!(m.on_recording_complete(&SampleBuffer::default()).unwrap(), None);
        assert!(m.display_state().library.is_empty());
    }

    #[test]
    fn missing_library_entry_does_nothing() {
        let dir = scratch_dir("missing");
        let mut m = middle_in(&dir);
        assert!(m.handle_input(InputEvent::AssignSample { row: 0, index: 3 }).is_empty());
        assert!(m.state.sounds.is_empty());
    }

    #[test]
    fn saved_sounds_are_reregistered() {
        let dir = scratch_dir("reload");
        let path = dir.join("snare.wav");
        SampleBuffer::from_frames(vec![StereoFrame::mono(0.1); 10]).save_wav(&path, 8000).unwrap();

        let mut state = ProjectState::default();
        state.sounds.insert(0, RowSound { sample_path: path.to_string_lossy().into_owned(), sample_id: None });
        let mut m = Middle::new(state, &Config::default(), &dir, 8000);

        let cmds = m.load_saved_sounds();
        assert_eq!(cmds.len(), 1);
        assert!(m.state.sounds[&0].is_loaded());
        // already loaded: nothing more to do
        assert!(m.load_saved_sounds().is_empty());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn preview_plays_row_sound_without_transport() {
        let dir = scratch_dir("preview");
        let mut m = middle_in(&dir);
        assert_eq!(triggered_rows(&m.handle_input(InputEvent::PreviewRow(0))), vec![0]);
        assert!(m.handle_input(InputEvent::PreviewRow(7)).is_empty());
        assert!(!m.display_state().playing);
    }
}
