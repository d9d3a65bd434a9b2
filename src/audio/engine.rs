use std::collections::HashMap;

use crate::audio_api::{AudioCommand, TriggerParams, TriggerSound};

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::sample_id::SampleId;
use super::voice::{SampleVoice, ToneVoice};

const MAX_SAMPLE_VOICES: usize = 32; // one per row at most
const MAX_TONE_VOICES: usize = 16;

// Everything the audio callback touches. Lives on the audio thread; the UI
// talks to it only through AudioCommands.
pub struct Engine {
    sample_rate: f32,
    samples: HashMap<SampleId, SampleBuffer>,
    voices: Vec<SampleVoice>,
    tones: [ToneVoice; MAX_TONE_VOICES],
    next_tone: usize,
}

impl Engine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f32,
            samples: HashMap::with_capacity(MAX_SAMPLE_VOICES * 2),
            voices: Vec::with_capacity(MAX_SAMPLE_VOICES),
            tones: [ToneVoice::SILENT; MAX_TONE_VOICES],
            next_tone: 0,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::RegisterSample { id, buffer } => {
                self.samples.insert(id, buffer);
            }
            AudioCommand::ReleaseSample(id) => {
                self.voices.retain(|v| v.sample_id != id);
                self.samples.remove(&id);
            }
            AudioCommand::Trigger(t) => self.trigger(t),
            AudioCommand::StopAll => {
                self.voices.clear();
                self.tones = [ToneVoice::SILENT; MAX_TONE_VOICES];
            }
            // takes are assembled on the UI side, see capture.rs
            AudioCommand::StartCapture | AudioCommand::StopCapture => {}
        }
    }

    fn trigger(&mut self, t: TriggerParams) {
        match t.sound {
            TriggerSound::Sample(id) => {
                if !self.samples.contains_key(&id) {
                    return;
                }
                let voice = SampleVoice::new(t.row, id, t.gain);
                // retriggering a row restarts it
                if let Some(existing) = self.voices.iter_mut().find(|v| v.row == t.row) {
                    *existing = voice;
                } else if self.voices.len() < MAX_SAMPLE_VOICES {
                    self.voices.push(voice);
                } else {
                    self.voices[0] = voice;
                }
            }
            TriggerSound::Tone { note } => {
                let slot = self
                    .tones
                    .iter()
                    .position(|v| !v.alive)
                    .unwrap_or(self.next_tone);
                self.tones[slot] = ToneVoice::new(note, t.gain, self.sample_rate);
                self.next_tone = (slot + 1) % MAX_TONE_VOICES;
            }
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());

        for voice in self.voices.iter_mut() {
            if let Some(buffer) = self.samples.get(&voice.sample_id) {
                voice.render_into(buffer, out);
            } else {
                voice.active = false;
            }
        }
        self.voices.retain(|v| v.active);

        for tone in self.tones.iter_mut().filter(|t| t.alive) {
            tone.render_into(out);
        }

        for f in out.iter_mut() {
            *f = f.clamped();
        }
    }
}
