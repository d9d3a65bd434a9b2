use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::sample_id::SampleId;

// One-shot playback of a registered buffer. The engine keeps at most one
// live voice per row, like a player node per lane.
#[derive(Clone, Debug)]
pub struct SampleVoice {
    pub row: usize,
    pub sample_id: SampleId,
    pub gain: f32,
    pub active: bool,
    pos: usize,
}

impl SampleVoice {
    pub fn new(row: usize, sample_id: SampleId, gain: f32) -> Self {
        Self {
            row,
            sample_id,
            gain,
            active: true,
            pos: 0,
        }
    }

    pub fn render_into(&mut self, buffer: &SampleBuffer, out: &mut [StereoFrame]) {
        if !self.active {
            return;
        }
        for frame in out.iter_mut() {
            let Some(sample) = buffer.data.get(self.pos) else {
                self.active = false;
                return;
            };
            frame.add_scaled(*sample, self.gain);
            self.pos += 1;
        }
    }
}

// Decaying sine, the stand-in instrument for rows with no sample mapped
#[derive(Clone, Copy, Debug)]
pub struct ToneVoice {
    phase: f32,
    phase_inc: f32,
    amp: f32,
    decay: f32,
    pub alive: bool,
}

impl ToneVoice {
    pub const SILENT: ToneVoice = ToneVoice {
        phase: 0.0,
        phase_inc: 0.0,
        amp: 0.0,
        decay: 1.0,
        alive: false,
    };

    pub fn new(note: u8, gain: f32, sample_rate: f32) -> Self {
        let freq = note_to_freq(note);
        Self {
            phase: 0.0,
            phase_inc: (std::f32::consts::TAU * freq) / sample_rate,
            amp: gain,
            // roughly -60dB after a quarter second regardless of rate
            decay: (0.001f32).powf(1.0 / (0.25 * sample_rate)),
            alive: true,
        }
    }

    pub fn render_into(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            if !self.alive {
                return;
            }
            frame.add_scaled(StereoFrame::mono(self.phase.sin()), self.amp);
            self.phase += self.phase_inc;
            if self.phase > std::f32::consts::TAU {
                self.phase -= std::f32::consts::TAU;
            }
            self.amp *= self.decay;
            if self.amp < 0.0005 {
                self.alive = false;
            }
        }
    }
}

pub fn note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}
