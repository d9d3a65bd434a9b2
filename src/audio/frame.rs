// One stereo frame; the engine mixes in these and interleaves on the way out
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn mono(s: f32) -> Self {
        Self { left: s, right: s }
    }

    // read one frame out of an interleaved slice with any channel count
    pub fn from_interleaved(chunk: &[f32]) -> Self {
        match chunk {
            [] => Self::zero(),
            [s] => Self::mono(*s),
            [l, r, ..] => Self { left: *l, right: *r },
        }
    }

    pub fn add_scaled(&mut self, other: StereoFrame, gain: f32) {
        self.left += other.left * gain;
        self.right += other.right * gain;
    }

    pub fn clamped(self) -> Self {
        Self {
            left: self.left.clamp(-1.0, 1.0),
            right: self.right.clamp(-1.0, 1.0),
        }
    }
}
