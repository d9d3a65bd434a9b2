use crate::audio::{SampleBuffer, SampleId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TriggerSound {
    Sample(SampleId),
    Tone { note: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerParams {
    pub row: usize,
    pub sound: TriggerSound,
    pub gain: f32,
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The audio thread never touches the disk: buffers are loaded on the UI
    // side (see loader/sample_loader.rs) and handed over already decoded.
    RegisterSample { id: SampleId, buffer: SampleBuffer },
    ReleaseSample(SampleId),

    Trigger(TriggerParams),
    StopAll,

    // microphone capture; StopCapture hands the take back as a CompletedRecording
    StartCapture,
    StopCapture,
}

#[derive(Clone, Debug)]
pub struct CompletedRecording {
    pub buffer: SampleBuffer,
}

impl PartialEq for AudioCommand {
    // buffers are compared by id only; enough for asserting on command streams
    fn eq(&self, other: &Self) -> bool {
        use AudioCommand::*;
        match (self, other) {
            (RegisterSample { id: a, .. }, RegisterSample { id: b, .. }) => a == b,
            (ReleaseSample(a), ReleaseSample(b)) => a == b,
            (Trigger(a), Trigger(b)) => a == b,
            (StopAll, StopAll) | (StartCapture, StartCapture) | (StopCapture, StopCapture) => true,
            _ => false,
        }
    }
}
