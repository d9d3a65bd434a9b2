use crossbeam_channel::Receiver;

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;

// Collects microphone blocks into a take. Lives on the UI thread so the
// audio callbacks never grow a buffer; input that arrives while no take is
// running is drained and dropped.
pub struct Capture {
    input_rx: Option<Receiver<Vec<StereoFrame>>>,
    take: Option<Vec<StereoFrame>>,
}

impl Capture {
    pub fn new(input_rx: Option<Receiver<Vec<StereoFrame>>>) -> Self {
        Self { input_rx, take: None }
    }

    pub fn has_input(&self) -> bool {
        self.input_rx.is_some()
    }

    pub fn start(&mut self) {
        self.drain();
        self.take = Some(Vec::new());
    }

    // None when no take was running
    pub fn stop(&mut self) -> Option<SampleBuffer> {
        self.drain();
        self.take.take().map(SampleBuffer::from_frames)
    }

    pub fn drain(&mut self) {
        let Some(rx) = &self.input_rx else {
            return;
        };
        while let Ok(frames) = rx.try_recv() {
            if let Some(take) = self.take.as_mut() {
                take.extend_from_slice(&frames);
            }
        }
    }
}
