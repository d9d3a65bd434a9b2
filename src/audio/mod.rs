use std::collections::VecDeque;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use log::{error, info, warn};

use crate::audio_api::{AudioCommand, CompletedRecording};

mod capture;
mod engine;
mod frame;
mod sample_buffer;
mod sample_id;
mod voice;

pub use frame::StereoFrame;
pub use sample_buffer::SampleBuffer;
pub use sample_id::{SampleId, next_sample_id};

use capture::Capture;
use engine::Engine;

// enough for any block size a host is likely to hand us
const SCRATCH_FRAMES: usize = 8192;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    capture: Capture,
    completed: VecDeque<CompletedRecording>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
    _input_stream: Option<cpal::Stream>, // None when no mic available
}

impl AudioHandle {
    // Capture commands are served here on the UI thread; the rest go to the engine
    pub fn send(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::StartCapture => self.capture.start(),
            AudioCommand::StopCapture => {
                if let Some(buffer) = self.capture.stop() {
                    self.completed.push_back(CompletedRecording { buffer });
                }
            }
            cmd => {
                if self.tx.try_send(cmd).is_err() {
                    warn!("audio command queue full, command dropped");
                }
            }
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn has_input(&self) -> bool {
        self.capture.has_input()
    }

    // Also keeps the mic queue drained; call once per frame
    pub fn poll_completed_recording(&mut self) -> Option<CompletedRecording> {
        self.capture.drain();
        self.completed.pop_front()
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(1024);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    let (input_tx, input_rx) = crossbeam_channel::bounded::<Vec<StereoFrame>>(2048);

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let engine = Engine::new(sample_rate);
            let output_stream = build_output_stream_f32(&device, &config.into(), rx, engine, channels)?;
            output_stream.play().context("failed to play output stream")?;
            info!("audio output running at {sample_rate} Hz, {channels} channels");

            let input_stream = try_build_input_stream(&host, sample_rate, input_tx);
            let capture = Capture::new(input_stream.as_ref().map(|_| input_rx));

            Ok(AudioHandle {
                tx,
                capture,
                completed: VecDeque::new(),
                sample_rate,
                _output_stream: output_stream,
                _input_stream: input_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    mut engine: Engine,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut scratch = vec![StereoFrame::zero(); SCRATCH_FRAMES];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels.max(1);
            if scratch.len() < n_frames {
                scratch.resize(n_frames, StereoFrame::zero());
            }
            let frames = &mut scratch[..n_frames];
            engine.render_block(frames);

            // interleave back out; mono gets the average, extra channels stay silent
            for (out, f) in data.chunks_exact_mut(channels.max(1)).zip(frames.iter()) {
                match out {
                    [m] => *m = 0.5 * (f.left + f.right),
                    [l, r, rest @ ..] => {
                        *l = f.left;
                        *r = f.right;
                        rest.fill(0.0);
                    }
                    [] => {}
                }
            }
        },
        |err| error!("audio output stream error: {err}"),
        None,
    )?;

    Ok(stream)
}

fn try_build_input_stream(
    host: &cpal::Host,
    target_sample_rate: u32,
    tx: Sender<Vec<StereoFrame>>,
) -> Option<cpal::Stream> {
    let Some(device) = host.default_input_device() else {
        warn!("no default input device, recording disabled");
        return None;
    };

    let supported = device.default_input_config().ok()?;
    let mut stream_config: cpal::StreamConfig = supported.into();
    stream_config.sample_rate = target_sample_rate;

    let in_channels = (stream_config.channels as usize).max(1);

    let stream = match device.build_input_stream(
        &stream_config,
        move |data: &[f32], _info: &cpal::InputCallbackInfo| {
            let frames: Vec<StereoFrame> = data
                .chunks_exact(in_channels)
                .map(StereoFrame::from_interleaved)
                .collect();
            let _ = tx.try_send(frames);
        },
        |err| error!("audio input stream error: {err}"),
        None,
    ) {
        Ok(s) => s,
        Err(e) => {
            warn!("could not open input stream: {e}");
            return None;
        }
    };

    if let Err(e) = stream.play() {
        warn!("could not start input stream: {e}");
        return None;
    }

    Some(stream)
}
