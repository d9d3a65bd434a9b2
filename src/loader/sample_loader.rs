use std::path::{Path, PathBuf};

use crate::audio::{SampleBuffer, SampleId, next_sample_id};

const RECORDING_PREFIX: &str = "recording";

// Load a WAV from disk and give it a fresh handle, ready for RegisterSample
pub fn load(path: &Path, target_rate: u32) -> anyhow::Result<(SampleId, SampleBuffer)> {
    let buffer = SampleBuffer::load_wav(path, target_rate)?;
    Ok((next_sample_id(), buffer))
}

// All .wav files directly inside `dir`, sorted by file name
pub fn index_wav_in_dir(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_wav(p))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

// "recording12.wav" -> Some(12)
pub fn recording_number(path: &Path) -> Option<u32> {
    if !is_wav(path) {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(RECORDING_PREFIX)?
        .parse()
        .ok()
}

// Next free numbered take; numbering continues across sessions
pub fn next_recording_path(dir: &Path) -> anyhow::Result<PathBuf> {
    let highest = index_wav_in_dir(dir)?
        .iter()
        .filter_map(|p| recording_number(p))
        .max()
        .unwrap_or(0);
    Ok(dir.join(format!("{RECORDING_PREFIX}{}.wav", highest + 1)))
}
