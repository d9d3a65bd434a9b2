use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::pipeline::persistence::STATE_DIR;
use crate::pipeline::transport::TickInterval;
use crate::shared::DEFAULT_BPM;

pub const CONFIG_ENV: &str = "STEPGRID_CONFIG";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "stepgrid.log";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TickConfig {
    Tempo,
    Fixed { millis: u64 },
}

impl From<TickConfig> for TickInterval {
    fn from(tick: TickConfig) -> Self {
        match tick {
            TickConfig::Tempo => TickInterval::Tempo,
            TickConfig::Fixed { millis } => TickInterval::Fixed(Duration::from_millis(millis)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tick: TickConfig,
    pub default_bpm: f32,
    pub initial_rows: usize,
    pub samples_dir: Option<PathBuf>, // relative paths resolve against the project dir
    pub log_file: Option<PathBuf>,
    pub sample_gain: f32,
    pub tone_gain: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick: TickConfig::Tempo,
            default_bpm: DEFAULT_BPM,
            initial_rows: 1,
            samples_dir: None,
            log_file: None,
            sample_gain: 0.8,
            tone_gain: 0.25,
        }
    }
}

impl Config {
    // $STEPGRID_CONFIG, else <project>/.stepgrid/config.json, else defaults
    pub fn load(project_dir: &Path) -> anyhow::Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| project_dir.join(STATE_DIR).join(CONFIG_FILE));
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(data: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn samples_dir(&self, project_dir: &Path) -> PathBuf {
        match &self.samples_dir {
            Some(dir) => project_dir.join(dir),
            None => project_dir.to_path_buf(),
        }
    }

    pub fn log_file(&self, project_dir: &Path) -> PathBuf {
        match &self.log_file {
            Some(file) => project_dir.join(file),
            None => project_dir.join(STATE_DIR).join(LOG_FILE),
        }
    }
}
