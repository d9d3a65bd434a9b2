// Project file, read on startup and written on quit
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::{debug, warn};

use crate::pipeline::project::ProjectState;

pub const STATE_DIR: &str = ".stepgrid";
const PROJECT_FILE: &str = "project.json";

// <project_dir>/.stepgrid/project.json
fn project_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(STATE_DIR).join(PROJECT_FILE)
}

// Missing file is not an error; a corrupt one is logged and ignored
pub fn load_project(project_dir: &Path) -> Option<ProjectState> {
    let path = project_file_path(project_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str::<ProjectState>(&data) {
        Ok(mut state) => {
            state.normalize();
            debug!("loaded project from {}", path.display());
            Some(state)
        }
        Err(e) => {
            warn!("ignoring unreadable project file {}: {e}", path.display());
            None
        }
    }
}

pub fn save_project(project_dir: &Path, state: &ProjectState) -> anyhow::Result<()> {
    let path = project_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    debug!("saved project to {}", path.display());
    Ok(())
}
