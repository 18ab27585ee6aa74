use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::model::CorpusEntry;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    #[error("empty path")]
    EmptyPath,
    #[error("path does not exist: {}", .0.display())]
    MissingPath(PathBuf),
    #[error("empty identifier")]
    EmptyIdentifier,
    #[error("failed to spawn {program}: {message}")]
    Spawn { program: String, message: String },
}

/// Fire-and-forget activation targets. Implementations must not block.
pub trait Activator: Send {
    fn activate_application(&self, entry: &CorpusEntry) -> Result<(), LaunchError>;
    fn open_settings_panel(&self, panel: &str) -> Result<(), LaunchError>;
    fn open_file(&self, path: &Path) -> Result<(), LaunchError>;
}

pub fn launch_path(path: &str) -> Result<PathBuf, LaunchError> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(LaunchError::EmptyPath);
    }

    let candidate = Path::new(trimmed);
    if !candidate.exists() {
        return Err(LaunchError::MissingPath(candidate.to_path_buf()));
    }

    Ok(candidate.to_path_buf())
}

/// Hands activation to the desktop's own launchers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemActivator;

impl Activator for SystemActivator {
    fn activate_application(&self, entry: &CorpusEntry) -> Result<(), LaunchError> {
        let id = entry.id.trim();
        let id = id.strip_suffix(".desktop").unwrap_or(id);
        if id.is_empty() {
            return Err(LaunchError::EmptyIdentifier);
        }
        spawn_detached("gtk-launch", &[id])
    }

    fn open_settings_panel(&self, panel: &str) -> Result<(), LaunchError> {
        let panel = panel.trim();
        if panel.is_empty() {
            return Err(LaunchError::EmptyIdentifier);
        }
        spawn_detached("gnome-control-center", &[panel])
    }

    fn open_file(&self, path: &Path) -> Result<(), LaunchError> {
        let path = launch_path(&path.to_string_lossy())?;
        spawn_detached("xdg-open", &[&path.to_string_lossy()])
    }
}

fn spawn_detached(program: &str, args: &[&str]) -> Result<(), LaunchError> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|error| LaunchError::Spawn {
            program: program.to_string(),
            message: error.to_string(),
        })
}
