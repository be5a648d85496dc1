use crate::domain::TaskId;
use dirs::config_dir;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use walkdir::WalkDir;

pub const TASKS_DIR_ENV: &str = "ROO_TASKS_DIR";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScanWarningCount(usize);

impl From<usize> for ScanWarningCount {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl ScanWarningCount {
    pub fn get(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("tasks directory does not exist: {0}")]
    TasksDirMissing(String),
}

#[derive(Debug, Error)]
pub enum ResolveTasksDirError {
    #[error("config directory not found (set {TASKS_DIR_ENV} or pass --tasks-dir)")]
    ConfigDirNotFound,
}

/// `ROO_TASKS_DIR` if set, else the Roo Cline extension storage under the editor's config dir
/// (`~/Library/Application Support` on macOS, `~/.config` on Linux).
pub fn resolve_tasks_dir() -> Result<PathBuf, ResolveTasksDirError> {
    if let Some(override_dir) = std::env::var_os(TASKS_DIR_ENV) {
        return Ok(PathBuf::from(override_dir));
    }

    let Some(config) = config_dir() else {
        return Err(ResolveTasksDirError::ConfigDirNotFound);
    };

    Ok(config
        .join("Code")
        .join("User")
        .join("globalStorage")
        .join("rooveterinaryinc.roo-cline")
        .join("tasks"))
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskDirEntry {
    pub id: TaskId,
    pub modified: Option<SystemTime>,
}

#[derive(Clone, Debug)]
pub struct ScanOutput {
    pub entries: Vec<TaskDirEntry>,
    pub warnings: ScanWarningCount,
}

/// Immediate sub-directories of `tasks_dir`, newest first. Entries whose metadata cannot be read
/// are kept and sort last.
pub fn scan_tasks_dir(tasks_dir: &Path) -> Result<ScanOutput, ScanError> {
    if !tasks_dir.is_dir() {
        return Err(ScanError::TasksDirMissing(tasks_dir.display().to_string()));
    }

    let mut warnings = 0usize;
    let mut entries: Vec<TaskDirEntry> = Vec::new();

    let walker = WalkDir::new(tasks_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(%error, "failed to read tasks directory entry");
                warnings += 1;
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        let modified = match entry.metadata() {
            Ok(metadata) => metadata.modified().ok(),
            Err(error) => {
                tracing::debug!(path = %entry.path().display(), %error, "task dir metadata unavailable");
                None
            }
        };

        entries.push(TaskDirEntry {
            id: TaskId::new(entry.file_name().to_string_lossy().to_string()),
            modified,
        });
    }

    entries.sort_by(newest_first);

    Ok(ScanOutput {
        entries,
        warnings: ScanWarningCount::from(warnings),
    })
}

fn newest_first(a: &TaskDirEntry, b: &TaskDirEntry) -> Ordering {
    let a_time = a.modified.unwrap_or(SystemTime::UNIX_EPOCH);
    let b_time = b.modified.unwrap_or(SystemTime::UNIX_EPOCH);
    b_time
        .cmp(&a_time)
        .then_with(|| a.id.as_str().cmp(b.id.as_str()))
}
