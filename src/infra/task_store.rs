use super::{
    LoadTaskFileError, ScanError, file_size_bytes, read_json_file, scan_tasks_dir,
};
use crate::domain::{
    SourceKind, TaskId, TaskSummary, default_task_title, derive_task_title, first_message_text,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskStoreError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error(transparent)]
    File(#[from] LoadTaskFileError),
}

#[derive(Clone, Debug)]
pub struct TaskListing {
    pub tasks: Vec<TaskSummary>,
    pub warnings: usize,
    pub notice: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TranscriptFile {
    pub kind: SourceKind,
    pub size_bytes: Option<u64>,
}

impl TranscriptFile {
    pub fn exists(&self) -> bool {
        self.size_bytes.is_some()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskOverview {
    pub id: TaskId,
    pub title: String,
    /// Untruncated text of the first UI message; empty when there is none.
    pub full_text: String,
    pub files: Vec<TranscriptFile>,
    pub default_file: Option<SourceKind>,
}

/// Read-only view over a Roo tasks directory. Every call re-reads the disk.
#[derive(Clone, Debug)]
pub struct TaskStore {
    tasks_dir: PathBuf,
}

impl TaskStore {
    pub fn new(tasks_dir: PathBuf) -> Self {
        Self { tasks_dir }
    }

    pub fn tasks_dir(&self) -> &Path {
        &self.tasks_dir
    }

    pub fn task_dir(&self, id: &TaskId) -> PathBuf {
        self.tasks_dir.join(id.as_str())
    }

    pub fn transcript_path(&self, id: &TaskId, kind: SourceKind) -> PathBuf {
        self.task_dir(id).join(kind.file_name())
    }

    /// Task candidates with titles, newest first. A missing tasks dir is an empty listing.
    pub fn list_tasks(&self) -> TaskListing {
        let output = match scan_tasks_dir(&self.tasks_dir) {
            Ok(output) => output,
            Err(ScanError::TasksDirMissing(path)) => {
                tracing::debug!(%path, "tasks directory missing");
                return TaskListing {
                    tasks: Vec::new(),
                    warnings: 0,
                    notice: Some(format!("Tasks dir not found: {path}")),
                };
            }
        };

        let tasks = output
            .entries
            .into_iter()
            .map(|entry| TaskSummary {
                title: self.task_title(&entry.id),
                id: entry.id,
                modified: entry.modified,
            })
            .collect();

        TaskListing {
            tasks,
            warnings: output.warnings.get(),
            notice: None,
        }
    }

    pub fn task_title(&self, id: &TaskId) -> String {
        self.first_message(id)
            .as_deref()
            .and_then(derive_task_title)
            .unwrap_or_else(|| default_task_title(id))
    }

    pub fn load_task(&self, id: &TaskId) -> Result<TaskOverview, TaskStoreError> {
        if !self.task_dir(id).is_dir() {
            return Err(TaskStoreError::TaskNotFound(id.clone()));
        }

        let full_text = self.first_message(id).unwrap_or_default();
        let title = derive_task_title(&full_text).unwrap_or_else(|| default_task_title(id));
        let files = SourceKind::ALL
            .into_iter()
            .map(|kind| TranscriptFile {
                kind,
                size_bytes: file_size_bytes(&self.transcript_path(id, kind)),
            })
            .collect::<Vec<_>>();
        let default_file = files
            .iter()
            .find(|file| file.exists())
            .map(|file| file.kind);

        Ok(TaskOverview {
            id: id.clone(),
            title,
            full_text,
            files,
            default_file,
        })
    }

    pub fn read_document(&self, id: &TaskId, kind: SourceKind) -> Result<Value, TaskStoreError> {
        if !self.task_dir(id).is_dir() {
            return Err(TaskStoreError::TaskNotFound(id.clone()));
        }
        Ok(read_json_file(&self.transcript_path(id, kind))?)
    }

    fn first_message(&self, id: &TaskId) -> Option<String> {
        let path = self.transcript_path(id, SourceKind::UiMessages);
        match read_json_file(&path) {
            Ok(document) => first_message_text(&document),
            Err(LoadTaskFileError::NotFound { .. }) => None,
            Err(error) => {
                tracing::warn!(task = %id, %error, "failed to read task title");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_task(root: &Path, id: &str, files: &[(SourceKind, &str)]) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).expect("mkdir");
        for (kind, body) in files {
            fs::write(dir.join(kind.file_name()), body).expect("write");
        }
    }

    fn id(value: &str) -> TaskId {
        TaskId::new(value.to_string())
    }

    #[test]
    fn missing_tasks_dir_lists_nothing() {
        let dir = tempdir().expect("tempdir");
        let store = TaskStore::new(dir.path().join("tasks"));
        let listing = store.list_tasks();
        assert!(listing.tasks.is_empty());
        assert!(listing.notice.is_some());
    }

    #[test]
    fn titles_come_from_first_ui_message() {
        let dir = tempdir().expect("tempdir");
        write_task(
            dir.path(),
            "t1",
            &[(
                SourceKind::UiMessages,
                r#"[{"ts":1,"type":"say","say":"text","text":"  Build the parser \n"}]"#,
            )],
        );
        write_task(dir.path(), "t2", &[]);
        write_task(dir.path(), "t3", &[(SourceKind::UiMessages, "not json")]);

        let store = TaskStore::new(dir.path().to_path_buf());
        assert_eq!(store.task_title(&id("t1")), "Build the parser");
        assert_eq!(store.task_title(&id("t2")), "Task: t2");
        assert_eq!(store.task_title(&id("t3")), "Task: t3");

        let listing = store.list_tasks();
        assert_eq!(listing.tasks.len(), 3);
        assert_eq!(listing.warnings, 0);
    }

    #[test]
    fn overview_prefers_ui_messages_then_api_history() {
        let dir = tempdir().expect("tempdir");
        write_task(dir.path(), "both", &[
            (SourceKind::UiMessages, r#"[{"text":"hello"}]"#),
            (SourceKind::ApiHistory, "[]"),
        ]);
        write_task(dir.path(), "api", &[(SourceKind::ApiHistory, "[]")]);
        write_task(dir.path(), "none", &[]);
        let store = TaskStore::new(dir.path().to_path_buf());

        let overview = store.load_task(&id("both")).expect("load");
        assert_eq!(overview.title, "hello");
        assert_eq!(overview.full_text, "hello");
        assert_eq!(overview.default_file, Some(SourceKind::UiMessages));
        assert!(overview.files.iter().all(TranscriptFile::exists));

        let overview = store.load_task(&id("api")).expect("load");
        assert_eq!(overview.default_file, Some(SourceKind::ApiHistory));
        assert_eq!(overview.title, "Task: api");

        let overview = store.load_task(&id("none")).expect("load");
        assert_eq!(overview.default_file, None);
    }

    #[test]
    fn unknown_task_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let store = TaskStore::new(dir.path().to_path_buf());
        assert!(matches!(
            store.load_task(&id("ghost")),
            Err(TaskStoreError::TaskNotFound(_))
        ));
        assert!(matches!(
            store.read_document(&id("ghost"), SourceKind::UiMessages),
            Err(TaskStoreError::TaskNotFound(_))
        ));
    }

    #[test]
    fn read_document_distinguishes_missing_and_invalid_files() {
        let dir = tempdir().expect("tempdir");
        write_task(dir.path(), "t", &[(SourceKind::UiMessages, "{oops")]);
        let store = TaskStore::new(dir.path().to_path_buf());

        assert!(matches!(
            store.read_document(&id("t"), SourceKind::ApiHistory),
            Err(TaskStoreError::File(LoadTaskFileError::NotFound { .. }))
        ));
        assert!(matches!(
            store.read_document(&id("t"), SourceKind::UiMessages),
            Err(TaskStoreError::File(LoadTaskFileError::Parse { .. }))
        ));
    }
}
