use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadTaskFileError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },

    /// `raw` holds the file text (lossily decoded) so callers can show it instead.
    #[error("invalid JSON in {path}: {source}")]
    Parse {
        path: String,
        raw: String,
        source: serde_json::Error,
    },
}

pub fn read_json_file(path: &Path) -> Result<Value, LoadTaskFileError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Err(LoadTaskFileError::NotFound {
                path: path.display().to_string(),
            });
        }
        Err(source) => {
            return Err(LoadTaskFileError::Read {
                path: path.display().to_string(),
                source,
            });
        }
    };

    serde_json::from_slice(&bytes).map_err(|source| LoadTaskFileError::Parse {
        path: path.display().to_string(),
        raw: String::from_utf8_lossy(&bytes).into_owned(),
        source,
    })
}

pub fn file_size_bytes(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_valid_json_in_key_order() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("ui_messages.json");
        fs::write(&path, r#"[{"ts":1,"type":"say","text":"hi"}]"#).expect("write");

        let value = read_json_file(&path).expect("read");
        let keys = value[0]
            .as_object()
            .expect("object")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["ts", "type", "text"]);
        assert_eq!(file_size_bytes(&path), Some(35));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("api_conversation_history.json");
        assert!(matches!(
            read_json_file(&path),
            Err(LoadTaskFileError::NotFound { .. })
        ));
        assert_eq!(file_size_bytes(&path), None);
    }

    #[test]
    fn invalid_json_keeps_raw_text() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("ui_messages.json");
        fs::write(&path, "[{\"ts\": 1,").expect("write");

        match read_json_file(&path) {
            Err(LoadTaskFileError::Parse { raw, .. }) => assert_eq!(raw, "[{\"ts\": 1,"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn directory_is_a_read_error() {
        let dir = tempdir().expect("tempdir");
        assert!(matches!(
            read_json_file(dir.path()),
            Err(LoadTaskFileError::Read { .. })
        ));
    }
}
