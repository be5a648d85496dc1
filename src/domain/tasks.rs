use serde_json::Value;
use std::fmt;
use std::time::SystemTime;
use thiserror::Error;

const MAX_TITLE_CHARS: usize = 300;
const FIRST_MESSAGE_KEYS: [&str; 3] = ["text", "content", "message"];

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TaskId(String);

#[derive(Debug, Error)]
#[error("invalid task id: {0:?}")]
pub struct InvalidTaskIdError(String);

impl TaskId {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Accepts user input only when it names a single directory entry. The value is kept
    /// verbatim, so directory names with surrounding whitespace stay reachable.
    pub fn parse(value: &str) -> Result<Self, InvalidTaskIdError> {
        let invalid = value.trim().is_empty()
            || value == "."
            || value == ".."
            || value.contains(['/', '\\', '\0']);
        if invalid {
            return Err(InvalidTaskIdError(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
    pub modified: Option<SystemTime>,
}

pub fn default_task_title(id: &TaskId) -> String {
    format!("Task: {id}")
}

/// Text of the first UI message, which doubles as the task prompt.
pub fn first_message_text(ui_messages: &Value) -> Option<String> {
    let first = ui_messages.as_array()?.first()?.as_object()?;
    FIRST_MESSAGE_KEYS
        .iter()
        .find_map(|key| first.get(*key).and_then(Value::as_str))
        .map(|text| text.trim().to_string())
}

pub fn derive_task_title(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() <= MAX_TITLE_CHARS {
        return Some(trimmed.to_string());
    }
    let mut title = trimmed
        .chars()
        .take(MAX_TITLE_CHARS - 3)
        .collect::<String>();
    title.push_str("...");
    Some(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_rejects_paths_and_dots() {
        assert!(TaskId::parse("").is_err());
        assert!(TaskId::parse("..").is_err());
        assert!(TaskId::parse("../etc").is_err());
        assert!(TaskId::parse("a\\b").is_err());
        assert!(TaskId::parse("   ").is_err());
        let id = TaskId::parse("1c2d-uuid").expect("valid");
        assert_eq!(id.as_str(), "1c2d-uuid");
    }

    #[test]
    fn parse_keeps_surrounding_whitespace() {
        let id = TaskId::parse(" spaced task ").expect("valid");
        assert_eq!(id.as_str(), " spaced task ");
    }

    #[test]
    fn first_message_text_prefers_text_key() {
        let doc = json!([{ "content": "c", "text": "  prompt \n" }, { "text": "later" }]);
        assert_eq!(first_message_text(&doc), Some("prompt".to_string()));
    }

    #[test]
    fn first_message_text_skips_non_string_keys() {
        let doc = json!([{ "text": 5, "message": "from message" }]);
        assert_eq!(first_message_text(&doc), Some("from message".to_string()));
        assert_eq!(first_message_text(&json!({ "text": "x" })), None);
        assert_eq!(first_message_text(&json!(["x"])), None);
        assert_eq!(first_message_text(&json!([])), None);
    }

    #[test]
    fn derive_task_title_truncates_long_prompts() {
        let long = "a".repeat(301);
        let title = derive_task_title(&long).expect("title");
        assert_eq!(title.chars().count(), 300);
        assert!(title.ends_with("..."));

        let exact = "b".repeat(300);
        assert_eq!(derive_task_title(&exact), Some(exact.clone()));
    }

    #[test]
    fn derive_task_title_rejects_blank_text() {
        assert_eq!(derive_task_title(" \n\t"), None);
        assert_eq!(
            default_task_title(&TaskId::new("t1".to_string())),
            "Task: t1"
        );
    }
}
