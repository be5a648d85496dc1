use serde::Serialize;
use serde_json::Value;

/// Which transcript file inside a task directory a document came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    UiMessages,
    ApiHistory,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::UiMessages, SourceKind::ApiHistory];

    pub fn file_stem(self) -> &'static str {
        match self {
            Self::UiMessages => "ui_messages",
            Self::ApiHistory => "api_conversation_history",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::UiMessages => "ui_messages.json",
            Self::ApiHistory => "api_conversation_history.json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UiMessages => "UI Messages",
            Self::ApiHistory => "API Conversation History",
        }
    }

    pub fn from_file_stem(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.file_stem() == value || kind.file_name() == value)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStyle {
    User,
    Assistant,
}

impl MessageStyle {
    /// Binary split: anything that does not look like the human side is styled as the assistant.
    pub fn classify(role: &str) -> Self {
        let role = role.to_lowercase();
        if role.contains("user") || role.contains("human") {
            Self::User
        } else {
            Self::Assistant
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// How a field's value sits relative to its label.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldLayout {
    /// Short value on the same line as the label.
    Inline,
    /// Value starts below the label.
    Block,
    /// Value is a group of sub-fields, indented one level under the label.
    Nested,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayNode {
    Heading {
        text: String,
        level: u8,
    },
    Field {
        name: String,
        value: Box<DisplayNode>,
        layout: FieldLayout,
    },
    EmptyField {
        name: String,
    },
    LongText {
        text: String,
    },
    CodeBlock {
        text: String,
        language: String,
    },
    PlainText {
        text: String,
    },
    MarkdownBlock {
        text: String,
    },
    Message {
        role: String,
        style: MessageStyle,
        children: Vec<DisplayNode>,
    },
    Group {
        children: Vec<DisplayNode>,
    },
}

impl DisplayNode {
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::Heading {
            text: text.into(),
            level,
        }
    }

    pub fn field(name: &str, value: DisplayNode, layout: FieldLayout) -> Self {
        Self::Field {
            name: name.to_string(),
            value: Box::new(value),
            layout,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    /// Pretty-printed JSON with two-space indentation, key order and non-ASCII text preserved.
    pub fn json_block(value: &Value) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self::CodeBlock {
            text,
            language: "json".to_string(),
        }
    }

    pub fn children(&self) -> &[DisplayNode] {
        match self {
            Self::Message { children, .. } | Self::Group { children } => children,
            Self::Field { value, .. } => std::slice::from_ref(value.as_ref()),
            Self::Heading { .. }
            | Self::EmptyField { .. }
            | Self::LongText { .. }
            | Self::CodeBlock { .. }
            | Self::PlainText { .. }
            | Self::MarkdownBlock { .. } => &[],
        }
    }
}
