use super::{DisplayNode, FieldLayout, MessageStyle, SourceKind};
use serde_json::{Map, Value};

/// Strings longer than this (in characters) render as scrollable long text.
pub const LONG_TEXT_CHARS: usize = 80;

/// Bound on `request`/`content` sub-field recursion; deeper objects are dumped as JSON.
pub const MAX_NESTED_FIELD_DEPTH: usize = 16;

const FALLBACK_PREVIEW_CHARS: usize = 100;

const ROLE_KEYS: [&str; 3] = ["role", "sender", "from"];
const CONTENT_KEYS: [&str; 3] = ["content", "message", "text"];
const NESTED_FIELD_KEYS: [&str; 2] = ["request", "content"];
const MARKDOWN_INDICATORS: [&str; 9] = ["#", "```", "*", "_", "- ", "1. ", "|", "[", "!["];

/// Renders one transcript file. Arrays whose first entry is an object are treated as a
/// transcript of role-tagged messages; anything else gets the generic structured view.
/// The result is never empty.
pub fn render_document(document: &Value, source: SourceKind) -> Vec<DisplayNode> {
    let mut nodes = render_transcript(document);
    if nodes.is_empty() {
        nodes = render_generic(document);
    }
    tracing::debug!(
        file = source.file_name(),
        nodes = nodes.len(),
        "rendered document"
    );
    nodes
}

/// Renders a single labeled attribute. Returns `None` only for an empty `images` array.
pub fn render_field(name: &str, value: &Value) -> Option<DisplayNode> {
    render_field_at(name, value, 0)
}

/// Renders the primary content of a transcript message. JSON embedded in a string is expanded
/// into fields; other strings are markdown or plain text.
pub fn render_content(value: &Value) -> DisplayNode {
    let Value::String(text) = value else {
        return DisplayNode::plain(string_form(value));
    };

    if looks_like_json_container(text) {
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::Object(map)) => {
                return DisplayNode::Group {
                    children: render_fields(&map),
                };
            }
            Ok(Value::Array(items)) => {
                return DisplayNode::Group {
                    children: render_content_items(&items),
                };
            }
            Ok(Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)) => {}
            Err(error) => {
                tracing::trace!(%error, "content looks like JSON but does not parse");
            }
        }
    }

    if is_markdown(text) {
        DisplayNode::MarkdownBlock { text: text.clone() }
    } else {
        DisplayNode::plain(text.clone())
    }
}

fn render_transcript(document: &Value) -> Vec<DisplayNode> {
    let Value::Array(entries) = document else {
        return Vec::new();
    };
    if !matches!(entries.first(), Some(Value::Object(_))) {
        return Vec::new();
    }

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let position = index + 1;
            match entry {
                Value::Object(message) => render_message(position, message),
                other => DisplayNode::Message {
                    role: "unknown".to_string(),
                    style: MessageStyle::Assistant,
                    children: vec![
                        DisplayNode::heading(format!("Message {position}: Unknown"), 4),
                        DisplayNode::json_block(other),
                    ],
                },
            }
        })
        .collect()
}

fn render_message(position: usize, message: &Map<String, Value>) -> DisplayNode {
    let role = ROLE_KEYS
        .iter()
        .find_map(|key| message.get(*key))
        .map(|value| string_form(value).to_lowercase())
        .unwrap_or_else(|| "unknown".to_string());
    let style = MessageStyle::classify(&role);
    let content_key = CONTENT_KEYS
        .iter()
        .copied()
        .find(|key| message.contains_key(*key));

    let mut children = vec![DisplayNode::heading(
        format!("Message {position}: {}", capitalize(&role)),
        4,
    )];
    children.extend(
        message
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != content_key)
            .filter_map(|(key, value)| render_field(key, value)),
    );

    let content = content_key
        .and_then(|key| message.get(key))
        .filter(|value| is_truthy(value));
    if let Some(content) = content {
        children.push(DisplayNode::heading("Content:", 5));
        children.push(render_content(content));
    }

    DisplayNode::Message {
        role,
        style,
        children,
    }
}

fn render_generic(document: &Value) -> Vec<DisplayNode> {
    match document {
        Value::Array(items) if items.is_empty() => vec![DisplayNode::json_block(document)],
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let mut children = vec![DisplayNode::heading(format!("Item {}", index + 1), 4)];
                match item {
                    Value::Object(map) => children.extend(render_fields(map)),
                    Value::Null
                    | Value::Bool(_)
                    | Value::Number(_)
                    | Value::String(_)
                    | Value::Array(_) => children.push(DisplayNode::json_block(item)),
                }
                DisplayNode::Group { children }
            })
            .collect(),
        Value::Object(map) => {
            let mut children = vec![DisplayNode::heading("JSON Object", 4)];
            children.extend(render_fields(map));
            vec![DisplayNode::Group { children }]
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            vec![DisplayNode::json_block(document)]
        }
    }
}

fn render_content_items(items: &[Value]) -> Vec<DisplayNode> {
    let mut nodes = Vec::new();
    for (index, item) in items.iter().enumerate() {
        nodes.push(DisplayNode::heading(format!("Item {}:", index + 1), 5));
        match item {
            Value::Object(map) => nodes.extend(render_fields(map)),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Array(_) => {
                nodes.push(DisplayNode::json_block(item));
            }
        }
    }
    nodes
}

fn render_fields(map: &Map<String, Value>) -> Vec<DisplayNode> {
    map.iter()
        .filter_map(|(key, value)| render_field(key, value))
        .collect()
}

fn render_field_at(name: &str, value: &Value, depth: usize) -> Option<DisplayNode> {
    match value {
        Value::Array(items) if items.is_empty() => {
            if name == "images" {
                None
            } else {
                Some(empty_field(name))
            }
        }
        Value::Object(map) if map.is_empty() => Some(empty_field(name)),
        Value::Object(map) if NESTED_FIELD_KEYS.contains(&name) => {
            if depth >= MAX_NESTED_FIELD_DEPTH {
                tracing::debug!(field = name, depth, "nested field depth limit reached");
                return Some(render_complex_field(name, value));
            }
            let children = map
                .iter()
                .filter_map(|(key, nested)| render_field_at(key, nested, depth + 1))
                .collect();
            Some(DisplayNode::field(
                name,
                DisplayNode::Group { children },
                FieldLayout::Nested,
            ))
        }
        Value::Array(_) | Value::Object(_) => Some(render_complex_field(name, value)),
        Value::String(text) if text.chars().count() > LONG_TEXT_CHARS => Some(DisplayNode::field(
            name,
            DisplayNode::LongText { text: text.clone() },
            FieldLayout::Block,
        )),
        Value::String(text) => Some(DisplayNode::field(
            name,
            DisplayNode::plain(text.clone()),
            FieldLayout::Inline,
        )),
        Value::Null | Value::Bool(_) | Value::Number(_) => Some(DisplayNode::field(
            name,
            DisplayNode::plain(value.to_string()),
            FieldLayout::Inline,
        )),
    }
}

fn render_complex_field(name: &str, value: &Value) -> DisplayNode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => DisplayNode::field(
            name,
            DisplayNode::CodeBlock {
                text,
                language: "json".to_string(),
            },
            FieldLayout::Block,
        ),
        Err(error) => {
            tracing::warn!(field = name, %error, "falling back to truncated field text");
            DisplayNode::field(
                name,
                DisplayNode::plain(preview(&value.to_string(), FALLBACK_PREVIEW_CHARS)),
                FieldLayout::Inline,
            )
        }
    }
}

fn empty_field(name: &str) -> DisplayNode {
    DisplayNode::EmptyField {
        name: name.to_string(),
    }
}

fn looks_like_json_container(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

fn is_markdown(text: &str) -> bool {
    MARKDOWN_INDICATORS
        .iter()
        .any(|indicator| text.contains(indicator))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn string_form(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            value.to_string()
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out = text.chars().take(max_chars).collect::<String>();
    out.push_str("...");
    out
}
