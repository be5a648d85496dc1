use super::write_line;
use crate::domain::{DisplayNode, FieldLayout};
use std::io::{self, Write};

const INDENT: &str = "  ";

/// Draws rendered nodes as indented plain text. Returns `false` once the reader has gone away.
pub fn write_nodes(out: &mut impl Write, nodes: &[DisplayNode]) -> io::Result<bool> {
    for node in nodes {
        if !write_node(out, node, 0)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn write_node(out: &mut impl Write, node: &DisplayNode, depth: usize) -> io::Result<bool> {
    match node {
        DisplayNode::Heading { text, level } => {
            let marks = "#".repeat(usize::from((*level).max(1)));
            write_indented(out, depth, &format!("{marks} {text}"))
        }
        DisplayNode::Field {
            name,
            value,
            layout,
        } => write_field(out, name, value, *layout, depth),
        DisplayNode::EmptyField { name } => write_indented(out, depth, &format!("{name}: (empty)")),
        DisplayNode::PlainText { text }
        | DisplayNode::LongText { text }
        | DisplayNode::MarkdownBlock { text } => write_text(out, depth, text),
        DisplayNode::CodeBlock { text, language } => {
            if !write_indented(out, depth, &format!("```{language}"))? {
                return Ok(false);
            }
            if !write_text(out, depth, text)? {
                return Ok(false);
            }
            write_indented(out, depth, "```")
        }
        DisplayNode::Message {
            style, children, ..
        } => {
            if !write_line(out, "")? {
                return Ok(false);
            }
            if !write_indented(out, depth, &format!("[{}]", style.label()))? {
                return Ok(false);
            }
            write_children(out, children, depth + 1)
        }
        DisplayNode::Group { .. } => write_children(out, node.children(), depth),
    }
}

fn write_field(
    out: &mut impl Write,
    name: &str,
    value: &DisplayNode,
    layout: FieldLayout,
    depth: usize,
) -> io::Result<bool> {
    if layout == FieldLayout::Inline {
        if let DisplayNode::PlainText { text } = value {
            let mut lines = text.lines();
            let first = lines.next().unwrap_or("");
            if !write_indented(out, depth, &format!("{name}: {first}"))? {
                return Ok(false);
            }
            for line in lines {
                if !write_indented(out, depth + 1, line)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
    }

    if !write_indented(out, depth, &format!("{name}:"))? {
        return Ok(false);
    }
    write_node(out, value, depth + 1)
}

fn write_children(out: &mut impl Write, children: &[DisplayNode], depth: usize) -> io::Result<bool> {
    for child in children {
        if !write_node(out, child, depth)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn write_text(out: &mut impl Write, depth: usize, text: &str) -> io::Result<bool> {
    for line in text.lines() {
        if !write_indented(out, depth, line)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn write_indented(out: &mut impl Write, depth: usize, line: &str) -> io::Result<bool> {
    if line.is_empty() {
        return write_line(out, "");
    }
    write_line(out, &format!("{}{line}", INDENT.repeat(depth)))
}
