mod present;

use crate::domain::{
    DisplayNode, InvalidTaskIdError, SourceKind, TaskId, render_document, search,
};
use crate::infra::{
    LoadTaskFileError, TaskListing, TaskOverview, TaskStore, TaskStoreError, Verbosity,
};
use humansize::{DECIMAL, format_size};
use present::write_nodes;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::SystemTime;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const TITLE_COLUMN_WIDTH: usize = 120;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Run(CliRun),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CliRun {
    pub tasks_dir: Option<PathBuf>,
    pub verbosity: Verbosity,
    pub command: CliCommand,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    List {
        offset: usize,
        limit: Option<usize>,
    },
    Search {
        query: String,
        limit: Option<usize>,
    },
    Show {
        task_id: String,
        file: Option<SourceKind>,
        json: bool,
    },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),
}

#[derive(Default)]
struct GlobalFlags {
    tasks_dir: Option<PathBuf>,
    verbose: bool,
    quiet: bool,
}

impl GlobalFlags {
    /// Consumes `arg` (and its value) when it is a global flag.
    fn take<'a>(
        &mut self,
        arg: &str,
        rest: &mut impl Iterator<Item = &'a String>,
    ) -> Result<bool, CliParseError> {
        match arg {
            "--tasks-dir" | "-d" => {
                let value = rest
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--tasks-dir".to_string()))?;
                self.tasks_dir = Some(PathBuf::from(value));
                Ok(true)
            }
            "--verbose" | "-v" => {
                self.verbose = true;
                Ok(true)
            }
            "--quiet" | "-q" => {
                self.quiet = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn finish(self, command: CliCommand) -> CliInvocation {
        CliInvocation::Run(CliRun {
            tasks_dir: self.tasks_dir,
            verbosity: Verbosity::from_flags(self.verbose, self.quiet),
            command,
        })
    }
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut flags = GlobalFlags::default();
    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.peek() {
        if arg.as_str() == "--" {
            let _ = iter.next();
            break;
        }
        if !arg.starts_with('-') {
            break;
        }
        let Some(arg) = iter.next() else {
            break;
        };
        if !flags.take(arg, &mut iter)? {
            return Err(CliParseError::UnknownFlag(arg.to_string()));
        }
    }

    let Some(subcommand) = iter.next() else {
        return Ok(flags.finish(CliCommand::List {
            offset: 0,
            limit: None,
        }));
    };

    match subcommand.as_str() {
        "list" | "ls" => {
            let mut offset = 0usize;
            let mut limit: Option<usize> = None;

            while let Some(arg) = iter.next() {
                if flags.take(arg, &mut iter)? {
                    continue;
                }
                match arg.as_str() {
                    "--limit" | "-l" => {
                        let value = iter.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--limit".to_string())
                        })?;
                        limit = Some(parse_usize_flag("--limit", value)?);
                    }
                    "--offset" | "-o" => {
                        let value = iter.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--offset".to_string())
                        })?;
                        offset = parse_usize_flag("--offset", value)?;
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                    }
                }
            }

            Ok(flags.finish(CliCommand::List { offset, limit }))
        }
        "search" => {
            let mut words: Vec<String> = Vec::new();
            let mut limit: Option<usize> = None;

            while let Some(arg) = iter.next() {
                if flags.take(arg, &mut iter)? {
                    continue;
                }
                match arg.as_str() {
                    "--limit" | "-l" => {
                        let value = iter.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--limit".to_string())
                        })?;
                        limit = Some(parse_usize_flag("--limit", value)?);
                    }
                    "--" => {
                        words.extend(iter.by_ref().map(|word| word.to_string()));
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => words.push(arg.to_string()),
                }
            }

            let query = words.join(" ");
            if query.trim().is_empty() {
                return Err(CliParseError::MissingArgument("QUERY"));
            }
            Ok(flags.finish(CliCommand::Search { query, limit }))
        }
        "show" => {
            let mut task_id: Option<String> = None;
            let mut file: Option<SourceKind> = None;
            let mut json = false;

            while let Some(arg) = iter.next() {
                if flags.take(arg, &mut iter)? {
                    continue;
                }
                match arg.as_str() {
                    "--file" | "-f" => {
                        let value = iter.next().ok_or_else(|| {
                            CliParseError::MissingFlagValue("--file".to_string())
                        })?;
                        file = Some(parse_file_flag("--file", value)?);
                    }
                    "--json" => {
                        json = true;
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        if task_id.is_some() {
                            return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                        }
                        task_id = Some(arg.to_string());
                    }
                }
            }

            let task_id = task_id.ok_or(CliParseError::MissingArgument("TASK_ID"))?;
            Ok(flags.finish(CliCommand::Show {
                task_id,
                file,
                json,
            }))
        }
        other => Err(CliParseError::UnknownSubcommand(other.to_string())),
    }
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    InvalidTaskId(#[from] InvalidTaskIdError),

    #[error("task not found: {0}\nHint: run `taskview list` and copy the task id column.")]
    TaskNotFound(String),

    #[error(transparent)]
    Store(TaskStoreError),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    WriteOutput(#[from] io::Error),
}

impl From<TaskStoreError> for CliRunError {
    fn from(error: TaskStoreError) -> Self {
        match error {
            TaskStoreError::TaskNotFound(id) => Self::TaskNotFound(id.to_string()),
            other => Self::Store(other),
        }
    }
}

pub fn run(command: CliCommand, store: &TaskStore) -> Result<(), CliRunError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let stderr = io::stderr();
    let mut err = io::BufWriter::new(stderr.lock());
    execute(command, store, &mut out, &mut err)
}

fn execute(
    command: CliCommand,
    store: &TaskStore,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<(), CliRunError> {
    match command {
        CliCommand::List { offset, limit } => {
            let listing = store.list_tasks();
            let tasks = listing
                .tasks
                .iter()
                .skip(offset)
                .take(limit.unwrap_or(usize::MAX));
            for task in tasks {
                let line = format!(
                    "{}\t{}\t{}",
                    format_modified(task.modified),
                    task.id,
                    title_column(&task.title)
                );
                if !write_line(out, &line)? {
                    return Ok(());
                }
            }
            write_listing_notes(err, &listing)?;
            Ok(())
        }
        CliCommand::Search { query, limit } => {
            let listing = store.list_tasks();
            let results = search(&query, &listing.tasks);
            tracing::debug!(
                query = %query,
                candidates = listing.tasks.len(),
                matches = results.len(),
                "search finished"
            );

            if results.is_empty() {
                write_line(out, "No tasks found.")?;
            }
            for result in results.iter().take(limit.unwrap_or(usize::MAX)) {
                let line = format!(
                    "{:.2}\t{}\t{}",
                    result.score,
                    result.id,
                    title_column(&result.title)
                );
                if !write_line(out, &line)? {
                    return Ok(());
                }
            }
            write_listing_notes(err, &listing)?;
            Ok(())
        }
        CliCommand::Show {
            task_id,
            file,
            json,
        } => {
            let task_id = TaskId::parse(&task_id)?;
            let overview = store.load_task(&task_id)?;
            let kind = file.or(overview.default_file);
            let view = load_document_view(store, &overview.id, kind)?;

            if json {
                let payload = build_show_json_payload(&overview, kind, &view)?;
                let rendered = serde_json::to_string_pretty(&payload)?;
                write_line(out, &rendered)?;
                return Ok(());
            }

            if !print_overview(out, &overview, kind)? {
                return Ok(());
            }
            print_document_view(out, kind, &view)?;
            Ok(())
        }
    }
}

/// The rendered document, or the reason there is none.
enum DocumentView {
    Rendered(Vec<DisplayNode>),
    NoFiles,
    Missing,
    Invalid { raw: String },
}

fn load_document_view(
    store: &TaskStore,
    id: &TaskId,
    kind: Option<SourceKind>,
) -> Result<DocumentView, CliRunError> {
    let Some(kind) = kind else {
        return Ok(DocumentView::NoFiles);
    };

    match store.read_document(id, kind) {
        Ok(document) => Ok(DocumentView::Rendered(render_document(&document, kind))),
        Err(TaskStoreError::File(LoadTaskFileError::NotFound { .. })) => Ok(DocumentView::Missing),
        Err(TaskStoreError::File(LoadTaskFileError::Parse { raw, source, .. })) => {
            tracing::warn!(task = %id, file = kind.file_name(), error = %source, "invalid transcript JSON");
            Ok(DocumentView::Invalid { raw })
        }
        Err(error) => Err(error.into()),
    }
}

fn print_overview(
    out: &mut impl Write,
    overview: &TaskOverview,
    selected: Option<SourceKind>,
) -> io::Result<bool> {
    if !write_line(out, &format!("# {}", overview.title))? {
        return Ok(false);
    }
    if !overview.full_text.is_empty() {
        if !write_line(out, "")? {
            return Ok(false);
        }
        for line in overview.full_text.lines() {
            let line = if line.is_empty() {
                String::new()
            } else {
                format!("> {line}")
            };
            if !write_line(out, &line)? {
                return Ok(false);
            }
        }
    }

    if !write_line(out, "")? {
        return Ok(false);
    }
    for file in &overview.files {
        let marker = if Some(file.kind) == selected { "*" } else { " " };
        let size = file
            .size_bytes
            .map(|bytes| format_size(bytes, DECIMAL))
            .unwrap_or_else(|| "missing".to_string());
        let line = format!("{marker} {} ({size})", file.kind.label());
        if !write_line(out, &line)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn print_document_view(
    out: &mut impl Write,
    kind: Option<SourceKind>,
    view: &DocumentView,
) -> io::Result<bool> {
    match view {
        DocumentView::Rendered(nodes) => write_nodes(out, nodes),
        DocumentView::NoFiles => {
            if !write_line(out, "")? {
                return Ok(false);
            }
            write_line(out, "No content available for this task.")
        }
        DocumentView::Missing => {
            let name = kind.map(SourceKind::file_name).unwrap_or("transcript");
            if !write_line(out, "")? {
                return Ok(false);
            }
            write_line(out, &format!("File not found: {name}"))
        }
        DocumentView::Invalid { raw } => {
            let name = kind.map(SourceKind::file_name).unwrap_or("transcript");
            if !write_line(out, "")? {
                return Ok(false);
            }
            if !write_line(out, &format!("Error: Invalid JSON in {name}"))? {
                return Ok(false);
            }
            for line in raw.lines() {
                if !write_line(out, line)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn build_show_json_payload(
    overview: &TaskOverview,
    kind: Option<SourceKind>,
    view: &DocumentView,
) -> Result<serde_json::Value, serde_json::Error> {
    let files = overview
        .files
        .iter()
        .map(|file| {
            serde_json::json!({
                "file": file.kind.file_name(),
                "size_bytes": file.size_bytes,
            })
        })
        .collect::<Vec<_>>();

    let mut payload = serde_json::json!({
        "task_id": overview.id.as_str(),
        "title": overview.title.clone(),
        "full_text": overview.full_text.clone(),
        "files": files,
        "selected": kind.map(SourceKind::file_name),
    });

    let (key, value) = match view {
        DocumentView::Rendered(nodes) => ("nodes", serde_json::to_value(nodes)?),
        DocumentView::NoFiles => ("error", "no content available".into()),
        DocumentView::Missing => ("error", "file not found".into()),
        DocumentView::Invalid { raw } => {
            payload["raw"] = raw.clone().into();
            ("error", "invalid JSON".into())
        }
    };
    payload[key] = value;
    Ok(payload)
}

fn write_listing_notes(err: &mut impl Write, listing: &TaskListing) -> io::Result<bool> {
    if let Some(notice) = listing.notice.as_deref() {
        if !write_line(err, notice)? {
            return Ok(false);
        }
    }
    if listing.warnings > 0 {
        return write_line(err, &format!("warnings: {}", listing.warnings));
    }
    Ok(true)
}

fn format_modified(modified: Option<SystemTime>) -> String {
    modified
        .and_then(|value| OffsetDateTime::from(value).format(&Rfc3339).ok())
        .unwrap_or_else(|| "-".to_string())
}

fn title_column(title: &str) -> String {
    let single_line = title.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_end(&single_line, TITLE_COLUMN_WIDTH)
}

fn truncate_end(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    for ch in text.chars() {
        let next = format!("{out}{ch}");
        if unicode_width::UnicodeWidthStr::width(next.as_str()) > width {
            break;
        }
        out.push(ch);
    }
    out
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}

fn parse_usize_flag(flag: &str, value: &str) -> Result<usize, CliParseError> {
    value
        .parse::<usize>()
        .map_err(|_| CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        })
}

fn parse_file_flag(flag: &str, value: &str) -> Result<SourceKind, CliParseError> {
    SourceKind::from_file_stem(value.trim()).ok_or_else(|| CliParseError::InvalidFlagValue {
        flag: flag.to_string(),
        value: value.to_string(),
    })
}
