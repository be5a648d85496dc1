mod cli;
mod domain;
mod infra;

use crate::cli::{CliInvocation, CliRun};
use crate::infra::{ResolveTasksDirError, TaskStore, init_logging, resolve_tasks_dir};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    ResolveTasksDir(#[from] ResolveTasksDirError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliRunError),
}

fn main() {
    if let Err(error) = run_main() {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let args = std::env::args().collect::<Vec<_>>();
    let invocation = match crate::cli::parse_invocation(&args) {
        Ok(invocation) => invocation,
        Err(error) => {
            let mut err = io::stderr().lock();
            let _ = writeln!(err, "{error}");
            let _ = writeln!(err);
            print_help();
            std::process::exit(2);
        }
    };

    match invocation {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            let mut out = io::stdout().lock();
            let _ = writeln!(out, "{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliInvocation::Run(CliRun {
            tasks_dir,
            verbosity,
            command,
        }) => {
            init_logging(verbosity);
            let tasks_dir = match tasks_dir {
                Some(dir) => dir,
                None => resolve_tasks_dir()?,
            };
            let store = TaskStore::new(tasks_dir);
            tracing::debug!(tasks_dir = %store.tasks_dir().display(), "using tasks directory");
            crate::cli::run(command, &store)?;
            Ok(())
        }
    }
}

fn print_help() {
    let text = format!(
        "{name} - browse and search Roo task transcripts\n\nUSAGE:\n  {name} [list] [--limit N] [--offset N]            List tasks, newest first\n  {name} search QUERY... [--limit N]                Rank task titles against QUERY\n  {name} show TASK_ID [--file FILE] [--json]        Print a task and its rendered transcript\n  {name} --help | --version\n\nGLOBAL FLAGS:\n  --tasks-dir DIR   Tasks directory (overrides ROO_TASKS_DIR)\n  -v, --verbose     Debug logging on stderr\n  -q, --quiet       Errors only on stderr\n\nSHOW FLAGS:\n  --file FILE       ui_messages | api_conversation_history (default: first that exists)\n  --json            Output the rendered nodes as JSON\n\nOUTPUT:\n  list:   modified<TAB>task_id<TAB>title\n  search: score<TAB>task_id<TAB>title\n\nENV:\n  ROO_TASKS_DIR     Override tasks dir (default: <config>/Code/User/globalStorage/rooveterinaryinc.roo-cline/tasks)\n  TASKVIEW_LOG      Log filter directives (falls back to RUST_LOG)\n",
        name = env!("CARGO_PKG_NAME")
    );
    let mut out = io::stdout().lock();
    let _ = write!(out, "{text}");
}
