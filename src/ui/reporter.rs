//! Leveled console reporting.
//!
//! Actions never print directly; they receive a `&dyn Reporter`. The console
//! implementation writes each event immediately, the recording one keeps the
//! events in memory for assertions.

use console::style;
use std::sync::{Arc, Mutex, PoisonError};

use crate::ui::icons::{ERROR, INFO, SUCCESS, WARN};
use crate::ui::progress::{
    ProgressState, Spinner, TerminalSpinner, render_progress, render_progress_styled,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
    Warn,
    Debug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEvent {
    pub level: Level,
    pub message: String,
}

pub trait Reporter: Send + Sync {
    /// Write one level-tagged line.
    fn emit(&self, level: Level, message: &str);

    /// Write one progress line. Every call produces a new line.
    fn progress(&self, state: &ProgressState);

    /// Write raw command output (rendered results) to stdout.
    fn print(&self, text: &str);

    fn spinner(&self, text: &str) -> Box<dyn Spinner>;

    fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    fn warn(&self, message: &str) {
        self.emit(Level::Warn, message);
    }

    /// No-op unless `verbose` is set.
    fn debug(&self, message: &str, verbose: bool) {
        if verbose {
            self.emit(Level::Debug, message);
        }
    }
}

/// Writes errors to stderr and everything else to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::Info => println!("{} {}", style(INFO).blue(), message),
            Level::Success => println!("{} {}", style(SUCCESS).green(), message),
            Level::Warn => println!("{} {}", style(WARN).yellow(), message),
            Level::Debug => println!("{} {}", style("[DEBUG]").dim(), message),
            Level::Error => eprintln!("{} {}", style(ERROR).red(), message),
        }
    }

    fn progress(&self, state: &ProgressState) {
        println!("{}", render_progress_styled(state));
    }

    fn print(&self, text: &str) {
        println!("{}", text);
    }

    fn spinner(&self, text: &str) -> Box<dyn Spinner> {
        Box::new(TerminalSpinner::start(text))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerOutcome {
    Succeeded,
    Failed,
}

/// Everything a `RecordingReporter` saw, in order. Styling is stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Event(ReportEvent),
    Progress(String),
    Output(String),
    SpinnerStarted(String),
    SpinnerMessage(String),
    SpinnerFinished {
        outcome: SpinnerOutcome,
        message: String,
    },
}

type Log = Arc<Mutex<Vec<Recorded>>>;

fn push(log: &Log, entry: Recorded) {
    log.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(entry);
}

fn plain(text: &str) -> String {
    console::strip_ansi_codes(text).into_owned()
}

/// In-memory reporter for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    log: Log,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Recorded> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Event(ev) => Some(ev),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self, level: Level) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    /// Concatenated raw output written through `print`.
    pub fn output(&self) -> String {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Output(text) => Some(text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn progress_lines(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Progress(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn spinner_outcome(&self) -> Option<SpinnerOutcome> {
        self.entries().into_iter().rev().find_map(|e| match e {
            Recorded::SpinnerFinished { outcome, .. } => Some(outcome),
            _ => None,
        })
    }
}

impl Reporter for RecordingReporter {
    fn emit(&self, level: Level, message: &str) {
        push(
            &self.log,
            Recorded::Event(ReportEvent {
                level,
                message: plain(message),
            }),
        );
    }

    fn progress(&self, state: &ProgressState) {
        push(&self.log, Recorded::Progress(render_progress(state)));
    }

    fn print(&self, text: &str) {
        push(&self.log, Recorded::Output(plain(text)));
    }

    fn spinner(&self, text: &str) -> Box<dyn Spinner> {
        push(&self.log, Recorded::SpinnerStarted(plain(text)));
        Box::new(RecordingSpinner {
            log: Arc::clone(&self.log),
        })
    }
}

struct RecordingSpinner {
    log: Log,
}

impl Spinner for RecordingSpinner {
    fn set_message(&self, message: &str) {
        push(&self.log, Recorded::SpinnerMessage(plain(message)));
    }

    fn succeed(self: Box<Self>, message: &str) {
        push(
            &self.log,
            Recorded::SpinnerFinished {
                outcome: SpinnerOutcome::Succeeded,
                message: plain(message),
            },
        );
    }

    fn fail(self: Box<Self>, message: &str) {
        push(
            &self.log,
            Recorded::SpinnerFinished {
                outcome: SpinnerOutcome::Failed,
                message: plain(message),
            },
        );
    }
}
