use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui::icons::{BAR_EMPTY, BAR_FILLED, DONE, FAILED};

/// Width of the percentage bar, in cells.
pub const BAR_WIDTH: u64 = 20;

/// A progress sample: `current` out of `total`, with a human message.
///
/// `current` may exceed `total`; the rendered bar is clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    pub current: u64,
    pub total: u64,
    pub message: String,
}

impl ProgressState {
    pub fn new(current: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
        }
    }

    /// `floor(current / total * 100)`, clamped to 100. A zero total reads as 0%.
    pub fn percentage(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        (self.current.saturating_mul(100) / self.total).min(100)
    }

    pub fn filled_cells(&self) -> u64 {
        self.percentage() / 5
    }
}

/// Plain (unstyled) progress line: `[50%] ██████████░░░░░░░░░░ (50/100) message`.
pub fn render_progress(state: &ProgressState) -> String {
    let (percent, bar, counts) = progress_parts(state);
    format!("{} {} {} {}", percent, bar, counts, state.message)
}

pub(crate) fn render_progress_styled(state: &ProgressState) -> String {
    let (percent, bar, counts) = progress_parts(state);
    format!(
        "{} {} {} {}",
        style(percent).cyan(),
        bar,
        style(counts).dim(),
        state.message
    )
}

fn progress_parts(state: &ProgressState) -> (String, String, String) {
    let filled = state.filled_cells();
    let bar: String = std::iter::repeat_n(BAR_FILLED, filled as usize)
        .chain(std::iter::repeat_n(BAR_EMPTY, (BAR_WIDTH - filled) as usize))
        .collect();
    (
        format!("[{}%]", state.percentage()),
        bar,
        format!("({}/{})", state.current, state.total),
    )
}

/// A running activity indicator that ends in either a succeeded or a failed state.
pub trait Spinner: Send + Sync {
    fn set_message(&self, message: &str);
    fn succeed(self: Box<Self>, message: &str);
    fn fail(self: Box<Self>, message: &str);
}

/// Spinner rendered on stderr by `indicatif`. Hidden when stderr is not a terminal.
pub struct TerminalSpinner {
    bar: ProgressBar,
}

impl TerminalSpinner {
    pub fn start(text: &str) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("spinner template is a valid static string")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style);
        bar.set_message(text.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl Spinner for TerminalSpinner {
    fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn succeed(self: Box<Self>, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", style(DONE).green(), message);
    }

    fn fail(self: Box<Self>, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", style(FAILED).red(), message);
    }
}
