pub mod icons;
pub mod progress;
pub mod reporter;

pub use progress::{ProgressState, Spinner, render_progress};
pub use reporter::{
    ConsoleReporter, Level, Recorded, RecordingReporter, ReportEvent, Reporter, SpinnerOutcome,
};
