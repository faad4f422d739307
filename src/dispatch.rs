//! Single-invocation dispatcher.
//!
//! ```text
//! Idle -> Parsing -> Validating -> Executing -> {Succeeded, Failed}
//! ```
//!
//! Failure is terminal from any non-idle state and is reported exactly once
//! at error level. There are no retries.

use clap::ArgMatches;
use clap::error::ErrorKind;
use tracing::debug;

use crate::errors::{CliError, ValidationError};
use crate::options::{Environment, RawFlags, ValueKind, normalize};
use crate::registry::{CommandRegistry, CommandSpec, ProgramInfo};
use crate::ui::Reporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Idle,
    Parsing,
    Validating,
    Executing,
    Succeeded,
    Failed,
}

/// Result of one invocation.
#[derive(Debug)]
pub enum Outcome {
    /// Help or version text was printed; nothing ran.
    Informational,
    Succeeded,
    Failed {
        /// State the invocation was in when it failed.
        at: InvocationState,
        error: CliError,
    },
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Informational | Outcome::Succeeded => 0,
            Outcome::Failed { error, .. } => error.exit_code(),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&CliError> {
        match self {
            Outcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

pub struct Dispatcher {
    registry: CommandRegistry,
    program: ProgramInfo,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, program: ProgramInfo) -> Self {
        Self { registry, program }
    }

    /// Run one command end to end. `argv[0]` is the program name.
    pub async fn dispatch<I, T>(&self, argv: I, env: &Environment, reporter: &dyn Reporter) -> Outcome
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        let mut state = InvocationState::Idle;

        if argv.len() <= 1 {
            reporter.print(&self.registry.to_clap(&self.program).render_help().to_string());
            return Outcome::Informational;
        }

        transition(&mut state, InvocationState::Parsing);
        let matches = match self.registry.to_clap(&self.program).try_get_matches_from(&argv) {
            Ok(matches) => matches,
            Err(err) => match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    reporter.print(err.render().to_string().trim_end());
                    return Outcome::Informational;
                }
                _ => {
                    let error = ValidationError::Arguments(clap_message(&err)).into();
                    return self.fail(&mut state, error, reporter);
                }
            },
        };

        let Some((name, sub)) = matches.subcommand() else {
            reporter.print(&self.registry.to_clap(&self.program).render_help().to_string());
            return Outcome::Informational;
        };
        let Some(spec) = self.registry.get(name) else {
            return self.fail(&mut state, CliError::UnknownCommand(name.to_string()), reporter);
        };
        let (args, raw) = tokenized(spec, sub);

        transition(&mut state, InvocationState::Validating);
        let options = match normalize(&spec.options, &raw, env) {
            Ok(options) => options,
            Err(err) => return self.fail(&mut state, err.into(), reporter),
        };

        transition(&mut state, InvocationState::Executing);
        debug!(command = spec.name, ?args, "executing");
        match spec.action.run(&args, &options, reporter).await {
            Ok(()) => {
                transition(&mut state, InvocationState::Succeeded);
                Outcome::Succeeded
            }
            Err(err) => self.fail(&mut state, err, reporter),
        }
    }

    fn fail(&self, state: &mut InvocationState, error: CliError, reporter: &dyn Reporter) -> Outcome {
        let at = *state;
        transition(state, InvocationState::Failed);
        report_failure(reporter, &error);
        Outcome::Failed { at, error }
    }
}

fn transition(state: &mut InvocationState, next: InvocationState) {
    debug!(from = ?state, to = ?next, "invocation state");
    *state = next;
}

/// Error line, then `Status: N` when known, then the hint as a warning.
pub fn report_failure(reporter: &dyn Reporter, error: &CliError) {
    reporter.error(&error.detailed());
    if let Some(status) = error.status() {
        reporter.error(&format!("Status: {}", status));
    }
    if let Some(hint) = error.hint() {
        reporter.warn(hint);
    }
}

fn clap_message(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let message = rendered
        .lines()
        .take_while(|line| !line.starts_with("Usage:"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    message
        .strip_prefix("error: ")
        .unwrap_or(&message)
        .to_string()
}

/// Positional values in declaration order, and the options actually given.
fn tokenized(spec: &CommandSpec, matches: &ArgMatches) -> (Vec<String>, RawFlags) {
    let args = spec
        .args
        .iter()
        .filter_map(|a| matches.get_one::<String>(a.name).cloned())
        .collect();

    let mut raw = RawFlags::new();
    for opt in &spec.options {
        match opt.kind {
            ValueKind::Flag => {
                if matches.get_flag(opt.name) {
                    raw.insert(opt.name.to_string(), "true".to_string());
                }
            }
            _ => {
                if let Some(value) = matches.get_one::<String>(opt.name) {
                    raw.insert(opt.name.to_string(), value.clone());
                }
            }
        }
    }
    (args, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{NormalizedOptions, OptionSpec};
    use crate::registry::{Action, ArgSpec};
    use crate::ui::{Level, RecordingReporter};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Spy {
        calls: AtomicUsize,
        seen: Mutex<Option<(Vec<String>, NormalizedOptions)>>,
        fail_with: Option<u16>,
    }

    #[async_trait]
    impl Action for Spy {
        async fn run(
            &self,
            args: &[String],
            options: &NormalizedOptions,
            _reporter: &dyn Reporter,
        ) -> Result<(), CliError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen.lock().unwrap() = Some((args.to_vec(), options.clone()));
            match self.fail_with {
                Some(status) => Err(crate::errors::TransportError::with_status("bad", status).into()),
                None => Ok(()),
            }
        }
    }

    fn dispatcher(spy: Arc<Spy>) -> Dispatcher {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                CommandSpec::new("task", "task command", spy)
                    .arg(ArgSpec::required("target", "target"))
                    .option(
                        OptionSpec::choice("output", "FORMAT", &["json", "text", "markdown"], "fmt")
                            .short('o')
                            .default_value("json"),
                    )
                    .option(OptionSpec::flag("verbose", "verbose").short('v')),
            )
            .unwrap();
        Dispatcher::new(
            registry,
            ProgramInfo {
                name: "demo-cli".into(),
                about: "demo".into(),
                version: "0.1.0",
            },
        )
    }

    #[tokio::test]
    async fn no_command_prints_help() {
        let spy = Arc::new(Spy::default());
        let reporter = RecordingReporter::new();
        let outcome = dispatcher(spy.clone())
            .dispatch(["demo-cli"], &Environment::default(), &reporter)
            .await;
        assert!(matches!(outcome, Outcome::Informational));
        assert_eq!(outcome.exit_code(), 0);
        assert!(reporter.output().contains("task"));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn version_flag_is_informational() {
        let reporter = RecordingReporter::new();
        let outcome = dispatcher(Arc::new(Spy::default()))
            .dispatch(["demo-cli", "-v"], &Environment::default(), &reporter)
            .await;
        assert!(matches!(outcome, Outcome::Informational));
        assert!(reporter.output().contains("0.1.0"));
    }

    #[tokio::test]
    async fn unknown_command_fails_while_parsing() {
        let reporter = RecordingReporter::new();
        let outcome = dispatcher(Arc::new(Spy::default()))
            .dispatch(["demo-cli", "nope"], &Environment::default(), &reporter)
            .await;
        match &outcome {
            Outcome::Failed { at, error } => {
                assert_eq!(*at, InvocationState::Parsing);
                assert!(matches!(error, CliError::UnknownCommand(n) if n == "nope"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(outcome.exit_code(), 2);
        assert_eq!(reporter.messages(Level::Error), vec!["Unknown command 'nope'".to_string()]);
    }

    #[tokio::test]
    async fn invalid_choice_fails_before_action() {
        let spy = Arc::new(Spy::default());
        let reporter = RecordingReporter::new();
        let outcome = dispatcher(spy.clone())
            .dispatch(["demo-cli", "task", "x", "-o", "yaml"], &Environment::default(), &reporter)
            .await;
        assert!(matches!(
            outcome,
            Outcome::Failed { at: InvocationState::Validating, .. }
        ));
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
        assert_eq!(reporter.messages(Level::Error).len(), 1);
    }

    #[tokio::test]
    async fn missing_positional_is_a_validation_error() {
        let spy = Arc::new(Spy::default());
        let reporter = RecordingReporter::new();
        let outcome = dispatcher(spy.clone())
            .dispatch(["demo-cli", "task"], &Environment::default(), &reporter)
            .await;
        match outcome.error() {
            Some(CliError::Validation(ValidationError::Arguments(msg))) => {
                assert!(msg.contains("<target>"), "{msg}");
            }
            other => panic!("expected argument error, got {:?}", other),
        }
        assert_eq!(spy.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn action_receives_positionals_and_normalized_options() {
        let spy = Arc::new(Spy::default());
        let reporter = RecordingReporter::new();
        let outcome = dispatcher(spy.clone())
            .dispatch(["demo-cli", "task", "here", "--verbose"], &Environment::default(), &reporter)
            .await;
        assert!(outcome.is_success());
        let (args, options) = spy.seen.lock().unwrap().clone().unwrap();
        assert_eq!(args, vec!["here".to_string()]);
        assert_eq!(options.str("output"), Some("json"));
        assert!(options.flag("verbose"));
    }

    #[tokio::test]
    async fn action_failure_reports_error_and_status_once() {
        let spy = Arc::new(Spy {
            fail_with: Some(404),
            ..Default::default()
        });
        let reporter = RecordingReporter::new();
        let outcome = dispatcher(spy)
            .dispatch(["demo-cli", "task", "x"], &Environment::default(), &reporter)
            .await;
        assert!(matches!(
            outcome,
            Outcome::Failed { at: InvocationState::Executing, .. }
        ));
        assert_eq!(
            reporter.messages(Level::Error),
            vec!["Request failed: bad".to_string(), "Status: 404".to_string()]
        );
    }

    #[test]
    fn hint_follows_the_error_line() {
        let reporter = RecordingReporter::new();
        let error = CliError::generic("Directory 'x' already exists")
            .with_hint("Use --force to override existing files");
        report_failure(&reporter, &error);
        let events = reporter.events();
        assert_eq!(events[0].level, Level::Error);
        assert_eq!(events[1].level, Level::Warn);
    }

    #[test]
    fn failure_line_carries_the_io_cause() {
        use anyhow::Context;
        let reporter = RecordingReporter::new();
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let error: CliError = Err::<(), _>(io)
            .context("Failed to write output file: /x/out.json")
            .unwrap_err()
            .into();
        report_failure(&reporter, &error);
        assert_eq!(
            reporter.messages(Level::Error),
            vec!["Failed to write output file: /x/out.json: permission denied".to_string()]
        );
    }
}
