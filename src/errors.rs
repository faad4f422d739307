//! Typed error hierarchy for the demo CLI.
//!
//! - `ValidationError` — bad or missing option values, caught before an action runs
//! - `TransportError` — network, timeout and non-2xx failures from `fetch`
//! - `CliError` — everything that can reach the dispatcher boundary

use thiserror::Error;

/// Errors raised while turning raw arguments into normalized options.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid value '{value}' for --{option}. Allowed values: {}", .allowed.join(", "))]
    InvalidChoice {
        option: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Invalid number '{value}' for --{option}")]
    InvalidNumber { option: String, value: String },

    #[error("Default '{default}' for --{option} is not one of: {}", .allowed.join(", "))]
    InvalidDefault {
        option: String,
        default: String,
        allowed: Vec<String>,
    },

    #[error("{0}")]
    Arguments(String),
}

impl ValidationError {
    /// Name of the offending option, when the failure is tied to one.
    pub fn option(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidChoice { option, .. }
            | ValidationError::InvalidNumber { option, .. }
            | ValidationError::InvalidDefault { option, .. } => Some(option),
            ValidationError::Arguments(_) => None,
        }
    }
}

/// A failed HTTP exchange. `status` is set when the server answered.
#[derive(Debug, Error)]
#[error("Request failed: {message}")]
pub struct TransportError {
    pub message: String,
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }
}

/// Errors that surface at the dispatcher boundary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    #[error("Command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Generic(#[from] anyhow::Error),

    /// An error followed by a warning-level suggestion for the operator.
    #[error("{source}")]
    Hinted {
        #[source]
        source: Box<CliError>,
        hint: String,
    },
}

impl CliError {
    pub fn generic(message: impl std::fmt::Display) -> Self {
        CliError::Generic(anyhow::anyhow!("{}", message))
    }

    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        CliError::Hinted {
            source: Box::new(self),
            hint: hint.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CliError::Transport(e) => e.status,
            CliError::Hinted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// The message with every underlying cause, `outer: inner: ...`.
    pub fn detailed(&self) -> String {
        match self {
            CliError::Generic(e) => format!("{:#}", e),
            CliError::Hinted { source, .. } => source.detailed(),
            other => other.to_string(),
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            CliError::Hinted { hint, .. } => Some(hint),
            _ => None,
        }
    }

    /// Usage failures exit with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Validation(_) | CliError::UnknownCommand(_) => 2,
            CliError::Hinted { source, .. } => source.exit_code(),
            _ => 1,
        }
    }
}
