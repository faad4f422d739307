//! `greet` — print a greeting and a structured result.

use async_trait::async_trait;
use console::style;
use serde::Serialize;
use std::sync::Arc;

use crate::commands::verbose_option;
use crate::config::KEY_OUTPUT;
use crate::errors::CliError;
use crate::options::{NormalizedOptions, OptionSpec};
use crate::output::{FORMAT_TAGS, format_output};
use crate::registry::{Action, CommandSpec};
use crate::types::timestamp_now;
use crate::ui::Reporter;

pub const NAME_ENV: &str = "DEMO_NAME";
pub const DEFAULT_NAME: &str = "World";
pub const DEFAULT_GREETING: &str = "Hello";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Greeting {
    pub message: String,
    pub timestamp: String,
    pub greeting: String,
    pub name: String,
}

impl Greeting {
    /// `"{greeting}, {name}!"`; an empty name greets the world.
    pub fn new(greeting: &str, name: &str) -> Self {
        let shown = if name.is_empty() { DEFAULT_NAME } else { name };
        Self {
            message: format!("{}, {}!", greeting, shown),
            timestamp: timestamp_now(),
            greeting: greeting.to_string(),
            name: name.to_string(),
        }
    }
}

pub fn spec() -> CommandSpec {
    CommandSpec::new("greet", "Say hello to someone", Arc::new(GreetAction))
        .alias("hello")
        .option(
            OptionSpec::string("name", "NAME", "Name to greet")
                .short('n')
                .env(NAME_ENV)
                .default_value(DEFAULT_NAME),
        )
        .option(
            OptionSpec::string("greeting", "MSG", "Custom greeting message")
                .short('g')
                .default_value(DEFAULT_GREETING),
        )
        .option(
            OptionSpec::choice("output", "FORMAT", FORMAT_TAGS, "Output format")
                .short('o')
                .env(KEY_OUTPUT)
                .default_value("text"),
        )
        .option(verbose_option())
}

pub struct GreetAction;

#[async_trait]
impl Action for GreetAction {
    async fn run(
        &self,
        _args: &[String],
        options: &NormalizedOptions,
        reporter: &dyn Reporter,
    ) -> Result<(), CliError> {
        let verbose = options.flag("verbose");
        let result = Greeting::new(
            options.str("greeting").unwrap_or(DEFAULT_GREETING),
            options.str("name").unwrap_or(DEFAULT_NAME),
        );

        reporter.debug("Executing greet command", verbose);
        reporter.success(&style(&result.message).bold().to_string());

        if verbose {
            reporter.info(&format!("Greeting: {}", result.greeting));
            reporter.info(&format!("Name: {}", result.name));
            reporter.info(&format!("Timestamp: {}", result.timestamp));
        }

        format_output(reporter, &result, options.str("output"))
    }
}
