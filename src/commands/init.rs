//! `init` — simulated project scaffolding.
//!
//! Scaffolding runs as an ordered list of named stages, each awaited in turn.
//! Nothing is written to disk.

use async_trait::async_trait;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::commands::verbose_option;
use crate::errors::CliError;
use crate::options::{NormalizedOptions, OptionSpec};
use crate::registry::{Action, CommandSpec};
use crate::ui::{Reporter, Spinner};

pub const DEFAULT_PROJECT: &str = "demo-project";
pub const DEFAULT_TEMPLATE: &str = "default";

/// One unit of scaffolding work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: &'static str,
    pub duration: Duration,
}

impl Stage {
    pub const fn new(name: &'static str, millis: u64) -> Self {
        Self {
            name,
            duration: Duration::from_millis(millis),
        }
    }

    async fn run(&self) {
        tokio::time::sleep(self.duration).await;
    }
}

pub fn default_stages() -> Vec<Stage> {
    vec![
        Stage::new("Creating directory structure", 1000),
        Stage::new("Creating files", 500),
        Stage::new("Generating configuration", 500),
    ]
}

pub fn spec(action: InitAction) -> CommandSpec {
    CommandSpec::new("init", "Initialize a new project", Arc::new(action))
        .option(OptionSpec::string("name", "NAME", "Project name").short('n'))
        .option(OptionSpec::string("description", "DESC", "Project description").short('d'))
        .option(
            OptionSpec::string("template", "TEMPLATE", "Template to use")
                .default_value(DEFAULT_TEMPLATE),
        )
        .option(OptionSpec::flag("force", "Force initialization").short('f'))
        .option(verbose_option())
}

pub struct InitAction {
    root: PathBuf,
    stages: Vec<Stage>,
}

impl InitAction {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            stages: default_stages(),
        }
    }

    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = stages;
        self
    }

    async fn scaffold(
        &self,
        name: &str,
        force: bool,
        verbose: bool,
        spinner: &dyn Spinner,
        reporter: &dyn Reporter,
    ) -> Result<(), CliError> {
        reporter.debug("Starting initialization...", verbose);

        if !force && self.root.join(name).exists() {
            return Err(CliError::generic(format!("Directory '{}' already exists", name)));
        }

        for stage in &self.stages {
            spinner.set_message(stage.name);
            reporter.debug(&format!("Stage: {}", stage.name), verbose);
            stage.run().await;
        }

        reporter.debug("Initialization complete", verbose);
        Ok(())
    }
}

#[async_trait]
impl Action for InitAction {
    async fn run(
        &self,
        _args: &[String],
        options: &NormalizedOptions,
        reporter: &dyn Reporter,
    ) -> Result<(), CliError> {
        let name = options.str("name").unwrap_or(DEFAULT_PROJECT);
        let template = options.str("template").unwrap_or(DEFAULT_TEMPLATE);
        let force = options.flag("force");
        let verbose = options.flag("verbose");

        reporter.info("Initializing new project...");
        let spinner = reporter.spinner("Creating project structure");

        if let Err(err) = self
            .scaffold(name, force, verbose, spinner.as_ref(), reporter)
            .await
        {
            spinner.fail("Initialization failed");
            return Err(if force {
                err
            } else {
                err.with_hint("Use --force to override existing files")
            });
        }
        spinner.succeed("Project initialized successfully!");

        reporter.success(&format!("Project: {}", style(name).bold()));
        if let Some(description) = options.str("description") {
            reporter.success(&format!("Description: {}", description));
        }
        reporter.success(&format!("Template: {}", template));

        reporter.info("");
        reporter.info("Next steps:");
        reporter.info(&format!("  1. cd {}", name));
        reporter.info("  2. cargo build");
        reporter.info("  3. cargo run");
        Ok(())
    }
}
