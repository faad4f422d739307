//! `config` — show or update the `.env.cli` file.

use async_trait::async_trait;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::commands::verbose_option;
use crate::config::{CONFIG_FILE, PartialConfig, load_partial, save_config};
use crate::errors::{CliError, ValidationError};
use crate::options::{NormalizedOptions, OptionSpec};
use crate::output::{FORMAT_TAGS, OutputFormat, format_output};
use crate::registry::{Action, CommandSpec};
use crate::ui::Reporter;

pub fn spec(working_dir: PathBuf) -> CommandSpec {
    CommandSpec::new(
        "config",
        "Show or update the .env.cli configuration",
        Arc::new(ConfigAction { working_dir }),
    )
    .option(OptionSpec::string("name", "NAME", "Set CLI_NAME"))
    .option(OptionSpec::string("description", "DESC", "Set CLI_DESCRIPTION").short('d'))
    .option(OptionSpec::string("author", "AUTHOR", "Set CLI_AUTHOR").short('a'))
    .option(OptionSpec::choice("output", "FORMAT", FORMAT_TAGS, "Set CLI_OUTPUT").short('o'))
    .option(OptionSpec::flag("debug", "Set CLI_DEBUG=true"))
    .option(OptionSpec::flag("no-debug", "Set CLI_DEBUG=false"))
    .option(OptionSpec::string("file", "PATH", "Config file [default: ./.env.cli]"))
    .option(verbose_option())
}

pub struct ConfigAction {
    working_dir: PathBuf,
}

impl ConfigAction {
    fn path(&self, options: &NormalizedOptions) -> PathBuf {
        match options.str("file") {
            Some(file) if Path::new(file).is_absolute() => PathBuf::from(file),
            Some(file) => self.working_dir.join(file),
            None => self.working_dir.join(CONFIG_FILE),
        }
    }
}

fn updates(options: &NormalizedOptions) -> Result<PartialConfig, ValidationError> {
    let debug = match (options.flag("debug"), options.flag("no-debug")) {
        (true, true) => {
            return Err(ValidationError::Arguments(
                "--debug and --no-debug cannot be used together".to_string(),
            ));
        }
        (true, false) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };

    Ok(PartialConfig {
        name: options.str("name").map(str::to_string),
        description: options.str("description").map(str::to_string),
        author: options.str("author").map(str::to_string),
        output_format: options.str("output").map(|t| OutputFormat::from_tag(Some(t))),
        debug,
    })
}

#[async_trait]
impl Action for ConfigAction {
    async fn run(
        &self,
        _args: &[String],
        options: &NormalizedOptions,
        reporter: &dyn Reporter,
    ) -> Result<(), CliError> {
        let path = self.path(options);
        let verbose = options.flag("verbose");
        reporter.debug(&format!("Config file: {}", path.display()), verbose);

        let changes = updates(options)?;
        let current = load_partial(&path)?;

        if changes.is_empty() {
            return format_output(reporter, &current.resolve(), Some("json"));
        }

        let saved = save_config(&current.merge(changes), Some(&path))?;
        reporter.success(&format!(
            "Saved configuration to: {}",
            style(saved.display()).bold()
        ));
        Ok(())
    }
}
