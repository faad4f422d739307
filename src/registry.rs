//! Command schemas and the registry that holds them.
//!
//! A `CommandSpec` is registered once at startup and never mutated. The
//! registry also builds the `clap` command tree used to tokenize argv; clap
//! only splits arguments, defaults and choice checks stay in
//! [`crate::options::normalize`].

use async_trait::async_trait;
use clap::{Arg, ArgAction, Command};
use std::sync::Arc;

use crate::errors::CliError;
use crate::options::{NormalizedOptions, OptionSpec, ValueKind};
use crate::ui::Reporter;

/// The work behind a command.
#[async_trait]
pub trait Action: Send + Sync {
    async fn run(
        &self,
        args: &[String],
        options: &NormalizedOptions,
        reporter: &dyn Reporter,
    ) -> Result<(), CliError>;
}

/// A positional argument.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name: &'static str,
    pub help: &'static str,
    pub required: bool,
}

impl ArgSpec {
    pub fn required(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            required: true,
        }
    }
}

pub struct CommandSpec {
    pub name: &'static str,
    pub about: &'static str,
    pub aliases: Vec<&'static str>,
    pub args: Vec<ArgSpec>,
    pub options: Vec<OptionSpec>,
    pub action: Arc<dyn Action>,
}

impl CommandSpec {
    pub fn new(name: &'static str, about: &'static str, action: Arc<dyn Action>) -> Self {
        Self {
            name,
            about,
            aliases: Vec::new(),
            args: Vec::new(),
            options: Vec::new(),
            action,
        }
    }

    pub fn alias(mut self, alias: &'static str) -> Self {
        self.aliases.push(alias);
        self
    }

    pub fn arg(mut self, arg: ArgSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn option(mut self, option: OptionSpec) -> Self {
        self.options.push(option);
        self
    }

    fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }

    fn to_clap(&self) -> Command {
        let mut cmd = Command::new(self.name)
            .about(self.about)
            .visible_aliases(self.aliases.iter().copied());

        for arg in &self.args {
            cmd = cmd.arg(
                Arg::new(arg.name)
                    .help(arg.help)
                    .required(arg.required)
                    .action(ArgAction::Set),
            );
        }

        for opt in &self.options {
            cmd = cmd.arg(option_arg(opt));
        }
        cmd
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("args", &self.args)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn option_arg(opt: &OptionSpec) -> Arg {
    let mut arg = Arg::new(opt.name).long(opt.long);
    if let Some(short) = opt.short {
        arg = arg.short(short);
    }

    let mut help = opt.help.to_string();
    if let Some(allowed) = opt.allowed() {
        help.push_str(&format!(" [possible values: {}]", allowed.join(", ")));
    }
    if let Some(default) = opt.default {
        help.push_str(&format!(" [default: {}]", default));
    }
    if let Some(env) = opt.env {
        help.push_str(&format!(" [env: {}]", env));
    }

    let arg = arg.help(help);
    match opt.kind {
        ValueKind::Flag => arg.action(ArgAction::SetTrue),
        ValueKind::String | ValueKind::Integer | ValueKind::Enum(_) => {
            arg.action(ArgAction::Set).value_name(opt.value_name)
        }
    }
}

/// Name, description and version shown by the root command.
#[derive(Debug, Clone)]
pub struct ProgramInfo {
    pub name: String,
    pub about: String,
    pub version: &'static str,
}

/// Ordered set of registered commands.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command. Names and aliases must be unique; enum defaults must be allowed values.
    pub fn register(&mut self, spec: CommandSpec) -> Result<(), CliError> {
        if let Some(taken) = spec.names().find(|n| self.get(n).is_some()) {
            return Err(CliError::DuplicateCommand(taken.to_string()));
        }
        for opt in &spec.options {
            opt.validate()?;
        }
        self.commands.push(spec);
        Ok(())
    }

    /// Look a command up by name or alias.
    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|c| c.names().any(|n| n == name))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|c| c.name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Root clap command with one subcommand per registered spec.
    ///
    /// Unknown subcommand names pass through clap so the registry can reject them.
    pub fn to_clap(&self, program: &ProgramInfo) -> Command {
        let mut root = Command::new(program.name.clone())
            .about(program.about.clone())
            .version(program.version)
            .disable_version_flag(true)
            .arg(
                Arg::new("version")
                    .short('v')
                    .long("version")
                    .help("Print version")
                    .action(ArgAction::Version),
            )
            .allow_external_subcommands(true);

        for spec in &self.commands {
            root = root.subcommand(spec.to_clap());
        }
        root
    }
}
