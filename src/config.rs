//! `.env.cli` configuration file.
//!
//! The file is a plain `KEY=value` list:
//!
//! ```text
//! CLI_NAME=demo-cli
//! CLI_DESCRIPTION=My tool
//! CLI_AUTHOR=Ada
//! CLI_OUTPUT=json
//! CLI_DEBUG=false
//! ```
//!
//! Unquoted values may contain spaces. Values written by [`save_config`] are
//! single-quoted when they contain whitespace or shell-special characters,
//! and double-quoted with escapes when they also contain a single quote.
//!
//! Reading never touches the process environment; the pairs are merged into
//! the environment snapshot instead, where real variables take precedence.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

use crate::options::is_truthy;
use crate::output::OutputFormat;

pub const CONFIG_FILE: &str = ".env.cli";
pub const DEFAULT_NAME: &str = "demo-cli";

pub const KEY_NAME: &str = "CLI_NAME";
pub const KEY_DESCRIPTION: &str = "CLI_DESCRIPTION";
pub const KEY_AUTHOR: &str = "CLI_AUTHOR";
pub const KEY_OUTPUT: &str = "CLI_OUTPUT";
pub const KEY_DEBUG: &str = "CLI_DEBUG";

/// Resolved configuration with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub output_format: OutputFormat,
    pub debug: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            description: None,
            author: None,
            output_format: OutputFormat::Json,
            debug: false,
        }
    }
}

/// Only the fields a file (or a caller) actually sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub debug: Option<bool>,
}

impl PartialConfig {
    /// Build from `KEY=value` pairs, ignoring unrelated keys.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                KEY_NAME => config.name = non_empty(value),
                KEY_DESCRIPTION => config.description = non_empty(value),
                KEY_AUTHOR => config.author = non_empty(value),
                KEY_OUTPUT => config.output_format = Some(OutputFormat::from_tag(Some(value))),
                KEY_DEBUG => config.debug = Some(is_truthy(value)),
                _ => {}
            }
        }
        config
    }

    /// Overlay every field `other` sets.
    pub fn merge(mut self, other: PartialConfig) -> Self {
        self.name = other.name.or(self.name);
        self.description = other.description.or(self.description);
        self.author = other.author.or(self.author);
        self.output_format = other.output_format.or(self.output_format);
        self.debug = other.debug.or(self.debug);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn resolve(self) -> CliConfig {
        let defaults = CliConfig::default();
        CliConfig {
            name: self.name.unwrap_or(defaults.name),
            description: self.description,
            author: self.author,
            output_format: self.output_format.unwrap_or(defaults.output_format),
            debug: self.debug.unwrap_or(defaults.debug),
        }
    }

    /// One `KEY=value` line per present field, in a fixed order.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(name) = &self.name {
            lines.push(format!("{}={}", KEY_NAME, quote(name)));
        }
        if let Some(description) = &self.description {
            lines.push(format!("{}={}", KEY_DESCRIPTION, quote(description)));
        }
        if let Some(author) = &self.author {
            lines.push(format!("{}={}", KEY_AUTHOR, quote(author)));
        }
        if let Some(format) = self.output_format {
            lines.push(format!("{}={}", KEY_OUTPUT, format));
        }
        if let Some(debug) = self.debug {
            lines.push(format!("{}={}", KEY_DEBUG, debug));
        }
        lines
    }
}

fn quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '"' | '\'' | '#' | '$' | '\\' | '`'));
    if plain {
        return value.to_string();
    }
    if !value.contains(['\'', '\n']) {
        return format!("'{}'", value);
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' | '$' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Default location: `.env.cli` in the working directory.
pub fn config_path() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    Ok(cwd.join(CONFIG_FILE))
}

/// Read raw `KEY=value` pairs. A missing file yields no pairs.
pub fn read_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read config file: {}", path.display()));
        }
    };

    parse_pairs(&text).with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse dotenv text line by line with `dotenvy`. A line it rejects is
/// still accepted as a bare `KEY=value` whose value is taken verbatim.
pub fn parse_pairs(text: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for (index, line) in text.lines().enumerate() {
        match dotenvy::from_read_iter(line.as_bytes()).next() {
            None => {}
            Some(Ok(pair)) => pairs.push(pair),
            Some(Err(err)) => match bare_pair(line) {
                Some(pair) => pairs.push(pair),
                None => return Err(err).with_context(|| format!("line {}", index + 1)),
            },
        }
    }
    Ok(pairs)
}

fn bare_pair(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if !valid_key || value.starts_with(['"', '\'']) {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

/// File pairs as the option normalizer should see them: `CLI_OUTPUT` and
/// `CLI_DEBUG` are reduced to the values [`PartialConfig::from_pairs`] reads.
pub fn env_fallbacks(pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    pairs
        .into_iter()
        .map(|(key, value)| {
            let value = match key.as_str() {
                KEY_OUTPUT => OutputFormat::from_tag(Some(value.as_str())).to_string(),
                KEY_DEBUG => is_truthy(&value).to_string(),
                _ => value,
            };
            (key, value)
        })
        .collect()
}

pub fn load_partial(path: &Path) -> Result<PartialConfig> {
    Ok(PartialConfig::from_pairs(&read_pairs(path)?))
}

/// Load `path` (or the default location) with defaults applied.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    Ok(load_partial(&path)?.resolve())
}

/// Write only the fields present in `config`.
pub fn save_config(config: &PartialConfig, path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    std::fs::write(&path, config.to_lines().join("\n"))
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(path)
}
