//! Result rendering: JSON, plain text, or a markdown-fenced block.

use serde::{Deserialize, Serialize};

use crate::errors::CliError;
use crate::ui::Reporter;

/// Output format tags accepted by `--output`/`--format`.
pub const FORMAT_TAGS: &[&str] = &["json", "text", "markdown"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
    Markdown,
}

impl OutputFormat {
    /// Parse a format tag. Unknown or absent tags fall back to JSON.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("text") => OutputFormat::Text,
            Some("markdown") => OutputFormat::Markdown,
            _ => OutputFormat::Json,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
            OutputFormat::Markdown => "markdown",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type Wrap = fn(String) -> String;

const RENDERERS: [(OutputFormat, Wrap); 3] = [
    (OutputFormat::Json, as_json),
    (OutputFormat::Text, as_text),
    (OutputFormat::Markdown, as_markdown),
];

fn as_json(body: String) -> String {
    body
}

fn as_text(body: String) -> String {
    body
}

// Opening fence has four backticks, closing fence three.
fn as_markdown(body: String) -> String {
    format!("````\n{}\n```", body)
}

/// Render `data` as indented JSON, wrapped for `format`.
pub fn render<T: Serialize + ?Sized>(data: &T, format: OutputFormat) -> Result<String, CliError> {
    let body = serde_json::to_string_pretty(data)
        .map_err(|e| CliError::generic(format!("Failed to serialize output: {}", e)))?;
    let wrap = RENDERERS
        .iter()
        .find(|(f, _)| *f == format)
        .map(|(_, wrap)| *wrap)
        .unwrap_or(as_json);
    Ok(wrap(body))
}

/// Render `data` and write it to the reporter's output stream.
pub fn format_output<T: Serialize + ?Sized>(
    reporter: &dyn Reporter,
    data: &T,
    tag: Option<&str>,
) -> Result<(), CliError> {
    reporter.print(&render(data, OutputFormat::from_tag(tag))?);
    Ok(())
}
