//! `fetch <url>` — GET a URL and print or save the result envelope.

use anyhow::Context;
use async_trait::async_trait;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::commands::verbose_option;
use crate::errors::CliError;
use crate::http::HttpTransport;
use crate::options::{NormalizedOptions, OptionSpec};
use crate::output::{OutputFormat, render};
use crate::registry::{Action, ArgSpec, CommandSpec};
use crate::types::ResultEnvelope;
use crate::ui::{ProgressState, Reporter};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub fn spec(transport: Arc<dyn HttpTransport>) -> CommandSpec {
    CommandSpec::new("fetch", "Fetch data from an API", Arc::new(FetchAction::new(transport)))
        .arg(ArgSpec::required("url", "URL to fetch"))
        .option(OptionSpec::string("output", "FILE", "Output file path").short('o'))
        .option(
            OptionSpec::choice("format", "FORMAT", &["json", "text"], "Output format")
                .short('f')
                .default_value("json"),
        )
        .option(
            OptionSpec::integer("timeout", "SECONDS", "Request timeout, 0 for none")
                .short('t')
                .default_value("30"),
        )
        .option(verbose_option())
}

pub struct FetchAction {
    transport: Arc<dyn HttpTransport>,
}

impl FetchAction {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Action for FetchAction {
    async fn run(
        &self,
        args: &[String],
        options: &NormalizedOptions,
        reporter: &dyn Reporter,
    ) -> Result<(), CliError> {
        let url = args
            .first()
            .ok_or_else(|| CliError::generic("Missing <url> argument"))?;
        let timeout = Duration::from_secs(options.int("timeout").unwrap_or(DEFAULT_TIMEOUT_SECS));
        let format = OutputFormat::from_tag(options.str("format"));
        let verbose = options.flag("verbose");

        reporter.info(&format!("Fetching from: {}", style(url).cyan()));
        let spinner = reporter.spinner("Downloading data");
        reporter.progress(&ProgressState::new(0, 100, "Connecting..."));

        let mut on_progress = |loaded: u64, total: u64| {
            reporter.progress(&ProgressState::new(loaded, total, "Downloading..."));
        };
        let response = match self.transport.get(url, timeout, &mut on_progress).await {
            Ok(response) => response,
            Err(err) => {
                spinner.fail("Fetch failed");
                return Err(err.into());
            }
        };
        spinner.succeed("Data fetched successfully!");

        reporter.success(&format!("Status: {}", response.status));
        reporter.success(&format!(
            "Size: {} bytes",
            response.content_length().unwrap_or("Unknown")
        ));

        if verbose {
            reporter.info("Response headers:");
            reporter.info(&render(&response.headers, OutputFormat::Json)?);
        }

        let envelope = ResultEnvelope::new(response.body, response.status);
        let content = render(&envelope, format)?;

        match options.str("output") {
            Some(path) => {
                let path = PathBuf::from(path);
                tokio::fs::write(&path, content)
                    .await
                    .with_context(|| format!("Failed to write output file: {}", path.display()))?;
                reporter.success(&format!("Saved to: {}", style(path.display()).bold()));
            }
            None => reporter.print(&content),
        }
        Ok(())
    }
}
