use anyhow::Context;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use demo_cli::commands::{Services, builtin_registry, program_info};
use demo_cli::config::{CONFIG_FILE, PartialConfig, env_fallbacks, read_pairs};
use demo_cli::dispatch::{Dispatcher, report_failure};
use demo_cli::errors::CliError;
use demo_cli::http::ReqwestTransport;
use demo_cli::options::Environment;
use demo_cli::ui::{ConsoleReporter, Reporter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let reporter = ConsoleReporter::new();
    match run(&reporter).await {
        Ok(code) => code,
        Err(err) => {
            report_failure(&reporter, &err);
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(reporter: &dyn Reporter) -> Result<ExitCode, CliError> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;

    // Real environment variables win over the file.
    let pairs = read_pairs(&working_dir.join(CONFIG_FILE))?;
    let config = PartialConfig::from_pairs(&pairs).resolve();
    let env = Environment::capture().with_fallbacks(env_fallbacks(pairs));

    let registry = builtin_registry(Services {
        transport: Arc::new(ReqwestTransport::new()),
        working_dir,
    })?;
    let dispatcher = Dispatcher::new(registry, program_info(&config));

    let argv = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
    let outcome = dispatcher.dispatch(argv, &env, reporter).await;
    Ok(ExitCode::from(outcome.exit_code()))
}
