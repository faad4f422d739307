//! Built-in commands.
//!
//! | Module   | Command            |
//! |----------|--------------------|
//! | `greet`  | `greet` (`hello`)  |
//! | `fetch`  | `fetch <url>`      |
//! | `init`   | `init`             |
//! | `config` | `config`           |

pub mod config;
pub mod fetch;
pub mod greet;
pub mod init;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{CliConfig, KEY_DEBUG};
use crate::errors::CliError;
use crate::http::HttpTransport;
use crate::options::OptionSpec;
use crate::registry::{CommandRegistry, ProgramInfo};

pub const DEFAULT_ABOUT: &str = "Command-line demo: greeting, HTTP fetch and project scaffolding";

/// `--verbose`, seeded from `CLI_DEBUG`.
pub(crate) fn verbose_option() -> OptionSpec {
    OptionSpec::flag("verbose", "Verbose output")
        .short('v')
        .env(KEY_DEBUG)
}

/// Collaborators the built-in commands need.
#[derive(Clone)]
pub struct Services {
    pub transport: Arc<dyn HttpTransport>,
    /// Directory `init` and `config` resolve relative paths against.
    pub working_dir: PathBuf,
}

/// Register every built-in command.
pub fn builtin_registry(services: Services) -> Result<CommandRegistry, CliError> {
    let mut registry = CommandRegistry::new();
    registry.register(greet::spec())?;
    registry.register(fetch::spec(Arc::clone(&services.transport)))?;
    registry.register(init::spec(init::InitAction::new(services.working_dir.clone())))?;
    registry.register(config::spec(services.working_dir))?;
    Ok(registry)
}

/// Root program name and description, taken from the loaded configuration.
pub fn program_info(config: &CliConfig) -> ProgramInfo {
    ProgramInfo {
        name: config.name.clone(),
        about: config
            .description
            .clone()
            .unwrap_or_else(|| DEFAULT_ABOUT.to_string()),
        version: env!("CARGO_PKG_VERSION"),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::errors::TransportError;
    use crate::http::{HttpResponse, HttpTransport, ProgressCallback};

    /// Transport that answers every request with a canned result.
    pub struct FakeTransport {
        pub status: u16,
        pub body: serde_json::Value,
        pub calls: AtomicUsize,
        pub last_timeout: Mutex<Option<Duration>>,
    }

    impl FakeTransport {
        pub fn responding(status: u16, body: serde_json::Value) -> Self {
            Self {
                status,
                body,
                calls: AtomicUsize::new(0),
                last_timeout: Mutex::new(None),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn get(
            &self,
            _url: &str,
            timeout: Duration,
            on_progress: ProgressCallback<'_>,
        ) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_timeout.lock().unwrap() = Some(timeout);
            if !(200..300).contains(&self.status) {
                return Err(TransportError::with_status(
                    format!("Request failed with status code {}", self.status),
                    self.status,
                ));
            }
            let text = self.body.to_string();
            let total = text.len() as u64;
            on_progress(total / 2, total);
            on_progress(total, total);
            let mut headers = BTreeMap::new();
            headers.insert("content-length".to_string(), total.to_string());
            headers.insert("content-type".to_string(), "application/json".to_string());
            Ok(HttpResponse {
                status: self.status,
                headers,
                body: self.body.clone(),
            })
        }
    }
}
