pub mod chrome;
pub mod containers;
pub mod doctor;
pub mod exec;
pub mod logs;
pub mod menu;
pub mod status;

use std::sync::Arc;

use anyhow::bail;

use crate::config::Config;
use crate::docker::DockerRuntime;
use crate::environment::Environment;
use crate::error::Error;
use crate::lifecycle::ContainerController;
use crate::ui;

/// Read the configuration once for the whole invocation.
pub fn load_config() -> anyhow::Result<Arc<Config>> {
    let config = Config::from_env().map_err(Error::from)?;
    tracing::debug!(root = %config.project_root.display(), "configuration loaded");
    Ok(Arc::new(config))
}

/// Connect to Docker and build the controller every container command uses.
pub async fn connect(config: Arc<Config>) -> anyhow::Result<ContainerController<DockerRuntime>> {
    let runtime = DockerRuntime::connect().await?;
    Ok(ContainerController::new(Arc::new(runtime), config))
}

/// Per-environment failures of a multi-environment command.
#[derive(Debug, Default)]
pub struct Failures {
    attempted: usize,
    failed: Vec<Environment>,
}

impl Failures {
    /// Print the error and remember which environment it came from.
    pub fn record<T>(&mut self, env: Environment, result: Result<T, Error>) -> Option<T> {
        self.attempted += 1;
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(environment = %env, error = ?e, "operation failed");
                ui::failure(e.title(), format!("{}: {}", env.title(), e));
                self.failed.push(env);
                None
            }
        }
    }

    /// Fail the command when any environment failed.
    pub fn finish(self, action: &str) -> anyhow::Result<()> {
        if self.failed.is_empty() {
            return Ok(());
        }
        let names: Vec<&str> = self.failed.iter().map(|e| e.as_str()).collect();
        bail!(
            "{} failed for {} of {} environment(s): {}",
            action,
            self.failed.len(),
            self.attempted,
            names.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_collect_per_environment() {
        let mut failures = Failures::default();
        assert_eq!(failures.record(Environment::Development, Ok::<_, Error>(1)), Some(1));
        assert_eq!(
            failures.record::<()>(
                Environment::Production,
                Err(Error::ContainerNotFound {
                    container: "groucho-the-hunter".to_string()
                })
            ),
            None
        );
        let err = failures.finish("stop").unwrap_err().to_string();
        assert_eq!(err, "stop failed for 1 of 2 environment(s): production");
    }

    #[test]
    fn no_failures_is_ok() {
        let mut failures = Failures::default();
        failures.record(Environment::Development, Ok::<_, Error>(()));
        assert!(failures.finish("start").is_ok());
    }
}
