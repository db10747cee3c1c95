pub mod ready;
pub mod status;

use std::sync::Arc;

use crate::config::Config;
use crate::docker::{ComposeTarget, ContainerRuntime, ExecOutput, LogStream};
use crate::environment::{Environment, EnvironmentSpec};
use crate::error::{Error, Result};
use crate::outcome::Outcome;

pub use ready::ReadinessPolicy;
pub use status::{ContainerStatus, Health};

/// Drives the development and production containers through the runtime.
///
/// Holds no container state of its own: every answer comes from a fresh
/// runtime query.
pub struct ContainerController<R: ?Sized> {
    runtime: Arc<R>,
    config: Arc<Config>,
    policy: ReadinessPolicy,
}

impl<R: ?Sized> Clone for ContainerController<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            config: Arc::clone(&self.config),
            policy: self.policy,
        }
    }
}

impl<R> ContainerController<R>
where
    R: ContainerRuntime + ?Sized,
{
    pub fn new(runtime: Arc<R>, config: Arc<Config>) -> Self {
        Self {
            runtime,
            config,
            policy: ReadinessPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReadinessPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bring an environment up and wait for it to become ready.
    pub async fn start(&self, env: Environment, build: bool) -> Result<Outcome> {
        let spec = self.config.environment(env);
        let target = self.compose_target(spec)?;

        if let Some(snapshot) = self.runtime.inspect(&spec.container_name).await? {
            if snapshot.is_running() {
                tracing::info!(environment = %env, container = %spec.container_name, "already running");
                return Ok(Outcome::Unchanged);
            }
        }

        let mut args = vec!["up", "-d"];
        if build {
            args.push("--build");
        }
        tracing::info!(environment = %env, build, "starting containers");
        self.compose_checked(&target, &args).await?;

        ready::wait_until_ready(self.runtime.as_ref(), spec, &self.policy).await?;
        tracing::info!(environment = %env, url = %spec.url, "environment ready");
        Ok(Outcome::Applied)
    }

    /// Take an environment down. With `remove`, volumes go too, and a
    /// stopped container is deleted.
    pub async fn stop(&self, env: Environment, remove: bool) -> Result<Outcome> {
        let spec = self.config.environment(env);

        let Some(snapshot) = self.runtime.inspect(&spec.container_name).await? else {
            tracing::info!(environment = %env, "no container to stop");
            return Ok(Outcome::Unchanged);
        };

        if !snapshot.is_running() {
            if remove {
                tracing::info!(container = %spec.container_name, status = %snapshot.status, "removing stopped container");
                self.runtime.remove_container(&spec.container_name).await?;
                return Ok(Outcome::Applied);
            }
            tracing::info!(environment = %env, status = %snapshot.status, "container is not running");
            return Ok(Outcome::Unchanged);
        }

        let target = self.compose_target(spec)?;
        let mut args = vec!["down"];
        if remove {
            args.push("-v");
        }
        tracing::info!(environment = %env, remove, "stopping containers");
        self.compose_checked(&target, &args).await?;
        Ok(Outcome::Applied)
    }

    /// `compose restart`, then the same readiness wait as `start`.
    pub async fn restart(&self, env: Environment) -> Result<Outcome> {
        let spec = self.config.environment(env);
        let target = self.compose_target(spec)?;

        if self.runtime.inspect(&spec.container_name).await?.is_none() {
            return Err(Error::ContainerNotFound {
                container: spec.container_name.clone(),
            });
        }

        tracing::info!(environment = %env, "restarting containers");
        self.compose_checked(&target, &["restart"]).await?;
        ready::wait_until_ready(self.runtime.as_ref(), spec, &self.policy).await?;
        Ok(Outcome::Applied)
    }

    /// One inspection of the environment's container. Absence is a normal
    /// answer, not an error.
    pub async fn status(&self, env: Environment) -> Result<ContainerStatus> {
        let spec = self.config.environment(env);
        Ok(match self.runtime.inspect(&spec.container_name).await? {
            Some(snapshot) => {
                ContainerStatus::from_snapshot(&spec.container_name, snapshot, chrono::Utc::now())
            }
            None => ContainerStatus::absent(&spec.container_name),
        })
    }

    /// Container logs: the last `tail` lines, or a live follow that ends
    /// when the returned stream is dropped.
    pub async fn stream_logs(&self, env: Environment, follow: bool, tail: usize) -> Result<LogStream> {
        let spec = self.config.environment(env);
        if self.runtime.inspect(&spec.container_name).await?.is_none() {
            return Err(Error::ContainerNotFound {
                container: spec.container_name.clone(),
            });
        }

        if follow {
            let target = self.compose_target(spec)?;
            self.runtime.follow_logs(&target, tail).await
        } else {
            let lines = self.runtime.logs(&spec.container_name, tail).await?;
            Ok(LogStream::from_lines(lines))
        }
    }

    /// Run a command inside the environment's running container.
    pub async fn execute(&self, env: Environment, argv: Vec<String>) -> Result<ExecOutput> {
        let spec = self.config.environment(env);
        self.require_running(spec).await?;
        tracing::debug!(container = %spec.container_name, argv = ?argv, "exec");
        self.runtime.exec(&spec.container_name, argv).await
    }

    /// Open an interactive shell in the container, preferring bash.
    pub async fn shell(&self, env: Environment) -> Result<i32> {
        let spec = self.config.environment(env);
        self.require_running(spec).await?;
        let target = self.compose_target(spec)?;

        let probe = vec!["test".to_string(), "-x".to_string(), "/bin/bash".to_string()];
        let shell = match self.runtime.exec(&spec.container_name, probe).await {
            Ok(out) if out.exit_code == 0 => "/bin/bash",
            _ => "/bin/sh",
        };
        tracing::debug!(container = %spec.container_name, shell, "attaching shell");
        self.runtime.attach(&target, &spec.service_name, shell).await
    }

    /// Build (and pull base images for) an environment's image.
    pub async fn build(&self, env: Environment, no_cache: bool) -> Result<Outcome> {
        let spec = self.config.environment(env);
        let target = self.compose_target(spec)?;

        let mut args = vec!["build", "--pull"];
        if no_cache {
            args.push("--no-cache");
        }
        tracing::info!(environment = %env, no_cache, "building image");
        let output = self.runtime.compose(&target, &args).await?;
        if !output.success {
            return Err(Error::BuildFailed {
                environment: env,
                stderr: output.stderr,
            });
        }
        Ok(Outcome::Applied)
    }

    /// Tear down both environments with their volumes and delete both
    /// images. Individual failures are logged and skipped.
    pub async fn clean(&self) -> Result<Outcome> {
        self.runtime.ping().await?;

        for env in Environment::ALL {
            let spec = self.config.environment(env);
            let Ok(target) = self.compose_target(spec) else {
                tracing::debug!(environment = %env, "no compose file, skipping teardown");
                continue;
            };
            match self
                .runtime
                .compose(&target, &["down", "-v", "--remove-orphans"])
                .await
            {
                Ok(output) if output.success => {
                    tracing::info!(environment = %env, "containers and volumes removed")
                }
                Ok(output) => {
                    tracing::warn!(environment = %env, stderr = %output.stderr.trim(), "teardown failed")
                }
                Err(e) => tracing::warn!(environment = %env, error = %e, "teardown failed"),
            }
        }

        for env in Environment::ALL {
            let image = &self.config.environment(env).image;
            match self.runtime.remove_image(image).await {
                Ok(Outcome::Applied) => tracing::info!(image = %image, "image removed"),
                Ok(_) => tracing::debug!(image = %image, "image not present"),
                Err(e) => tracing::warn!(image = %image, error = %e, "could not remove image"),
            }
        }

        Ok(Outcome::Applied)
    }

    fn compose_target(&self, spec: &EnvironmentSpec) -> Result<ComposeTarget> {
        if !spec.compose_file.is_file() {
            return Err(Error::ComposeFileMissing {
                environment: spec.environment,
                path: spec.compose_file.clone(),
            });
        }
        Ok(ComposeTarget {
            file: spec.compose_file.clone(),
            project_dir: self.config.project_root.clone(),
        })
    }

    async fn compose_checked(&self, target: &ComposeTarget, args: &[&str]) -> Result<()> {
        let output = self.runtime.compose(target, args).await?;
        if output.success {
            Ok(())
        } else {
            Err(Error::ComposeFailed {
                command: args.join(" "),
                stderr: output.stderr,
            })
        }
    }

    async fn require_running(&self, spec: &EnvironmentSpec) -> Result<()> {
        match self.runtime.inspect(&spec.container_name).await? {
            None => Err(Error::ContainerNotFound {
                container: spec.container_name.clone(),
            }),
            Some(snapshot) if !snapshot.is_running() => Err(Error::ContainerNotRunning {
                container: spec.container_name.clone(),
                status: snapshot.status,
            }),
            Some(_) => Ok(()),
        }
    }
}
