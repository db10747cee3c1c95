pub mod compose;
pub mod container;
pub mod exec;
pub mod image;
pub mod log_stream;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use bollard::Docker;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::outcome::Outcome;

pub use log_stream::LogStream;

/// State of a container's Docker health check, when it defines one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckState {
    Starting,
    Healthy,
    Unhealthy,
}

/// One host-side binding of a published container port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostBinding {
    pub host_ip: Option<String>,
    pub host_port: Option<String>,
}

/// Point-in-time view of a container as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSnapshot {
    /// Docker lifecycle state: "created", "running", "exited", ...
    pub status: String,
    /// `None` when the image defines no health check.
    pub health_check: Option<HealthCheckState>,
    pub started_at: Option<DateTime<Utc>>,
    /// Container port (e.g. "3000/tcp") to its host bindings.
    pub ports: BTreeMap<String, Vec<HostBinding>>,
    pub image: Option<String>,
}

impl ContainerSnapshot {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

/// A compose project: the file plus the directory compose runs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeTarget {
    pub file: PathBuf,
    pub project_dir: PathBuf,
}

/// Captured output of a `docker compose` invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Result of a command run inside a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
}

/// The container runtime as the lifecycle controller sees it: compose verbs,
/// introspection, logs, exec and image removal.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Fails with [`Error::RuntimeUnavailable`] when the daemon is unreachable.
    async fn ping(&self) -> Result<()>;

    /// `Ok(None)` when no container with that name exists.
    async fn inspect(&self, container: &str) -> Result<Option<ContainerSnapshot>>;

    /// Run `docker compose -f <file> <args...>` and capture its output.
    async fn compose(&self, target: &ComposeTarget, args: &[&str]) -> Result<ComposeOutput>;

    /// The last `tail` log lines of a container, with timestamps.
    async fn logs(&self, container: &str, tail: usize) -> Result<Vec<String>>;

    /// Follow a compose project's logs until the stream is dropped.
    async fn follow_logs(&self, target: &ComposeTarget, tail: usize) -> Result<LogStream>;

    async fn exec(&self, container: &str, cmd: Vec<String>) -> Result<ExecOutput>;

    /// Hand the terminal to an interactive shell in a compose service and
    /// return its exit code.
    async fn attach(&self, target: &ComposeTarget, service: &str, shell: &str) -> Result<i32>;

    /// Force-remove a container; a missing container is not an error.
    async fn remove_container(&self, container: &str) -> Result<()>;

    /// Force-remove an image by tag. `Unchanged` if it did not exist.
    async fn remove_image(&self, image: &str) -> Result<Outcome>;
}

/// [`ContainerRuntime`] backed by the local Docker daemon (via bollard) and
/// the `docker compose` CLI.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Client for the local daemon without contacting it. Queries fail with
    /// [`Error::RuntimeUnavailable`] while the daemon is down.
    pub fn local() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults().map_err(|e| Error::RuntimeUnavailable {
            reason: e.to_string(),
        })?;
        Ok(Self { docker })
    }

    /// Connect to the local daemon, verifying it answers a ping.
    pub async fn connect() -> Result<Self> {
        let runtime = Self::local()?;
        runtime.ping().await?;
        tracing::debug!("docker client initialized");
        Ok(runtime)
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| Error::RuntimeUnavailable {
                reason: e.to_string(),
            })
    }

    async fn inspect(&self, container: &str) -> Result<Option<ContainerSnapshot>> {
        container::inspect_container(&self.docker, container).await
    }

    async fn compose(&self, target: &ComposeTarget, args: &[&str]) -> Result<ComposeOutput> {
        compose::run_compose(target, args).await
    }

    async fn logs(&self, container: &str, tail: usize) -> Result<Vec<String>> {
        log_stream::tail_logs(&self.docker, container, tail).await
    }

    async fn follow_logs(&self, target: &ComposeTarget, tail: usize) -> Result<LogStream> {
        compose::follow_logs(target, tail)
    }

    async fn exec(&self, container: &str, cmd: Vec<String>) -> Result<ExecOutput> {
        exec::exec_in_container(&self.docker, container, cmd).await
    }

    async fn attach(&self, target: &ComposeTarget, service: &str, shell: &str) -> Result<i32> {
        compose::attach_shell(target, service, shell).await
    }

    async fn remove_container(&self, container: &str) -> Result<()> {
        container::remove_container(&self.docker, container).await
    }

    async fn remove_image(&self, image: &str) -> Result<Outcome> {
        image::remove_image(&self.docker, image).await
    }
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;
    use tempfile::TempDir;

    #[tokio::test]
    async fn inspect_through_dead_socket_reports_unavailable() {
        let dir = TempDir::new().unwrap();
        let socket = dir.path().join("docker.sock");
        // the socket file outlives its listener, so connects are refused
        drop(UnixListener::bind(&socket).unwrap());

        let docker =
            Docker::connect_with_unix(socket.to_str().unwrap(), 5, bollard::API_DEFAULT_VERSION)
                .unwrap();
        let runtime = DockerRuntime { docker };

        let err = runtime.inspect("groucho-dev").await.unwrap_err();
        assert!(
            matches!(err, Error::RuntimeUnavailable { .. }),
            "unexpected error: {err:?}"
        );
    }
}
