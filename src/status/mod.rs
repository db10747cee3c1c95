pub mod metrics;

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::docker::ContainerRuntime;
use crate::environment::{Environment, EnvironmentSpec};
use crate::lifecycle::{ContainerController, ContainerStatus};

pub use metrics::HostMetrics;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REACHABLE_POLL: Duration = Duration::from_secs(1);

/// Everything the status views show for one environment. Each part is
/// gathered independently; a failed container query leaves an absent
/// record plus `container_error`.
#[derive(Debug, Clone)]
pub struct GameInfo {
    pub environment: Environment,
    pub url: String,
    pub container: ContainerStatus,
    pub container_error: Option<String>,
    /// The game's port accepts TCP connections from this host.
    pub reachable: bool,
    pub host: Option<HostMetrics>,
}

impl GameInfo {
    /// Container up and its port answering.
    pub fn is_running(&self) -> bool {
        self.container.running && self.reachable
    }
}

/// Combines container state, reachability and host metrics. Stateless:
/// every call queries afresh, so it can run on a background task.
pub struct StatusAggregator<R: ?Sized> {
    containers: ContainerController<R>,
    host_metrics: bool,
}

impl<R> StatusAggregator<R>
where
    R: ContainerRuntime + ?Sized,
{
    pub fn new(containers: ContainerController<R>) -> Self {
        Self {
            containers,
            host_metrics: true,
        }
    }

    /// Skip the host metrics sample (it takes a fraction of a second).
    pub fn without_host_metrics(mut self) -> Self {
        self.host_metrics = false;
        self
    }

    pub async fn game_info(&self, env: Environment) -> GameInfo {
        let spec = self.containers.config().environment(env);

        let (container, reachable, host) = tokio::join!(
            self.containers.status(env),
            reachable(spec),
            self.sample_host()
        );
        let (container, container_error) = match container {
            Ok(status) => (status, None),
            Err(e) => {
                tracing::debug!(environment = %env, error = %e, "container status unavailable");
                (ContainerStatus::absent(&spec.container_name), Some(e.to_string()))
            }
        };

        GameInfo {
            environment: env,
            url: spec.url.clone(),
            container,
            container_error,
            reachable,
            host,
        }
    }

    pub async fn all_game_info(&self) -> Vec<GameInfo> {
        let (dev, prod) = tokio::join!(
            self.game_info(Environment::Development),
            self.game_info(Environment::Production)
        );
        vec![dev, prod]
    }

    /// Poll reachability once a second until it succeeds or `timeout` passes.
    pub async fn wait_for_reachable(&self, env: Environment, timeout: Duration) -> bool {
        let spec = self.containers.config().environment(env);
        let started = Instant::now();
        while started.elapsed() < timeout {
            if reachable(spec).await {
                tracing::info!(environment = %env, url = %spec.url, "game is reachable");
                return true;
            }
            tokio::time::sleep(REACHABLE_POLL).await;
        }
        tracing::warn!(environment = %env, url = %spec.url, "timed out waiting for game");
        false
    }

    async fn sample_host(&self) -> Option<HostMetrics> {
        if self.host_metrics {
            metrics::sample().await
        } else {
            None
        }
    }
}

/// Host and port a reachability probe connects to: from the URL, with the
/// configured port when the URL has none.
pub fn probe_target(spec: &EnvironmentSpec) -> (String, u16) {
    match reqwest::Url::parse(&spec.url) {
        Ok(url) => (
            url.host_str().unwrap_or("localhost").to_string(),
            url.port().unwrap_or(spec.port),
        ),
        Err(_) => ("localhost".to_string(), spec.port),
    }
}

/// TCP connect to the environment's URL within five seconds.
pub async fn reachable(spec: &EnvironmentSpec) -> bool {
    let (host, port) = probe_target(spec);
    matches!(
        tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect((host.as_str(), port))).await,
        Ok(Ok(_))
    )
}
