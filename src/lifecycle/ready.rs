use std::time::Duration;

use tokio::time::Instant;

use crate::docker::{ContainerRuntime, ContainerSnapshot, HealthCheckState};
use crate::environment::EnvironmentSpec;
use crate::error::{Error, Result};

/// Timing of the readiness-wait loop that follows `up` and `restart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
    /// Extra delay after the container looks ready, so the service inside
    /// has time to bind its port.
    pub grace: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
            grace: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pending,
    Ready,
    Unhealthy,
}

/// Classify one inspection. A running container without a health check
/// counts as ready.
pub fn assess(snapshot: Option<&ContainerSnapshot>) -> Verdict {
    let Some(snapshot) = snapshot else {
        return Verdict::Pending;
    };
    match snapshot.health_check {
        Some(HealthCheckState::Unhealthy) => Verdict::Unhealthy,
        Some(HealthCheckState::Healthy) => Verdict::Ready,
        Some(HealthCheckState::Starting) => Verdict::Pending,
        None if snapshot.is_running() => Verdict::Ready,
        None => Verdict::Pending,
    }
}

/// Poll the environment's container until it is ready, reports unhealthy,
/// or the policy's timeout elapses.
pub async fn wait_until_ready<R>(
    runtime: &R,
    spec: &EnvironmentSpec,
    policy: &ReadinessPolicy,
) -> Result<()>
where
    R: ContainerRuntime + ?Sized,
{
    let started = Instant::now();
    loop {
        let snapshot = match runtime.inspect(&spec.container_name).await {
            Ok(snapshot) => snapshot,
            Err(e @ Error::RuntimeUnavailable { .. }) => return Err(e),
            Err(e) => {
                tracing::debug!(container = %spec.container_name, error = %e, "inspect failed while waiting");
                None
            }
        };

        match assess(snapshot.as_ref()) {
            Verdict::Ready => {
                tracing::debug!(
                    container = %spec.container_name,
                    elapsed = ?started.elapsed(),
                    "container ready, waiting out grace period"
                );
                tokio::time::sleep(policy.grace).await;
                return Ok(());
            }
            Verdict::Unhealthy => {
                return Err(Error::ContainerUnhealthy {
                    container: spec.container_name.clone(),
                })
            }
            Verdict::Pending => {
                tracing::debug!(
                    container = %spec.container_name,
                    status = snapshot.as_ref().map(|s| s.status.as_str()).unwrap_or("absent"),
                    "container not ready yet"
                );
            }
        }

        if started.elapsed() >= policy.timeout {
            return Err(Error::StartupTimeout {
                environment: spec.environment,
                waited: policy.timeout,
            });
        }
        tokio::time::sleep(policy.poll_interval).await;
    }
}
