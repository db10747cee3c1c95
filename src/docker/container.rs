use std::collections::BTreeMap;

use bollard::models::{
    ContainerInspectResponse, ContainerStateStatusEnum, HealthStatusEnum, PortBinding,
};
use bollard::query_parameters::{InspectContainerOptions, RemoveContainerOptions};
use bollard::Docker;
use chrono::{DateTime, Utc};

use crate::docker::{ContainerSnapshot, HealthCheckState, HostBinding};
use crate::error::{Error, Result};

/// Inspect a container by name. A 404 from the daemon means it does not exist.
pub async fn inspect_container(docker: &Docker, name: &str) -> Result<Option<ContainerSnapshot>> {
    match docker
        .inspect_container(name, None::<InspectContainerOptions>)
        .await
    {
        Ok(response) => Ok(Some(snapshot_from_inspect(response))),
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => Ok(None),
        Err(e) => Err(Error::docker(format!("inspecting container {}", name), e)),
    }
}

/// Force-remove a container by name.
pub async fn remove_container(docker: &Docker, name: &str) -> Result<()> {
    let options = RemoveContainerOptions {
        force: true,
        ..Default::default()
    };
    match docker.remove_container(name, Some(options)).await {
        Ok(()) => Ok(()),
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => Ok(()),
        Err(e) => Err(Error::docker(format!("removing container {}", name), e)),
    }
}

pub(crate) fn snapshot_from_inspect(response: ContainerInspectResponse) -> ContainerSnapshot {
    let state = response.state.unwrap_or_default();
    let status = state
        .status
        .map(status_name)
        .unwrap_or("unknown")
        .to_string();

    let health_check = state
        .health
        .and_then(|h| h.status)
        .and_then(|s| match s {
            HealthStatusEnum::STARTING => Some(HealthCheckState::Starting),
            HealthStatusEnum::HEALTHY => Some(HealthCheckState::Healthy),
            HealthStatusEnum::UNHEALTHY => Some(HealthCheckState::Unhealthy),
            _ => None,
        });

    // Docker reports "0001-01-01T00:00:00Z" for containers that never started.
    let started_at = if status == "running" {
        state.started_at.as_deref().and_then(parse_timestamp)
    } else {
        None
    };

    let ports = response
        .network_settings
        .and_then(|n| n.ports)
        .map(|ports| {
            ports
                .into_iter()
                .map(|(port, bindings)| (port, convert_bindings(bindings)))
                .collect()
        })
        .unwrap_or_else(BTreeMap::new);

    ContainerSnapshot {
        status,
        health_check,
        started_at,
        ports,
        image: response.config.and_then(|c| c.image),
    }
}

fn status_name(status: ContainerStateStatusEnum) -> &'static str {
    match status {
        ContainerStateStatusEnum::CREATED => "created",
        ContainerStateStatusEnum::RUNNING => "running",
        ContainerStateStatusEnum::PAUSED => "paused",
        ContainerStateStatusEnum::RESTARTING => "restarting",
        ContainerStateStatusEnum::REMOVING => "removing",
        ContainerStateStatusEnum::EXITED => "exited",
        ContainerStateStatusEnum::DEAD => "dead",
        _ => "unknown",
    }
}

fn convert_bindings(bindings: Option<Vec<PortBinding>>) -> Vec<HostBinding> {
    bindings
        .unwrap_or_default()
        .into_iter()
        .map(|b| HostBinding {
            host_ip: b.host_ip,
            host_port: b.host_port,
        })
        .collect()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
