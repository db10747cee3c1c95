use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::docker::{ContainerSnapshot, HealthCheckState, HostBinding};

/// Container health as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy,
    Unknown,
}

impl Health {
    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Healthy => "healthy",
            Health::Unhealthy => "unhealthy",
            Health::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one environment's container.
///
/// `running` implies `exists`, and `uptime` is only set while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub name: String,
    pub exists: bool,
    pub running: bool,
    pub status: String,
    pub health: Health,
    pub ports: BTreeMap<String, Vec<HostBinding>>,
    pub uptime: Option<Duration>,
    pub image: Option<String>,
}

impl ContainerStatus {
    /// The record reported for a container that has never been created.
    pub fn absent(name: &str) -> Self {
        Self {
            name: name.to_string(),
            exists: false,
            running: false,
            status: "not_created".to_string(),
            health: Health::Unknown,
            ports: BTreeMap::new(),
            uptime: None,
            image: None,
        }
    }

    pub fn from_snapshot(name: &str, snapshot: ContainerSnapshot, now: DateTime<Utc>) -> Self {
        let running = snapshot.is_running();
        let health = match snapshot.health_check {
            Some(HealthCheckState::Healthy) => Health::Healthy,
            Some(HealthCheckState::Unhealthy) => Health::Unhealthy,
            Some(HealthCheckState::Starting) => Health::Unknown,
            None if running => Health::Healthy,
            None => Health::Unknown,
        };
        let uptime = if running {
            snapshot
                .started_at
                .and_then(|started| (now - started).to_std().ok())
        } else {
            None
        };

        Self {
            name: name.to_string(),
            exists: true,
            running,
            status: snapshot.status,
            health,
            ports: snapshot.ports,
            uptime,
            image: snapshot.image,
        }
    }

    /// Published ports as `host->container` pairs, e.g. `3000->3000/tcp`.
    pub fn published_ports(&self) -> Vec<String> {
        self.ports
            .iter()
            .flat_map(|(container_port, bindings)| {
                bindings.iter().filter_map(move |b| {
                    b.host_port
                        .as_deref()
                        .filter(|p| !p.is_empty())
                        .map(|host| format!("{}->{}", host, container_port))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docker::fake;

    #[test]
    fn absent_record() {
        let status = ContainerStatus::absent("groucho-the-hunter-dev");
        assert!(!status.exists);
        assert!(!status.running);
        assert_eq!(status.status, "not_created");
        assert_eq!(status.health, Health::Unknown);
        assert!(status.ports.is_empty());
        assert_eq!(status.uptime, None);
    }

    #[test]
    fn running_without_health_check_is_healthy() {
        let snap = fake::running();
        let started = snap.started_at.unwrap();
        let status = ContainerStatus::from_snapshot("c", snap, started + chrono::Duration::seconds(75));
        assert!(status.running && status.exists);
        assert_eq!(status.health, Health::Healthy);
        assert_eq!(status.uptime, Some(Duration::from_secs(75)));
        assert_eq!(status.published_ports(), vec!["3000->3000/tcp"]);
    }

    #[test]
    fn starting_health_check_is_unknown() {
        let status = ContainerStatus::from_snapshot(
            "c",
            fake::with_health(HealthCheckState::Starting),
            Utc::now(),
        );
        assert_eq!(status.health, Health::Unknown);
    }

    #[test]
    fn stopped_container_has_no_uptime() {
        let status = ContainerStatus::from_snapshot("c", fake::with_status("exited"), Utc::now());
        assert!(status.exists);
        assert!(!status.running);
        assert_eq!(status.uptime, None);
        assert_eq!(status.health, Health::Unknown);
    }
}
