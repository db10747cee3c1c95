// The miette/thiserror derive macros generate code that triggers false
// positive unused_assignments warnings on enum variant fields.
#![allow(unused_assignments)]

use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::environment::Environment;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure a controller can surface to a presentation layer.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("cannot connect to the Docker daemon: {reason}")]
    #[diagnostic(
        code(groucho::runtime_unavailable),
        help("make sure Docker is installed and running")
    )]
    RuntimeUnavailable { reason: String },

    #[error("docker compose file for {environment} not found: {}", path.display())]
    #[diagnostic(
        code(groucho::compose_file_missing),
        help("set GROUCHO_PROJECT_ROOT or GROUCHO_COMPOSE_DEV/GROUCHO_COMPOSE_PROD")
    )]
    ComposeFileMissing {
        environment: Environment,
        path: PathBuf,
    },

    #[error("`docker compose {command}` failed: {}", stderr.trim())]
    #[diagnostic(code(groucho::compose_failed))]
    ComposeFailed { command: String, stderr: String },

    #[error("docker API error while {action}")]
    #[diagnostic(code(groucho::docker))]
    Docker {
        action: String,
        #[source]
        source: bollard::errors::Error,
    },

    #[error("container '{container}' not found")]
    #[diagnostic(code(groucho::container_not_found), help("start it with `groucho start`"))]
    ContainerNotFound { container: String },

    #[error("container '{container}' is not running (status: {status})")]
    #[diagnostic(code(groucho::container_not_running))]
    ContainerNotRunning { container: String, status: String },

    #[error("{environment} container did not become ready within {}", humantime::format_duration(*waited))]
    #[diagnostic(
        code(groucho::startup_timeout),
        help("the container may still be starting; check `groucho logs`")
    )]
    StartupTimeout {
        environment: Environment,
        waited: Duration,
    },

    #[error("container '{container}' reported unhealthy")]
    #[diagnostic(code(groucho::container_unhealthy), help("check `groucho logs` for the cause"))]
    ContainerUnhealthy { container: String },

    #[error("{environment} image build failed: {}", stderr.trim())]
    #[diagnostic(code(groucho::build_failed))]
    BuildFailed {
        environment: Environment,
        stderr: String,
    },

    #[error("Chrome executable not found")]
    #[diagnostic(
        code(groucho::executable_not_found),
        help("install Google Chrome or Chromium, or set CHROME_PATH")
    )]
    ExecutableNotFound { searched: Vec<PathBuf> },

    #[error("failed to start Chrome: {reason}")]
    #[diagnostic(code(groucho::process_start_failed))]
    ProcessStartFailed { reason: String },

    #[error("failed to stop Chrome: {reason}")]
    #[diagnostic(code(groucho::process_stop_failed))]
    ProcessStopFailed { reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Short heading shown above the message.
    pub fn title(&self) -> &'static str {
        match self {
            Error::RuntimeUnavailable { .. } => "Docker Unavailable",
            Error::ComposeFileMissing { .. } => "Compose File Missing",
            Error::ComposeFailed { .. } => "Compose Failed",
            Error::Docker { .. } => "Docker Error",
            Error::ContainerNotFound { .. } => "Container Not Found",
            Error::ContainerNotRunning { .. } => "Container Not Running",
            Error::StartupTimeout { .. } => "Startup Timeout",
            Error::ContainerUnhealthy { .. } => "Container Unhealthy",
            Error::BuildFailed { .. } => "Build Failed",
            Error::ExecutableNotFound { .. } => "Chrome Not Found",
            Error::ProcessStartFailed { .. } => "Chrome Start Failed",
            Error::ProcessStopFailed { .. } => "Chrome Stop Failed",
            Error::Profile(_) => "Profile Error",
            Error::Config(_) => "Configuration Error",
        }
    }

    /// Wrap a bollard failure. Failures to reach the daemon at all become
    /// [`Error::RuntimeUnavailable`] so callers can tell them apart from API errors.
    pub(crate) fn docker(action: impl Into<String>, source: bollard::errors::Error) -> Self {
        if daemon_unreachable(&source) {
            return Error::RuntimeUnavailable {
                reason: source.to_string(),
            };
        }
        Error::Docker {
            action: action.into(),
            source,
        }
    }
}

fn daemon_unreachable(err: &bollard::errors::Error) -> bool {
    use bollard::errors::Error as Bollard;
    use std::io::ErrorKind;

    if matches!(
        err,
        Bollard::SocketNotFoundError(_) | Bollard::RequestTimeoutError
    ) {
        return true;
    }
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = cause {
        if let Some(io) = current.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                ErrorKind::ConnectionRefused
                    | ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::NotFound
                    | ErrorKind::PermissionDenied
                    | ErrorKind::BrokenPipe
                    | ErrorKind::TimedOut
            ) {
                return true;
            }
        }
        cause = current.source();
    }
    false
}

/// Profile directory and archive failures.
#[derive(Debug, Error, Diagnostic)]
pub enum ProfileError {
    #[error("cannot {action} the reserved profile 'default'")]
    #[diagnostic(code(groucho::profile_reserved), help("use `groucho chrome profile reset` instead"))]
    Reserved { action: &'static str },

    #[error("invalid profile name '{name}'")]
    #[diagnostic(
        code(groucho::profile_invalid_name),
        help("profile names must be a single path component")
    )]
    InvalidName { name: String },

    #[error("profile '{name}' already exists")]
    #[diagnostic(code(groucho::profile_exists))]
    AlreadyExists { name: String },

    #[error("profile '{name}' not found")]
    #[diagnostic(code(groucho::profile_not_found))]
    NotFound { name: String },

    #[error("backup file not found: {}", path.display())]
    #[diagnostic(code(groucho::backup_not_found))]
    BackupNotFound { path: PathBuf },

    #[error("invalid backup archive {}: {reason}", path.display())]
    #[diagnostic(code(groucho::backup_invalid))]
    InvalidArchive { path: PathBuf, reason: String },

    #[error("failed to {action} {}", path.display())]
    #[diagnostic(code(groucho::profile_io))]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProfileError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProfileError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Problems reading the environment into a [`crate::config::Config`].
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {variable}")]
    #[diagnostic(code(groucho::config_invalid_value))]
    InvalidValue { variable: String, value: String },

    #[error("cannot determine the current directory")]
    #[diagnostic(code(groucho::config_cwd))]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_timeout_message_is_human_readable() {
        let err = Error::StartupTimeout {
            environment: Environment::Development,
            waited: Duration::from_secs(60),
        };
        assert_eq!(
            err.to_string(),
            "development container did not become ready within 1m"
        );
        assert_eq!(err.title(), "Startup Timeout");
    }

    #[test]
    fn profile_errors_pass_through() {
        let err: Error = ProfileError::Reserved { action: "delete" }.into();
        assert_eq!(
            err.to_string(),
            "cannot delete the reserved profile 'default'"
        );
        assert_eq!(err.title(), "Profile Error");
    }

    #[test]
    fn missing_socket_means_docker_is_unavailable() {
        let err = Error::docker(
            "inspecting container groucho-dev",
            bollard::errors::Error::SocketNotFoundError("/var/run/docker.sock".into()),
        );
        assert!(matches!(err, Error::RuntimeUnavailable { .. }));
        assert_eq!(err.title(), "Docker Unavailable");
    }

    #[test]
    fn timeouts_and_refused_connections_mean_docker_is_unavailable() {
        let timeout = Error::docker("inspecting exec", bollard::errors::Error::RequestTimeoutError);
        assert!(matches!(timeout, Error::RuntimeUnavailable { .. }));

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::docker("reading logs of groucho-dev", refused.into());
        assert!(matches!(err, Error::RuntimeUnavailable { .. }));
    }

    #[test]
    fn api_errors_stay_docker_errors() {
        let err = Error::docker(
            "removing image groucho:dev",
            bollard::errors::Error::DockerResponseServerError {
                status_code: 500,
                message: "boom".into(),
            },
        );
        assert!(matches!(err, Error::Docker { .. }));
        assert_eq!(err.to_string(), "docker API error while removing image groucho:dev");
    }

    #[test]
    fn diagnostics_carry_codes() {
        let err = Error::ExecutableNotFound { searched: vec![] };
        let diag: &dyn Diagnostic = &err;
        assert_eq!(
            diag.code().map(|c| c.to_string()).as_deref(),
            Some("groucho::executable_not_found")
        );
        assert!(diag.help().is_some());
    }
}
