pub mod discovery;
pub mod probe;
pub mod profile;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::config::Config;
use crate::error::{Error, ProfileError, Result};
use crate::outcome::{Confirm, Outcome};
use crate::platform::{self, PortOwner, ProcessGroupHandle, StopTimings};

pub use discovery::Discovery;
pub use profile::{Profile, ProfileStore, DEFAULT_PROFILE};

/// Flags passed to every debug browser, after the port and profile.
pub const CHROME_FLAGS: [&str; 7] = [
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-features=TranslateUI",
    "--disable-extensions",
    "--disable-background-timer-throttling",
    "--disable-backgrounding-occluded-windows",
    "--disable-renderer-backgrounding",
];

/// Delays used while confirming a freshly spawned browser came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchTimings {
    /// Wait before checking the process did not exit immediately.
    pub settle: Duration,
    pub port_poll_interval: Duration,
    pub port_poll_attempts: usize,
}

impl Default for LaunchTimings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(2),
            port_poll_interval: Duration::from_millis(500),
            port_poll_attempts: 10,
        }
    }
}

struct ManagedBrowser {
    child: Child,
    pid: Option<u32>,
    profile: String,
    group: Option<ProcessGroupHandle>,
}

/// What `chrome status` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserStatus {
    pub running: bool,
    /// PID of the browser we spawned, or of the port's owner otherwise.
    pub pid: Option<u32>,
    pub port: u16,
    pub debugging_available: bool,
    pub browser_version: Option<String>,
    pub executable: Option<PathBuf>,
    pub profile_path: PathBuf,
    pub active_profile: Option<String>,
    /// Set when the debugging port is held by a browser we did not spawn.
    pub external_owner: Option<PortOwner>,
}

/// The debuggable Chrome instance: at most one process per session.
pub struct BrowserSession {
    port: u16,
    default_url: String,
    explicit_executable: Option<PathBuf>,
    configured_executable: Option<PathBuf>,
    discovery: Discovery,
    profiles: ProfileStore,
    launch: LaunchTimings,
    stop_timings: StopTimings,
    process: Option<ManagedBrowser>,
}

impl BrowserSession {
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.chrome.debug_port,
            default_url: config.development.url.clone(),
            explicit_executable: None,
            configured_executable: config.chrome.executable.clone(),
            discovery: Discovery::system(),
            profiles: ProfileStore::new(&config.chrome.profiles_path),
            launch: LaunchTimings::default(),
            stop_timings: StopTimings::default(),
            process: None,
        }
    }

    /// Executable from `--chrome-path`; takes precedence over `CHROME_PATH`.
    pub fn with_executable(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_executable = path;
        self
    }

    pub fn with_discovery(mut self, discovery: Discovery) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_timings(mut self, launch: LaunchTimings, stop: StopTimings) -> Self {
        self.launch = launch;
        self.stop_timings = stop;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn executable(&self) -> Result<PathBuf> {
        self.discovery.find(
            self.explicit_executable.as_deref(),
            self.configured_executable.as_deref(),
        )
    }

    /// Launch the browser on `profile`, opening `url` (the development URL
    /// by default). A no-op if a browser already answers on the port.
    pub async fn start(&mut self, profile: &str, url: Option<&str>, extra_args: &[String]) -> Result<Outcome> {
        if self.is_running().await {
            tracing::info!(port = self.port, "Chrome is already running");
            return Ok(Outcome::Unchanged);
        }

        let executable = self.executable()?;
        let profile_path = self.profiles.ensure(profile)?;

        let mut cmd = Command::new(&executable);
        cmd.arg(format!("--remote-debugging-port={}", self.port))
            .arg(format!("--user-data-dir={}", profile_path.display()))
            .args(CHROME_FLAGS)
            .args(extra_args)
            .arg(url.unwrap_or(&self.default_url))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        platform::configure_process_group(&mut cmd);

        tracing::debug!(executable = %executable.display(), profile = %profile, "spawning Chrome");
        let mut child = cmd.spawn().map_err(|e| Error::ProcessStartFailed {
            reason: format!("{}: {}", executable.display(), e),
        })?;
        let pid = child.id();
        let group = platform::post_spawn_setup(pid);

        tokio::time::sleep(self.launch.settle).await;
        match child.try_wait() {
            Ok(None) => {}
            Ok(Some(status)) => {
                return Err(Error::ProcessStartFailed {
                    reason: format!("Chrome exited immediately ({})", status),
                })
            }
            Err(e) => {
                return Err(Error::ProcessStartFailed {
                    reason: e.to_string(),
                })
            }
        }

        let port = self.port;
        let answered = probe::wait_until_available(
            port,
            self.launch.port_poll_interval,
            self.launch.port_poll_attempts,
        )
        .await;
        match answered {
            Ok(()) => tracing::info!(port, pid, profile = %profile, "Chrome started with remote debugging"),
            Err(e) => tracing::warn!(port, error = %e, "Chrome started but debugging port not responding"),
        }

        self.process = Some(ManagedBrowser {
            child,
            pid,
            profile: profile.to_string(),
            group,
        });
        Ok(Outcome::Applied)
    }

    /// Stop the browser. Without `graceful` it is killed outright. A
    /// browser this session did not spawn is found through its port.
    pub async fn stop(&mut self, graceful: bool) -> Result<Outcome> {
        if !self.is_running().await {
            tracing::info!("Chrome is not running");
            return Ok(Outcome::Unchanged);
        }

        match self.process.take() {
            Some(mut managed) => {
                platform::terminate_child(
                    &mut managed.child,
                    managed.group.as_ref(),
                    graceful,
                    &self.stop_timings,
                )
                .await
                .map_err(|e| Error::ProcessStopFailed {
                    reason: e.to_string(),
                })?;
            }
            None => {
                let owner = platform::port_owner(self.port).ok_or_else(|| Error::ProcessStopFailed {
                    reason: format!(
                        "a browser is listening on port {} but its process could not be identified",
                        self.port
                    ),
                })?;
                tracing::info!(owner = %owner, "stopping browser found on debugging port");
                platform::terminate_pid(owner.pid, graceful, &self.stop_timings)
                    .await
                    .map_err(|e| Error::ProcessStopFailed {
                        reason: format!("{}: {}", owner, e),
                    })?;
            }
        }

        let locks = self.profiles.clear_locks();
        tracing::info!(graceful, locks_removed = locks, "Chrome stopped");
        Ok(Outcome::Applied)
    }

    /// True while our process is alive or anything answers on the debugging
    /// port. Forgets a process that has exited.
    pub async fn is_running(&mut self) -> bool {
        if let Some(managed) = self.process.as_mut() {
            match managed.child.try_wait() {
                Ok(None) => return true,
                Ok(Some(status)) => {
                    tracing::debug!(pid = managed.pid, %status, "Chrome process has exited");
                }
                Err(e) => tracing::debug!(error = %e, "could not poll Chrome process"),
            }
            self.process = None;
        }
        probe::available(self.port).await
    }

    pub async fn status(&mut self) -> BrowserStatus {
        let handle_alive = self
            .process
            .as_mut()
            .is_some_and(|m| matches!(m.child.try_wait(), Ok(None)));
        if !handle_alive {
            self.process = None;
        }

        let version = probe::version(self.port).await;
        let debugging_available = version.is_some() || probe::available(self.port).await;
        let external_owner = if !handle_alive && debugging_available {
            platform::port_owner(self.port)
        } else {
            None
        };

        let active_profile = self.process.as_ref().map(|m| m.profile.clone());
        let profile_path = self
            .profiles
            .path(active_profile.as_deref().unwrap_or(DEFAULT_PROFILE))
            .unwrap_or_else(|_| self.profiles.root().to_path_buf());

        BrowserStatus {
            running: handle_alive || debugging_available,
            pid: self
                .process
                .as_ref()
                .and_then(|m| m.pid)
                .or(external_owner.as_ref().map(|o| o.pid)),
            port: self.port,
            debugging_available,
            browser_version: version.map(|v| v.browser).filter(|b| !b.is_empty()),
            executable: self.executable().ok(),
            profile_path,
            active_profile,
            external_owner,
        }
    }

    pub fn create_profile(&self, name: &str) -> Result<PathBuf> {
        Ok(self.profiles.create(name)?)
    }

    pub fn delete_profile(&self, name: &str, force: bool, confirm: &dyn Confirm) -> Result<Outcome> {
        // Surface reserved/missing errors before prompting.
        if name != DEFAULT_PROFILE && self.profiles.exists(name)? && !force {
            let prompt = format!("Are you sure you want to delete profile '{}'?", name);
            if !confirm.confirm(&prompt) {
                return Ok(Outcome::Cancelled);
            }
        }
        self.profiles.delete(name)?;
        Ok(Outcome::Applied)
    }

    /// Wipe a profile back to an empty directory, creating it if missing.
    pub async fn reset_profile(&mut self, name: &str, force: bool, confirm: &dyn Confirm) -> Result<Outcome> {
        if !self.profiles.exists(name)? {
            self.profiles.ensure(name)?;
            tracing::info!(profile = %name, "profile created");
            return Ok(Outcome::Applied);
        }

        if !force {
            let prompt = format!(
                "Are you sure you want to reset profile '{}'? All data will be lost!",
                name
            );
            if !confirm.confirm(&prompt) {
                return Ok(Outcome::Cancelled);
            }
        }

        if self.is_running().await {
            self.stop(true).await?;
        }
        self.profiles.recreate(name)?;
        tracing::info!(profile = %name, "profile reset");
        Ok(Outcome::Applied)
    }

    pub fn backup_profile(&self, name: &str, output: Option<&Path>) -> Result<PathBuf> {
        Ok(self.profiles.backup(name, output, chrono::Local::now())?)
    }

    /// Restore a backup, by default into the profile named in the archive's
    /// file name. Returns the profile name and its directory.
    pub async fn restore_profile(&mut self, archive: &Path, name: Option<&str>) -> Result<(String, PathBuf)> {
        if !archive.is_file() {
            return Err(ProfileError::BackupNotFound {
                path: archive.to_path_buf(),
            }
            .into());
        }
        let name = match name {
            Some(name) => name.to_string(),
            None => profile::profile_name_from_backup(archive),
        };
        self.profiles.path(&name)?;

        if self.is_running().await {
            self.stop(true).await?;
        }
        let path = self.profiles.restore(archive, &name)?;
        Ok((name, path))
    }

    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        Ok(self.profiles.list()?)
    }
}
