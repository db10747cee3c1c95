use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
use unix as imp;
#[cfg(windows)]
use windows as imp;

pub use imp::ProcessGroupHandle;

/// How long to wait for a process to exit after each termination step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTimings {
    /// After the polite request (SIGTERM / CTRL_BREAK).
    pub graceful: Duration,
    /// After the forced kill.
    pub forced: Duration,
}

impl Default for StopTimings {
    fn default() -> Self {
        Self {
            graceful: Duration::from_secs(5),
            forced: Duration::from_secs(2),
        }
    }
}

/// A process found listening on a TCP port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortOwner {
    pub pid: u32,
    pub command: String,
}

impl std::fmt::Display for PortOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.command.is_empty() {
            write!(f, "PID {}", self.pid)
        } else if self.command.len() > 60 {
            let cut = self
                .command
                .char_indices()
                .map(|(i, _)| i)
                .take_while(|&i| i <= 57)
                .last()
                .unwrap_or(0);
            write!(f, "{}... (PID {})", &self.command[..cut], self.pid)
        } else {
            write!(f, "{} (PID {})", self.command, self.pid)
        }
    }
}

/// Configure the command to run in a new process group.
/// Unix: `process_group(0)`, Windows: `CREATE_NEW_PROCESS_GROUP`
pub fn configure_process_group(cmd: &mut Command) {
    imp::configure_process_group(cmd)
}

/// Perform any post-spawn setup (e.g., Job Object on Windows).
/// Returns a handle that must be kept alive for the process lifetime.
pub fn post_spawn_setup(child_pid: Option<u32>) -> Option<ProcessGroupHandle> {
    imp::post_spawn_setup(child_pid)
}

/// Terminate a spawned child and its process group. With `graceful`, the
/// group is asked to exit first and killed only if it outlives
/// `timings.graceful`. Errors if the child survives the forced kill.
pub async fn terminate_child(
    child: &mut tokio::process::Child,
    group_handle: Option<&ProcessGroupHandle>,
    graceful: bool,
    timings: &StopTimings,
) -> std::io::Result<()> {
    imp::terminate_child(child, group_handle, graceful, timings).await
}

/// Terminate a process this program did not spawn, signalling its whole
/// group when it leads one.
pub async fn terminate_pid(pid: u32, graceful: bool, timings: &StopTimings) -> std::io::Result<()> {
    imp::terminate_pid(pid, graceful, timings).await
}

/// Check if a process with the given PID is still alive.
pub fn is_process_alive(pid: u32) -> bool {
    imp::is_process_alive(pid)
}

/// Identify which process is listening on a given TCP port.
pub fn port_owner(port: u16) -> Option<PortOwner> {
    imp::port_owner(port)
}

/// Poll until `pid` is gone or `limit` elapses.
pub(crate) async fn wait_for_exit(pid: u32, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    loop {
        if !is_process_alive(pid) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Get the current user's home directory.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Expand leading `~` or `$HOME` in a path string to the actual home directory.
///
/// Returns the original string unchanged when no home directory is available
/// or the string doesn't start with `~` or `$HOME`.
pub fn expand_home(path: &str) -> String {
    if let Some(home) = home_dir() {
        let home = home.to_string_lossy();
        if path == "~" || path == "$HOME" {
            return home.to_string();
        }
        if let Some(rest) = path.strip_prefix('~').filter(|r| r.starts_with('/')) {
            return format!("{}{}", home, rest);
        }
        if let Some(rest) = path
            .strip_prefix("$HOME")
            .filter(|r| r.starts_with('/') || r.starts_with('\\'))
        {
            return format!("{}{}", home, rest);
        }
    }
    path.to_string()
}
