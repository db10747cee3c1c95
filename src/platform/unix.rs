use std::io;
use tokio::process::Command;
use tracing::{debug, warn};

use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::{getpgid, Pid};

use super::{wait_for_exit, PortOwner, StopTimings};

/// No-op handle on Unix: process group cleanup uses killpg with the child PID.
pub struct ProcessGroupHandle;

pub fn configure_process_group(cmd: &mut Command) {
    cmd.process_group(0);
}

pub fn post_spawn_setup(_child_pid: Option<u32>) -> Option<ProcessGroupHandle> {
    // On Unix, process group is configured before spawn via process_group(0).
    None
}

pub async fn terminate_child(
    child: &mut tokio::process::Child,
    _group_handle: Option<&ProcessGroupHandle>,
    graceful: bool,
    timings: &StopTimings,
) -> io::Result<()> {
    // No pid means the child was already reaped.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pgid = Pid::from_raw(pid as i32);

    if graceful {
        match killpg(pgid, Signal::SIGTERM) {
            Ok(()) => debug!(pid, "sent SIGTERM to process group"),
            Err(Errno::ESRCH) => debug!(pid, "process group already exited"),
            Err(e) => warn!(pid, error = %e, "killpg(SIGTERM) failed"),
        }
        if let Ok(Ok(_)) = tokio::time::timeout(timings.graceful, child.wait()).await {
            debug!(pid, "child exited after SIGTERM");
            return Ok(());
        }
        warn!(pid, "child did not exit within {:?}, sending SIGKILL", timings.graceful);
    }

    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => {
            warn!(pid, error = %e, "killpg(SIGKILL) failed, killing child directly");
            child.start_kill()?;
        }
    }

    match tokio::time::timeout(timings.forced, child.wait()).await {
        Ok(result) => result.map(|_| ()),
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("process {} did not exit after SIGKILL", pid),
        )),
    }
}

pub async fn terminate_pid(pid: u32, graceful: bool, timings: &StopTimings) -> io::Result<()> {
    let target = Pid::from_raw(pid as i32);
    let leads_group = matches!(getpgid(Some(target)), Ok(pgid) if pgid == target);
    let send = |signal: Signal| -> io::Result<()> {
        let sent = if leads_group {
            killpg(target, signal)
        } else {
            kill(target, signal)
        };
        match sent {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(io::Error::from(e)),
        }
    };

    if graceful {
        send(Signal::SIGTERM)?;
        debug!(pid, leads_group, "sent SIGTERM");
        if wait_for_exit(pid, timings.graceful).await {
            return Ok(());
        }
        warn!(pid, "process did not exit within {:?}, sending SIGKILL", timings.graceful);
    }

    send(Signal::SIGKILL)?;
    if wait_for_exit(pid, timings.forced).await {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("process {} did not exit after SIGKILL", pid),
        ))
    }
}

pub fn is_process_alive(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(target_os = "linux")]
pub fn port_owner(port: u16) -> Option<PortOwner> {
    let port_hex = format!("{:04X}", port);

    // Listening sockets (state 0A) on IPv4 or IPv6.
    let inode = ["/proc/net/tcp", "/proc/net/tcp6"]
        .iter()
        .filter_map(|table| std::fs::read_to_string(table).ok())
        .find_map(|content| {
            content.lines().skip(1).find_map(|line| {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() < 10 || fields[3] != "0A" {
                    return None;
                }
                let local_port = fields[1].rsplit(':').next()?;
                (local_port == port_hex && fields[9] != "0").then(|| fields[9].to_string())
            })
        })?;

    let socket_link = format!("socket:[{}]", inode);
    let proc_dir = std::fs::read_dir("/proc").ok()?;
    for entry in proc_dir.flatten() {
        let pid_str = entry.file_name().to_string_lossy().to_string();
        let Ok(pid) = pid_str.parse::<u32>() else {
            continue;
        };
        let Ok(fds) = std::fs::read_dir(format!("/proc/{}/fd", pid)) else {
            continue;
        };
        for fd_entry in fds.flatten() {
            if let Ok(link) = std::fs::read_link(fd_entry.path()) {
                if link.to_string_lossy() == socket_link {
                    let command = std::fs::read_to_string(format!("/proc/{}/cmdline", pid))
                        .map(|c| c.replace('\0', " ").trim().to_string())
                        .unwrap_or_default();
                    return Some(PortOwner { pid, command });
                }
            }
        }
    }

    None
}

#[cfg(not(target_os = "linux"))]
pub fn port_owner(_port: u16) -> Option<PortOwner> {
    None
}
