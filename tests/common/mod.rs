#![allow(dead_code)]
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project root with its own compose file and profile directory.
pub struct TestProject {
    pub dir: TempDir,
    pub compose_path: PathBuf,
    pub profiles_path: PathBuf,
    pub debug_port: u16,
}

impl TestProject {
    pub fn new(compose_yaml: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let compose_path = dir.path().join("docker-compose.yml");
        std::fs::write(&compose_path, compose_yaml).unwrap();
        let profiles_path = dir.path().join("profiles");
        Self {
            dir,
            compose_path,
            profiles_path,
            debug_port: free_port(),
        }
    }

    /// Project with no compose file, for commands that never reach Docker.
    pub fn empty() -> Self {
        Self::new("services: {}\n")
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// The binary, pointed at this project and isolated from the caller's
    /// environment.
    pub fn groucho(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("groucho").unwrap();
        cmd.current_dir(self.root())
            .env("GROUCHO_PROJECT_ROOT", self.root())
            .env("GROUCHO_CHROME_PROFILES_PATH", &self.profiles_path)
            .env("GROUCHO_CHROME_DEBUG_PORT", self.debug_port.to_string())
            .env_remove("CHROME_PATH")
            .env_remove("RUST_LOG")
            .env_remove("GROUCHO_LOG_LEVEL");
        cmd
    }
}

pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

pub async fn wait_for_port(port: u16, timeout: std::time::Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    false
}

/// Tear down whatever a test's compose project left behind. Uses the
/// Docker CLI directly so it works even when groucho itself failed.
pub fn docker_cleanup(project: &TestProject, container: &str) {
    let _ = std::process::Command::new("docker")
        .args(["compose", "-f"])
        .arg(&project.compose_path)
        .args(["down", "--remove-orphans", "--timeout", "1"])
        .current_dir(project.root())
        .output();
    let _ = std::process::Command::new("docker")
        .args(["rm", "-f", container])
        .output();
}
