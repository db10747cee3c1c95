use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::docker::{ComposeOutput, ComposeTarget, LogStream};
use crate::error::{Error, Result};

fn compose_command(target: &ComposeTarget) -> Command {
    let mut cmd = Command::new("docker");
    cmd.arg("compose")
        .arg("-f")
        .arg(&target.file)
        .current_dir(&target.project_dir);
    cmd
}

fn spawn_error(e: std::io::Error) -> Error {
    Error::RuntimeUnavailable {
        reason: format!("could not run `docker compose`: {}", e),
    }
}

/// Run `docker compose -f <file> <args...>` to completion, capturing output.
/// A non-zero exit is reported through [`ComposeOutput::success`], not as an
/// error; callers decide which failure kind it maps to.
pub async fn run_compose(target: &ComposeTarget, args: &[&str]) -> Result<ComposeOutput> {
    debug!(file = %target.file.display(), args = ?args, "docker compose");
    let output = compose_command(target)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(spawn_error)?;

    Ok(ComposeOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Spawn `docker compose logs -f --tail N`. The child is killed when the
/// returned stream is dropped.
pub fn follow_logs(target: &ComposeTarget, tail: usize) -> Result<LogStream> {
    let tail = tail.to_string();
    let child = compose_command(target)
        .args(["logs", "-f", "--tail", tail.as_str()])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_error)?;
    Ok(LogStream::from_child(child))
}

/// Run `docker compose exec <service> <shell>` attached to this terminal.
pub async fn attach_shell(target: &ComposeTarget, service: &str, shell: &str) -> Result<i32> {
    let status = compose_command(target)
        .args(["exec", service, shell])
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(spawn_error)?;
    Ok(status.code().unwrap_or(-1))
}

/// Service names declared under the top-level `services:` key of a compose
/// file. Empty if the file cannot be read or has no services section.
pub fn declared_services(compose_file: &Path) -> Vec<String> {
    let content = match std::fs::read_to_string(compose_file) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %compose_file.display(), error = %e, "could not read compose file");
            return Vec::new();
        }
    };

    let mut services = Vec::new();
    let mut in_services = false;
    let mut service_indent: Option<usize> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let indent = line.len() - line.trim_start().len();

        if !in_services {
            if indent == 0 && trimmed.starts_with("services:") {
                in_services = true;
            }
            continue;
        }

        if indent == 0 {
            break;
        }

        let is_service_line = match service_indent {
            None => {
                service_indent = Some(indent);
                true
            }
            Some(si) => indent == si,
        };
        if is_service_line {
            if let Some((name, _)) = trimmed.split_once(':') {
                let name = name.trim_matches(|c| c == '"' || c == '\'');
                if !name.is_empty() {
                    services.push(name.to_string());
                }
            }
        }
    }

    services
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_services_from_game_compose() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker-compose.yml");
        let content = "\
services:
  # Vite dev server with HMR
  groucho-dev:
    build:
      context: .
      dockerfile: Dockerfile.dev
    container_name: groucho-the-hunter-dev
    ports:
      - '3000:3000'
      - '24678:24678'

volumes:
  node_modules:
";
        std::fs::write(&path, content).unwrap();

        assert_eq!(declared_services(&path), vec!["groucho-dev"]);
    }

    #[test]
    fn declared_services_quoted_and_multiple() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker-compose.prod.yml");
        std::fs::write(
            &path,
            "version: '3.8'\nservices:\n  \"groucho\":\n    image: nginx\n  proxy:\n    image: caddy\n",
        )
        .unwrap();

        assert_eq!(declared_services(&path), vec!["groucho", "proxy"]);
    }

    #[test]
    fn declared_services_missing_file_is_empty() {
        assert!(declared_services(Path::new("/nonexistent/docker-compose.yml")).is_empty());
    }

    #[test]
    fn declared_services_without_section_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docker-compose.yml");
        std::fs::write(&path, "volumes:\n  data:\n").unwrap();
        assert!(declared_services(&path).is_empty());
    }
}
