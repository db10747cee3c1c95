use bollard::container::LogOutput;
use bollard::exec::{StartExecOptions, StartExecResults};
use bollard::models::ExecConfig;
use bollard::Docker;
use futures_util::StreamExt;

use crate::docker::ExecOutput;
use crate::error::{Error, Result};

/// Execute a command in a container, collecting stdout and stderr separately.
pub async fn exec_in_container(
    docker: &Docker,
    container: &str,
    cmd: Vec<String>,
) -> Result<ExecOutput> {
    let config = ExecConfig {
        cmd: Some(cmd),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        ..Default::default()
    };

    let exec = docker
        .create_exec(container, config)
        .await
        .map_err(|e| Error::docker(format!("creating exec in {}", container), e))?;

    let mut stdout = String::new();
    let mut stderr = String::new();
    let start_options = StartExecOptions {
        detach: false,
        ..Default::default()
    };
    if let StartExecResults::Attached {
        output: mut stream, ..
    } = docker
        .start_exec(&exec.id, Some(start_options))
        .await
        .map_err(|e| Error::docker("starting exec", e))?
    {
        while let Some(msg) = stream.next().await {
            match msg {
                Ok(LogOutput::StdErr { message }) => {
                    stderr.push_str(&String::from_utf8_lossy(&message))
                }
                Ok(other) => stdout.push_str(&other.to_string()),
                Err(e) => tracing::warn!("exec stream error: {}", e),
            }
        }
    }

    let inspect = docker
        .inspect_exec(&exec.id)
        .await
        .map_err(|e| Error::docker("inspecting exec", e))?;

    Ok(ExecOutput {
        exit_code: inspect.exit_code.unwrap_or(-1),
        stdout,
        stderr,
    })
}
