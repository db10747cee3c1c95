use std::io::Write;

use crate::docker::{ContainerRuntime, ExecOutput};
use crate::environment::Environment;
use crate::lifecycle::ContainerController;

/// Run a command in the container and relay its output. Returns the exit
/// code for the process to exit with.
pub async fn run<R>(
    controller: &ContainerController<R>,
    env: Environment,
    command: Vec<String>,
) -> anyhow::Result<i32>
where
    R: ContainerRuntime + ?Sized,
{
    let output = controller.execute(env, command).await?;
    relay(&output, &mut std::io::stdout(), &mut std::io::stderr())?;
    Ok(exit_code(&output))
}

/// Hand the terminal to a shell in the container until it exits.
pub async fn shell<R>(controller: &ContainerController<R>, env: Environment) -> anyhow::Result<i32>
where
    R: ContainerRuntime + ?Sized,
{
    let spec = controller.config().environment(env);
    tracing::info!(container = %spec.container_name, "opening shell");
    Ok(controller.shell(env).await?)
}

fn relay(output: &ExecOutput, out: &mut impl Write, err: &mut impl Write) -> std::io::Result<()> {
    out.write_all(output.stdout.as_bytes())?;
    out.flush()?;
    err.write_all(output.stderr.as_bytes())?;
    err.flush()
}

/// Docker reports exit codes as i64; clamp to what a process can return.
fn exit_code(output: &ExecOutput) -> i32 {
    i32::try_from(output.exit_code).unwrap_or(1)
}
