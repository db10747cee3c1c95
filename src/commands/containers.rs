use crate::docker::ContainerRuntime;
use crate::environment::Environment;
use crate::lifecycle::ContainerController;
use crate::outcome::{Confirm, Outcome};
use crate::ui;

use super::Failures;

/// Start each environment in turn. With a single environment its failure
/// fails the command; with both, failures are reported and the rest go on.
pub async fn start<R>(
    controller: &ContainerController<R>,
    envs: &[Environment],
    build: bool,
) -> anyhow::Result<()>
where
    R: ContainerRuntime + ?Sized,
{
    let mut failures = Failures::default();
    for &env in envs {
        ui::info(format!("Starting {}...", env.title()));
        let result = controller.start(env, build).await;
        if let Some(outcome) = failures.record(env, result) {
            let spec = controller.config().environment(env);
            ui::outcome(
                outcome,
                format!("{} ready at {}", env.title(), spec.url),
                format!("{} already running at {}", env.title(), spec.url),
            );
            if env.is_dev() {
                ui::info(format!("Hot reload on port {}", controller.config().hmr_port));
            }
        }
    }
    if envs.len() == 1 {
        failures.finish("start")
    } else {
        Ok(())
    }
}

pub async fn stop<R>(
    controller: &ContainerController<R>,
    envs: &[Environment],
    remove: bool,
) -> anyhow::Result<()>
where
    R: ContainerRuntime + ?Sized,
{
    let mut failures = Failures::default();
    for &env in envs {
        let result = controller.stop(env, remove).await;
        if let Some(outcome) = failures.record(env, result) {
            let applied = if remove {
                format!("{} stopped and removed", env.title())
            } else {
                format!("{} stopped", env.title())
            };
            ui::outcome(outcome, applied, format!("{} is not running", env.title()));
        }
    }
    failures.finish("stop")
}

pub async fn restart<R>(
    controller: &ContainerController<R>,
    envs: &[Environment],
) -> anyhow::Result<()>
where
    R: ContainerRuntime + ?Sized,
{
    let mut failures = Failures::default();
    for &env in envs {
        ui::info(format!("Restarting {}...", env.title()));
        if failures.record(env, controller.restart(env).await).is_some() {
            let url = &controller.config().environment(env).url;
            ui::success(format!("{} restarted, ready at {}", env.title(), url));
        }
    }
    failures.finish("restart")
}

pub async fn build<R>(
    controller: &ContainerController<R>,
    envs: &[Environment],
    no_cache: bool,
) -> anyhow::Result<()>
where
    R: ContainerRuntime + ?Sized,
{
    let mut failures = Failures::default();
    for &env in envs {
        ui::info(format!("Building {} image...", env.title()));
        if failures.record(env, controller.build(env, no_cache).await).is_some() {
            ui::success(format!("{} image built", env.title()));
        }
    }
    failures.finish("build")
}

/// Remove everything both environments created, after confirmation.
pub async fn clean<R>(
    controller: &ContainerController<R>,
    force: bool,
    confirm: &dyn Confirm,
) -> anyhow::Result<Outcome>
where
    R: ContainerRuntime + ?Sized,
{
    if !force && !confirm.confirm("Remove all groucho containers, volumes and images?") {
        ui::info("Cancelled");
        return Ok(Outcome::Cancelled);
    }

    ui::info("Cleaning up containers, volumes and images...");
    let outcome = controller.clean().await?;
    ui::success("Cleanup complete");
    Ok(outcome)
}
