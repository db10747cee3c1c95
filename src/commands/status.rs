use std::time::Duration;

use crate::docker::ContainerRuntime;
use crate::environment::Environment;
use crate::status::{GameInfo, StatusAggregator};
use crate::ui;

/// Print the status table, optionally after waiting for each environment to
/// answer on its port.
pub async fn run<R>(
    aggregator: &StatusAggregator<R>,
    envs: &[Environment],
    wait: Option<u64>,
) -> anyhow::Result<Vec<GameInfo>>
where
    R: ContainerRuntime + ?Sized,
{
    if let Some(secs) = wait {
        for &env in envs {
            ui::info(format!("Waiting up to {}s for {}...", secs, env.title()));
            if aggregator
                .wait_for_reachable(env, Duration::from_secs(secs))
                .await
            {
                ui::success(format!("{} is reachable", env.title()));
            } else {
                ui::warn(format!("{} did not become reachable", env.title()));
            }
        }
    }

    let infos =
        futures_util::future::join_all(envs.iter().map(|&env| aggregator.game_info(env))).await;
    ui::summary::print_status(&infos, ui::use_color());
    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::docker::fake::FakeRuntime;
    use crate::lifecycle::ContainerController;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reports_requested_environments_in_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_str().unwrap().to_string();
        let config = Arc::new(
            Config::from_lookup(
                |k| (k == "GROUCHO_PROJECT_ROOT").then(|| root.clone()),
                dir.path(),
            )
            .unwrap(),
        );
        let aggregator = StatusAggregator::new(ContainerController::new(
            Arc::new(FakeRuntime::new()),
            config,
        ))
        .without_host_metrics();

        let infos = run(&aggregator, &[Environment::Production], None).await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].environment, Environment::Production);
        assert!(!infos[0].container.exists);
    }
}
