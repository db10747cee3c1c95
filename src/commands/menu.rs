use std::sync::Arc;

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::docker::DockerRuntime;
use crate::lifecycle::ContainerController;
use crate::tui;

/// Open the interactive menu. A Docker daemon that is down shows up in the
/// status panel rather than stopping the menu from opening.
pub async fn run(config: Arc<Config>) -> anyhow::Result<()> {
    let runtime = DockerRuntime::local()?;
    let controller = ContainerController::new(Arc::new(runtime), Arc::clone(&config));
    let browser = BrowserSession::new(&config);
    tui::run(controller, browser).await
}
