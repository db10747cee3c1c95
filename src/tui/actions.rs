use futures_util::StreamExt;

use crate::browser::{BrowserSession, DEFAULT_PROFILE};
use crate::docker::ContainerRuntime;
use crate::error::Error;
use crate::lifecycle::ContainerController;
use crate::outcome::Outcome;
use crate::ui::format;

use super::app::{Action, Message};

/// Log lines shown in the message pane for a logs action.
const LOG_TAIL: usize = 50;

fn failed(action: Action, e: &Error) -> Message {
    Message::error(format!("{} failed: {}", action.label(), e))
}

fn outcome(action: Action, outcome: Outcome, applied: String, unchanged: String) -> Message {
    match outcome {
        Outcome::Applied => Message::success(applied),
        Outcome::Unchanged => Message::info(unchanged),
        Outcome::Cancelled => Message::info(format!("{}: cancelled", action.label())),
    }
}

/// Run one menu action and describe the result for the message pane.
/// Nothing here prints: the terminal belongs to the TUI.
pub async fn perform<R>(
    action: Action,
    controller: &ContainerController<R>,
    browser: &mut BrowserSession,
) -> Vec<Message>
where
    R: ContainerRuntime + ?Sized,
{
    match action {
        Action::Start(env) => {
            let url = &controller.config().environment(env).url;
            match controller.start(env, false).await {
                Ok(o) => vec![outcome(
                    action,
                    o,
                    format!("{} ready at {}", env.title(), url),
                    format!("{} already running at {}", env.title(), url),
                )],
                Err(e) => vec![failed(action, &e)],
            }
        }
        Action::Stop(env) => match controller.stop(env, false).await {
            Ok(o) => vec![outcome(
                action,
                o,
                format!("{} stopped", env.title()),
                format!("{} is not running", env.title()),
            )],
            Err(e) => vec![failed(action, &e)],
        },
        Action::Restart(env) => match controller.restart(env).await {
            Ok(_) => vec![Message::success(format!("{} restarted", env.title()))],
            Err(e) => vec![failed(action, &e)],
        },
        Action::Build(env) => match controller.build(env, false).await {
            Ok(_) => vec![Message::success(format!("{} image built", env.title()))],
            Err(e) => vec![failed(action, &e)],
        },
        Action::Logs(env) => match controller.stream_logs(env, false, LOG_TAIL).await {
            Ok(stream) => {
                let lines: Vec<Message> = stream
                    .filter_map(|line| async move { line.ok() })
                    .map(Message::info)
                    .collect()
                    .await;
                if lines.is_empty() {
                    vec![Message::info(format!("{}: no log output", env.title()))]
                } else {
                    lines
                }
            }
            Err(e) => vec![failed(action, &e)],
        },
        Action::Clean => match controller.clean().await {
            Ok(_) => vec![Message::success("Containers, volumes and images removed")],
            Err(e) => vec![failed(action, &e)],
        },
        Action::ChromeStart => match browser.start(DEFAULT_PROFILE, None, &[]).await {
            Ok(o) => vec![outcome(
                action,
                o,
                format!("Chrome started, DevTools on port {}", browser.port()),
                "Chrome is already running".to_string(),
            )],
            Err(e) => vec![failed(action, &e)],
        },
        Action::ChromeStop => match browser.stop(true).await {
            Ok(o) => vec![outcome(
                action,
                o,
                "Chrome stopped".to_string(),
                "Chrome is not running".to_string(),
            )],
            Err(e) => vec![failed(action, &e)],
        },
        Action::ChromeStatus => {
            let status = browser.status().await;
            let mut messages = vec![Message::info(format!(
                "Chrome {} (port {}, DevTools {})",
                if status.running { "running" } else { "stopped" },
                status.port,
                if status.debugging_available {
                    "available"
                } else {
                    "unavailable"
                }
            ))];
            if let Some(owner) = &status.external_owner {
                messages.push(Message::info(format!("Started outside groucho: {}", owner)));
            }
            messages.push(Message::info(format!(
                "Profile: {}",
                status.profile_path.display()
            )));
            messages
        }
        Action::Profiles => match browser.list_profiles() {
            Ok(profiles) if profiles.is_empty() => vec![Message::info("No profiles yet")],
            Ok(profiles) => profiles
                .iter()
                .map(|p| Message::info(format!("{:<20} {:>10}", p.name, format::bytes(p.size_bytes))))
                .collect(),
            Err(e) => vec![failed(action, &e)],
        },
        // Handled by the event loop.
        Action::Status | Action::Quit => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Discovery;
    use crate::config::Config;
    use crate::docker::fake::FakeRuntime;
    use crate::environment::Environment;
    use crate::lifecycle::ReadinessPolicy;
    use crate::tui::app::Level;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        runtime: Arc<FakeRuntime>,
        controller: ContainerController<FakeRuntime>,
        browser: BrowserSession,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        let root = dir.path().to_str().unwrap().to_string();
        let port = crate::browser::probe::test_server::closed_port().to_string();
        let config = Arc::new(
            Config::from_lookup(
                |k| match k {
                    "GROUCHO_PROJECT_ROOT" => Some(root.clone()),
                    "GROUCHO_CHROME_DEBUG_PORT" => Some(port.clone()),
                    _ => None,
                },
                dir.path(),
            )
            .unwrap(),
        );
        let runtime = Arc::new(FakeRuntime::new());
        runtime.register(&config.development.compose_file, &config.development.container_name);
        let controller = ContainerController::new(runtime.clone(), config.clone()).with_policy(
            ReadinessPolicy {
                poll_interval: Duration::from_millis(10),
                timeout: Duration::from_secs(1),
                grace: Duration::ZERO,
            },
        );
        let browser = BrowserSession::new(&config).with_discovery(Discovery::default());
        Fixture {
            _dir: dir,
            runtime,
            controller,
            browser,
        }
    }

    #[tokio::test]
    async fn start_then_start_again() {
        let mut f = fixture();
        let action = Action::Start(Environment::Development);
        let first = perform(action, &f.controller, &mut f.browser).await;
        assert_eq!(first[0].level, Level::Success);
        assert!(first[0].text.contains("ready at http://localhost:3000"));

        let second = perform(action, &f.controller, &mut f.browser).await;
        assert_eq!(second[0].level, Level::Info);
        assert!(second[0].text.contains("already running"));
    }

    #[tokio::test]
    async fn failures_become_error_messages() {
        let mut f = fixture();
        let messages = perform(
            Action::Start(Environment::Production),
            &f.controller,
            &mut f.browser,
        )
        .await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, Level::Error);
        assert!(messages[0].text.starts_with("Start production failed"));
    }

    #[tokio::test]
    async fn logs_fill_the_pane() {
        let mut f = fixture();
        perform(Action::Start(Environment::Development), &f.controller, &mut f.browser).await;
        f.runtime.set_log_lines(&["one", "two"]);
        let messages = perform(
            Action::Logs(Environment::Development),
            &f.controller,
            &mut f.browser,
        )
        .await;
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn chrome_start_without_executable_reports_error() {
        let mut f = fixture();
        let messages = perform(Action::ChromeStart, &f.controller, &mut f.browser).await;
        assert_eq!(messages[0].level, Level::Error);

        let messages = perform(Action::Profiles, &f.controller, &mut f.browser).await;
        assert_eq!(messages[0].text, "No profiles yet");
    }
}
