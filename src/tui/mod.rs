//! `groucho menu`: a keyboard-driven console over the same controllers the
//! CLI uses.
//!
//! A poller task publishes a fresh status snapshot every few seconds over a
//! `watch` channel. Actions run on the UI task, one at a time; the screen
//! shows which one is in progress.

pub mod actions;
pub mod app;
pub mod view;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures_util::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::browser::{probe, BrowserSession};
use crate::docker::ContainerRuntime;
use crate::lifecycle::ContainerController;
use crate::status::StatusAggregator;

use app::{Action, App, Message, Snapshot};

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Publish a status snapshot now and then every `interval` until `cancel`
/// fires or every receiver is gone.
pub fn spawn_poller<R>(
    aggregator: StatusAggregator<R>,
    debug_port: u16,
    interval: Duration,
    cancel: CancellationToken,
) -> (watch::Receiver<Option<Snapshot>>, JoinHandle<()>)
where
    R: ContainerRuntime + ?Sized + 'static,
{
    let (tx, rx) = watch::channel(None);
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let snapshot = tokio::select! {
                        _ = cancel.cancelled() => break,
                        s = take_snapshot(&aggregator, debug_port) => s,
                    };
                    if tx.send(Some(snapshot)).is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("status poller stopped");
    });
    (rx, handle)
}

async fn take_snapshot<R>(aggregator: &StatusAggregator<R>, debug_port: u16) -> Snapshot
where
    R: ContainerRuntime + ?Sized,
{
    let (games, debugger_available) =
        tokio::join!(aggregator.all_game_info(), probe::available(debug_port));
    Snapshot {
        games,
        debugger_available,
        taken_at: chrono::Local::now(),
    }
}

/// Restores the terminal however the loop exits.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Run the menu until the operator quits.
pub async fn run<R>(
    controller: ContainerController<R>,
    mut browser: BrowserSession,
) -> anyhow::Result<()>
where
    R: ContainerRuntime + ?Sized + 'static,
{
    let cancel = CancellationToken::new();
    let aggregator = StatusAggregator::new(controller.clone());
    let (mut snapshots, poller) =
        spawn_poller(aggregator, browser.port(), POLL_INTERVAL, cancel.clone());
    // On-demand refreshes use their own aggregator, skipping host metrics.
    let refresher = StatusAggregator::new(controller.clone()).without_host_metrics();

    let mut guard = TerminalGuard::enter()?;
    let mut events = EventStream::new();
    let mut app = App::new();
    let mut polling = true;

    let result: anyhow::Result<()> = loop {
        if let Err(e) = guard.terminal.draw(|frame| view::render(frame, &app)) {
            break Err(e.into());
        }

        let action = tokio::select! {
            changed = snapshots.changed(), if polling => {
                match changed {
                    Ok(()) => app.snapshot = snapshots.borrow_and_update().clone(),
                    Err(_) => {
                        tracing::debug!("status poller is gone");
                        polling = false;
                    }
                }
                None
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => app.on_key(key),
                Some(Ok(_)) => None,
                Some(Err(e)) => break Err(e.into()),
                None => break Ok(()),
            },
        };

        let Some(action) = action else { continue };
        match action {
            Action::Quit => break Ok(()),
            Action::Status => {
                app.busy = Some("Refreshing status".to_string());
                let _ = guard.terminal.draw(|frame| view::render(frame, &app));
                let mut snapshot = take_snapshot(&refresher, browser.port()).await;
                if let Some(previous) = &app.snapshot {
                    for (game, old) in snapshot.games.iter_mut().zip(&previous.games) {
                        game.host = old.host;
                    }
                }
                app.snapshot = Some(snapshot);
                app.busy = None;
            }
            action => {
                app.busy = Some(action.label());
                app.push(Message::info(format!("{}...", action.label())));
                let _ = guard.terminal.draw(|frame| view::render(frame, &app));
                let messages = actions::perform(action, &controller, &mut browser).await;
                app.extend(messages);
                app.busy = None;
            }
        }
    };

    cancel.cancel();
    drop(guard);
    if let Err(e) = poller.await {
        tracing::debug!(error = %e, "status poller ended abnormally");
    }
    result
}
