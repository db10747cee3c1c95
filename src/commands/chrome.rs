use std::path::PathBuf;

use crate::browser::BrowserSession;
use crate::cli::ProfileCommands;
use crate::outcome::{Confirm, Outcome};
use crate::ui;

pub async fn start(
    session: &mut BrowserSession,
    profile: &str,
    url: Option<&str>,
    extra_args: &[String],
) -> anyhow::Result<()> {
    let outcome = session.start(profile, url, extra_args).await?;
    let devtools = format!("http://127.0.0.1:{}", session.port());
    ui::outcome(
        outcome,
        format!("Chrome started with profile '{}', DevTools at {}", profile, devtools),
        format!("Chrome is already running, DevTools at {}", devtools),
    );
    Ok(())
}

pub async fn stop(session: &mut BrowserSession, force: bool) -> anyhow::Result<()> {
    let outcome = session.stop(!force).await?;
    ui::outcome(outcome, "Chrome stopped", "Chrome is not running");
    Ok(())
}

pub async fn status(session: &mut BrowserSession) -> anyhow::Result<()> {
    let status = session.status().await;
    println!();
    ui::summary::print_table(&ui::summary::browser_table(&status, ui::use_color()));
    println!();
    Ok(())
}

/// Dispatch a `chrome profile` subcommand. Returns what the operation did,
/// or the created/written path for commands that produce one.
pub async fn profile(
    session: &mut BrowserSession,
    command: ProfileCommands,
    confirm: &dyn Confirm,
) -> anyhow::Result<(Outcome, Option<PathBuf>)> {
    match command {
        ProfileCommands::Create { name } => {
            let path = session.create_profile(&name)?;
            ui::success(format!("Created profile '{}' at {}", name, path.display()));
            Ok((Outcome::Applied, Some(path)))
        }
        ProfileCommands::Delete { name, force } => {
            let outcome = session.delete_profile(&name, force, confirm)?;
            ui::outcome(outcome, format!("Deleted profile '{}'", name), "");
            Ok((outcome, None))
        }
        ProfileCommands::Reset { name, force } => {
            let outcome = session.reset_profile(&name, force, confirm).await?;
            ui::outcome(outcome, format!("Profile '{}' reset", name), "");
            Ok((outcome, None))
        }
        ProfileCommands::List => {
            let profiles = session.list_profiles()?;
            if profiles.is_empty() {
                ui::info(format!(
                    "No profiles in {}",
                    session.profiles().root().display()
                ));
            } else {
                ui::summary::print_table(&ui::summary::profiles_table(&profiles));
            }
            Ok((Outcome::Unchanged, None))
        }
        ProfileCommands::Backup { name, output } => {
            let path = session.backup_profile(&name, output.as_deref())?;
            ui::success(format!("Backed up profile '{}' to {}", name, path.display()));
            Ok((Outcome::Applied, Some(path)))
        }
        ProfileCommands::Restore { archive, name } => {
            let (name, path) = session.restore_profile(&archive, name.as_deref()).await?;
            ui::success(format!("Restored profile '{}' to {}", name, path.display()));
            Ok((Outcome::Applied, Some(path)))
        }
    }
}
