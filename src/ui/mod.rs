pub mod format;
pub mod logs;
pub mod prompt;
pub mod summary;

use std::fmt::Display;

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::outcome::Outcome;

pub use prompt::TerminalPrompt;

pub fn use_color() -> bool {
    std::io::stdout().is_terminal()
}

pub fn success(msg: impl Display) {
    if use_color() {
        println!("{} {}", "\u{2713}".green(), msg);
    } else {
        println!("\u{2713} {}", msg);
    }
}

pub fn info(msg: impl Display) {
    if use_color() {
        println!("{} {}", "\u{2022}".cyan(), msg);
    } else {
        println!("\u{2022} {}", msg);
    }
}

pub fn warn(msg: impl Display) {
    if use_color() {
        println!("{} {}", "!".yellow(), msg.to_string().yellow());
    } else {
        println!("! {}", msg);
    }
}

/// Error line on stderr, prefixed with a short title.
pub fn failure(title: &str, msg: impl Display) {
    if std::io::stderr().is_terminal() {
        eprintln!("{} {}: {}", "\u{2717}".red(), title.red().bold(), msg);
    } else {
        eprintln!("\u{2717} {}: {}", title, msg);
    }
}

/// Print the line matching an operation's outcome.
pub fn outcome(outcome: Outcome, applied: impl Display, unchanged: impl Display) {
    match outcome {
        Outcome::Applied => success(applied),
        Outcome::Unchanged => info(unchanged),
        Outcome::Cancelled => info("Cancelled"),
    }
}
