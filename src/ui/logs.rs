use owo_colors::OwoColorize;
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

static LOG_LEVEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(debug|info|warn(?:ing)?|error)\b|\berr!").unwrap());

/// Detect a log level from a line of container output.
pub fn detect_log_level(text: &str) -> Option<LogLevel> {
    LOG_LEVEL_RE.find(text).and_then(|m| {
        match m.as_str().to_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" | "err!" => Some(LogLevel::Error),
            _ => None,
        }
    })
}

static COMPOSE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<service>\S+)\s+\| ?(?P<text>.*)$").unwrap());

/// Split `docker compose logs` output into (service prefix, text).
/// `groucho-dev-1  | VITE ready` -> `("groucho-dev-1", "VITE ready")`
pub fn split_prefix(line: &str) -> (Option<&str>, &str) {
    match COMPOSE_PREFIX_RE.captures(line) {
        Some(caps) => match (caps.name("service"), caps.name("text")) {
            (Some(service), Some(text)) => (Some(service.as_str()), text.as_str()),
            _ => (None, line),
        },
        None => (None, line),
    }
}

/// One log line, colored by detected level when `use_color` is set.
pub fn render_line(line: &str, use_color: bool) -> String {
    if !use_color {
        return line.to_string();
    }
    let (prefix, text) = split_prefix(line);
    let text = match detect_log_level(text) {
        Some(LogLevel::Error) => text.red().to_string(),
        Some(LogLevel::Warn) => text.yellow().to_string(),
        Some(LogLevel::Debug) => text.dimmed().to_string(),
        Some(LogLevel::Info) | None => text.to_string(),
    };
    match prefix {
        Some(prefix) => format!("{} {} {}", prefix.cyan(), "|".dimmed(), text),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_level_info() {
        assert_eq!(detect_log_level("[INFO] starting"), Some(LogLevel::Info));
        assert_eq!(detect_log_level("level=info msg=ok"), Some(LogLevel::Info));
    }

    #[test]
    fn detect_level_error() {
        assert_eq!(
            detect_log_level("ERROR: something failed"),
            Some(LogLevel::Error)
        );
        assert_eq!(detect_log_level("npm ERR! missing script"), Some(LogLevel::Error));
    }

    #[test]
    fn detect_level_warn() {
        assert_eq!(detect_log_level("[WARN] slow query"), Some(LogLevel::Warn));
        assert_eq!(
            detect_log_level("WARNING: deprecated"),
            Some(LogLevel::Warn)
        );
    }

    #[test]
    fn detect_level_none() {
        assert_eq!(detect_log_level("  VITE v5.0.0  ready in 312 ms"), None);
        assert_eq!(detect_log_level(""), None);
    }

    #[test]
    fn compose_prefix_is_split() {
        assert_eq!(
            split_prefix("groucho-dev-1  | VITE ready"),
            (Some("groucho-dev-1"), "VITE ready")
        );
        assert_eq!(split_prefix("plain line"), (None, "plain line"));
    }

    #[test]
    fn plain_rendering_is_verbatim() {
        let line = "groucho-dev-1  | ERROR boom";
        assert_eq!(render_line(line, false), line);
        assert!(render_line(line, true).contains("\u{1b}["));
    }
}
