// The miette/thiserror derive macros generate code that triggers false
// positive unused_assignments warnings on enum variant fields.
#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::config::Config;
use crate::environment::Environment;

const LOG_LEVELS: [&str; 7] = ["trace", "debug", "info", "warn", "warning", "error", "critical"];

// ---------------------------------------------------------------------------
// ConfigDiagnostic: problems found in an otherwise parseable Config
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigDiagnostic {
    #[error("{environment} docker compose file not found: {}", path.display())]
    #[diagnostic(code(groucho::missing_compose_file))]
    MissingComposeFile {
        environment: Environment,
        path: PathBuf,
    },

    #[error("project root does not exist: {}", path.display())]
    #[diagnostic(
        code(groucho::missing_project_root),
        help("set GROUCHO_PROJECT_ROOT to the game's checkout")
    )]
    MissingProjectRoot { path: PathBuf },

    #[error("invalid {name}: {port} (must be 1-65535)")]
    #[diagnostic(code(groucho::invalid_port))]
    InvalidPort { name: &'static str, port: u16 },

    #[error("invalid log level `{level}`")]
    #[diagnostic(
        code(groucho::invalid_log_level),
        help("valid values are: trace, debug, info, warn, error")
    )]
    InvalidLogLevel { level: String },
}

/// Check a configuration for problems that would make operations fail later.
/// Returns every problem found, not just the first.
pub fn validate(config: &Config) -> Result<(), Vec<ConfigDiagnostic>> {
    let mut errors = Vec::new();

    for env in Environment::ALL {
        let spec = config.environment(env);
        if !spec.compose_file.is_file() {
            errors.push(ConfigDiagnostic::MissingComposeFile {
                environment: env,
                path: spec.compose_file.clone(),
            });
        }
    }

    if !config.project_root.is_dir() {
        errors.push(ConfigDiagnostic::MissingProjectRoot {
            path: config.project_root.clone(),
        });
    }

    let ports = [
        ("dev_port", config.development.port),
        ("prod_port", config.production.port),
        ("hmr_port", config.hmr_port),
        ("chrome_debug_port", config.chrome.debug_port),
    ];
    for (name, port) in ports {
        if port == 0 {
            errors.push(ConfigDiagnostic::InvalidPort { name, port });
        }
    }

    if !LOG_LEVELS.contains(&config.log_level.to_lowercase().as_str()) {
        errors.push(ConfigDiagnostic::InvalidLogLevel {
            level: config.log_level.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Map a configured log level onto a tracing filter directive.
pub fn filter_directive(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => "info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let root = dir.path().to_str().unwrap().to_string();
        Config::from_lookup(
            |k| (k == "GROUCHO_PROJECT_ROOT").then(|| root.clone()),
            dir.path(),
        )
        .unwrap()
    }

    #[test]
    fn valid_project_passes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        std::fs::write(dir.path().join("docker-compose.prod.yml"), "services: {}\n").unwrap();

        assert!(validate(&config_in(&dir)).is_ok());
    }

    #[test]
    fn missing_compose_files_reported_per_environment() {
        let dir = TempDir::new().unwrap();
        let errors = validate(&config_in(&dir)).unwrap_err();

        let missing: Vec<Environment> = errors
            .iter()
            .filter_map(|e| match e {
                ConfigDiagnostic::MissingComposeFile { environment, .. } => Some(*environment),
                _ => None,
            })
            .collect();
        assert_eq!(missing, vec![Environment::Development, Environment::Production]);
    }

    #[test]
    fn zero_port_and_bad_level_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("docker-compose.yml"), "").unwrap();
        std::fs::write(dir.path().join("docker-compose.prod.yml"), "").unwrap();

        let mut cfg = config_in(&dir);
        cfg.hmr_port = 0;
        cfg.log_level = "loud".to_string();

        let errors = validate(&cfg).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigDiagnostic::InvalidPort { name: "hmr_port", .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigDiagnostic::InvalidLogLevel { .. })));
    }

    #[test]
    fn filter_directive_mapping() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("critical"), "error");
        assert_eq!(filter_directive("nonsense"), "info");
    }
}
