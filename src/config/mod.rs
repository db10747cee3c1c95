pub mod resolve;
pub mod validate;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::environment::{Environment, EnvironmentSpec};
use crate::error::ConfigError;

pub const DEFAULT_DEV_PORT: u16 = 3000;
pub const DEFAULT_PROD_PORT: u16 = 8080;
pub const DEFAULT_HMR_PORT: u16 = 24678;
pub const DEFAULT_DEBUG_PORT: u16 = 9222;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings for the debug browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeConfig {
    pub profiles_path: PathBuf,
    /// Executable override from `CHROME_PATH`.
    pub executable: Option<PathBuf>,
    pub debug_port: u16,
}

/// Immutable runtime configuration, read once at startup and passed by
/// reference into every controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub project_root: PathBuf,
    pub development: EnvironmentSpec,
    pub production: EnvironmentSpec,
    /// Vite hot-module-reload port published by the development container.
    pub hmr_port: u16,
    pub log_level: String,
    pub chrome: ChromeConfig,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::CurrentDir { source })?;
        Self::from_lookup(|key| std::env::var(key).ok(), &cwd)
    }

    /// Build the configuration from an arbitrary variable lookup. `cwd` is
    /// where the project root search starts when `GROUCHO_PROJECT_ROOT` is
    /// unset.
    pub fn from_lookup<F>(lookup: F, cwd: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let explicit_root = get("GROUCHO_PROJECT_ROOT").map(PathBuf::from);
        let project_root = resolve::resolve_project_root(explicit_root.as_deref(), cwd);

        let dev_port = parse_var(&get, "GROUCHO_DEV_PORT", DEFAULT_DEV_PORT)?;
        let prod_port = parse_var(&get, "GROUCHO_PROD_PORT", DEFAULT_PROD_PORT)?;
        let hmr_port = parse_var(&get, "GROUCHO_HMR_PORT", DEFAULT_HMR_PORT)?;
        let debug_port = parse_var(&get, "GROUCHO_CHROME_DEBUG_PORT", DEFAULT_DEBUG_PORT)?;

        let development = EnvironmentSpec {
            environment: Environment::Development,
            container_name: get("GROUCHO_DEV_CONTAINER")
                .unwrap_or_else(|| "groucho-the-hunter-dev".to_string()),
            service_name: get("GROUCHO_DEV_SERVICE").unwrap_or_else(|| "groucho-dev".to_string()),
            compose_file: path_var(&get, "GROUCHO_COMPOSE_DEV", &project_root, "docker-compose.yml"),
            port: dev_port,
            url: get("GROUCHO_DEV_URL").unwrap_or_else(|| format!("http://localhost:{}", dev_port)),
            image: get("GROUCHO_DEV_IMAGE")
                .unwrap_or_else(|| "groucho-the-hunter-dev:latest".to_string()),
        };

        let production = EnvironmentSpec {
            environment: Environment::Production,
            container_name: get("GROUCHO_PROD_CONTAINER")
                .unwrap_or_else(|| "groucho-the-hunter".to_string()),
            service_name: get("GROUCHO_PROD_SERVICE").unwrap_or_else(|| "groucho".to_string()),
            compose_file: path_var(
                &get,
                "GROUCHO_COMPOSE_PROD",
                &project_root,
                "docker-compose.prod.yml",
            ),
            port: prod_port,
            url: get("GROUCHO_PROD_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", prod_port)),
            image: get("GROUCHO_PROD_IMAGE")
                .unwrap_or_else(|| "groucho-the-hunter:latest".to_string()),
        };

        let chrome = ChromeConfig {
            profiles_path: path_var(
                &get,
                "GROUCHO_CHROME_PROFILES_PATH",
                &project_root,
                ".chrome-profiles",
            ),
            executable: get("CHROME_PATH").map(PathBuf::from),
            debug_port,
        };

        Ok(Self {
            development,
            production,
            hmr_port,
            log_level: get("GROUCHO_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            chrome,
            project_root,
        })
    }

    pub fn environment(&self, env: Environment) -> &EnvironmentSpec {
        match env {
            Environment::Development => &self.development,
            Environment::Production => &self.production,
        }
    }

    /// Every problem that would make an operation fail later.
    pub fn validate(&self) -> Result<(), Vec<validate::ConfigDiagnostic>> {
        validate::validate(self)
    }
}

fn parse_var<G, T>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            variable: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

/// A path variable; relative values are taken relative to the project root.
fn path_var<G>(get: &G, key: &str, root: &Path, default_name: &str) -> PathBuf
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => {
            let path = PathBuf::from(raw);
            if path.is_absolute() {
                path
            } else {
                root.join(path)
            }
        }
        None => root.join(default_name),
    }
}
