use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The two deployment targets. Every lifecycle operation is parameterised by
/// one of these; there is no way to create another at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Development, Environment::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Capitalised name for titles and table headers.
    pub fn title(&self) -> &'static str {
        match self {
            Environment::Development => "Development",
            Environment::Production => "Production",
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to pick when neither `--dev` nor `--prod` was passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultSelection {
    Development,
    Both,
}

/// Turn a pair of `--dev`/`--prod` flags into the environments to act on,
/// always in development-then-production order.
pub fn select(dev: bool, prod: bool, default: DefaultSelection) -> Vec<Environment> {
    match (dev, prod) {
        (false, false) => match default {
            DefaultSelection::Development => vec![Environment::Development],
            DefaultSelection::Both => Environment::ALL.to_vec(),
        },
        (true, false) => vec![Environment::Development],
        (false, true) => vec![Environment::Production],
        (true, true) => Environment::ALL.to_vec(),
    }
}

/// Resolved, immutable settings for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSpec {
    pub environment: Environment,
    pub container_name: String,
    pub service_name: String,
    pub compose_file: PathBuf,
    pub port: u16,
    pub url: String,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_defaults() {
        assert_eq!(
            select(false, false, DefaultSelection::Development),
            vec![Environment::Development]
        );
        assert_eq!(
            select(false, false, DefaultSelection::Both),
            vec![Environment::Development, Environment::Production]
        );
    }

    #[test]
    fn select_explicit_flags() {
        assert_eq!(
            select(false, true, DefaultSelection::Both),
            vec![Environment::Production]
        );
        assert_eq!(
            select(true, false, DefaultSelection::Both),
            vec![Environment::Development]
        );
        assert_eq!(
            select(true, true, DefaultSelection::Development),
            Environment::ALL.to_vec()
        );
    }

    #[test]
    fn display_and_title() {
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.title(), "Production");
    }
}
