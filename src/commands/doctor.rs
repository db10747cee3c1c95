use std::path::Path;

use tokio::process::Command;

use crate::browser::Discovery;
use crate::config::Config;
use crate::docker::compose::declared_services;
use crate::docker::DockerRuntime;
use crate::environment::Environment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

impl Check {
    fn ok(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: true,
            detail: detail.into(),
        }
    }

    fn failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok: false,
            detail: detail.into(),
        }
    }
}

pub async fn run(config: &Config, chrome_path: Option<&Path>) -> anyhow::Result<()> {
    println!("groucho doctor");
    println!("==============");
    println!();

    let mut checks = Vec::new();
    checks.push(tool_version("docker", &["--version"]).await);
    checks.push(tool_version("docker compose", &["compose", "version"]).await);
    checks.push(match DockerRuntime::connect().await {
        Ok(_) => Check::ok("docker daemon", "reachable"),
        Err(e) => Check::failed("docker daemon", e.to_string()),
    });
    checks.extend(config_checks(config));
    checks.push(chrome_check(&Discovery::system(), chrome_path, config));

    for check in &checks {
        let mark = if check.ok { "[ok]" } else { "[!!]" };
        println!("  {} {:<20} {}", mark, check.name, check.detail);
    }

    println!();
    if checks.iter().all(|c| c.ok) {
        println!("Everything looks good.");
    } else {
        println!("Some checks failed. Containers need Docker and the compose files;");
        println!("the debug browser needs Chrome or Chromium (set CHROME_PATH to override).");
    }
    Ok(())
}

async fn tool_version(name: &str, args: &[&str]) -> Check {
    match Command::new("docker").args(args).output().await {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Check::ok(name, version)
        }
        _ => Check::failed(name, "not found"),
    }
}

/// Configuration problems, then whether each compose file declares the
/// service the controller drives.
pub fn config_checks(config: &Config) -> Vec<Check> {
    let mut checks = match config.validate() {
        Ok(()) => vec![Check::ok("configuration", config.project_root.display().to_string())],
        Err(problems) => problems
            .iter()
            .map(|p| Check::failed("configuration", p.to_string()))
            .collect(),
    };

    for env in Environment::ALL {
        let spec = config.environment(env);
        if !spec.compose_file.is_file() {
            continue;
        }
        let name = format!("{} service", env.as_str());
        let services = declared_services(&spec.compose_file);
        if services.iter().any(|s| s == &spec.service_name) {
            checks.push(Check::ok(name, spec.service_name.clone()));
        } else {
            checks.push(Check::failed(
                name,
                format!(
                    "'{}' not declared in {} (found: {})",
                    spec.service_name,
                    spec.compose_file.display(),
                    services.join(", ")
                ),
            ));
        }
    }
    checks
}

pub fn chrome_check(discovery: &Discovery, explicit: Option<&Path>, config: &Config) -> Check {
    match discovery.find(explicit, config.chrome.executable.as_deref()) {
        Ok(path) => Check::ok("chrome", path.display().to_string()),
        Err(e) => Check::failed("chrome", e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        let root = dir.path().to_str().unwrap().to_string();
        Config::from_lookup(
            |k| (k == "GROUCHO_PROJECT_ROOT").then(|| root.clone()),
            dir.path(),
        )
        .unwrap()
    }

    #[test]
    fn missing_compose_files_are_reported() {
        let dir = TempDir::new().unwrap();
        let checks = config_checks(&config(&dir));
        let failed: Vec<_> = checks.iter().filter(|c| !c.ok).collect();
        assert_eq!(failed.len(), 2);
        assert!(failed[0].detail.contains("docker-compose.yml"));
    }

    #[test]
    fn undeclared_service_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("docker-compose.yml"),
            "services:\n  web:\n    image: nginx\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("docker-compose.prod.yml"),
            "services:\n  groucho:\n    image: groucho-the-hunter:latest\n",
        )
        .unwrap();

        let checks = config_checks(&config(&dir));
        assert!(checks[0].ok);
        let dev = checks.iter().find(|c| c.name == "development service").unwrap();
        assert!(!dev.ok);
        assert!(dev.detail.contains("'groucho-dev' not declared"));
        assert!(dev.detail.contains("found: web"));
        let prod = checks.iter().find(|c| c.name == "production service").unwrap();
        assert!(prod.ok);
    }

    #[test]
    fn chrome_check_uses_override() {
        let dir = TempDir::new().unwrap();
        let chrome = dir.path().join("chrome");
        std::fs::write(&chrome, "").unwrap();
        let check = chrome_check(&Discovery::default(), Some(&chrome), &config(&dir));
        assert!(check.ok);
        assert_eq!(check.detail, chrome.display().to_string());

        let check = chrome_check(&Discovery::default(), None, &config(&dir));
        assert!(!check.ok);
    }
}
