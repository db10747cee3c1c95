use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::platform::expand_home;

/// Executable names tried on `PATH` when no known install location matches.
pub const PATH_NAMES: [&str; 4] = [
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

/// Where to look for a Chrome or Chromium executable.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub install_locations: Vec<PathBuf>,
    pub path_names: Vec<&'static str>,
    /// `PATH`-style search list; `None` uses the process `PATH`.
    pub search_path: Option<OsString>,
}

impl Discovery {
    /// Install locations and `PATH` names for the current platform.
    pub fn system() -> Self {
        Self {
            install_locations: default_locations(),
            path_names: if cfg!(windows) {
                Vec::new()
            } else {
                PATH_NAMES.to_vec()
            },
            search_path: None,
        }
    }

    /// Resolve the executable. An explicit override wins, then the configured
    /// path, then known install locations, then a `PATH` search. Overrides
    /// that do not name an existing file are skipped.
    pub fn find(&self, explicit: Option<&Path>, configured: Option<&Path>) -> Result<PathBuf> {
        let mut searched = Vec::new();

        let overrides = explicit
            .into_iter()
            .chain(configured)
            .map(|p| PathBuf::from(expand_home(&p.to_string_lossy())));
        for candidate in overrides.chain(self.install_locations.iter().cloned()) {
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "found Chrome executable");
                return Ok(candidate);
            }
            searched.push(candidate);
        }

        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        for name in &self.path_names {
            let found = match &self.search_path {
                Some(paths) => which::which_in(name, Some(paths), &cwd),
                None => which::which(name),
            };
            if let Ok(path) = found {
                tracing::debug!(path = %path.display(), "found Chrome on PATH");
                return Ok(path);
            }
            searched.push(PathBuf::from(name));
        }

        Err(Error::ExecutableNotFound { searched })
    }
}

#[cfg(target_os = "linux")]
fn default_locations() -> Vec<PathBuf> {
    [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

#[cfg(target_os = "macos")]
fn default_locations() -> Vec<PathBuf> {
    [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chrome.app/Contents/MacOS/Chrome",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect()
}

#[cfg(windows)]
fn default_locations() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = [
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    ]
    .into_iter()
    .map(PathBuf::from)
    .collect();
    if let Some(local) = dirs::data_local_dir() {
        paths.push(local.join(r"Google\Chrome\Application\chrome.exe"));
    }
    paths
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
fn default_locations() -> Vec<PathBuf> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn empty() -> (TempDir, Discovery) {
        let dir = TempDir::new().unwrap();
        let discovery = Discovery {
            install_locations: vec![dir.path().join("missing-chrome")],
            path_names: vec!["chromium"],
            search_path: Some(dir.path().as_os_str().to_owned()),
        };
        (dir, discovery)
    }

    #[test]
    fn explicit_override_wins() {
        let (dir, discovery) = empty();
        let chrome = dir.path().join("chrome");
        let other = dir.path().join("configured-chrome");
        std::fs::write(&chrome, "").unwrap();
        std::fs::write(&other, "").unwrap();

        let found = discovery.find(Some(&chrome), Some(&other)).unwrap();
        assert_eq!(found, chrome);
    }

    #[test]
    fn missing_override_falls_through_to_configured() {
        let (dir, discovery) = empty();
        let configured = dir.path().join("configured-chrome");
        std::fs::write(&configured, "").unwrap();

        let found = discovery
            .find(Some(&dir.path().join("nope")), Some(&configured))
            .unwrap();
        assert_eq!(found, configured);
    }

    #[test]
    fn install_location_is_used() {
        let (dir, mut discovery) = empty();
        let installed = dir.path().join("google-chrome");
        std::fs::write(&installed, "").unwrap();
        discovery.install_locations.push(installed.clone());

        assert_eq!(discovery.find(None, None).unwrap(), installed);
    }

    #[cfg(unix)]
    #[test]
    fn path_search_finds_executable() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, discovery) = empty();
        let chromium = dir.path().join("chromium");
        std::fs::write(&chromium, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&chromium, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(discovery.find(None, None).unwrap(), chromium);
    }

    #[test]
    fn nothing_found_lists_searched_locations() {
        let (dir, discovery) = empty();
        let err = discovery.find(None, None).unwrap_err();
        match err {
            Error::ExecutableNotFound { searched } => {
                assert_eq!(
                    searched,
                    vec![dir.path().join("missing-chrome"), PathBuf::from("chromium")]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
