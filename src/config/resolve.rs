use std::path::{Path, PathBuf};

/// Marker file that identifies the game's project root.
pub const ROOT_MARKER: &str = "docker-compose.yml";

/// Walk up the directory tree from `start`, checking for `filename` at each level.
/// Returns the directory that contains the file, or None if the root is reached
/// without finding it.
pub fn find_marker_dir(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(filename).is_file() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Resolve the project root. An explicit root (from `GROUCHO_PROJECT_ROOT`)
/// wins; otherwise search from `cwd` upward for `docker-compose.yml`, falling
/// back to `cwd` itself.
pub fn resolve_project_root(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    if let Some(path) = explicit {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        return path.canonicalize().unwrap_or(path);
    }

    find_marker_dir(cwd, ROOT_MARKER).unwrap_or_else(|| cwd.to_path_buf())
}
