use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use regex::Regex;

use crate::error::ProfileError;

/// Reserved profile name; always exists conceptually, can only be reset.
pub const DEFAULT_PROFILE: &str = "default";

const DIR_PREFIX: &str = "chrome-profile-";
const DEFAULT_DIR: &str = "chrome-profile-groucho";
const LOCK_FILE: &str = "SingletonLock";

static BACKUP_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.+?)_backup_\d{8}_\d{6}$").expect("backup name regex must compile")
});

type Result<T> = std::result::Result<T, ProfileError>;

/// A named browser user-data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created: Option<SystemTime>,
}

/// Profile directories under one root, plus their tar.gz backups.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a profile name. The name must be a single path component.
    pub fn path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(dir_name(name)))
    }

    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path(name)?.is_dir())
    }

    /// Create the directory for `name` if needed and return it.
    pub fn ensure(&self, name: &str) -> Result<PathBuf> {
        let path = self.path(name)?;
        fs::create_dir_all(&path).map_err(|e| ProfileError::io("create", &path, e))?;
        Ok(path)
    }

    pub fn create(&self, name: &str) -> Result<PathBuf> {
        if is_default(name) {
            return Err(ProfileError::Reserved { action: "create" });
        }
        if self.exists(name)? {
            return Err(ProfileError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let path = self.ensure(name)?;
        tracing::info!(profile = %name, path = %path.display(), "profile created");
        Ok(path)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        if is_default(name) {
            return Err(ProfileError::Reserved { action: "delete" });
        }
        let path = self.existing(name)?;
        fs::remove_dir_all(&path).map_err(|e| ProfileError::io("delete", &path, e))?;
        tracing::info!(profile = %name, "profile deleted");
        Ok(())
    }

    /// Empty a profile by removing and recreating its directory.
    pub fn recreate(&self, name: &str) -> Result<PathBuf> {
        let path = self.path(name)?;
        if path.exists() {
            fs::remove_dir_all(&path).map_err(|e| ProfileError::io("reset", &path, e))?;
        }
        self.ensure(name)
    }

    /// Write `name` to a gzip'd tarball whose only top-level entry is the
    /// profile directory. Defaults to `<root>/<name>_backup_<timestamp>.tar.gz`.
    pub fn backup(&self, name: &str, output: Option<&Path>, now: DateTime<Local>) -> Result<PathBuf> {
        let source = self.existing(name)?;
        let target = match output {
            Some(path) => path.to_path_buf(),
            None => self.root.join(backup_file_name(name, now)),
        };
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ProfileError::io("create", parent, e))?;
        }

        let file = File::create(&target).map_err(|e| ProfileError::io("create", &target, e))?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        // Chrome's lock files are dangling symlinks; archive them as links.
        builder.follow_symlinks(false);
        builder
            .append_dir_all(dir_name(name), &source)
            .map_err(|e| ProfileError::io("archive", &source, e))?;
        builder
            .into_inner()
            .and_then(|gz| gz.finish())
            .map_err(|e| ProfileError::io("write", &target, e))?;

        tracing::info!(profile = %name, archive = %target.display(), "profile backed up");
        Ok(target)
    }

    /// Replace profile `name` with the contents of `archive`, whatever the
    /// archive's top-level directory was called.
    pub fn restore(&self, archive: &Path, name: &str) -> Result<PathBuf> {
        if !archive.is_file() {
            return Err(ProfileError::BackupNotFound {
                path: archive.to_path_buf(),
            });
        }
        let target = self.path(name)?;
        top_level_entry(archive)?;

        if target.exists() {
            fs::remove_dir_all(&target).map_err(|e| ProfileError::io("replace", &target, e))?;
        }
        fs::create_dir_all(&target).map_err(|e| ProfileError::io("create", &target, e))?;

        let mut tar = open_archive(archive)?;
        let entries = tar.entries().map_err(|e| invalid(archive, e))?;
        for entry in entries {
            let mut entry = entry.map_err(|e| invalid(archive, e))?;
            let path = entry.path().map_err(|e| invalid(archive, e))?.into_owned();
            let relative: PathBuf = path
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .skip(1)
                .collect();
            if relative.as_os_str().is_empty() {
                continue;
            }
            if crosses_symlink(&target, &relative) {
                return Err(invalid(
                    archive,
                    format!("entry {} goes through a symlink", path.display()),
                ));
            }
            let dest = target.join(&relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| ProfileError::io("create", parent, e))?;
            }
            entry
                .unpack(&dest)
                .map_err(|e| ProfileError::io("extract", &dest, e))?;
        }

        tracing::info!(profile = %name, archive = %archive.display(), "profile restored");
        Ok(target)
    }

    /// Every profile directory under the root, sorted by name.
    pub fn list(&self) -> Result<Vec<Profile>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ProfileError::io("read", &self.root, e)),
        };

        let mut profiles = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some(name) = profile_name_for_dir(&file_name) else {
                continue;
            };
            let created = entry
                .metadata()
                .ok()
                .and_then(|m| m.created().or_else(|_| m.modified()).ok());
            profiles.push(Profile {
                name,
                size_bytes: dir_size(&path),
                created,
                path,
            });
        }
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    /// Remove `SingletonLock` from every profile directory. Returns how many
    /// were removed; failures are logged.
    pub fn clear_locks(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return 0;
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let lock = entry.path().join(LOCK_FILE);
            // The lock is usually a dangling symlink, so `exists()` won't see it.
            if fs::symlink_metadata(&lock).is_err() {
                continue;
            }
            match fs::remove_file(&lock) {
                Ok(()) => {
                    tracing::debug!(path = %lock.display(), "removed lock file");
                    removed += 1;
                }
                Err(e) => tracing::warn!(path = %lock.display(), error = %e, "failed to remove lock file"),
            }
        }
        removed
    }

    fn existing(&self, name: &str) -> Result<PathBuf> {
        let path = self.path(name)?;
        if !path.is_dir() {
            return Err(ProfileError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(path)
    }
}

fn is_default(name: &str) -> bool {
    dir_name(name) == DEFAULT_DIR
}

fn dir_name(name: &str) -> String {
    if name == DEFAULT_PROFILE {
        DEFAULT_DIR.to_string()
    } else {
        format!("{}{}", DIR_PREFIX, name)
    }
}

fn profile_name_for_dir(dir: &str) -> Option<String> {
    if dir == DEFAULT_DIR {
        return Some(DEFAULT_PROFILE.to_string());
    }
    dir.strip_prefix(DIR_PREFIX)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();
    if name.is_empty() || !single_normal || name.contains(['/', '\\', '\0']) {
        return Err(ProfileError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub fn backup_file_name(name: &str, now: DateTime<Local>) -> String {
    format!("{}_backup_{}.tar.gz", name, now.format("%Y%m%d_%H%M%S"))
}

/// Profile name encoded in a backup file name:
/// `work_backup_20240101_120000.tar.gz` -> `work`.
pub fn profile_name_from_backup(archive: &Path) -> String {
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = file_name
        .strip_suffix(".tar.gz")
        .or_else(|| file_name.strip_suffix(".tgz"))
        .unwrap_or(&file_name);
    match BACKUP_NAME_RE.captures(stem) {
        Some(caps) => caps["name"].to_string(),
        None => stem.to_string(),
    }
}

fn open_archive(archive: &Path) -> Result<tar::Archive<GzDecoder<File>>> {
    let file = File::open(archive).map_err(|e| ProfileError::io("open", archive, e))?;
    Ok(tar::Archive::new(GzDecoder::new(file)))
}

fn invalid(archive: &Path, e: impl std::fmt::Display) -> ProfileError {
    ProfileError::InvalidArchive {
        path: archive.to_path_buf(),
        reason: e.to_string(),
    }
}

/// The archive's single top-level directory. Rejects absolute paths, `..`,
/// hard links, symlinks that leave their directory and archives with more
/// than one top-level entry.
fn top_level_entry(archive: &Path) -> Result<String> {
    let mut tar = open_archive(archive)?;
    let mut tops = BTreeSet::new();
    for entry in tar.entries().map_err(|e| invalid(archive, e))? {
        let entry = entry.map_err(|e| invalid(archive, e))?;
        let path = entry.path().map_err(|e| invalid(archive, e))?;
        let mut top = None;
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    if top.is_none() {
                        top = Some(part.to_string_lossy().to_string());
                    }
                }
                Component::CurDir => {}
                _ => {
                    return Err(invalid(
                        archive,
                        format!("unsafe entry path {}", path.display()),
                    ))
                }
            }
        }
        if let Some(top) = top {
            tops.insert(top);
        }

        let kind = entry.header().entry_type();
        if kind.is_hard_link() {
            return Err(invalid(
                archive,
                format!("hard link {} is not supported", path.display()),
            ));
        }
        if kind.is_symlink() {
            let target = entry.link_name().map_err(|e| invalid(archive, e))?;
            if !target.as_deref().is_some_and(stays_inside) {
                return Err(invalid(
                    archive,
                    format!("symlink {} points outside the profile", path.display()),
                ));
            }
        }
    }

    let mut tops = tops.into_iter();
    match (tops.next(), tops.next()) {
        (Some(top), None) => Ok(top),
        (None, _) => Err(invalid(archive, "archive is empty")),
        (Some(_), Some(_)) => Err(invalid(archive, "expected a single top-level directory")),
    }
}

/// A relative link target made only of plain names.
fn stays_inside(target: &Path) -> bool {
    !target.as_os_str().is_empty()
        && target
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// True when some directory between `root` and `relative`'s parent is a
/// symlink, so writing there would land somewhere else.
fn crosses_symlink(root: &Path, relative: &Path) -> bool {
    let mut current = root.to_path_buf();
    let Some(parent) = relative.parent() else {
        return false;
    };
    parent.components().any(|component| {
        current.push(component);
        fs::symlink_metadata(&current).is_ok_and(|m| m.file_type().is_symlink())
    })
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(ft) if ft.is_dir() => dir_size(&entry.path()),
            Ok(ft) if ft.is_file() => entry.metadata().map(|m| m.len()).unwrap_or(0),
            _ => 0,
        })
        .sum()
}
