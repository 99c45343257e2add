use crate::error::{QsError, Result};
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// File and directory constants
// ---------------------------------------------------------------------------

pub const APP_DIR: &str = ".qs";
pub const CONFIG_FILE: &str = "config.json";
pub const REGISTRY_FILE: &str = "projects.json";

/// Environment variable that relocates the application directory.
pub const HOME_ENV: &str = "QS_HOME";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Resolve the application directory.
///
/// Priority:
/// 1. `QS_HOME`
/// 2. `~/.qs`
pub fn app_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = home::home_dir().ok_or(QsError::HomeNotFound)?;
    Ok(home.join(APP_DIR))
}

pub fn config_path(app_dir: &Path) -> PathBuf {
    app_dir.join(CONFIG_FILE)
}

pub fn registry_path(app_dir: &Path) -> PathBuf {
    app_dir.join(REGISTRY_FILE)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return home::home_dir().ok_or(QsError::HomeNotFound);
    }
    if let Some(rest) = path.strip_prefix("~/") {
        let home = home::home_dir().ok_or(QsError::HomeNotFound)?;
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(path))
}

/// Lexically normalize a path: drop `.` components, fold `..` and trailing
/// separators. Does not touch the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Last path component, used as a short display name for a repository.
pub fn repo_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
