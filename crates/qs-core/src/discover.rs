//! Turn `project add` arguments into registered repositories.

use crate::error::Result;
use crate::git::Vcs;
use crate::paths;
use crate::registry::Repository;
use std::path::{Path, PathBuf};

/// Split candidate directories into git working copies and everything else.
///
/// Relative arguments are resolved against `base_dir`; `~` is expanded.
pub fn git_repos(base_dir: &Path, dirs: &[String]) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut repos = Vec::new();
    let mut rejected = Vec::new();
    for dir in dirs {
        let expanded = paths::expand_tilde(dir)?;
        let full = paths::normalize(&base_dir.join(expanded));
        if full.join(".git").exists() {
            if !repos.contains(&full) {
                repos.push(full);
            }
        } else {
            tracing::debug!("{} is not a git repository", full.display());
            rejected.push(full);
        }
    }
    Ok((repos, rejected))
}

/// Read each repository's remotes from git.
pub fn describe_repos(vcs: &dyn Vcs, paths: Vec<PathBuf>) -> Result<Vec<Repository>> {
    paths
        .into_iter()
        .map(|path| {
            let remotes = vcs.list_remotes(&path)?;
            Ok(Repository::new(path, remotes))
        })
        .collect()
}
