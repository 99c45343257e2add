//! Pull the baseline branch from a project's upstream, one repository at a
//! time, without disturbing repositories that are on other branches.

use crate::git::Vcs;
use crate::registry::Project;
use crate::types::BASELINE_BRANCH;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Synced,
    /// The repository is not on the baseline branch; nothing was pulled.
    Skipped { branch: String },
    Failed { reason: String },
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyncOutcome::Failed { .. })
    }
}

/// Outcome of one step of a batch operation, tagged with its repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoOutcome<T> {
    pub repo: PathBuf,
    pub outcome: T,
}

/// Sync one repository. Never fails: errors are folded into the outcome.
pub fn sync_repo(vcs: &dyn Vcs, repo: &Path, upstream: &str) -> SyncOutcome {
    let branch = match vcs.current_branch(repo) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(repo = %repo.display(), "sync: {e}");
            return SyncOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };
    if branch != BASELINE_BRANCH {
        tracing::info!(repo = %repo.display(), %branch, "sync skipped: not on {BASELINE_BRANCH}");
        return SyncOutcome::Skipped { branch };
    }
    match vcs.pull(repo, upstream, BASELINE_BRANCH) {
        Ok(()) => {
            tracing::info!(repo = %repo.display(), %upstream, "synced");
            SyncOutcome::Synced
        }
        Err(e) => {
            tracing::warn!(repo = %repo.display(), "sync: {e}");
            SyncOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Sync every repository in order, continuing past failures.
pub fn sync_many<'a>(
    vcs: &dyn Vcs,
    repos: impl IntoIterator<Item = &'a Path>,
    upstream: &str,
) -> Vec<RepoOutcome<SyncOutcome>> {
    repos
        .into_iter()
        .map(|repo| RepoOutcome {
            repo: repo.to_path_buf(),
            outcome: sync_repo(vcs, repo, upstream),
        })
        .collect()
}

pub fn sync_project(vcs: &dyn Vcs, project: &Project) -> Vec<RepoOutcome<SyncOutcome>> {
    sync_many(
        vcs,
        project.repos.iter().map(|r| r.path.as_path()),
        &project.upstream,
    )
}
