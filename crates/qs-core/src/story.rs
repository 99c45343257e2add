//! Story lifecycle: branch every repository of a project for a new story,
//! track the single open story, and tear the branches down on completion.
//!
//! Functions here mutate the in-memory [`Project`] only. Callers persist the
//! registry after each consistent step.

use crate::error::{QsError, Result};
use crate::git::Vcs;
use crate::registry::{Project, Repository, Story};
use crate::sync::{self, RepoOutcome, SyncOutcome};
use crate::types::{self, BASELINE_BRANCH};
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Confirmation gate
// ---------------------------------------------------------------------------

/// Asks the user a yes/no question.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BranchOutcome {
    Created,
    /// The repository was off baseline and the user declined to branch it.
    Declined { branch: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartRepoReport {
    pub repo: std::path::PathBuf,
    pub sync: SyncOutcome,
    pub branch: BranchOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartReport {
    pub story: String,
    pub branch: String,
    pub repos: Vec<StartRepoReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub story: String,
    pub branch: String,
    pub sync: Vec<RepoOutcome<SyncOutcome>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TeardownOutcome {
    /// Checked out baseline and deleted `branch`.
    Removed { branch: String },
    /// Left alone; the repository is on `branch`.
    Skipped { branch: String },
    Failed { reason: String },
}

impl TeardownOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, TeardownOutcome::Failed { .. })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// The project's open story, if any. At most one exists.
pub fn open_story(project: &Project) -> Option<&Story> {
    project.stories.iter().find(|s| s.is_open())
}

pub fn open_story_mut(project: &mut Project) -> Option<&mut Story> {
    project.stories.iter_mut().find(|s| s.is_open())
}

/// Repositories with uncommitted changes, in project order. Repositories whose
/// status cannot be read are logged and left out.
pub fn changed_repos(project: &Project, vcs: &dyn Vcs) -> Vec<Repository> {
    project
        .repos
        .iter()
        .filter(|repo| match vcs.is_clean(&repo.path) {
            Ok(clean) => !clean,
            Err(e) => {
                tracing::warn!(repo = %repo.path.display(), "status: {e}");
                false
            }
        })
        .cloned()
        .collect()
}

/// Repositories that belong to the story's work: dirty now, already pushed
/// for this story, or on the story branch with commits the baseline lacks.
pub fn touched_repos(project: &Project, vcs: &dyn Vcs, story: &Story) -> Vec<Repository> {
    let changed = changed_repos(project, vcs);
    let branch = story.branch();
    project
        .repos
        .iter()
        .filter(|repo| {
            changed.iter().any(|c| c.path == repo.path)
                || story.pushed.iter().any(|p| *p == repo.path)
                || has_story_commits(vcs, &repo.path, &branch)
        })
        .cloned()
        .collect()
}

/// True when `repo` is on `branch` and holds commits not yet on the baseline,
/// e.g. a commit whose push failed.
fn has_story_commits(vcs: &dyn Vcs, repo: &Path, branch: &str) -> bool {
    match vcs.current_branch(repo) {
        Ok(current) if current == branch => match vcs.commits_ahead(repo, BASELINE_BRANCH) {
            Ok(ahead) => ahead > 0,
            Err(e) => {
                tracing::warn!(repo = %repo.display(), "rev-list: {e}");
                false
            }
        },
        Ok(_) => false,
        Err(e) => {
            tracing::warn!(repo = %repo.display(), "branch: {e}");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Open a new story: sync each repository, then create the story branch in it.
///
/// A repository that is not on the baseline branch is only branched if
/// `confirm` agrees; declined repositories stay as they are. The story is
/// recorded as open either way.
pub fn start_story(
    project: &mut Project,
    vcs: &dyn Vcs,
    confirm: &mut dyn Confirm,
    id: &str,
    description: &str,
) -> Result<StartReport> {
    if let Some(open) = open_story(project) {
        return Err(QsError::StoryAlreadyOpen {
            id: open.id.clone(),
            description: open.description.clone(),
        });
    }
    if project.story(id).is_some() {
        return Err(QsError::StoryExists(id.to_string()));
    }

    let description = description.trim();
    let branch = types::branch_name(id, description);
    let mut repos = Vec::with_capacity(project.repos.len());

    for repo in &project.repos {
        let sync = sync::sync_repo(vcs, &repo.path, &project.upstream);
        let outcome = create_story_branch(vcs, confirm, repo, &branch);
        repos.push(StartRepoReport {
            repo: repo.path.clone(),
            sync,
            branch: outcome,
        });
    }

    project.stories.push(Story::new(id, description));
    tracing::info!(story = id, %branch, "story opened");

    Ok(StartReport {
        story: id.to_string(),
        branch,
        repos,
    })
}

fn create_story_branch(
    vcs: &dyn Vcs,
    confirm: &mut dyn Confirm,
    repo: &Repository,
    branch: &str,
) -> BranchOutcome {
    let current = match vcs.current_branch(&repo.path) {
        Ok(b) => b,
        Err(e) => {
            return BranchOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };
    if current != BASELINE_BRANCH {
        let prompt = format!(
            "{} is on branch '{current}', not '{BASELINE_BRANCH}'. Create '{branch}' from it anyway?",
            repo.name()
        );
        if !confirm.confirm(&prompt) {
            tracing::info!(repo = %repo.path.display(), %current, "branch creation declined");
            return BranchOutcome::Declined { branch: current };
        }
    }
    match vcs.create_branch(&repo.path, branch) {
        Ok(()) => BranchOutcome::Created,
        Err(e) => {
            tracing::warn!(repo = %repo.path.display(), "{e}");
            BranchOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Sync the project and mark the story completed.
///
/// Branch teardown is a separate step ([`teardown_story_branch`]) so the
/// caller can persist the status change first.
pub fn complete_story(project: &mut Project, vcs: &dyn Vcs, id: &str) -> Result<Completion> {
    if project.stories.is_empty() {
        return Err(QsError::NoStories);
    }
    let story = project
        .story(id)
        .ok_or_else(|| QsError::StoryNotFound(id.to_string()))?;
    if !story.is_open() {
        return Err(QsError::StoryNotOpen(id.to_string()));
    }
    let branch = story.branch();

    let sync = sync::sync_project(vcs, project);
    if let Some(story) = project.story_mut(id) {
        story.complete();
    }
    tracing::info!(story = id, "story completed");

    Ok(Completion {
        story: id.to_string(),
        branch,
        sync,
    })
}

/// Return every repository on `branch` to the baseline and delete `branch`.
///
/// A repository already on the baseline only loses `branch` if it still has
/// one. Repositories on any other branch are left alone.
pub fn teardown_story_branch(
    project: &Project,
    vcs: &dyn Vcs,
    branch: &str,
) -> Vec<RepoOutcome<TeardownOutcome>> {
    project
        .repos
        .iter()
        .map(|repo| {
            let outcome = match vcs.current_branch(&repo.path) {
                Ok(current) if current == branch => revert_to_baseline(vcs, &repo.path, branch),
                Ok(current) if current == BASELINE_BRANCH => {
                    delete_leftover(vcs, &repo.path, branch)
                }
                Ok(current) => TeardownOutcome::Skipped { branch: current },
                Err(e) => TeardownOutcome::Failed {
                    reason: e.to_string(),
                },
            };
            RepoOutcome {
                repo: repo.path.clone(),
                outcome,
            }
        })
        .collect()
}

/// Put every repository not in `touched` back on the baseline branch and
/// delete the branch it was on.
pub fn reconcile_untouched(
    project: &Project,
    vcs: &dyn Vcs,
    touched: &[Repository],
) -> Vec<RepoOutcome<TeardownOutcome>> {
    project
        .repos
        .iter()
        .filter(|repo| !touched.iter().any(|t| t.path == repo.path))
        .map(|repo| {
            let outcome = match vcs.current_branch(&repo.path) {
                Ok(current) if current == BASELINE_BRANCH => {
                    TeardownOutcome::Skipped { branch: current }
                }
                Ok(current) => revert_to_baseline(vcs, &repo.path, &current),
                Err(e) => TeardownOutcome::Failed {
                    reason: e.to_string(),
                },
            };
            RepoOutcome {
                repo: repo.path.clone(),
                outcome,
            }
        })
        .collect()
}

fn revert_to_baseline(vcs: &dyn Vcs, repo: &Path, branch: &str) -> TeardownOutcome {
    let result = vcs
        .checkout(repo, BASELINE_BRANCH)
        .and_then(|()| vcs.delete_branch(repo, branch));
    match result {
        Ok(()) => TeardownOutcome::Removed {
            branch: branch.to_string(),
        },
        Err(e) => {
            tracing::warn!(repo = %repo.display(), "teardown: {e}");
            TeardownOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

fn delete_leftover(vcs: &dyn Vcs, repo: &Path, branch: &str) -> TeardownOutcome {
    let result = vcs.branch_exists(repo, branch).and_then(|exists| {
        if exists {
            vcs.delete_branch(repo, branch).map(|()| true)
        } else {
            Ok(false)
        }
    });
    match result {
        Ok(true) => TeardownOutcome::Removed {
            branch: branch.to_string(),
        },
        Ok(false) => TeardownOutcome::Skipped {
            branch: BASELINE_BRANCH.to_string(),
        },
        Err(e) => {
            tracing::warn!(repo = %repo.display(), "teardown: {e}");
            TeardownOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Stage everything, commit and push `branch`.
pub fn commit_and_push(vcs: &dyn Vcs, repo: &Path, branch: &str, message: &str) -> Result<()> {
    vcs.stage_all(repo)?;
    vcs.commit(repo, message)?;
    vcs.push(repo, branch)?;
    tracing::info!(repo = %repo.display(), %branch, "pushed");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
