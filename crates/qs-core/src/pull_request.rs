//! Open one pull request per repository for a story, at most once.

use crate::error::{QsError, Result};
use crate::git::Vcs;
use crate::github::{PullRequest, PullRequestHost};
use crate::registry::{Repository, Story};
use crate::remote;
use crate::types::BASELINE_BRANCH;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrOutcome {
    Created { url: String },
    /// A pull request was already opened for this repository and story.
    AlreadyCreated,
}

/// Title, body, head and base for a story's pull request.
pub fn build_request(story: &Story, username: &str, branch: &str) -> PullRequest {
    PullRequest {
        title: format!("id:{} {}", story.id, story.description),
        body: String::new(),
        head: format!("{username}:{branch}"),
        base: BASELINE_BRANCH.to_string(),
    }
}

/// Open a pull request for `repo` and record it on `story`.
///
/// On error nothing is recorded, so the call can be retried.
pub fn open_pull_request(
    host: &dyn PullRequestHost,
    vcs: &dyn Vcs,
    repo: &Repository,
    story: &mut Story,
) -> Result<PrOutcome> {
    if story.has_pull_request(&repo.path) {
        return Ok(PrOutcome::AlreadyCreated);
    }

    let branch = story.branch();
    let current = vcs.current_branch(&repo.path)?;
    if current != branch {
        return Err(QsError::BranchMismatch {
            repo: repo.path.display().to_string(),
            expected: branch,
            actual: current,
        });
    }

    let push = remote::push_remote(&repo.remotes)
        .ok_or_else(|| QsError::NoPushRemote(repo.path.display().to_string()))?;
    let target = remote::parse_remote_url(&push.url)?;
    let username = host.username()?;

    let request = build_request(story, &username, &branch);
    let created = host.create_pull_request(&target.owner, &target.repo, &request)?;
    tracing::info!(
        repo = %repo.path.display(),
        number = created.number,
        "pull request opened"
    );

    story.record_pull_request(&repo.path, Some(created.html_url.clone()));
    Ok(PrOutcome::Created {
        url: created.html_url,
    })
}
