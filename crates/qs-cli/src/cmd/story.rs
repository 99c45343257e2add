use crate::output::{print_json, print_table};
use crate::{prompt, select};
use anyhow::Context;
use clap::Subcommand;
use qs_core::{
    config::Config,
    git::{GitCli, Vcs},
    github::GitHubClient,
    pull_request::{self, PrOutcome},
    registry::{Registry, Repository},
    story,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum StorySubcommand {
    /// Start a story: sync every repository and create the story branch
    New {
        id: String,
        /// Free-text description; also names the branch
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
        #[arg(long)]
        project: Option<String>,
        /// Branch repositories that are not on the baseline branch without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// List a project's stories
    List {
        #[arg(long)]
        project: Option<String>,
    },
    /// Commit and push changed repositories and open pull requests
    Push {
        #[arg(long)]
        project: Option<String>,
        /// Commit message for every repository (prompted per repository otherwise)
        #[arg(long, short = 'm')]
        message: Option<String>,
        /// Commit and push only
        #[arg(long)]
        no_pr: bool,
    },
    /// Complete a story: sync, mark it completed and delete its branches
    Complete {
        id: String,
        #[arg(long)]
        project: Option<String>,
    },
}

pub fn run(
    app_dir: &Path,
    subcmd: StorySubcommand,
    select: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        StorySubcommand::New {
            id,
            description,
            project,
            yes,
        } => new(app_dir, &id, &description.join(" "), project.as_deref(), select, yes, json),
        StorySubcommand::List { project } => list(app_dir, project.as_deref(), select, json),
        StorySubcommand::Push {
            project,
            message,
            no_pr,
        } => push(app_dir, project.as_deref(), select, message.as_deref(), no_pr, json),
        StorySubcommand::Complete { id, project } => {
            complete(app_dir, &id, project.as_deref(), select, json)
        }
    }
}

// ---------------------------------------------------------------------------
// new
// ---------------------------------------------------------------------------

fn new(
    app_dir: &Path,
    id: &str,
    description: &str,
    project: Option<&str>,
    select: Option<usize>,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut registry = Registry::load(app_dir).context("failed to load projects")?;
    let name = select::resolve_project(&registry, project, select)?;
    let vcs = GitCli::locate()?;

    let mut confirm = |question: &str| prompt::confirm(question, yes);
    let report = story::start_story(
        registry.project_mut(&name)?,
        &vcs,
        &mut confirm,
        id,
        description,
    )?;
    registry.save(app_dir).context("failed to save projects")?;

    if json {
        print_json(&report)?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = report
        .repos
        .iter()
        .map(|r| {
            vec![
                r.repo.display().to_string(),
                super::sync_status(&r.sync),
                super::branch_status(&r.branch),
            ]
        })
        .collect();
    print_table(&["REPOSITORY", "SYNC", "BRANCH"], rows);
    println!("\nStarted story {id} on branch {} in {name}", report.branch);
    Ok(())
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(
    app_dir: &Path,
    project: Option<&str>,
    select: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let registry = Registry::load(app_dir).context("failed to load projects")?;
    let name = select::resolve_project(&registry, project, select)?;
    let project = registry.project(&name)?;

    if json {
        print_json(&project.stories)?;
        return Ok(());
    }

    if project.stories.is_empty() {
        println!("No stories yet in {name}.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = project
        .stories
        .iter()
        .map(|s| {
            vec![
                s.id.clone(),
                s.status.to_string(),
                s.branch(),
                if s.pr_created {
                    s.pull_requests.len().to_string()
                } else {
                    "-".to_string()
                },
                s.description.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "STATUS", "BRANCH", "PRS", "DESCRIPTION"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// push
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PushRow {
    repo: PathBuf,
    commit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pull_request: Option<String>,
}

enum CommitStep {
    /// New commit made and pushed.
    Pushed,
    /// No changes; the existing story branch was pushed again.
    Repushed,
    /// No changes and not on the story branch.
    Clean,
}

fn push(
    app_dir: &Path,
    project: Option<&str>,
    select: Option<usize>,
    message: Option<&str>,
    no_pr: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(app_dir).context("failed to load config")?;
    let mut registry = Registry::load(app_dir).context("failed to load projects")?;
    let name = select::resolve_project(&registry, project, select)?;
    let vcs = GitCli::locate()?;

    let project = registry.project(&name)?;
    let open = story::open_story(project)
        .cloned()
        .with_context(|| format!("no open story for project '{name}'"))?;
    let branch = open.branch();

    let touched = story::touched_repos(project, &vcs, &open);
    if touched.is_empty() {
        if json {
            print_json(&serde_json::json!({ "story": open.id, "repos": [] }))?;
        } else {
            println!("Nothing to push for story {} {}", open.id, open.description);
        }
        return Ok(());
    }

    let host = if no_pr {
        None
    } else {
        Some(GitHubClient::from_config(&config).context("cannot open pull requests")?)
    };

    let reconciled = story::reconcile_untouched(project, &vcs, &touched);

    let mut rows = Vec::with_capacity(touched.len());
    for repo in &touched {
        let commit = match commit_step(&vcs, repo, &branch, message) {
            Ok(step @ (CommitStep::Pushed | CommitStep::Repushed)) => {
                if let Some(s) = story::open_story_mut(registry.project_mut(&name)?) {
                    s.record_push(&repo.path);
                }
                registry.save(app_dir).context("failed to save projects")?;
                match step {
                    CommitStep::Pushed => "pushed".to_string(),
                    _ => "nothing to commit, pushed".to_string(),
                }
            }
            Ok(CommitStep::Clean) => "nothing to commit".to_string(),
            Err(e) => {
                rows.push(PushRow {
                    repo: repo.path.clone(),
                    commit: format!("failed: {e:#}"),
                    pull_request: None,
                });
                continue;
            }
        };

        let pull_request = match &host {
            Some(host) => {
                let s = story::open_story_mut(registry.project_mut(&name)?)
                    .context("open story disappeared")?;
                Some(match pull_request::open_pull_request(host, &vcs, repo, s) {
                    Ok(PrOutcome::Created { url }) => {
                        registry.save(app_dir).context("failed to save projects")?;
                        url
                    }
                    Ok(PrOutcome::AlreadyCreated) => "already open".to_string(),
                    Err(e) => format!("failed: {e}"),
                })
            }
            None => None,
        };

        rows.push(PushRow {
            repo: repo.path.clone(),
            commit,
            pull_request,
        });
    }

    if json {
        print_json(&serde_json::json!({
            "story": open.id,
            "branch": branch,
            "reverted": reconciled,
            "repos": rows,
        }))?;
        return Ok(());
    }

    for r in &reconciled {
        println!(
            "{}: {}",
            r.repo.display(),
            super::teardown_status(&r.outcome)
        );
    }
    let table: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.repo.display().to_string(),
                r.commit.clone(),
                r.pull_request.clone().unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print_table(&["REPOSITORY", "COMMIT", "PULL REQUEST"], table);
    Ok(())
}

/// Commit pending changes, then push the story branch. A clean repository on
/// the story branch is still pushed so a failed earlier push is retried.
fn commit_step(
    vcs: &GitCli,
    repo: &Repository,
    branch: &str,
    message: Option<&str>,
) -> anyhow::Result<CommitStep> {
    let clean = vcs.is_clean(&repo.path)?;
    let current = vcs.current_branch(&repo.path)?;
    if current != branch {
        if clean {
            return Ok(CommitStep::Clean);
        }
        anyhow::bail!("on branch '{current}', not '{branch}'");
    }
    if clean {
        vcs.push(&repo.path, branch)?;
        return Ok(CommitStep::Repushed);
    }
    let message = match message {
        Some(m) => m.to_string(),
        None => prompt::ask(&format!("Commit message for {}:", repo.name()))?,
    };
    story::commit_and_push(vcs, &repo.path, branch, &message)?;
    Ok(CommitStep::Pushed)
}

// ---------------------------------------------------------------------------
// complete
// ---------------------------------------------------------------------------

fn complete(
    app_dir: &Path,
    id: &str,
    project: Option<&str>,
    select: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let mut registry = Registry::load(app_dir).context("failed to load projects")?;
    let name = select::resolve_project(&registry, project, select)?;
    let vcs = GitCli::locate()?;

    let completion = story::complete_story(registry.project_mut(&name)?, &vcs, id)
        .with_context(|| format!("cannot complete story '{id}'"))?;
    registry.save(app_dir).context("failed to save projects")?;

    let teardown = story::teardown_story_branch(registry.project(&name)?, &vcs, &completion.branch);

    if json {
        print_json(&serde_json::json!({
            "story": completion.story,
            "branch": completion.branch,
            "sync": completion.sync,
            "teardown": teardown,
        }))?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = completion
        .sync
        .iter()
        .zip(&teardown)
        .map(|(s, t)| {
            vec![
                s.repo.display().to_string(),
                super::sync_status(&s.outcome),
                super::teardown_status(&t.outcome),
            ]
        })
        .collect();
    print_table(&["REPOSITORY", "SYNC", "BRANCH"], rows);
    println!("\nCompleted story {id} in {name}");

    let failed = teardown.iter().filter(|t| t.outcome.is_failure()).count();
    if failed > 0 {
        eprintln!("warning: {failed} repositories still have branch {}", completion.branch);
    }
    Ok(())
}
