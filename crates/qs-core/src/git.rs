//! Git shell-out for a single working copy.
//!
//! Every operation takes the repository path explicitly and runs `git` with
//! that path as the child's working directory. The process-wide cwd is never
//! touched.

use crate::error::{QsError, Result};
use crate::remote::{self, Remote};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Version-control capabilities the story and sync workflows need.
pub trait Vcs {
    /// Name of the checked-out branch. Fails when `repo` is not a repository
    /// or HEAD is detached.
    fn current_branch(&self, repo: &Path) -> Result<String>;

    /// True when the working copy has no staged, unstaged or untracked changes.
    fn is_clean(&self, repo: &Path) -> Result<bool>;

    fn checkout(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Create `branch` from the current HEAD and check it out.
    fn create_branch(&self, repo: &Path, branch: &str) -> Result<()>;

    fn branch_exists(&self, repo: &Path, branch: &str) -> Result<bool>;

    /// Number of commits on HEAD that are not on `base`.
    fn commits_ahead(&self, repo: &Path, base: &str) -> Result<usize>;

    /// Delete a fully merged local branch.
    fn delete_branch(&self, repo: &Path, branch: &str) -> Result<()>;

    fn stage_all(&self, repo: &Path) -> Result<()>;

    fn commit(&self, repo: &Path, message: &str) -> Result<()>;

    /// Push `branch` to the push remote.
    fn push(&self, repo: &Path, branch: &str) -> Result<()>;

    fn pull(&self, repo: &Path, remote: &str, branch: &str) -> Result<()>;

    fn list_remotes(&self, repo: &Path) -> Result<Vec<Remote>>;
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

/// [`Vcs`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    bin: PathBuf,
}

impl GitCli {
    /// Locate `git` on PATH.
    pub fn locate() -> Result<Self> {
        let bin = which::which("git").map_err(|_| QsError::GitNotFound)?;
        Ok(Self { bin })
    }

    pub fn with_binary(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    fn command(&self, repo: &Path, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.args(args)
            .current_dir(repo)
            // Never block on a credential prompt in the middle of a batch.
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        cmd
    }

    /// Run a mutating command; non-zero exit becomes `VcsCommand`.
    fn run(&self, repo: &Path, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        tracing::debug!(repo = %repo.display(), "git {command}");
        let output = self
            .command(repo, args)
            .output()
            .map_err(|e| QsError::VcsCommand {
                command: command.clone(),
                stderr: e.to_string(),
            })?;
        if !output.status.success() {
            return Err(QsError::VcsCommand {
                command,
                stderr: failure_text(&output),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run a read-only query; any failure becomes `VcsQuery`.
    fn query(&self, repo: &Path, args: &[&str]) -> Result<String> {
        self.run(repo, args).map_err(|e| match e {
            QsError::VcsCommand { command, stderr } => {
                QsError::VcsQuery(format!("{}: `git {command}`: {stderr}", repo.display()))
            }
            other => other,
        })
    }
}

fn failure_text(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stdout
    }
}

impl Vcs for GitCli {
    fn current_branch(&self, repo: &Path) -> Result<String> {
        if !repo.is_dir() {
            return Err(QsError::VcsQuery(format!(
                "{} is not a directory",
                repo.display()
            )));
        }
        // symbolic-ref also works on an unborn branch and fails on a detached HEAD.
        let out = self.query(repo, &["symbolic-ref", "--short", "HEAD"])?;
        let branch = out.trim();
        if branch.is_empty() {
            return Err(QsError::VcsQuery(format!(
                "{}: empty branch name",
                repo.display()
            )));
        }
        Ok(branch.to_string())
    }

    fn is_clean(&self, repo: &Path) -> Result<bool> {
        let out = self.query(repo, &["status", "--porcelain"])?;
        Ok(out.trim().is_empty())
    }

    fn checkout(&self, repo: &Path, branch: &str) -> Result<()> {
        self.run(repo, &["checkout", branch]).map(drop)
    }

    fn create_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        self.run(repo, &["checkout", "-b", branch]).map(drop)
    }

    fn branch_exists(&self, repo: &Path, branch: &str) -> Result<bool> {
        let out = self.query(repo, &["branch", "--list", branch])?;
        Ok(!out.trim().is_empty())
    }

    fn commits_ahead(&self, repo: &Path, base: &str) -> Result<usize> {
        let range = format!("{base}..HEAD");
        let out = self.query(repo, &["rev-list", "--count", range.as_str()])?;
        out.trim().parse().map_err(|_| {
            QsError::VcsQuery(format!(
                "{}: unexpected rev-list output: {}",
                repo.display(),
                out.trim()
            ))
        })
    }

    fn delete_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        self.run(repo, &["branch", "-d", branch]).map(drop)
    }

    fn stage_all(&self, repo: &Path) -> Result<()> {
        self.run(repo, &["add", "--all"]).map(drop)
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<()> {
        self.run(repo, &["commit", "-m", message]).map(drop)
    }

    fn push(&self, repo: &Path, branch: &str) -> Result<()> {
        self.run(repo, &["push", crate::types::PUSH_REMOTE, branch])
            .map(drop)
    }

    fn pull(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        self.run(repo, &["pull", remote, branch]).map(drop)
    }

    fn list_remotes(&self, repo: &Path) -> Result<Vec<Remote>> {
        let out = self.query(repo, &["remote", "-v"])?;
        remote::parse_remote_list(&out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A fresh repository on `master` with one commit, or `None` when git is
    /// not installed in the test environment.
    fn init_repo() -> Option<(GitCli, TempDir)> {
        let git = GitCli::locate().ok()?;
        let dir = TempDir::new().unwrap();
        let p = dir.path();
        git.run(p, &["init", "-q"]).unwrap();
        git.run(p, &["symbolic-ref", "HEAD", "refs/heads/master"]).unwrap();
        git.run(p, &["config", "user.email", "dev@example.com"]).unwrap();
        git.run(p, &["config", "user.name", "Dev"]).unwrap();
        git.run(p, &["config", "commit.gpgsign", "false"]).unwrap();
        std::fs::write(p.join("README.md"), "hello\n").unwrap();
        git.stage_all(p).unwrap();
        git.commit(p, "initial").unwrap();
        Some((git, dir))
    }

    #[test]
    fn branch_lifecycle() {
        let Some((git, dir)) = init_repo() else { return };
        let p = dir.path();
        assert_eq!(git.current_branch(p).unwrap(), "master");

        git.create_branch(p, "42_add_button").unwrap();
        assert_eq!(git.current_branch(p).unwrap(), "42_add_button");

        git.checkout(p, "master").unwrap();
        assert!(git.branch_exists(p, "42_add_button").unwrap());
        git.delete_branch(p, "42_add_button").unwrap();
        assert!(!git.branch_exists(p, "42_add_button").unwrap());
        assert!(git.checkout(p, "42_add_button").is_err());
    }

    #[test]
    fn commits_ahead_of_baseline() {
        let Some((git, dir)) = init_repo() else { return };
        let p = dir.path();
        git.create_branch(p, "42_add_button").unwrap();
        assert_eq!(git.commits_ahead(p, "master").unwrap(), 0);

        std::fs::write(p.join("button.rs"), "fn button() {}\n").unwrap();
        git.stage_all(p).unwrap();
        git.commit(p, "add button").unwrap();
        assert_eq!(git.commits_ahead(p, "master").unwrap(), 1);
    }

    #[test]
    fn create_existing_branch_is_command_error() {
        let Some((git, dir)) = init_repo() else { return };
        git.create_branch(dir.path(), "dup").unwrap();
        git.checkout(dir.path(), "master").unwrap();
        assert!(matches!(
            git.create_branch(dir.path(), "dup"),
            Err(QsError::VcsCommand { .. })
        ));
    }

    #[test]
    fn dirty_detection() {
        let Some((git, dir)) = init_repo() else { return };
        assert!(git.is_clean(dir.path()).unwrap());
        std::fs::write(dir.path().join("README.md"), "changed\n").unwrap();
        assert!(!git.is_clean(dir.path()).unwrap());
    }

    #[test]
    fn commit_after_stage_leaves_clean_tree() {
        let Some((git, dir)) = init_repo() else { return };
        std::fs::write(dir.path().join("new.txt"), "x\n").unwrap();
        git.stage_all(dir.path()).unwrap();
        git.commit(dir.path(), "add new").unwrap();
        assert!(git.is_clean(dir.path()).unwrap());
    }

    #[test]
    fn remotes_are_listed() {
        let Some((git, dir)) = init_repo() else { return };
        git.run(
            dir.path(),
            &["remote", "add", "origin", "git@github.com:me/widgets.git"],
        )
        .unwrap();
        let remotes = git.list_remotes(dir.path()).unwrap();
        assert_eq!(remotes.len(), 2);
        assert!(remotes.iter().all(|r| r.name == "origin"));
    }

    #[test]
    fn non_repository_is_query_error() {
        let Some(git) = GitCli::locate().ok() else { return };
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            git.current_branch(dir.path()),
            Err(QsError::VcsQuery(_))
        ));
    }

    #[test]
    fn missing_directory_is_query_error() {
        let git = GitCli::with_binary("git");
        assert!(matches!(
            git.current_branch(Path::new("/definitely/not/here")),
            Err(QsError::VcsQuery(_))
        ));
    }
}
