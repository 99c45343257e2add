//! In-memory [`Vcs`] used by the workflow tests.

use crate::error::{QsError, Result};
use crate::git::Vcs;
use crate::remote::Remote;
use crate::types::BASELINE_BRANCH;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub(crate) struct FakeRepo {
    pub branch: String,
    pub branches: BTreeSet<String>,
    pub dirty: bool,
    pub remotes: Vec<Remote>,
    pub fail_pull: bool,
    pub fail_push: bool,
    pub unmerged: BTreeSet<String>,
    /// Commits per branch that are not on the baseline.
    pub ahead: BTreeMap<String, usize>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeVcs {
    repos: RefCell<BTreeMap<PathBuf, FakeRepo>>,
    calls: RefCell<Vec<String>>,
}

fn command_error(command: String, stderr: &str) -> QsError {
    QsError::VcsCommand {
        command,
        stderr: stderr.to_string(),
    }
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clean repository on `branch` (plus the baseline branch).
    pub fn add_repo(&self, path: &str, branch: &str) -> &Self {
        let mut branches = BTreeSet::new();
        branches.insert(BASELINE_BRANCH.to_string());
        branches.insert(branch.to_string());
        self.repos.borrow_mut().insert(
            PathBuf::from(path),
            FakeRepo {
                branch: branch.to_string(),
                branches,
                dirty: false,
                remotes: Vec::new(),
                fail_pull: false,
                fail_push: false,
                unmerged: BTreeSet::new(),
                ahead: BTreeMap::new(),
            },
        );
        self
    }

    pub fn update(&self, path: &str, f: impl FnOnce(&mut FakeRepo)) {
        let mut repos = self.repos.borrow_mut();
        let repo = repos.get_mut(Path::new(path)).expect("unknown fake repo");
        f(repo);
    }

    pub fn branch(&self, path: &str) -> String {
        self.repos.borrow()[Path::new(path)].branch.clone()
    }

    pub fn has_branch(&self, path: &str, branch: &str) -> bool {
        self.repos.borrow()[Path::new(path)].branches.contains(branch)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn with_repo<T>(&self, repo: &Path, f: impl FnOnce(&mut FakeRepo) -> Result<T>) -> Result<T> {
        let mut repos = self.repos.borrow_mut();
        let state = repos
            .get_mut(repo)
            .ok_or_else(|| QsError::VcsQuery(format!("{} is not a repository", repo.display())))?;
        f(state)
    }
}

impl Vcs for FakeVcs {
    fn current_branch(&self, repo: &Path) -> Result<String> {
        self.with_repo(repo, |r| Ok(r.branch.clone()))
    }

    fn is_clean(&self, repo: &Path) -> Result<bool> {
        self.with_repo(repo, |r| Ok(!r.dirty))
    }

    fn checkout(&self, repo: &Path, branch: &str) -> Result<()> {
        let call = format!("checkout {} {branch}", repo.display());
        self.record(call.clone());
        self.with_repo(repo, |r| {
            if !r.branches.contains(branch) {
                return Err(command_error(call, "pathspec did not match"));
            }
            r.branch = branch.to_string();
            Ok(())
        })
    }

    fn create_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        let call = format!("create {} {branch}", repo.display());
        self.record(call.clone());
        self.with_repo(repo, |r| {
            if !r.branches.insert(branch.to_string()) {
                return Err(command_error(call, "branch already exists"));
            }
            r.branch = branch.to_string();
            Ok(())
        })
    }

    fn branch_exists(&self, repo: &Path, branch: &str) -> Result<bool> {
        self.with_repo(repo, |r| Ok(r.branches.contains(branch)))
    }

    fn commits_ahead(&self, repo: &Path, _base: &str) -> Result<usize> {
        self.with_repo(repo, |r| Ok(r.ahead.get(&r.branch).copied().unwrap_or(0)))
    }

    fn delete_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        let call = format!("delete {} {branch}", repo.display());
        self.record(call.clone());
        self.with_repo(repo, |r| {
            if r.branch == branch {
                return Err(command_error(call, "cannot delete the checked out branch"));
            }
            if r.unmerged.contains(branch) {
                return Err(command_error(call, "branch is not fully merged"));
            }
            if !r.branches.remove(branch) {
                return Err(command_error(call, "branch not found"));
            }
            Ok(())
        })
    }

    fn stage_all(&self, repo: &Path) -> Result<()> {
        self.record(format!("add {}", repo.display()));
        self.with_repo(repo, |_| Ok(()))
    }

    fn commit(&self, repo: &Path, message: &str) -> Result<()> {
        let call = format!("commit {} {message}", repo.display());
        self.record(call.clone());
        self.with_repo(repo, |r| {
            if !r.dirty {
                return Err(command_error(call, "nothing to commit"));
            }
            r.dirty = false;
            if r.branch != BASELINE_BRANCH {
                *r.ahead.entry(r.branch.clone()).or_default() += 1;
                r.unmerged.insert(r.branch.clone());
            }
            Ok(())
        })
    }

    fn push(&self, repo: &Path, branch: &str) -> Result<()> {
        let call = format!("push {} {branch}", repo.display());
        self.record(call.clone());
        self.with_repo(repo, |r| {
            if r.fail_push {
                return Err(command_error(call, "permission denied"));
            }
            Ok(())
        })
    }

    fn pull(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        let call = format!("pull {} {remote} {branch}", repo.display());
        self.record(call.clone());
        self.with_repo(repo, |r| {
            if r.fail_pull {
                return Err(command_error(call, "merge conflict"));
            }
            Ok(())
        })
    }

    fn list_remotes(&self, repo: &Path) -> Result<Vec<Remote>> {
        self.with_repo(repo, |r| Ok(r.remotes.clone()))
    }
}
