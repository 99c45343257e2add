use crate::error::{QsError, Result};
use crate::remote::Remote;
use crate::types::{self, StoryStatus, DEFAULT_UPSTREAM};
use crate::{io, paths};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub path: PathBuf,
    #[serde(default)]
    pub remotes: Vec<Remote>,
}

impl Repository {
    pub fn new(path: impl Into<PathBuf>, remotes: Vec<Remote>) -> Self {
        Self {
            path: path.into(),
            remotes,
        }
    }

    pub fn name(&self) -> String {
        paths::repo_name(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Story
// ---------------------------------------------------------------------------

/// A pull request opened for one repository of a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub repo: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub description: String,
    pub status: StoryStatus,
    #[serde(default)]
    pub pr_created: bool,
    /// Repositories whose story branch has been committed and pushed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pushed: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pull_requests: Vec<PullRequestRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Story {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: StoryStatus::Open,
            pr_created: false,
            pushed: Vec::new(),
            pull_requests: Vec::new(),
            created_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    pub fn branch(&self) -> String {
        types::branch_name(&self.id, &self.description)
    }

    pub fn is_open(&self) -> bool {
        self.status == StoryStatus::Open
    }

    pub fn has_pull_request(&self, repo: &Path) -> bool {
        self.pull_requests.iter().any(|pr| pr.repo == repo)
    }

    pub fn record_pull_request(&mut self, repo: &Path, url: Option<String>) {
        if !self.has_pull_request(repo) {
            self.pull_requests.push(PullRequestRecord {
                repo: repo.to_path_buf(),
                url,
            });
        }
        self.pr_created = true;
    }

    pub fn record_push(&mut self, repo: &Path) {
        if !self.pushed.iter().any(|p| p == repo) {
            self.pushed.push(repo.to_path_buf());
        }
    }

    pub fn complete(&mut self) {
        self.status = StoryStatus::Completed;
        self.completed_at = Some(Utc::now());
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub repos: Vec<Repository>,
    #[serde(default = "default_upstream")]
    pub upstream: String,
    #[serde(default)]
    pub stories: Vec<Story>,
}

fn default_upstream() -> String {
    DEFAULT_UPSTREAM.to_string()
}

impl Project {
    pub fn new(repos: Vec<Repository>, upstream: Option<String>) -> Self {
        Self {
            repos,
            upstream: upstream.unwrap_or_else(default_upstream),
            stories: Vec::new(),
        }
    }

    pub fn story(&self, id: &str) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == id)
    }

    pub fn story_mut(&mut self, id: &str) -> Option<&mut Story> {
        self.stories.iter_mut().find(|s| s.id == id)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Every known project, keyed by name. The only persisted state besides the
/// config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    pub projects: BTreeMap<String, Project>,
}

impl Registry {
    /// Load the registry. A missing file is an empty registry.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let path = paths::registry_path(app_dir);
        match io::read_if_exists(&path)? {
            Some(data) if !data.trim().is_empty() => Ok(serde_json::from_str(&data)?),
            _ => Ok(Registry::default()),
        }
    }

    pub fn save(&self, app_dir: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        io::atomic_write(&paths::registry_path(app_dir), data.as_bytes())
    }

    pub fn project(&self, name: &str) -> Result<&Project> {
        self.projects
            .get(name)
            .ok_or_else(|| QsError::ProjectNotFound(name.to_string()))
    }

    pub fn project_mut(&mut self, name: &str) -> Result<&mut Project> {
        self.projects
            .get_mut(name)
            .ok_or_else(|| QsError::ProjectNotFound(name.to_string()))
    }

    /// Register a new project. Fails without mutating if the name is taken
    /// or no repositories were given.
    pub fn create_project(
        &mut self,
        name: &str,
        repos: Vec<Repository>,
        upstream: Option<String>,
    ) -> Result<&Project> {
        if self.projects.contains_key(name) {
            return Err(QsError::ProjectExists(name.to_string()));
        }
        if repos.is_empty() {
            return Err(QsError::NoRepositories(name.to_string()));
        }
        self.projects
            .insert(name.to_string(), Project::new(repos, upstream));
        self.project(name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
