use thiserror::Error;

#[derive(Debug, Error)]
pub enum QsError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error("project '{0}' has no repositories")]
    NoRepositories(String),

    #[error("no registered project contains {0}: run 'qs project add' first")]
    NoProjectForPath(String),

    #[error("selection {index} is out of range (1..={count})")]
    InvalidSelection { index: usize, count: usize },

    #[error("story {id} {description} is currently in progress for this project")]
    StoryAlreadyOpen { id: String, description: String },

    #[error("this project has no stories yet")]
    NoStories,

    #[error("story not found: {0}")]
    StoryNotFound(String),

    #[error("story already exists: {0}")]
    StoryExists(String),

    #[error("story {0} is not open")]
    StoryNotOpen(String),

    #[error("git query failed: {0}")]
    VcsQuery(String),

    #[error("`git {command}` failed: {stderr}")]
    VcsCommand { command: String, stderr: String },

    #[error("git executable not found on PATH")]
    GitNotFound,

    #[error("unsupported remote url '{0}': only host:owner/repo(.git) remotes are supported")]
    UnsupportedRemoteFormat(String),

    #[error("repository {0} has no push remote")]
    NoPushRemote(String),

    #[error("repository {repo} is on branch '{actual}', expected '{expected}'")]
    BranchMismatch {
        repo: String,
        expected: String,
        actual: String,
    },

    #[error("no remote auth token configured: run 'qs config --token <TOKEN>'")]
    MissingToken,

    #[error("code hosting API error: {0}")]
    RemoteApi(String),

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QsError>;
