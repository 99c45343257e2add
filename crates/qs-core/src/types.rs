use serde::{Deserialize, Serialize};
use std::fmt;

/// The branch every repository rests on between stories.
pub const BASELINE_BRANCH: &str = "master";

/// Remote used to push story branches.
pub const PUSH_REMOTE: &str = "origin";

/// Default sync source for a new project.
pub const DEFAULT_UPSTREAM: &str = "upstream";

// ---------------------------------------------------------------------------
// StoryStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoryStatus {
    Open,
    Completed,
}

impl StoryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StoryStatus::Open => "OPEN",
            StoryStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RemoteKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteKind {
    Fetch,
    Push,
}

impl RemoteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteKind::Fetch => "fetch",
            RemoteKind::Push => "push",
        }
    }
}

impl fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RemoteKind {
    type Err = crate::error::QsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetch" => Ok(RemoteKind::Fetch),
            "push" => Ok(RemoteKind::Push),
            _ => Err(crate::error::QsError::VcsQuery(format!(
                "unknown remote type: {s}"
            ))),
        }
    }
}

/// Branch name for a story: `<id>_<description with spaces as underscores>`.
pub fn branch_name(id: &str, description: &str) -> String {
    let description = description.trim().replace(' ', "_");
    if description.is_empty() {
        id.to_string()
    } else {
        format!("{id}_{description}")
    }
}
