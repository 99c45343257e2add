//! Map a working directory to the registered project it belongs to.

use crate::error::{QsError, Result};
use crate::registry::Registry;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    /// Several projects claim the directory; candidates are sorted by name.
    Ambiguous(Vec<String>),
}

/// Find the projects that own a repository containing `cwd`.
pub fn resolve(registry: &Registry, cwd: &Path) -> Result<Resolution> {
    let mut candidates: Vec<String> = registry
        .projects
        .iter()
        .filter(|(_, project)| project.repos.iter().any(|r| cwd.starts_with(&r.path)))
        .map(|(name, _)| name.clone())
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => Err(QsError::NoProjectForPath(cwd.display().to_string())),
        1 => Ok(Resolution::Found(candidates.remove(0))),
        _ => Ok(Resolution::Ambiguous(candidates)),
    }
}

/// Pick a candidate by one-based index.
pub fn select_candidate(candidates: &[String], index: usize) -> Result<String> {
    if index == 0 || index > candidates.len() {
        return Err(QsError::InvalidSelection {
            index,
            count: candidates.len(),
        });
    }
    Ok(candidates[index - 1].clone())
}
