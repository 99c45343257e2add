use crate::prompt;
use anyhow::Context;
use qs_core::{
    paths,
    registry::Registry,
    resolver::{self, Resolution},
};
use std::path::{Path, PathBuf};

/// Resolve the application directory.
///
/// Priority:
/// 1. `--home` flag (passed in as `explicit`)
/// 2. `QS_HOME`, then `~/.qs`, via [`paths::app_dir`]
pub fn app_dir(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    paths::app_dir().context("failed to locate the qs directory")
}

/// Work out which project a command applies to.
///
/// An explicit `--project` wins. Otherwise the current directory is matched
/// against registered repositories; when several projects match, `--select`
/// or an interactive choice picks one.
pub fn resolve_project(
    registry: &Registry,
    explicit: Option<&str>,
    select: Option<usize>,
) -> anyhow::Result<String> {
    if let Some(name) = explicit {
        registry.project(name)?;
        return Ok(name.to_string());
    }

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    match resolver::resolve(registry, &cwd)? {
        Resolution::Found(name) => Ok(name),
        Resolution::Ambiguous(candidates) => {
            let index = match select {
                Some(i) => i,
                None => prompt::choose("This directory belongs to several projects:", &candidates)?,
            };
            Ok(resolver::select_candidate(&candidates, index)?)
        }
    }
}
