use crate::output::{print_json, print_table};
use anyhow::Context;
use qs_core::{git::GitCli, registry::Registry, sync};
use std::path::Path;

/// `qs sync [PROJECT]`: pull the baseline branch into every repository that
/// is sitting on it.
pub fn run(app_dir: &Path, project: Option<&str>, json: bool) -> anyhow::Result<()> {
    let registry = Registry::load(app_dir).context("failed to load projects")?;
    let vcs = GitCli::locate()?;

    let names: Vec<String> = match project {
        Some(name) => {
            registry.project(name)?;
            vec![name.to_string()]
        }
        None => registry.projects.keys().cloned().collect(),
    };

    let mut results = Vec::new();
    for name in &names {
        let project = registry.project(name)?;
        if !json {
            println!("Syncing {name} from '{}'", project.upstream);
        }
        let outcomes = sync::sync_project(&vcs, project);
        results.push((name.clone(), outcomes));
    }

    if json {
        let value: serde_json::Map<String, serde_json::Value> = results
            .iter()
            .map(|(name, outcomes)| -> anyhow::Result<(String, serde_json::Value)> {
                Ok((name.clone(), serde_json::to_value(outcomes)?))
            })
            .collect::<anyhow::Result<_>>()?;
        print_json(&value)?;
        return Ok(());
    }

    if results.is_empty() {
        println!("No projects yet.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = results
        .iter()
        .flat_map(|(name, outcomes)| {
            outcomes.iter().map(move |o| {
                vec![
                    name.clone(),
                    o.repo.display().to_string(),
                    super::sync_status(&o.outcome),
                ]
            })
        })
        .collect();
    println!();
    print_table(&["PROJECT", "REPOSITORY", "RESULT"], rows);

    let failed = results
        .iter()
        .flat_map(|(_, o)| o.iter())
        .filter(|o| o.outcome.is_failure())
        .count();
    if failed > 0 {
        eprintln!("warning: {failed} repositories failed to sync");
    }
    Ok(())
}
