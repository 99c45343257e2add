use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use qs_core::{config::Config, discover, git::GitCli, registry::Registry, story};
use std::path::Path;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Register a project made of one or more git repositories
    Add {
        name: String,
        /// Repository directories, absolute or relative to base_dir
        #[arg(required = true)]
        repos: Vec<String>,
        /// Remote to sync from (default: upstream)
        #[arg(long)]
        upstream: Option<String>,
    },
    /// List projects, or show one
    List { name: Option<String> },
}

pub fn run(app_dir: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::Add {
            name,
            repos,
            upstream,
        } => add(app_dir, &name, &repos, upstream, json),
        ProjectSubcommand::List { name } => list(app_dir, name.as_deref(), json),
    }
}

fn add(
    app_dir: &Path,
    name: &str,
    dirs: &[String],
    upstream: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(app_dir).context("failed to load config")?;
    let mut registry = Registry::load(app_dir).context("failed to load projects")?;

    let (paths, rejected) = discover::git_repos(&config.base_dir, dirs)?;
    for path in &rejected {
        eprintln!("warning: {} is not a git repository", path.display());
    }

    let vcs = GitCli::locate()?;
    let repos = discover::describe_repos(&vcs, paths).context("failed to read remotes")?;
    let project = registry
        .create_project(name, repos, upstream)
        .with_context(|| format!("failed to create project '{name}'"))?
        .clone();
    registry.save(app_dir).context("failed to save projects")?;

    if json {
        print_json(&serde_json::json!({ "name": name, "project": project }))?;
    } else {
        println!(
            "Created project: {name} ({} repositories, upstream '{}')",
            project.repos.len(),
            project.upstream
        );
        for repo in &project.repos {
            println!("  {}", repo.path.display());
        }
    }
    Ok(())
}

fn list(app_dir: &Path, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let registry = Registry::load(app_dir).context("failed to load projects")?;

    if let Some(name) = name {
        let project = registry.project(name)?;
        if json {
            print_json(project)?;
            return Ok(());
        }
        println!("Project:  {name}");
        println!("Upstream: {}", project.upstream);
        println!("\nRepositories:");
        for repo in &project.repos {
            let remotes: Vec<String> = repo
                .remotes
                .iter()
                .map(|r| format!("{} ({})", r.name, r.kind))
                .collect();
            println!("  {}  {}", repo.path.display(), remotes.join(", "));
        }
        if !project.stories.is_empty() {
            println!("\nStories ({}):", project.stories.len());
            for s in &project.stories {
                println!("  [{}] {} {}", s.status, s.id, s.description);
            }
        }
        return Ok(());
    }

    if json {
        print_json(&registry)?;
        return Ok(());
    }

    if registry.projects.is_empty() {
        println!("No projects yet.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = registry
        .projects
        .iter()
        .map(|(name, project)| {
            let open = story::open_story(project)
                .map(|s| format!("{} {}", s.id, s.description))
                .unwrap_or_default();
            vec![
                name.clone(),
                project.repos.len().to_string(),
                project.upstream.clone(),
                open,
            ]
        })
        .collect();
    print_table(&["NAME", "REPOS", "UPSTREAM", "OPEN STORY"], rows);
    Ok(())
}
