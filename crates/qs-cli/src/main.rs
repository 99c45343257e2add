mod cmd;
mod output;
mod prompt;
mod select;

use clap::{Parser, Subcommand};
use cmd::{project::ProjectSubcommand, story::StorySubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "qs",
    about = "A simple CLI to aid in common, repetitive development tasks",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory holding config.json and projects.json (default: $QS_HOME, then ~/.qs)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Pick the Nth (1-based) project when the current directory belongs to several
    #[arg(long, global = true)]
    select: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Edit the configuration (prints it when no option is given)
    Config {
        /// Directory relative repository paths are resolved against
        #[arg(long)]
        base_dir: Option<PathBuf>,
        /// Token for the code hosting API
        #[arg(long)]
        token: Option<String>,
    },

    /// Sync all projects, or one, with their upstream
    Sync {
        /// Project name (omit to sync every project)
        project: Option<String>,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Start, push and complete stories
    Story {
        #[command(subcommand)]
        subcommand: StorySubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = select::app_dir(cli.home.as_deref()).and_then(|app_dir| {
        match cli.command {
            Commands::Config { base_dir, token } => {
                cmd::config::run(&app_dir, base_dir, token, cli.json)
            }
            Commands::Sync { project } => cmd::sync::run(&app_dir, project.as_deref(), cli.json),
            Commands::Project { subcommand } => cmd::project::run(&app_dir, subcommand, cli.json),
            Commands::Story { subcommand } => cmd::story::run(&app_dir, subcommand, cli.select, cli.json),
        }
    });

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
