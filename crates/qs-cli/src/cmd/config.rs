use crate::output::print_json;
use anyhow::Context;
use qs_core::config::Config;
use std::path::{Path, PathBuf};

pub fn run(
    app_dir: &Path,
    base_dir: Option<PathBuf>,
    token: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load(app_dir).context("failed to load config")?;

    let editing = base_dir.is_some() || token.is_some();
    if editing {
        config.apply(base_dir, token);
        config.save(app_dir).context("failed to save config")?;
    }

    if json {
        print_json(&serde_json::json!({
            "base_dir": config.base_dir,
            "remote_auth_token": config.masked_token(),
            "api_base": config.api_base(),
        }))?;
        return Ok(());
    }

    if editing {
        println!("Config updated.");
    }
    println!("base_dir:          {}", config.base_dir.display());
    if config.has_token() {
        println!("remote_auth_token: {}", config.masked_token());
    } else {
        println!("remote_auth_token: (not set)");
    }
    Ok(())
}
