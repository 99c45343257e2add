use crate::error::Result;
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root under which relative repository paths are resolved.
    #[serde(default = "default_base_dir", alias = "BASE_DIR")]
    pub base_dir: PathBuf,
    /// Bearer token for the code hosting API.
    #[serde(default, alias = "GITHUB_TOKEN")]
    pub remote_auth_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

fn default_base_dir() -> PathBuf {
    home::home_dir()
        .map(|h| h.join("Projects"))
        .unwrap_or_else(|| PathBuf::from("Projects"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            remote_auth_token: String::new(),
            api_base: None,
        }
    }
}

impl Config {
    /// Load the config, writing the defaults on first run.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let path = paths::config_path(app_dir);
        match io::read_if_exists(&path)? {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => {
                let config = Config::default();
                config.save(app_dir)?;
                tracing::debug!(path = %path.display(), "created default config");
                Ok(config)
            }
        }
    }

    pub fn save(&self, app_dir: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        io::atomic_write(&paths::config_path(app_dir), data.as_bytes())
    }

    /// Apply edits from the `config` command. `None` leaves a key unchanged.
    pub fn apply(&mut self, base_dir: Option<PathBuf>, token: Option<String>) {
        if let Some(dir) = base_dir {
            self.base_dir = dir;
        }
        if let Some(token) = token {
            self.remote_auth_token = token;
        }
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }

    pub fn has_token(&self) -> bool {
        !self.remote_auth_token.trim().is_empty()
    }

    /// The token with everything but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.remote_auth_token.chars().collect();
        if chars.is_empty() {
            return String::new();
        }
        let visible = chars.len().min(4);
        let tail: String = chars[chars.len() - visible..].iter().collect();
        format!("{}{tail}", "*".repeat(chars.len() - visible))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
