//! Git remotes: the stored `{name, url, type}` triple, parsing of
//! `git remote -v` output, and owner/repo extraction from remote URLs.

use crate::error::{QsError, Result};
use crate::types::RemoteKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: RemoteKind,
}

/// Owner and repository name addressed by a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub owner: String,
    pub repo: String,
}

// ---------------------------------------------------------------------------
// URL parsing
// ---------------------------------------------------------------------------

static SCP_RE: OnceLock<Regex> = OnceLock::new();

fn scp_re() -> &'static Regex {
    SCP_RE.get_or_init(|| {
        Regex::new(r"^(?:[^@/:\s]+@)?[^@/:\s]+:([^/\s]+)/([^/\s]+?)(?:\.git)?/?$").unwrap()
    })
}

/// Parse an scp-style remote (`git@host:owner/repo.git`) into owner and repo.
///
/// URL-style remotes (`https://`, `ssh://`, `git://`) are rejected rather than
/// guessed at.
pub fn parse_remote_url(url: &str) -> Result<RemoteRef> {
    let url = url.trim();
    if url.contains("://") {
        return Err(QsError::UnsupportedRemoteFormat(url.to_string()));
    }
    let caps = scp_re()
        .captures(url)
        .ok_or_else(|| QsError::UnsupportedRemoteFormat(url.to_string()))?;
    Ok(RemoteRef {
        owner: caps[1].to_string(),
        repo: caps[2].to_string(),
    })
}

// ---------------------------------------------------------------------------
// `git remote -v`
// ---------------------------------------------------------------------------

/// Parse `git remote -v` output.
///
/// Each line has the form `<name>\t<url> (<fetch|push>)`. Blank lines are
/// ignored; anything else malformed is a query error.
pub fn parse_remote_list(raw: &str) -> Result<Vec<Remote>> {
    let mut remotes = Vec::new();
    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let malformed = || QsError::VcsQuery(format!("unexpected `git remote -v` line: {line}"));
        let (name, rest) = line.split_once(char::is_whitespace).ok_or_else(malformed)?;
        let rest = strip_filter(rest.trim());
        let (url, kind) = rest.rsplit_once(' ').ok_or_else(malformed)?;
        let kind = kind
            .strip_prefix('(')
            .and_then(|k| k.strip_suffix(')'))
            .ok_or_else(malformed)?;
        remotes.push(Remote {
            name: name.to_string(),
            url: url.trim().to_string(),
            kind: RemoteKind::from_str(kind)?,
        });
    }
    Ok(remotes)
}

/// Drop the ` [blob:none]`-style suffix git adds for partial clones.
fn strip_filter(rest: &str) -> &str {
    match rest.rsplit_once(" [") {
        Some((head, filter)) if filter.ends_with(']') => head.trim_end(),
        _ => rest,
    }
}

/// The first push-type remote, if any.
pub fn push_remote(remotes: &[Remote]) -> Option<&Remote> {
    remotes.iter().find(|r| r.kind == RemoteKind::Push)
}
