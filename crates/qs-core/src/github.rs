//! Minimal blocking client for the GitHub REST API: authenticated user lookup
//! and pull request creation.

use crate::config::Config;
use crate::error::{QsError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

/// Body of `POST /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPullRequest {
    pub number: u64,
    pub html_url: String,
}

/// The code hosting service pull requests are opened on.
pub trait PullRequestHost {
    /// Login of the authenticated user.
    fn username(&self) -> Result<String>;

    fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        request: &PullRequest,
    ) -> Result<CreatedPullRequest>;
}

// ---------------------------------------------------------------------------
// GitHubClient
// ---------------------------------------------------------------------------

pub struct GitHubClient {
    client: Client,
    api_base: String,
    username: RefCell<Option<String>>,
}

#[derive(Deserialize)]
struct User {
    login: String,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

impl GitHubClient {
    pub fn new(api_base: &str, token: &str) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(QsError::MissingToken);
        }
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|e| QsError::RemoteApi(format!("invalid token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .user_agent(concat!("qs/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| QsError::RemoteApi(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            username: RefCell::new(None),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_base(), &config.remote_auth_token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

/// Turn a non-2xx response into `RemoteApi`, preferring GitHub's `message`.
fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().unwrap_or_default();
    let detail = serde_json::from_str::<ApiError>(&text)
        .map(|e| e.message)
        .unwrap_or(text);
    Err(QsError::RemoteApi(format!("{status}: {detail}")))
}

impl PullRequestHost for GitHubClient {
    fn username(&self) -> Result<String> {
        if let Some(name) = self.username.borrow().as_ref() {
            return Ok(name.clone());
        }
        let response = self
            .client
            .get(self.url("/user"))
            .send()
            .map_err(|e| QsError::RemoteApi(e.to_string()))?;
        let user: User = check(response)?
            .json()
            .map_err(|e| QsError::RemoteApi(e.to_string()))?;
        *self.username.borrow_mut() = Some(user.login.clone());
        Ok(user.login)
    }

    fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        request: &PullRequest,
    ) -> Result<CreatedPullRequest> {
        let response = self
            .client
            .post(self.url(&format!("/repos/{owner}/{repo}/pulls")))
            .json(request)
            .send()
            .map_err(|e| QsError::RemoteApi(e.to_string()))?;
        check(response)?
            .json()
            .map_err(|e| QsError::RemoteApi(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn request() -> PullRequest {
        PullRequest {
            title: "id:42 add button".into(),
            body: String::new(),
            head: "dev:42_add_button".into(),
            base: "master".into(),
        }
    }

    #[test]
    fn missing_token_rejected() {
        assert!(matches!(
            GitHubClient::new("http://localhost", "  "),
            Err(QsError::MissingToken)
        ));
    }

    #[test]
    fn username_is_fetched_once() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/user")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"login": "dev", "id": 1}"#)
            .expect(1)
            .create();

        let client = GitHubClient::new(&server.url(), "tok").unwrap();
        assert_eq!(client.username().unwrap(), "dev");
        assert_eq!(client.username().unwrap(), "dev");
        mock.assert();
    }

    #[test]
    fn creates_pull_request() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/repos/acme/widgets/pulls")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::Json(serde_json::json!({
                "title": "id:42 add button",
                "body": "",
                "head": "dev:42_add_button",
                "base": "master",
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"number": 7, "html_url": "https://github.com/acme/widgets/pull/7"}"#)
            .create();

        let client = GitHubClient::new(&server.url(), "tok").unwrap();
        let created = client
            .create_pull_request("acme", "widgets", &request())
            .unwrap();
        assert_eq!(created.number, 7);
        assert_eq!(created.html_url, "https://github.com/acme/widgets/pull/7");
        mock.assert();
    }

    #[test]
    fn api_error_message_is_surfaced() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/repos/acme/widgets/pulls")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "Validation Failed"}"#)
            .create();

        let client = GitHubClient::new(&server.url(), "tok").unwrap();
        let err = client
            .create_pull_request("acme", "widgets", &request())
            .unwrap_err();
        match err {
            QsError::RemoteApi(msg) => assert!(msg.contains("Validation Failed"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
