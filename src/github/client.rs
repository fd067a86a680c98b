//! HTTP client for the GitHub REST API.
//!
//! Configuration is via environment variables:
//! - `GITHUB_API_URL` - Base URL (default: `https://api.github.com`)
//! - `INPUT_GITHUB-TOKEN` / `GITHUB_TOKEN` - Token used for authentication

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use super::{CreateLabelInput, ItemSource, LabelSource, Repository};
use crate::models::{Item, ItemKind, Label, LinkedItem};

/// Default URL for github.com.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Page size for list endpoints.
const PER_PAGE: usize = 100;

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: token missing or invalid")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl ClientError {
    /// Whether the error only says the resource is already in the desired state.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}

// ============================================================
// Wire Types
// ============================================================

#[derive(Debug, Deserialize)]
struct GhLabel {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GhIssue {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    user: Option<GhUser>,
    #[serde(default)]
    labels: Vec<GhLabel>,
    /// Present only when the issue is a pull request.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl GhIssue {
    fn kind(&self) -> ItemKind {
        if self.pull_request.is_some() {
            ItemKind::PullRequest
        } else {
            ItemKind::Issue
        }
    }
}

#[derive(Debug, Deserialize)]
struct GhPullFile {
    filename: String,
    /// Omitted by GitHub for binary or very large diffs.
    #[serde(default)]
    patch: Option<String>,
}

// ============================================================
// Client
// ============================================================

/// HTTP client for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl GitHubClient {
    /// Create client from environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url =
            std::env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let token = std::env::var("INPUT_GITHUB-TOKEN")
            .or_else(|_| std::env::var("GITHUB_TOKEN"))
            .ok();
        Self::new(base_url, token)
    }

    /// Create with explicit configuration.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("ai-labeler"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    /// Build a request with optional auth header.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    /// Convert a non-success status into a ClientError.
    async fn error_for(response: reqwest::Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(body),
            StatusCode::BAD_REQUEST => ClientError::BadRequest(body),
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(body),
            StatusCode::UNPROCESSABLE_ENTITY if body.contains("already_exists") => {
                ClientError::AlreadyExists(body)
            }
            StatusCode::UNPROCESSABLE_ENTITY => ClientError::Unprocessable(body),
            _ => ClientError::Server(format!("{}: {}", status, body)),
        }
    }

    /// Handle response, converting HTTP errors to ClientError.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::error_for(response).await)
        }
    }

    /// Handle response whose body is not needed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ClientError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_for(response).await)
        }
    }

    /// Fetch every page of a list endpoint.
    async fn get_all_pages<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let response = self
                .request(reqwest::Method::GET, path)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await?;
            let batch: Vec<T> = self.handle_response(response).await?;
            let done = batch.len() < PER_PAGE;
            all.extend(batch);
            if done {
                return Ok(all);
            }
            page += 1;
        }
    }

    async fn get_issue(&self, repo: &Repository, number: u64) -> Result<GhIssue, ClientError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/repos/{}/issues/{}", repo, number),
            )
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Changed files of a pull request, mapped to their patches.
    pub async fn get_pull_files(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<BTreeMap<String, String>, ClientError> {
        let files: Vec<GhPullFile> = self
            .get_all_pages(&format!("/repos/{}/pulls/{}/files", repo, number))
            .await?;
        Ok(files
            .into_iter()
            .map(|f| (f.filename, f.patch.unwrap_or_default()))
            .collect())
    }
}

#[async_trait]
impl ItemSource for GitHubClient {
    async fn fetch_item(&self, repo: &Repository, number: u64) -> Result<Item, ClientError> {
        let issue = self.get_issue(repo, number).await?;
        // The issues endpoint serves pull requests too; only the marker differs
        let kind = issue.kind();
        let author = issue.user.map(|u| u.login).unwrap_or_default();
        let body = issue.body.unwrap_or_default();

        if kind == ItemKind::PullRequest {
            let files = self.get_pull_files(repo, number).await?;
            Ok(Item::PullRequest {
                number: issue.number,
                title: issue.title,
                body,
                files,
                author,
                linked_items: Vec::new(),
            })
        } else {
            Ok(Item::Issue {
                number: issue.number,
                title: issue.title,
                body,
                author,
                linked_items: Vec::new(),
            })
        }
    }

    async fn fetch_linked_item(
        &self,
        repo: &Repository,
        number: u64,
    ) -> Result<LinkedItem, ClientError> {
        let issue = self.get_issue(repo, number).await?;
        let kind = issue.kind();
        Ok(LinkedItem {
            number: issue.number,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            kind,
        })
    }
}

#[async_trait]
impl LabelSource for GitHubClient {
    async fn list_labels(&self, repo: &Repository) -> Result<Vec<Label>, ClientError> {
        let labels: Vec<GhLabel> = self
            .get_all_pages(&format!("/repos/{}/labels", repo))
            .await?;
        Ok(labels
            .into_iter()
            .map(|l| Label {
                name: l.name,
                description: l.description.filter(|d| !d.is_empty()),
                instructions: None,
            })
            .collect())
    }

    async fn create_label(
        &self,
        repo: &Repository,
        input: &CreateLabelInput,
    ) -> Result<(), ClientError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/repos/{}/labels", repo))
            .json(input)
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    async fn add_labels(
        &self,
        repo: &Repository,
        number: u64,
        names: &[String],
    ) -> Result<(), ClientError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/repos/{}/issues/{}/labels", repo, number),
            )
            .json(&serde_json::json!({ "labels": names }))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }
}
