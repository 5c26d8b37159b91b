// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Fork naming and description policy.
//!
//! Development forks are public forks tagged with the `dev-fork` topic. Each
//! one must be named `<parent_owner>--<parent_name>--dev-fork`, and its
//! description must carry the `[DEV-FORK]` tag so the fork is recognizable
//! from listings without opening it. This module finds every tagged fork of
//! the authenticated user through the GitHub REST API and edits the ones
//! that drifted from policy.
//!
//! The API is consumed as an opaque, already-authenticated service: search
//! owned repositories, fetch one repository, patch name or description.
//! Search results omit the `parent` record, so every hit is re-fetched
//! before the policy check.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Topic tag that marks a repository as a development fork.
pub const DEV_FORK_TOPIC: &str = "dev-fork";

/// Description tag every development fork must carry.
pub const DEV_FORK_DESC_TAG: &str = "[DEV-FORK]";

/// Environment variable holding the API token.
pub const TOKEN_VAR: &str = "GH_TOKEN";

/// Environment variable overriding the API base URL.
pub const API_URL_VAR: &str = "GITHUB_API_URL";

const DEFAULT_API_URL: &str = "https://api.github.com";
const SEARCH_PAGE_SIZE: usize = 100;

/// One page of repository search results.
#[derive(Debug, Deserialize)]
struct SearchPage {
    items: Vec<SearchHit>,
}

/// Search result entry. Only the full name matters; everything else is
/// re-fetched.
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub full_name: String,
}

/// Repository record as returned by `GET /repos/{full_name}`.
#[derive(Debug, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub parent: Option<Box<RepoRef>>,
}

/// Reduced repository reference inside a `parent` record.
#[derive(Debug, Deserialize)]
pub struct RepoRef {
    pub name: String,
    pub owner: Owner,
}

/// Repository owner reference.
#[derive(Debug, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Fields of a repository edit. Unset fields are left untouched server-side.
#[derive(Debug, Default, Serialize)]
struct RepoEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Name a development fork must have.
pub fn expected_fork_name(parent_owner: &str, parent_name: &str) -> String {
    format!("{parent_owner}--{parent_name}--{DEV_FORK_TOPIC}")
}

/// Description a development fork must have, preserving any existing text.
pub fn tagged_description(current: Option<&str>) -> String {
    match current {
        None | Some("") => DEV_FORK_DESC_TAG.to_string(),
        Some(description) => format!("{DEV_FORK_DESC_TAG} {description}"),
    }
}

/// Thin client over the GitHub REST API.
#[derive(Debug)]
pub struct GithubClient {
    http: reqwest::Client,
    base: String,
}

impl GithubClient {
    /// Construct new client from the process environment.
    ///
    /// Takes the token out of `GH_TOKEN`, scrubs the variable from the
    /// environment, and masks the value in GitHub Actions logs. The API base
    /// URL comes from `GITHUB_API_URL` when set.
    ///
    /// # Errors
    ///
    /// - Return [`ForksError::MissingToken`] if `GH_TOKEN` is unset.
    /// - Return [`ForksError::Client`] if the HTTP client cannot be built
    ///   from the token.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_VAR).map_err(|_| ForksError::MissingToken)?;
        std::env::remove_var(TOKEN_VAR);
        println!("::add-mask::{token}");

        let base = std::env::var(API_URL_VAR).unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Self::new(&token, base)
    }

    /// Construct new client from an explicit token and base URL.
    pub fn new(token: &str, base: impl Into<String>) -> Result<Self> {
        use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};

        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| ForksError::MalformedToken)?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("repokeep"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(ForksError::Client)?;

        Ok(Self {
            http,
            base: base.into(),
        })
    }

    /// Search every public fork of the authenticated user carrying a topic.
    pub async fn search_forks(&self, topic: &str) -> Result<Vec<SearchHit>> {
        let query = format!("user:@me is:public fork:true topic:{topic}");
        let per_page = SEARCH_PAGE_SIZE.to_string();
        let mut hits = Vec::new();
        let mut page = 1usize;

        loop {
            let page_number = page.to_string();
            let response = self
                .http
                .get(format!("{}/search/repositories", self.base))
                .query(&[
                    ("q", query.as_str()),
                    ("per_page", per_page.as_str()),
                    ("page", page_number.as_str()),
                ])
                .send()
                .await
                .map_err(ForksError::Http)?;
            let body: SearchPage = read_json(response).await?;

            if body.items.is_empty() {
                break;
            }
            hits.extend(body.items);
            page += 1;
        }

        Ok(hits)
    }

    /// Fetch one repository record.
    pub async fn repository(&self, full_name: &str) -> Result<Repository> {
        let response = self
            .http
            .get(format!("{}/repos/{full_name}", self.base))
            .send()
            .await
            .map_err(ForksError::Http)?;
        read_json(response).await
    }

    /// Patch a repository's name.
    pub async fn rename(&self, full_name: &str, name: impl Into<String>) -> Result<Repository> {
        self.edit(
            full_name,
            &RepoEdit {
                name: Some(name.into()),
                ..RepoEdit::default()
            },
        )
        .await
    }

    /// Patch a repository's description.
    pub async fn describe(
        &self,
        full_name: &str,
        description: impl Into<String>,
    ) -> Result<Repository> {
        self.edit(
            full_name,
            &RepoEdit {
                description: Some(description.into()),
                ..RepoEdit::default()
            },
        )
        .await
    }

    async fn edit(&self, full_name: &str, edit: &RepoEdit) -> Result<Repository> {
        let response = self
            .http
            .patch(format!("{}/repos/{full_name}", self.base))
            .json(edit)
            .send()
            .await
            .map_err(ForksError::Http)?;
        read_json(response).await
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ForksError::Api { status, body });
    }

    response.json().await.map_err(ForksError::Http)
}

/// Aggregate result of one policy enforcement run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnforceOutcome {
    /// Repositories checked against policy.
    pub processed: usize,

    /// Repositories that could not be checked or edited.
    pub failed: usize,
}

impl EnforceOutcome {
    /// Whether every tagged fork was checked.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Enforce naming and description policy on every tagged fork.
///
/// Per-repository failures are logged and counted without stopping the
/// sweep, mirroring the per-link isolation of the repair driver.
///
/// # Errors
///
/// - Return [`ForksError::Http`] or [`ForksError::Api`] if the initial
///   search itself fails.
#[instrument(skip(client), level = "debug")]
pub async fn enforce(client: &GithubClient, topic: &str) -> Result<EnforceOutcome> {
    let hits = client.search_forks(topic).await?;
    info!("found {} tagged fork(s)", hits.len());

    let mut outcome = EnforceOutcome::default();
    for hit in hits {
        match process_repository(client, &hit.full_name).await {
            Ok(()) => outcome.processed += 1,
            Err(err) => {
                warn!("skipping '{}': {err}", hit.full_name);
                outcome.failed += 1;
            }
        }
    }

    Ok(outcome)
}

/// Bring one repository in line with fork policy.
async fn process_repository(client: &GithubClient, full_name: &str) -> Result<()> {
    let repo = client.repository(full_name).await?;
    let parent = repo.parent.as_deref().ok_or_else(|| ForksError::OrphanFork {
        full_name: repo.full_name.clone(),
    })?;

    let expected = expected_fork_name(&parent.owner.login, &parent.name);
    let mut full_name = repo.full_name.clone();

    if repo.name != expected {
        warn!("changing name of repo '{}' to '{expected}'", repo.name);
        client.rename(&full_name, &expected).await?;
        // Later edits must address the repository by its new name.
        let owner = full_name.split('/').next().unwrap_or_default().to_string();
        full_name = format!("{owner}/{expected}");
        info!("done");
    }

    let tagged = repo
        .description
        .as_deref()
        .is_some_and(|description| description.contains(DEV_FORK_DESC_TAG));
    if !tagged {
        let description = tagged_description(repo.description.as_deref());
        warn!(
            "changing description of repo '{expected}' from '{:?}' to '{description}'",
            repo.description
        );
        client.describe(&full_name, description).await?;
        info!("done");
    }

    info!("processed repo: '{expected}'");

    Ok(())
}

/// Fork policy error types.
#[derive(Debug, thiserror::Error)]
pub enum ForksError {
    /// API token environment variable is unset.
    #[error("{TOKEN_VAR} environment variable is not set")]
    MissingToken,

    /// API token cannot be used as an authorization header.
    #[error("{TOKEN_VAR} holds a value unusable as an authorization header")]
    MalformedToken,

    /// HTTP client cannot be constructed.
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    /// Transport-level request failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("API request failed with status {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Tagged repository has no reachable parent to derive a name from.
    #[error("fork '{full_name}' has no reachable parent repository")]
    OrphanFork { full_name: String },
}

/// Friendly result alias :3
pub type Result<T, E = ForksError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn composes_expected_fork_name() {
        let result = expected_fork_name("rust-lang", "cargo");
        assert_eq!(result, "rust-lang--cargo--dev-fork");
    }

    #[test]
    fn tags_empty_description() {
        assert_eq!(tagged_description(None), "[DEV-FORK]");
        assert_eq!(tagged_description(Some("")), "[DEV-FORK]");
    }

    #[test]
    fn tags_existing_description_by_prepending() {
        let result = tagged_description(Some("My experiments."));
        assert_eq!(result, "[DEV-FORK] My experiments.");
    }

    #[test]
    fn deserializes_repository_with_parent() -> anyhow::Result<()> {
        let data = indoc! {r#"
            {
                "name": "rust-lang--cargo--dev-fork",
                "full_name": "someone/rust-lang--cargo--dev-fork",
                "description": "[DEV-FORK] Package manager fork.",
                "parent": {
                    "name": "cargo",
                    "owner": { "login": "rust-lang" }
                }
            }
        "#};

        let repo: Repository = serde_json::from_str(data)?;

        let parent = repo.parent.as_deref().unwrap();
        assert_eq!(repo.name, "rust-lang--cargo--dev-fork");
        assert_eq!(parent.owner.login, "rust-lang");
        assert_eq!(parent.name, "cargo");

        Ok(())
    }

    #[test]
    fn deserializes_repository_without_parent_or_description() -> anyhow::Result<()> {
        let data = r#"{ "name": "solo", "full_name": "someone/solo" }"#;

        let repo: Repository = serde_json::from_str(data)?;

        assert!(repo.parent.is_none());
        assert!(repo.description.is_none());

        Ok(())
    }

    #[test]
    fn serializes_partial_repo_edit() -> anyhow::Result<()> {
        let edit = RepoEdit {
            name: Some("new-name".into()),
            ..RepoEdit::default()
        };

        let result = serde_json::to_string(&edit)?;

        assert_eq!(result, r#"{"name":"new-name"}"#);

        Ok(())
    }
}
