//! GitHub REST client

use async_trait::async_trait;
use gatekeeper_core::{CheckProvider, CheckRunPage, ProviderError, WorkflowRun};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const WORKFLOW_RUNS_PER_PAGE: u32 = 100;

/// GitHub API configuration
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API base URL, e.g. `https://api.github.com` or a GHES `/api/v3` root
    pub api_url: String,
    /// Token sent as `Authorization: Bearer` (optional for public repos)
    pub token: Option<String>,
    pub user_agent: String,
}

const USER_AGENT: &str = concat!("merge-gatekeeper/", env!("CARGO_PKG_VERSION"));

impl Default for GithubConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl GithubConfig {
    /// Create config from `GITHUB_API_URL` and `GITHUB_TOKEN`
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        GithubConfig {
            api_url: var("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token: var("GITHUB_TOKEN"),
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Create config for a specific API root, without a token
    pub fn new(api_url: &str) -> Self {
        GithubConfig {
            api_url: api_url.to_string(),
            token: None,
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Override the API root
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.to_string();
        self
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsPage {
    #[serde(default)]
    total_count: usize,
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

/// GitHub client implementing [`CheckProvider`].
pub struct GithubClient {
    config: GithubConfig,
    http_client: reqwest::Client,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(GithubClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::new(GithubConfig::from_env())
    }

    fn repo_url(&self, owner: &str, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            owner,
            repo
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let mut request = self
            .http_client
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "GitHub request failed");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CheckProvider for GithubClient {
    async fn list_check_runs(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        page: u32,
        per_page: u32,
    ) -> Result<CheckRunPage, ProviderError> {
        let url = format!(
            "{}/commits/{}/check-runs",
            self.repo_url(owner, repo),
            git_ref
        );
        debug!(%url, page, per_page, "listing check runs");
        self.get_json(
            &url,
            &[("page", page.to_string()), ("per_page", per_page.to_string())],
        )
        .await
    }

    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<Vec<WorkflowRun>, ProviderError> {
        let url = format!("{}/actions/runs", self.repo_url(owner, repo));
        let mut runs = Vec::new();
        let mut page = 1u32;
        loop {
            debug!(%url, page, "listing workflow runs");
            let result: WorkflowRunsPage = self
                .get_json(
                    &url,
                    &[
                        ("head_sha", git_ref.to_string()),
                        ("page", page.to_string()),
                        ("per_page", WORKFLOW_RUNS_PER_PAGE.to_string()),
                    ],
                )
                .await?;

            let fetched = result.workflow_runs.len();
            runs.extend(result.workflow_runs);
            if result.total_count <= runs.len() || fetched == 0 {
                break;
            }
            page += 1;
        }
        Ok(runs)
    }
}
