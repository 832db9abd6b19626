use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::env;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{classify_status, FetchError, Operation};
use crate::models::{Commit, CommitDetail, Repository};

/// The three remote reads the store depends on.
///
/// Implementations never retry; every failure is returned as a single
/// classified [`FetchError`].
#[async_trait]
pub trait GitProvider: Send + Sync {
    /// `GET /users/{username}/repos`
    async fn fetch_repos(&self, username: &str) -> Result<Vec<Repository>, FetchError>;

    /// `GET /repos/{username}/{repo}/commits?page={page}&per_page={per_page}`
    async fn fetch_commits(
        &self,
        username: &str,
        repo: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Commit>, FetchError>;

    /// `GET /repos/{username}/{repo}/commits/{sha}`
    async fn fetch_commit_detail(
        &self,
        username: &str,
        repo: &str,
        sha: &str,
    ) -> Result<CommitDetail, FetchError>;
}

/// GitHub authentication strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Token from the configuration file
    ConfigToken,
    /// Use environment variable token
    EnvironmentToken,
    /// Use GitHub CLI authentication
    GitHubCLI,
    /// No credentials; subject to the unauthenticated rate limit
    Anonymous,
}

/// GitHub REST client
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: Url,
    token: Option<String>,
    auth_strategy: AuthStrategy,
}

impl GitHubClient {
    /// Create a new GitHub client with automatic authentication
    pub fn new(config: &Config) -> Result<Self> {
        let (auth_strategy, token) = Self::detect_authentication(config)?;

        info!("Using authentication strategy: {:?}", auth_strategy);

        let mut client =
            Self::with_token(&config.github.api_base, token, config.request_timeout())?;
        client.auth_strategy = auth_strategy;
        Ok(client)
    }

    /// Create a client against `api_base` with an explicit token
    pub fn with_token(api_base: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let api_base = Url::parse(api_base.trim_end_matches('/'))
            .with_context(|| format!("Invalid GitHub API base URL: {}", api_base))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let http = reqwest::Client::builder()
            .user_agent(concat!("commitmark/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let auth_strategy = if token.is_some() {
            AuthStrategy::ConfigToken
        } else {
            AuthStrategy::Anonymous
        };

        Ok(Self {
            http,
            api_base,
            token,
            auth_strategy,
        })
    }

    /// Detect and obtain GitHub authentication
    pub fn detect_authentication(config: &Config) -> Result<(AuthStrategy, Option<String>)> {
        let config_token = config
            .github
            .token
            .clone()
            .filter(|t| !t.trim().is_empty());

        match config.github.auth_method.as_str() {
            "auto" => {
                // Config token, then environment, then GitHub CLI
                if let Some(token) = config_token {
                    Ok((AuthStrategy::ConfigToken, Some(token)))
                } else if let Ok(token) = Self::try_environment_token() {
                    Ok((AuthStrategy::EnvironmentToken, Some(token)))
                } else if let Ok(token) = Self::try_github_cli() {
                    Ok((AuthStrategy::GitHubCLI, Some(token)))
                } else {
                    debug!("No GitHub credentials found, continuing unauthenticated");
                    Ok((AuthStrategy::Anonymous, None))
                }
            }
            "token" => {
                if let Some(token) = config_token {
                    return Ok((AuthStrategy::ConfigToken, Some(token)));
                }
                let token = Self::try_environment_token()
                    .context("No github.token configured and GITHUB_TOKEN not set")?;
                Ok((AuthStrategy::EnvironmentToken, Some(token)))
            }
            "gh_cli" => {
                let token = Self::try_github_cli()
                    .context("GitHub CLI authentication failed. Run: gh auth login")?;
                Ok((AuthStrategy::GitHubCLI, Some(token)))
            }
            "none" => Ok((AuthStrategy::Anonymous, None)),
            other => Err(anyhow!("Unknown auth method: {}", other)),
        }
    }

    /// Try to get token from GitHub CLI
    fn try_github_cli() -> Result<String> {
        debug!("Attempting GitHub CLI authentication");

        if !Self::is_command_available("gh") {
            return Err(anyhow!("GitHub CLI (gh) is not installed"));
        }

        let token_output = Command::new("gh")
            .args(["auth", "token"])
            .output()
            .context("Failed to get GitHub CLI token")?;

        if !token_output.status.success() {
            return Err(anyhow!(
                "Failed to retrieve token from GitHub CLI: {}",
                String::from_utf8_lossy(&token_output.stderr)
            ));
        }

        let token = String::from_utf8(token_output.stdout)
            .context("GitHub CLI token is not valid UTF-8")?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(anyhow!("GitHub CLI returned empty token"));
        }

        debug!("Successfully obtained token from GitHub CLI");
        Ok(token)
    }

    /// Try to get token from environment variable
    fn try_environment_token() -> Result<String> {
        debug!("Attempting environment variable authentication");

        let token = env::var("GITHUB_TOKEN").context("GITHUB_TOKEN environment variable not set")?;

        if token.is_empty() {
            return Err(anyhow!("GITHUB_TOKEN is empty"));
        }

        if !token.starts_with("ghp_")
            && !token.starts_with("gho_")
            && !token.starts_with("ghs_")
            && !token.starts_with("github_pat_")
        {
            warn!("GITHUB_TOKEN doesn't look like a GitHub token (expected ghp_, gho_, ghs_ or github_pat_ prefix)");
        }

        Ok(token)
    }

    /// Check if a command is available in PATH
    fn is_command_available(command: &str) -> bool {
        Command::new("which")
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    pub fn auth_strategy(&self) -> AuthStrategy {
        self.auth_strategy
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_str().trim_end_matches('/')
    }

    /// Build `{api_base}/{segments...}` with each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::transport(format!("Invalid API base: {}", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issue one GET and decode the body, classifying any failure
    async fn get_json<T: DeserializeOwned>(&self, op: Operation, url: Url) -> Result<T, FetchError> {
        debug!("GET {}", url);

        let mut request = self.http.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            FetchError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok();
            let err = classify_status(op, status.as_u16(), body.as_deref());
            warn!("GET {} returned {}: {}", url, status, err);
            return Err(err);
        }

        response.json::<T>().await.map_err(|e| {
            warn!("Failed to decode response from {}: {}", url, e);
            FetchError::from(e)
        })
    }
}

#[async_trait]
impl GitProvider for GitHubClient {
    async fn fetch_repos(&self, username: &str) -> Result<Vec<Repository>, FetchError> {
        let url = self.endpoint(&["users", username, "repos"])?;
        let repos: Vec<Repository> = self.get_json(Operation::Repos, url).await?;

        debug!("Fetched {} repositories for {}", repos.len(), username);
        Ok(repos)
    }

    async fn fetch_commits(
        &self,
        username: &str,
        repo: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Commit>, FetchError> {
        let mut url = self.endpoint(&["repos", username, repo, "commits"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());

        let commits: Vec<Commit> = self.get_json(Operation::Commits, url).await?;

        debug!(
            "Fetched {} commits for {}/{} page {}",
            commits.len(),
            username,
            repo,
            page
        );
        Ok(commits)
    }

    async fn fetch_commit_detail(
        &self,
        username: &str,
        repo: &str,
        sha: &str,
    ) -> Result<CommitDetail, FetchError> {
        let url = self.endpoint(&["repos", username, repo, "commits", sha])?;
        self.get_json(Operation::CommitDetail, url).await
    }
}
