//! Data model for repositories, commits and favorites
//!
//! Field names follow the GitHub REST JSON shape so responses deserialize
//! directly. The `favorited` flag on [`Commit`] is local-only: it is never
//! sent by the API and never written to persisted documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository as listed by `GET /users/{username}/repos`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Author block of the git commit metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    /// ISO-8601 timestamp as reported by the API
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl CommitAuthor {
    /// Parse `date` into a UTC timestamp, `None` if it is not valid RFC 3339
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitTree {
    pub sha: String,
    pub url: String,
}

/// Nested `commit` object of a GitHub commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitMeta {
    pub author: CommitAuthor,
    pub message: String,
    pub tree: CommitTree,
}

/// The GitHub account linked to a commit, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorAccount {
    pub login: String,
}

/// A commit as listed by `GET /repos/{owner}/{repo}/commits`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitMeta,
    /// GitHub reports `null` when the author email has no linked account
    #[serde(default)]
    pub author: Option<AuthorAccount>,
    /// Local projection of "is this sha in the favorites collection"
    #[serde(default, skip_serializing)]
    pub favorited: bool,
}

impl Commit {
    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.commit.message.lines().next().unwrap_or_default()
    }

    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}

/// A file entry of a commit diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitFile {
    pub filename: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
    pub status: String,
    /// Absent for binary files and very large diffs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitStats {
    pub total: u64,
    pub additions: u64,
    pub deletions: u64,
}

/// A commit with its diff, as returned by `GET /repos/{owner}/{repo}/commits/{sha}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    #[serde(flatten)]
    pub commit: Commit,
    #[serde(default)]
    pub files: Vec<CommitFile>,
    #[serde(default)]
    pub stats: CommitStats,
}

impl CommitDetail {
    pub fn sha(&self) -> &str {
        &self.commit.sha
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRepository {
    pub name: String,
}

/// A snapshot of a commit taken when it was favorited, plus the repository it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteCommit {
    #[serde(flatten)]
    pub commit: Commit,
    pub repository: FavoriteRepository,
}

impl FavoriteCommit {
    pub fn new(commit: Commit, repository: impl Into<String>) -> Self {
        Self {
            commit,
            repository: FavoriteRepository {
                name: repository.into(),
            },
        }
    }

    pub fn sha(&self) -> &str {
        &self.commit.sha
    }
}
