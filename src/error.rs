//! Classified failures of the remote read operations

use serde::Deserialize;
use thiserror::Error;

/// The three remote reads, each with its own fallback messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Repos,
    Commits,
    CommitDetail,
}

impl Operation {
    /// Message used when the response body carries none of its own
    pub fn default_message(&self) -> &'static str {
        match self {
            Operation::Repos => "Failed to fetch repositories",
            Operation::Commits => "Failed to fetch commits",
            Operation::CommitDetail => "Failed to fetch commit details",
        }
    }

    /// Message reported for a 404 from this endpoint
    pub fn not_found_message(&self) -> &'static str {
        match self {
            Operation::Repos => "User not found",
            Operation::Commits => "Failed to fetch commits",
            Operation::CommitDetail => "Failed to fetch commit details",
        }
    }
}

/// Errors that a [`GitProvider`](crate::github::GitProvider) read can fail with.
///
/// `Display` yields exactly the human-readable message the store keeps in its
/// `error` field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// 404 from a listing endpoint
    #[error("{message}")]
    NotFound { message: String },

    /// 403 from any endpoint
    #[error("API rate limit exceeded")]
    RateLimited,

    /// Any other non-success status
    #[error("{message}")]
    NotFetchable { status: u16, message: String },

    /// The request itself failed (connectivity, DNS, timeout, undecodable body)
    #[error("{0}")]
    Transport(String),
}

impl FetchError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Pull the `message` field out of an API error body, if there is one
pub fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

/// Classify a non-success response of `op`
pub fn classify_status(op: Operation, status: u16, body: Option<&str>) -> FetchError {
    match status {
        403 => FetchError::RateLimited,
        404 => match op {
            Operation::Repos | Operation::Commits => FetchError::NotFound {
                message: op.not_found_message().to_string(),
            },
            Operation::CommitDetail => FetchError::NotFetchable {
                status,
                message: op.not_found_message().to_string(),
            },
        },
        _ => FetchError::NotFetchable {
            status,
            message: body
                .and_then(extract_message)
                .unwrap_or_else(|| op.default_message().to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_messages_per_operation() {
        assert_eq!(
            classify_status(Operation::Repos, 404, Some(r#"{"message":"Not Found"}"#)),
            FetchError::NotFound {
                message: "User not found".to_string()
            }
        );
        assert_eq!(
            classify_status(Operation::Commits, 404, Some("{}")).to_string(),
            "Failed to fetch commits"
        );

        let detail = classify_status(Operation::CommitDetail, 404, None);
        assert!(matches!(detail, FetchError::NotFetchable { status: 404, .. }));
        assert_eq!(detail.to_string(), "Failed to fetch commit details");
    }

    #[test]
    fn test_forbidden_is_rate_limited_everywhere() {
        for op in [Operation::Repos, Operation::Commits, Operation::CommitDetail] {
            let err = classify_status(op, 403, Some(r#"{"message":"something else"}"#));
            assert!(err.is_rate_limited());
            assert_eq!(err.to_string(), "API rate limit exceeded");
        }
    }

    #[test]
    fn test_other_status_prefers_body_message() {
        let err = classify_status(
            Operation::Commits,
            409,
            Some(r#"{"message":"Git Repository is empty."}"#),
        );
        assert_eq!(err.to_string(), "Git Repository is empty.");
    }

    #[test]
    fn test_other_status_falls_back_to_default() {
        assert_eq!(
            classify_status(Operation::Repos, 500, None).to_string(),
            "Failed to fetch repositories"
        );
        assert_eq!(
            classify_status(Operation::CommitDetail, 502, Some("<html>bad gateway</html>"))
                .to_string(),
            "Failed to fetch commit details"
        );
        assert_eq!(
            classify_status(Operation::Commits, 422, Some(r#"{"documentation_url":"x"}"#))
                .to_string(),
            "Failed to fetch commits"
        );
    }

    #[test]
    fn test_transport_keeps_underlying_message() {
        assert_eq!(FetchError::transport("Network error").to_string(), "Network error");
    }
}
