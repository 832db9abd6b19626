//! commitmark - GitHub commit browsing with durable favorites
//!
//! commitmark lists a GitHub account's repositories, pages through a
//! repository's commit history, fetches per-commit diff detail, and keeps a
//! cross-repository list of favorite commits that survives restarts.
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`github`]: Remote provider trait and the GitHub REST client
//! - [`error`]: Classified fetch failures
//! - [`models`]: Repository, commit, detail and favorite records
//! - [`pagination`]: Page tracking
//! - [`sort`]: Commit ordering
//! - [`state`]: SQLite-backed document persistence
//! - [`store`]: The commit store (fetch actions, session state, favorites)
//! - [`ui`]: Persisted UI selection scratchpad
//! - [`context`]: Per-application context wiring the above together

pub mod config;
pub mod context;
pub mod error;
pub mod github;
pub mod models;
pub mod pagination;
pub mod sort;
pub mod state;
pub mod store;
pub mod ui;

pub use config::Config;
pub use context::AppContext;
pub use error::FetchError;
pub use github::{GitHubClient, GitProvider};
pub use models::{Commit, CommitDetail, FavoriteCommit, Repository};
pub use pagination::Pagination;
pub use sort::SortOrder;
pub use state::{DocumentStore, StateDb};
pub use store::{CommitStore, Session};
pub use ui::SelectionStore;
