//! Application context
//!
//! One [`AppContext`] is built per process and passed by reference to
//! whatever drives the stores (the CLI here).

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::github::{GitHubClient, GitProvider};
use crate::state::{DocumentStore, StateDb};
use crate::store::CommitStore;
use crate::ui::SelectionStore;
use crate::Config;

pub struct AppContext {
    pub config: Config,
    pub store: CommitStore,
    pub selections: SelectionStore,
}

impl AppContext {
    /// Build the GitHub client and open the state database named by `config`
    pub fn new(config: Config) -> Result<Self> {
        let provider = Arc::new(GitHubClient::new(&config)?);
        let documents = Arc::new(StateDb::open_at(config.state_db_path())?);
        Ok(Self::with_parts(config, provider, documents))
    }

    /// Assemble a context from an existing provider and document store
    pub fn with_parts(
        config: Config,
        provider: Arc<dyn GitProvider>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        let store = CommitStore::new(provider, documents.clone());
        store.set_page_size(config.github.per_page);
        if let Some(username) = &config.github.username {
            debug!("Default username from config: {}", username);
            store.set_username(username.clone());
        }

        let selections = SelectionStore::new(documents);

        Self {
            config,
            store,
            selections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_with_parts_seeds_session_from_config() {
        let mut config = Config::default();
        config.github.username = Some("octocat".to_string());
        config.github.per_page = 30;

        let provider = Arc::new(
            GitHubClient::with_token("http://127.0.0.1:9", None, Duration::from_secs(1)).unwrap(),
        );
        let documents = Arc::new(StateDb::open_in_memory().unwrap());

        let ctx = AppContext::with_parts(config, provider, documents);
        let session = ctx.store.session();

        assert_eq!(session.username.as_deref(), Some("octocat"));
        assert_eq!(session.page_size(), 30);
        assert_eq!(session.page(), 1);
        assert!(ctx.selections.all().is_empty());
    }
}
