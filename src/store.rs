//! Commit Store - orchestrates remote reads, session state and favorites
//!
//! The store owns the loaded repositories, the current commit page, fetched
//! commit details and the favorites collection. Fetch actions never return
//! errors: callers inspect [`CommitStore::error`] and
//! [`CommitStore::is_loading`] after awaiting them.
//!
//! `loading` is a flag, not a lock. Overlapping fetches are allowed and the
//! last one to complete decides what remains in state.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::github::GitProvider;
use crate::models::{Commit, CommitDetail, FavoriteCommit, Repository};
use crate::pagination::Pagination;
use crate::sort::{sort_commits, SortOrder};
use crate::state::{load_typed, save_typed, DocumentStore, FAVORITES_KEY};

/// "Last used" query parameters, used as defaults by the fetch actions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub username: Option<String>,
    pub selected_repo: Option<String>,
    pub selected_commit: Option<String>,
    pub sort_order: SortOrder,
    pub pagination: Pagination,
}

impl Session {
    pub fn page(&self) -> u32 {
        self.pagination.page()
    }

    pub fn page_size(&self) -> u32 {
        self.pagination.page_size()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    repos: Vec<Repository>,
    commits: Vec<Commit>,
    favorites: Vec<FavoriteCommit>,
    commit_details: HashMap<String, CommitDetail>,
    error: Option<String>,
    loading: bool,
    session: Session,
}

/// The data synchronization store
pub struct CommitStore {
    provider: Arc<dyn GitProvider>,
    documents: Arc<dyn DocumentStore>,
    state: Mutex<StoreState>,
}

impl CommitStore {
    /// Create a store, loading persisted favorites from `documents`
    pub fn new(provider: Arc<dyn GitProvider>, documents: Arc<dyn DocumentStore>) -> Self {
        let favorites = Self::load_favorites(documents.as_ref());

        Self {
            provider,
            documents,
            state: Mutex::new(StoreState {
                favorites,
                ..StoreState::default()
            }),
        }
    }

    fn load_favorites(documents: &dyn DocumentStore) -> Vec<FavoriteCommit> {
        let loaded: Vec<FavoriteCommit> = match load_typed(documents, FAVORITES_KEY) {
            Ok(Some(favorites)) => favorites,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Ignoring unreadable favorites document: {:#}", e);
                Vec::new()
            }
        };

        // At most one favorite per sha, first one wins
        let mut seen = HashSet::new();
        let favorites: Vec<FavoriteCommit> = loaded
            .into_iter()
            .filter(|f| seen.insert(f.sha().to_string()))
            .collect();

        debug!("Loaded {} favorites", favorites.len());
        favorites
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        // State is only mutated in short non-panicking sections
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // Session setters
    // =========================================================================

    pub fn set_username(&self, username: impl Into<String>) {
        self.state().session.username = Some(username.into());
    }

    pub fn set_selected_repo(&self, repo: impl Into<String>) {
        self.state().session.selected_repo = Some(repo.into());
    }

    pub fn set_selected_commit(&self, sha: impl Into<String>) {
        self.state().session.selected_commit = Some(sha.into());
    }

    pub fn set_page(&self, page: u32) {
        self.state().session.pagination.set_page(page);
    }

    /// Change the commit page size; the page goes back to 1
    pub fn set_page_size(&self, page_size: u32) {
        self.state().session.pagination.set_page_size(page_size);
    }

    pub fn set_total(&self, total: Option<u64>) {
        self.state().session.pagination.set_total(total);
    }

    pub fn set_sort_order(&self, order: SortOrder) {
        self.state().session.sort_order = order;
    }

    pub fn next_page(&self) {
        self.state().session.pagination.next();
    }

    pub fn prev_page(&self) {
        self.state().session.pagination.prev();
    }

    pub fn has_next_page(&self) -> bool {
        self.state().session.pagination.has_next()
    }

    pub fn has_prev_page(&self) -> bool {
        self.state().session.pagination.has_prev()
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub fn session(&self) -> Session {
        self.state().session.clone()
    }

    pub fn repos(&self) -> Vec<Repository> {
        self.state().repos.clone()
    }

    pub fn commits(&self) -> Vec<Commit> {
        self.state().commits.clone()
    }

    pub fn commit_detail(&self, sha: &str) -> Option<CommitDetail> {
        self.state().commit_details.get(sha).cloned()
    }

    pub fn favorites(&self) -> Vec<FavoriteCommit> {
        self.state().favorites.clone()
    }

    pub fn is_favorite(&self, sha: &str) -> bool {
        self.state().favorites.iter().any(|f| f.sha() == sha)
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    // =========================================================================
    // Fetch actions
    // =========================================================================

    /// Load the repositories of `username`, or of the session username.
    ///
    /// The resolved username is written to the session only on success.
    pub async fn fetch_repos(&self, username: Option<&str>) {
        let username = {
            let mut state = self.state();
            state.loading = true;
            state.error = None;
            resolve(username, &state.session.username)
        };

        debug!("Fetching repositories for '{}'", username);
        let result = self.provider.fetch_repos(&username).await;

        let mut state = self.state();
        match result {
            Ok(repos) => {
                info!("Loaded {} repositories for {}", repos.len(), username);
                state.repos = repos;
                state.session.username = Some(username);
            }
            Err(e) => {
                warn!("Failed to fetch repositories for '{}': {}", username, e);
                state.error = Some(e.to_string());
                state.repos.clear();
            }
        }
        state.loading = false;
    }

    /// Load one page of commits.
    ///
    /// The resolved repository and page are written to the session before the
    /// request is sent, whatever its outcome.
    pub async fn fetch_commits(
        &self,
        username: Option<&str>,
        repo: Option<&str>,
        page: Option<u32>,
        per_page: Option<u32>,
    ) {
        let (username, repo, page, per_page) = {
            let mut state = self.state();
            state.loading = true;
            state.error = None;

            let username = resolve(username, &state.session.username);
            let repo = resolve(repo, &state.session.selected_repo);
            let page = page.unwrap_or_else(|| state.session.pagination.page());
            let per_page = per_page
                .unwrap_or_else(|| state.session.pagination.page_size())
                .max(1);

            state.session.selected_repo = Some(repo.clone());
            // Page size first, since changing it resets the page
            if per_page != state.session.pagination.page_size() {
                state.session.pagination.set_page_size(per_page);
            }
            state.session.pagination.set_page(page);
            (username, repo, state.session.pagination.page(), per_page)
        };

        debug!(
            "Fetching commits for {}/{} page {} ({} per page)",
            username, repo, page, per_page
        );
        let result = self
            .provider
            .fetch_commits(&username, &repo, page, per_page)
            .await;

        let mut state = self.state();
        match result {
            Ok(commits) => {
                info!(
                    "Loaded {} commits for {}/{} page {}",
                    commits.len(),
                    username,
                    repo,
                    page
                );
                // A short page marks the end of the listing
                let total = if commits.len() < per_page as usize {
                    Some(u64::from(page - 1) * u64::from(per_page) + commits.len() as u64)
                } else {
                    None
                };
                state.session.pagination.set_total(total);
                state.commits = commits;
                sync_favorited(&mut state);
            }
            Err(e) => {
                warn!("Failed to fetch commits for {}/{}: {}", username, repo, e);
                state.error = Some(e.to_string());
                state.commits.clear();
            }
        }
        state.loading = false;
    }

    /// Load the detail of one commit into the detail map.
    ///
    /// The resolved sha becomes the selected commit regardless of outcome. A
    /// failure leaves the detail map untouched.
    pub async fn fetch_commit_detail(
        &self,
        username: Option<&str>,
        repo: Option<&str>,
        sha: Option<&str>,
    ) {
        let (username, repo, sha) = {
            let mut state = self.state();
            state.loading = true;
            state.error = None;

            let username = resolve(username, &state.session.username);
            let repo = resolve(repo, &state.session.selected_repo);
            let sha = resolve(sha, &state.session.selected_commit);

            state.session.selected_commit = Some(sha.clone());
            (username, repo, sha)
        };

        debug!("Fetching commit {} of {}/{}", sha, username, repo);
        let result = self
            .provider
            .fetch_commit_detail(&username, &repo, &sha)
            .await;

        let mut state = self.state();
        match result {
            Ok(detail) => {
                info!(
                    "Loaded commit {} ({} files changed)",
                    sha,
                    detail.files.len()
                );
                state.commit_details.insert(sha, detail);
            }
            Err(e) => {
                warn!("Failed to fetch commit {}: {}", sha, e);
                state.error = Some(e.to_string());
            }
        }
        state.loading = false;
    }

    // =========================================================================
    // Derived views
    // =========================================================================

    /// The loaded page ordered by author date; `order` overrides the session order
    pub fn sorted_commits(&self, order: Option<SortOrder>) -> Vec<Commit> {
        let state = self.state();
        let order = order.unwrap_or(state.session.sort_order);
        sort_commits(&state.commits, order)
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Favorite `commit` under `repo_name`, or the selected repository.
    ///
    /// Returns `false` if a favorite with the same sha already exists.
    pub fn add_favorite(&self, commit: &Commit, repo_name: Option<&str>) -> bool {
        let mut state = self.state();
        let added = insert_favorite(&mut state, commit, repo_name);
        if added {
            self.persist_favorites(&state.favorites);
        }
        added
    }

    /// Remove the favorite with `sha`. Returns `false` if there was none.
    pub fn remove_favorite(&self, sha: &str) -> bool {
        let mut state = self.state();
        let removed = delete_favorite(&mut state, sha);
        if removed {
            self.persist_favorites(&state.favorites);
        }
        removed
    }

    /// Flip the favorite status of `commit` and return the new status.
    ///
    /// The flag is also written onto `commit` itself, so a reference the
    /// caller holds outside the loaded page reflects the change.
    pub fn toggle_favorite(&self, commit: &mut Commit) -> bool {
        let mut state = self.state();
        let favorited = if state.favorites.iter().any(|f| f.sha() == commit.sha) {
            delete_favorite(&mut state, &commit.sha);
            false
        } else {
            insert_favorite(&mut state, commit, None);
            true
        };
        self.persist_favorites(&state.favorites);

        commit.favorited = favorited;
        favorited
    }

    fn persist_favorites(&self, favorites: &[FavoriteCommit]) {
        if let Err(e) = save_typed(self.documents.as_ref(), FAVORITES_KEY, favorites) {
            warn!("Failed to persist favorites: {:#}", e);
        }
    }
}

/// Explicit argument, else session value, else empty
fn resolve(explicit: Option<&str>, session: &Option<String>) -> String {
    explicit
        .map(str::to_owned)
        .or_else(|| session.clone())
        .unwrap_or_default()
}

fn insert_favorite(state: &mut StoreState, commit: &Commit, repo_name: Option<&str>) -> bool {
    if state.favorites.iter().any(|f| f.sha() == commit.sha) {
        debug!("Commit {} is already a favorite", commit.sha);
        return false;
    }

    let repository = resolve(repo_name, &state.session.selected_repo);
    info!("Added favorite {} from '{}'", commit.sha, repository);
    state
        .favorites
        .push(FavoriteCommit::new(commit.clone(), repository));
    sync_favorited(state);
    true
}

fn delete_favorite(state: &mut StoreState, sha: &str) -> bool {
    let before = state.favorites.len();
    state.favorites.retain(|f| f.sha() != sha);
    let removed = state.favorites.len() != before;

    if removed {
        info!("Removed favorite {}", sha);
    }
    sync_favorited(state);
    removed
}

/// Recompute the `favorited` flag of every loaded commit from the favorites
fn sync_favorited(state: &mut StoreState) {
    let shas: HashSet<&str> = state.favorites.iter().map(|f| f.sha()).collect();
    for commit in &mut state.commits {
        commit.favorited = shas.contains(commit.sha.as_str());
    }
}
