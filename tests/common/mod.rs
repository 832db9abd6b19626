//! Common test utilities and fixtures for commitmark tests
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};

use commitmark::models::{AuthorAccount, CommitAuthor, CommitMeta, CommitTree};
use commitmark::{Commit, CommitDetail, Repository, StateDb};

/// A commit as the GitHub listing endpoint returns it
pub fn commit_json(sha: &str, date: &str, message: &str) -> Value {
    json!({
        "sha": sha,
        "commit": {
            "author": { "name": "Mona Lisa", "email": "mona@example.com", "date": date },
            "message": message,
            "tree": { "sha": format!("tree-{}", sha), "url": format!("https://example.com/trees/{}", sha) }
        },
        "author": { "login": "octocat" }
    })
}

/// A commit detail body: listing fields plus files and stats
pub fn commit_detail_json(sha: &str) -> Value {
    let mut value = commit_json(sha, "2024-03-01T12:00:00Z", "Fix the flux capacitor");
    value["files"] = json!([
        {
            "filename": "src/flux.rs",
            "additions": 3,
            "deletions": 1,
            "changes": 4,
            "status": "modified",
            "patch": "@@ -1 +1,3 @@\n-old\n+new"
        },
        {
            "filename": "assets/logo.png",
            "additions": 0,
            "deletions": 0,
            "changes": 0,
            "status": "added"
        }
    ]);
    value["stats"] = json!({ "total": 4, "additions": 3, "deletions": 1 });
    value
}

pub fn repo_json(id: u64, owner: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "full_name": format!("{}/{}", owner, name),
        "description": format!("The {} project", name)
    })
}

pub fn commit(sha: &str, date: &str) -> Commit {
    Commit {
        sha: sha.to_string(),
        commit: CommitMeta {
            author: CommitAuthor {
                name: "Mona Lisa".to_string(),
                email: Some("mona@example.com".to_string()),
                date: date.to_string(),
            },
            message: format!("Commit {}", sha),
            tree: CommitTree {
                sha: format!("tree-{}", sha),
                url: format!("https://example.com/trees/{}", sha),
            },
        },
        author: Some(AuthorAccount {
            login: "octocat".to_string(),
        }),
        favorited: false,
    }
}

pub fn repo(name: &str) -> Repository {
    Repository {
        id: Some(1),
        name: name.to_string(),
        full_name: format!("octocat/{}", name),
        description: None,
    }
}

pub fn detail(sha: &str) -> CommitDetail {
    serde_json::from_value(commit_detail_json(sha)).expect("fixture detail decodes")
}

pub fn memory_db() -> Arc<StateDb> {
    Arc::new(StateDb::open_in_memory().expect("in-memory state db"))
}
