//! Ordering of a loaded commit page by author timestamp

use crate::models::Commit;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Direction of the commit ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recent author date first
    #[default]
    Newest,
    /// Oldest author date first
    Oldest,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            other => Err(format!("unknown sort order '{}' (expected newest or oldest)", other)),
        }
    }
}

/// Return a new vector of `commits` ordered by author timestamp.
///
/// The input is left untouched. The sort is stable, so commits with equal
/// timestamps keep their relative input order in both directions. Dates that
/// fail to parse compare as older than any valid date.
pub fn sort_commits(commits: &[Commit], order: SortOrder) -> Vec<Commit> {
    let mut keyed: Vec<_> = commits
        .iter()
        .map(|c| (c.commit.author.timestamp(), c))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| compare(a, b, order));

    keyed.into_iter().map(|(_, c)| c.clone()).collect()
}

fn compare<T: Ord>(a: &T, b: &T, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Oldest => a.cmp(b),
        SortOrder::Newest => b.cmp(a),
    }
}
