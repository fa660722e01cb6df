//! In-memory search, filter and sort over the record set.
//!
//! Pure functions: input slices are never mutated, results are fresh
//! vectors, and the three operations compose by sequential application.

use serde::{Deserialize, Serialize};

use crate::catalog::ProgramRecord;
use crate::classifier::Category;

/// Conjunctive filter; unset fields impose no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stars: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stars: Option<u32>,
}

/// Sort key for catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Star count, descending.
    #[default]
    Stars,
    /// Last upstream activity, newest first.
    Updated,
    /// Repository name, ascending.
    Name,
}

/// Case-insensitive substring search over name, description and topics.
/// An empty query returns the input unchanged.
pub fn search(records: &[ProgramRecord], query: &str) -> Vec<ProgramRecord> {
    if query.is_empty() {
        return records.to_vec();
    }
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&needle)
                || r.full_name.to_lowercase().contains(&needle)
                || r.description
                    .as_ref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || r.topics.iter().any(|t| t.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Apply the filter conjunctively.
pub fn filter(records: &[ProgramRecord], f: &RepoFilter) -> Vec<ProgramRecord> {
    records
        .iter()
        .filter(|r| {
            if let Some(category) = f.category {
                if r.category != category {
                    return false;
                }
            }
            if let Some(ref language) = f.language {
                match &r.language {
                    Some(l) if l.eq_ignore_ascii_case(language) => {}
                    _ => return false,
                }
            }
            if let Some(min) = f.min_stars {
                if r.stars < min {
                    return false;
                }
            }
            if let Some(max) = f.max_stars {
                if r.stars > max {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}

/// Stable sort by the given key, on a copy of the input.
pub fn sort_records(records: &[ProgramRecord], key: SortKey) -> Vec<ProgramRecord> {
    let mut sorted = records.to_vec();
    match key {
        SortKey::Stars => sorted.sort_by(|a, b| b.stars.cmp(&a.stars)),
        SortKey::Updated => sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        SortKey::Name => sorted.sort_by(|a, b| a.name.cmp(&b.name)),
    }
    sorted
}
