//! Mock repository search backend.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collector::{CollectError, RepoSource, SourcePage, SourceRepo};

/// Scripted [`RepoSource`]: responses are queued per query and popped in
/// order. A query with nothing queued returns an empty final page.
#[derive(Default)]
pub struct MockRepoSource {
    responses: Mutex<HashMap<String, VecDeque<Result<SourcePage, CollectError>>>>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl MockRepoSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful page for a query.
    pub fn push_page(&self, query: &str, repos: Vec<SourceRepo>, has_next: bool) {
        self.responses
            .lock()
            .unwrap()
            .entry(query.to_string())
            .or_default()
            .push_back(Ok(SourcePage { repos, has_next }));
    }

    /// Queue a failure for a query.
    pub fn fail_with(&self, query: &str, error: CollectError) {
        self.responses
            .lock()
            .unwrap()
            .entry(query.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// Every (query, page) pair requested so far.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RepoSource for MockRepoSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search_page(&self, query: &str, page: u32) -> Result<SourcePage, CollectError> {
        self.calls.lock().unwrap().push((query.to_string(), page));

        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(query)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(result) => result,
            None => Ok(SourcePage {
                repos: Vec::new(),
                has_next: false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(full_name: &str) -> SourceRepo {
        let (owner, name) = full_name.split_once('/').unwrap();
        SourceRepo {
            full_name: full_name.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
            url: format!("https://github.com/{}", full_name),
            description: None,
            stars: 1,
            language: None,
            topics: Vec::new(),
            updated_at: None,
            default_branch: None,
        }
    }

    #[tokio::test]
    async fn test_pages_pop_in_order() {
        let source = MockRepoSource::new();
        source.push_page("q", vec![raw("a/one")], true);
        source.push_page("q", vec![raw("b/two")], false);

        let first = source.search_page("q", 1).await.unwrap();
        assert_eq!(first.repos[0].full_name, "a/one");
        assert!(first.has_next);

        let second = source.search_page("q", 2).await.unwrap();
        assert_eq!(second.repos[0].full_name, "b/two");
        assert!(!second.has_next);
    }

    #[tokio::test]
    async fn test_unqueued_query_returns_empty_page() {
        let source = MockRepoSource::new();
        let page = source.search_page("unknown", 1).await.unwrap();
        assert!(page.repos.is_empty());
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_failure_is_delivered_once() {
        let source = MockRepoSource::new();
        source.fail_with("q", CollectError::RateLimited);

        assert!(matches!(
            source.search_page("q", 1).await,
            Err(CollectError::RateLimited)
        ));
        // Queue drained: next call gets the empty default.
        assert!(source.search_page("q", 2).await.is_ok());
        assert_eq!(source.call_count(), 2);
    }
}
