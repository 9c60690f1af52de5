//! Local accumulation of remote shared-project summaries.
//!
//! The cache is a lazy, partial window over the remote registry. Pages are
//! appended without re-sorting and deduplicated by `uid`; an entry keeps the
//! fields it was first seen with unless the share workflow updates it.
//!
//! "Load older" uses the smallest `lastEdited` currently held as the `from`
//! watermark, so each click asks for entries older than anything cached.
//! Entries inserted remotely between two watermarks are never discovered.

use crate::api::RemoteProjectApi;
use crate::error::CloudResult;
use crate::types::PageRequest;
use atelier_types::{min_by_key, now_millis, push_unique, SharedProjectSummary};
use tracing::{debug, error};

/// Result of merging one fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// New summaries were appended.
    Added(Vec<SharedProjectSummary>),
    /// The page held nothing new. `notify` is set for user-initiated fetches.
    NothingNew { notify: bool },
    /// The fetch failed; the cache is unchanged.
    Failed,
}

#[derive(Debug, Default)]
pub struct SharedProjectCache {
    accumulated: Vec<SharedProjectSummary>,
}

impl SharedProjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summaries(&self) -> &[SharedProjectSummary] {
        &self.accumulated
    }

    pub fn len(&self) -> usize {
        self.accumulated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accumulated.is_empty()
    }

    pub fn get(&self, uid: &str) -> Option<&SharedProjectSummary> {
        self.accumulated.iter().find(|s| s.uid == uid)
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.get(uid).is_some()
    }

    /// Oldest `lastEdited` held, or `now` when empty.
    pub fn watermark(&self, now: i64) -> i64 {
        min_by_key(&self.accumulated, |s| s.last_edited)
            .map(|s| s.last_edited)
            .unwrap_or(now)
    }

    /// The request for the next page of older entries.
    pub fn older_page_request(&self, limit: u32) -> PageRequest {
        PageRequest::window(self.watermark(now_millis()), limit)
    }

    /// Appends the summaries whose uid is not cached yet.
    pub fn merge_page(&mut self, page: Vec<SharedProjectSummary>) -> Vec<SharedProjectSummary> {
        push_unique(&mut self.accumulated, page, |s| s.uid.clone())
    }

    /// Folds a completed `ls` call into the cache.
    pub fn apply_page(
        &mut self,
        result: CloudResult<Vec<SharedProjectSummary>>,
        notify: bool,
    ) -> PageOutcome {
        match result {
            Ok(page) => {
                let received = page.len();
                let added = self.merge_page(page);
                debug!(
                    "shared page: {} received, {} new, {} cached",
                    received,
                    added.len(),
                    self.accumulated.len()
                );
                if added.is_empty() {
                    PageOutcome::NothingNew { notify }
                } else {
                    PageOutcome::Added(added)
                }
            }
            Err(e) => {
                error!("shared project fetch failed: {e}");
                PageOutcome::Failed
            }
        }
    }

    /// Fetches one page and merges it. No retry on failure.
    pub async fn fetch_page(
        &mut self,
        api: &dyn RemoteProjectApi,
        request: &PageRequest,
        notify: bool,
    ) -> PageOutcome {
        let result = api.list(request).await;
        self.apply_page(result, notify)
    }

    /// Fetches the page just older than the oldest cached entry.
    pub async fn fetch_older(&mut self, api: &dyn RemoteProjectApi, limit: u32) -> PageOutcome {
        let request = self.older_page_request(limit);
        self.fetch_page(api, &request, true).await
    }

    /// Puts a freshly shared project at the most-recent position.
    ///
    /// An existing entry with the same uid is moved rather than duplicated.
    pub fn insert_front(&mut self, summary: SharedProjectSummary) {
        self.accumulated.retain(|s| s.uid != summary.uid);
        self.accumulated.insert(0, summary);
    }

    /// Refreshes the display fields of a cached entry. Returns false if absent.
    pub fn update_entry(&mut self, uid: &str, name: &str, author: &str, last_edited: i64) -> bool {
        match self.accumulated.iter_mut().find(|s| s.uid == uid) {
            Some(entry) => {
                entry.name = name.to_string();
                entry.author = author.to_string();
                entry.last_edited = last_edited;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, uid: &str) -> Option<SharedProjectSummary> {
        let index = self.accumulated.iter().position(|s| s.uid == uid)?;
        Some(self.accumulated.remove(index))
    }
}
