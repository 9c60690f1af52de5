mod support;

use atelier_cloud::{CloudError, PageOutcome, PageRequest, SharedProjectCache};
use pretty_assertions::assert_eq;
use support::{summary, MockApi};

fn uids(cache: &SharedProjectCache) -> Vec<String> {
    cache.summaries().iter().map(|s| s.uid.clone()).collect()
}

#[test]
fn overlapping_pages_are_deduplicated() {
    let mut cache = SharedProjectCache::new();

    let first = cache.apply_page(Ok(vec![summary("a", 100), summary("b", 90)]), false);
    assert_eq!(first, PageOutcome::Added(vec![summary("a", 100), summary("b", 90)]));

    let second = cache.apply_page(Ok(vec![summary("b", 90), summary("c", 80)]), false);
    assert_eq!(second, PageOutcome::Added(vec![summary("c", 80)]));

    assert_eq!(uids(&cache), vec!["a", "b", "c"]);
}

#[test]
fn first_seen_fields_win() {
    let mut cache = SharedProjectCache::new();
    cache.merge_page(vec![summary("a", 100)]);

    let mut renamed = summary("a", 200);
    renamed.name = "Renamed".into();
    let added = cache.merge_page(vec![renamed]);

    assert!(added.is_empty());
    assert_eq!(cache.get("a").unwrap().last_edited, 100);
    assert_eq!(cache.get("a").unwrap().name, "Project a");
}

#[test]
fn watermark_is_oldest_entry_or_now() {
    let mut cache = SharedProjectCache::new();
    assert_eq!(cache.watermark(12345), 12345);

    cache.merge_page(vec![summary("a", 100), summary("b", 50), summary("c", 70)]);
    assert_eq!(cache.watermark(12345), 50);
}

#[test]
fn older_page_request_uses_watermark() {
    let mut cache = SharedProjectCache::new();
    cache.merge_page(vec![summary("x", 100), summary("y", 50)]);

    assert_eq!(cache.older_page_request(10), PageRequest::window(50, 10));
}

#[tokio::test]
async fn fetch_older_sends_watermark_and_limit() {
    let api = MockApi::new();
    api.push_page(vec![summary("z", 40)]);

    let mut cache = SharedProjectCache::new();
    cache.merge_page(vec![summary("x", 100), summary("y", 50)]);

    let outcome = cache.fetch_older(&api, 10).await;

    assert_eq!(outcome, PageOutcome::Added(vec![summary("z", 40)]));
    assert_eq!(
        api.requests(),
        vec![PageRequest {
            from: Some(50),
            limit: Some(10),
        }]
    );
    assert_eq!(uids(&cache), vec!["x", "y", "z"]);
}

#[tokio::test]
async fn fetch_older_on_empty_cache_uses_current_time() {
    let api = MockApi::new();
    let mut cache = SharedProjectCache::new();

    let before = atelier_types::now_millis();
    cache.fetch_older(&api, 10).await;
    let after = atelier_types::now_millis();

    let requests = api.requests();
    assert_eq!(requests.len(), 1);
    let from = requests[0].from.unwrap();
    assert!(from >= before && from <= after);
    assert_eq!(requests[0].limit, Some(10));
}

#[tokio::test]
async fn user_fetch_with_nothing_new_asks_for_notice() {
    let api = MockApi::new();
    api.push_page(vec![summary("x", 100)]);

    let mut cache = SharedProjectCache::new();
    cache.merge_page(vec![summary("x", 100)]);

    assert_eq!(
        cache.fetch_older(&api, 10).await,
        PageOutcome::NothingNew { notify: true }
    );
}

#[tokio::test]
async fn silent_fetch_with_nothing_new() {
    let api = MockApi::new();
    let mut cache = SharedProjectCache::new();

    let outcome = cache
        .fetch_page(&api, &PageRequest::window(1000, 5), false)
        .await;

    assert_eq!(outcome, PageOutcome::NothingNew { notify: false });
    assert!(cache.is_empty());
}

#[tokio::test]
async fn failed_fetch_leaves_cache_unchanged() {
    let api = MockApi::new();
    api.push_failure();

    let mut cache = SharedProjectCache::new();
    cache.merge_page(vec![summary("a", 10)]);

    assert_eq!(cache.fetch_older(&api, 10).await, PageOutcome::Failed);
    assert_eq!(uids(&cache), vec!["a"]);
}

#[test]
fn failed_result_is_not_retried() {
    let mut cache = SharedProjectCache::new();
    let outcome = cache.apply_page(Err(CloudError::Api("timeout".into())), true);
    assert_eq!(outcome, PageOutcome::Failed);
    assert!(cache.is_empty());
}

#[test]
fn insert_front_moves_existing_entry() {
    let mut cache = SharedProjectCache::new();
    cache.merge_page(vec![summary("a", 100), summary("b", 90)]);

    cache.insert_front(summary("c", 300));
    assert_eq!(uids(&cache), vec!["c", "a", "b"]);

    cache.insert_front(summary("b", 400));
    assert_eq!(uids(&cache), vec!["b", "c", "a"]);
    assert_eq!(cache.get("b").unwrap().last_edited, 400);
}

#[test]
fn update_entry_refreshes_fields() {
    let mut cache = SharedProjectCache::new();
    cache.merge_page(vec![summary("a", 100)]);

    assert!(cache.update_entry("a", "New name", "me", 500));
    let entry = cache.get("a").unwrap();
    assert_eq!(entry.name, "New name");
    assert_eq!(entry.author, "me");
    assert_eq!(entry.last_edited, 500);

    assert!(!cache.update_entry("missing", "x", "y", 1));
}

#[test]
fn remove_entry() {
    let mut cache = SharedProjectCache::new();
    cache.merge_page(vec![summary("a", 100), summary("b", 90)]);

    assert_eq!(cache.remove("a"), Some(summary("a", 100)));
    assert_eq!(cache.remove("a"), None);
    assert_eq!(uids(&cache), vec!["b"]);
    assert!(!cache.contains("a"));
}
