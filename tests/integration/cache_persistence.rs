//! Cache snapshots written by one pass and read by the next.

use plugin_deps::cache::MetadataCache;
use plugin_deps::context::DependencyContext;
use plugin_deps::test_utils::{ManualClock, MockFetcher, unit};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const EXT_ENDPOINT: &str = "https://example.com/ext.json";

#[tokio::test]
async fn test_snapshot_serves_next_pass_without_fetching() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("metadata-cache.json");
    let clock = Arc::new(ManualClock::default());

    let first_fetcher = Arc::new(MockFetcher::new().with_json(EXT_ENDPOINT, r#"{"name":"Ext Plugin"}"#));
    let cache = Arc::new(MetadataCache::with_clock(clock.clone()));
    let mut context = DependencyContext::new(cache.clone(), first_fetcher.clone());
    context.build_graph(vec![unit("a/a.php", &format!("ext|{EXT_ENDPOINT}, missing"))]);
    context.resolver().resolve_required(None).await;
    cache.save_to(&path).await.unwrap();
    assert_eq!(first_fetcher.call_count(), 1);

    let reloaded = Arc::new(MetadataCache::load_from(&path, clock.clone()).await.unwrap());
    assert_eq!(reloaded.len(), 2);

    let second_fetcher = Arc::new(MockFetcher::new());
    let mut context = DependencyContext::new(reloaded, second_fetcher.clone());
    context.build_graph(vec![unit("a/a.php", &format!("ext|{EXT_ENDPOINT}, missing"))]);

    assert_eq!(context.resolve("ext").await.name, "Ext Plugin");
    assert!(context.resolve("missing").await.is_synthesized());
    assert_eq!(second_fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_expired_entries_are_dropped_on_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("metadata-cache.json");
    let clock = Arc::new(ManualClock::default());

    let cache = Arc::new(MetadataCache::with_clock(clock.clone()));
    let mut context = DependencyContext::new(cache.clone(), Arc::new(MockFetcher::new()));
    context.build_graph(vec![unit("a/a.php", "missing")]);
    context.resolve("missing").await;
    cache.save_to(&path).await.unwrap();

    clock.advance(Duration::from_secs(24 * 60 * 60));
    let reloaded = MetadataCache::load_from(&path, clock.clone()).await.unwrap();
    assert!(reloaded.is_empty());
}

#[tokio::test]
async fn test_missing_snapshot_loads_empty() {
    let temp = TempDir::new().unwrap();
    let cache = MetadataCache::load_from(&temp.path().join("absent.json"), Arc::new(ManualClock::default()))
        .await
        .unwrap();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_corrupt_snapshot_is_a_cache_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("metadata-cache.json");
    std::fs::write(&path, "{ not json").unwrap();

    let error = MetadataCache::load_from(&path, Arc::new(ManualClock::default())).await.unwrap_err();
    assert!(error.to_string().contains("read failed"));
}
