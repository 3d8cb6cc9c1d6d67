//! Full resolution passes through `DependencyContext`.

use plugin_deps::cache::MetadataCache;
use plugin_deps::context::DependencyContext;
use plugin_deps::core::Unit;
use plugin_deps::fetch::FetchError;
use plugin_deps::metadata::RecordOrigin;
use plugin_deps::resolver::ResolverOptions;
use plugin_deps::test_utils::{ManualClock, MockFetcher, init_test_logging, unit};
use std::sync::Arc;
use std::time::Duration;

const EXT_ENDPOINT: &str = "https://example.com/ext.json";

struct Pass {
    clock: Arc<ManualClock>,
    fetcher: Arc<MockFetcher>,
    context: DependencyContext,
}

fn pass(fetcher: MockFetcher, units: Vec<Unit>) -> Pass {
    init_test_logging(None);
    let clock = Arc::new(ManualClock::default());
    let fetcher = Arc::new(fetcher);
    let cache = Arc::new(MetadataCache::with_clock(clock.clone()));
    let mut context = DependencyContext::new(cache, fetcher.clone());
    context.build_graph(units);
    Pass {
        clock,
        fetcher,
        context,
    }
}

#[tokio::test]
async fn test_mutual_requirement_reports_one_cycle_and_synthesizes() {
    let pass = pass(MockFetcher::new(), vec![unit("a/a.php", "b"), unit("b/b.php", "a")]);

    let cycles = pass.context.find_cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].member_set(), ["a", "b"].into_iter().collect());

    assert!(pass.context.installed_vs_required().is_empty());
    assert!(pass.context.dependents_of("b").contains("a/a.php"));

    let record = pass.context.resolve("b").await;
    assert_eq!(record.origin, RecordOrigin::Synthesized);
    assert_eq!(record.name, "b");
    assert_eq!(pass.fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_inline_endpoint_is_fetched_then_served_from_cache() {
    let fetcher = MockFetcher::new().with_json(EXT_ENDPOINT, r#"{"name":"Ext Plugin","slug":"ext"}"#);
    let pass = pass(fetcher, vec![unit("a/a.php", &format!("ext|{EXT_ENDPOINT}"))]);

    assert_eq!(pass.context.installed_vs_required().into_iter().collect::<Vec<_>>(), vec!["ext"]);
    assert_eq!(pass.context.registry().resolve_endpoints("ext"), vec![EXT_ENDPOINT]);

    let first = pass.context.resolve("ext").await;
    assert_eq!(first.origin, RecordOrigin::Fetched);
    assert_eq!(first.name, "Ext Plugin");
    assert_eq!(first.slug, "ext");
    assert_eq!(pass.fetcher.call_count(), 1);

    let second = pass.context.resolve("ext").await;
    assert_eq!(second, first);
    assert_eq!(pass.fetcher.call_count(), 1);
}

#[tokio::test]
async fn test_failed_endpoint_recovers_after_synthesized_ttl() {
    let fetcher = MockFetcher::new().with_error(
        EXT_ENDPOINT,
        FetchError::Status {
            endpoint: EXT_ENDPOINT.to_string(),
            status: 503,
        },
    );
    let pass = pass(fetcher, vec![unit("a/a.php", &format!("ext|{EXT_ENDPOINT}"))]);

    let placeholder = pass.context.resolve("ext").await;
    assert!(placeholder.is_synthesized());

    pass.fetcher.set_json(EXT_ENDPOINT, r#"{"name":"Ext Plugin"}"#);
    assert!(pass.context.resolve("ext").await.is_synthesized());
    assert_eq!(pass.fetcher.call_count(), 1);

    pass.clock.advance(ResolverOptions::default().synthesized_ttl + Duration::from_secs(1));
    let record = pass.context.resolve("ext").await;
    assert_eq!(record.name, "Ext Plugin");
    assert_eq!(pass.fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_default_endpoints_follow_inline_ones() {
    let defaults = vec![
        ("ext".to_string(), "https://registry.example/ext".to_string()),
        ("woo".to_string(), "https://registry.example/woo".to_string()),
    ];
    let fetcher = MockFetcher::new()
        .with_error(
            EXT_ENDPOINT,
            FetchError::Transport {
                endpoint: EXT_ENDPOINT.to_string(),
                reason: "connection refused".to_string(),
            },
        )
        .with_json("https://registry.example/ext", r#"{"name":"Ext From Registry"}"#)
        .with_json("https://registry.example/woo", r#"{"name":"Woo"}"#);

    init_test_logging(None);
    let fetcher = Arc::new(fetcher);
    let mut context =
        DependencyContext::new(Arc::new(MetadataCache::new()), fetcher.clone()).with_endpoints(&defaults);
    context.build_graph(vec![unit("a/a.php", &format!("ext|{EXT_ENDPOINT}, woo"))]);

    let resolved = context.resolver().resolve_required(None).await;
    assert_eq!(resolved.len(), 2);
    assert_eq!(resolved.fetched_count(), 2);
    assert_eq!(resolved.get("ext").map(|r| r.name.as_str()), Some("Ext From Registry"));
    assert_eq!(resolved.get("woo").map(|r| r.name.as_str()), Some("Woo"));

    let calls = fetcher.calls();
    let inline = calls.iter().position(|c| c == EXT_ENDPOINT).unwrap();
    let registry = calls.iter().position(|c| c == "https://registry.example/ext").unwrap();
    assert!(inline < registry);
}

#[tokio::test]
async fn test_installed_dependency_fills_synthesized_record() {
    let installed = Unit {
        version: "2.1.0".to_string(),
        author: Some("Jane Doe".to_string()),
        description: Some("Adds things.".to_string()),
        ..Unit::new("b/b.php", "B Plugin")
    };
    let pass = pass(MockFetcher::new(), vec![unit("a/a.php", "b"), installed]);

    let record = pass.context.resolve("b").await;
    assert!(record.is_synthesized());
    assert_eq!(record.name, "b");
    assert_eq!(record.version, "2.1.0");
    assert_eq!(record.author, "Jane Doe");
    assert!(record.sections.description.starts_with("Adds things."));
}

#[tokio::test]
async fn test_rebuild_keeps_cache_across_passes() {
    let fetcher = MockFetcher::new().with_json(EXT_ENDPOINT, r#"{"name":"Ext Plugin"}"#);
    let mut pass = pass(fetcher, vec![unit("a/a.php", &format!("ext|{EXT_ENDPOINT}"))]);
    pass.context.resolve("ext").await;

    pass.context.rebuild(&vec![unit("c/c.php", "ext")]).unwrap();
    assert!(pass.context.dependents_of("ext").contains("c/c.php"));
    assert!(pass.context.registry().resolve_endpoints("ext").is_empty());

    let record = pass.context.resolve("ext").await;
    assert_eq!(record.name, "Ext Plugin");
    assert_eq!(pass.fetcher.call_count(), 1);
}
