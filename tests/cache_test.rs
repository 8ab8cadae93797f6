//! Session cache behaviour across page views sharing one session store

mod common;

use refdoc_nav::{
    cache::{FixedClock, MemorySessionStore, SessionStore, ROOT_CACHE_KEY},
    config::NavConfig,
    context::{NavContext, NavOutcome},
    event::CompletionTag,
    loader::{FragmentScript, MemoryFragmentSource},
    symbol::ChildRef,
};
use std::sync::Arc;
use test_log::test;

const PUBLISHED: i64 = 1_700_000_000;

fn source() -> MemoryFragmentSource {
    let source = MemoryFragmentSource::new();
    source.insert(
        "predef/index.js",
        FragmentScript::symbol(
            "predef",
            vec![("class", vec![ChildRef::new("Array", "predef/Array.html")])],
        ),
    );
    source
}

async fn page_view(
    page: &str,
    source: &MemoryFragmentSource,
    store: &MemorySessionStore,
    publish_time: i64,
    now_millis: i64,
) -> NavOutcome {
    let mut config = NavConfig::for_page(page);
    config.publish_time = publish_time;
    let mut ctx = NavContext::new(config)
        .with_source(Arc::new(source.clone()))
        .with_session_store(Arc::new(store.clone()))
        .with_clock(Arc::new(FixedClock(now_millis)));
    ctx.load("predef/index.js", Some(CompletionTag::TopLevel), &[]);
    ctx.notify_dom_ready();
    ctx.run_until_idle().await
}

#[test(tokio::test)]
async fn test_revisit_uses_cached_sidebar() {
    common::init_logging();
    let source = source();
    let store = MemorySessionStore::new();
    let later = PUBLISHED * 1000 + 10_000;

    let first = match page_view("predef/Array.html", &source, &store, PUBLISHED, later).await {
        NavOutcome::Rendered(sidebar) => sidebar,
        other => panic!("expected fresh render, got {other:?}"),
    };
    assert_eq!(source.total_fetches(), 1);
    assert_eq!(store.keys(), vec!["predef/Array.html".to_string()]);

    match page_view("predef/Array.html", &source, &store, PUBLISHED, later + 1).await {
        NavOutcome::Cached(sidebar) => assert_eq!(sidebar.body, first.body),
        other => panic!("expected cached sidebar, got {other:?}"),
    }
    assert_eq!(source.total_fetches(), 1, "cached page view must not fetch");
}

#[test(tokio::test)]
async fn test_republish_invalidates_entry() {
    common::init_logging();
    let source = source();
    let store = MemorySessionStore::new();
    let written = PUBLISHED * 1000 + 10_000;

    page_view("predef/Array.html", &source, &store, PUBLISHED, written).await;
    let republished = PUBLISHED + 60;
    let outcome = page_view(
        "predef/Array.html",
        &source,
        &store,
        republished,
        republished * 1000 + 1,
    )
    .await;
    assert!(matches!(outcome, NavOutcome::Rendered(_)));
    assert_eq!(source.total_fetches(), 2);

    let raw = store.get_item("predef/Array.html").unwrap().unwrap();
    assert!(raw.contains(&format!("\"time\":{}", republished * 1000 + 1)), "{raw}");
}

#[test(tokio::test)]
async fn test_root_page_is_never_cached() {
    common::init_logging();
    let source = source();
    let store = MemorySessionStore::new();
    let later = PUBLISHED * 1000 + 10_000;

    for _ in 0..2 {
        let outcome = page_view("index.html", &source, &store, PUBLISHED, later).await;
        assert!(matches!(outcome, NavOutcome::Rendered(_)));
    }
    assert!(store.is_empty());
    assert_eq!(source.total_fetches(), 2);
}

async fn linkless_view(
    source: &MemoryFragmentSource,
    store: &MemorySessionStore,
    now_millis: i64,
) -> NavOutcome {
    let mut ctx = NavContext::new(NavConfig::default())
        .with_source(Arc::new(source.clone()))
        .with_session_store(Arc::new(store.clone()))
        .with_clock(Arc::new(FixedClock(now_millis)));
    ctx.load("predef/index.js", Some(CompletionTag::TopLevel), &[]);
    ctx.notify_dom_ready();
    ctx.run_until_idle().await
}

#[test(tokio::test)]
async fn test_linkless_page_uses_root_key() {
    common::init_logging();
    let source = source();
    let store = MemorySessionStore::new();

    let first = match linkless_view(&source, &store, 1).await {
        NavOutcome::Rendered(sidebar) => sidebar,
        other => panic!("expected fresh render, got {other:?}"),
    };
    assert_eq!(store.keys(), vec![ROOT_CACHE_KEY.to_string()]);

    // Any other page without a link reads the same entry back
    match linkless_view(&source, &store, 2).await {
        NavOutcome::Cached(sidebar) => assert_eq!(sidebar.body, first.body),
        other => panic!("expected cached sidebar, got {other:?}"),
    }
    assert_eq!(source.total_fetches(), 1);
    assert_eq!(store.keys(), vec![ROOT_CACHE_KEY.to_string()]);
}
