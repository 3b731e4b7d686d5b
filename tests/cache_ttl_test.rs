mod common;

use common::ManualClock;
use mediagate::services::{CacheTtls, GrantCache, LocalGrantCache};
use std::sync::Arc;

fn cache_with_clock(ttls: CacheTtls) -> (LocalGrantCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let cache = LocalGrantCache::with_clock(ttls, clock.clone());
    (cache, clock)
}

#[tokio::test]
async fn pending_session_expires_after_ttl() {
    let (cache, clock) = cache_with_clock(common::default_ttls());

    cache.set_auth("s1", false).await.unwrap();
    assert!(cache.exists_auth("s1").await);

    clock.advance_secs(899);
    assert!(cache.exists_auth("s1").await);

    clock.advance_secs(2);
    assert!(!cache.exists_auth("s1").await);
    assert!(!cache.get_auth("s1").await);
    assert!(cache.dump_auth().await.is_empty());
}

#[tokio::test]
async fn authenticating_rearms_the_window() {
    let (cache, clock) = cache_with_clock(common::default_ttls());

    cache.set_auth("s1", false).await.unwrap();
    clock.advance_secs(800);

    // The write at t=800 starts a fresh authenticated window
    cache.set_auth("s1", true).await.unwrap();
    clock.advance_secs(800);
    assert!(cache.get_auth("s1").await);

    clock.advance_secs(200);
    assert!(!cache.get_auth("s1").await);
    assert!(!cache.exists_auth("s1").await);
}

#[tokio::test]
async fn authenticated_ttl_is_independent_of_pending_ttl() {
    let ttls = CacheTtls {
        pending_secs: 900,
        authenticated_secs: 3600,
        share_secs: 172_800,
    };
    let (cache, clock) = cache_with_clock(ttls);

    cache.set_auth("s1", true).await.unwrap();
    clock.advance_secs(1000);
    assert!(cache.get_auth("s1").await);

    clock.advance_secs(3000);
    assert!(!cache.get_auth("s1").await);
}

#[tokio::test]
async fn share_entry_expires_after_48_hours() {
    let (cache, clock) = cache_with_clock(common::default_ttls());

    cache.set_share("c1", "movies/foo.mp4").await.unwrap();
    clock.advance_secs(172_799);
    assert_eq!(
        cache.get_share("c1").await.as_deref(),
        Some("movies/foo.mp4")
    );

    clock.advance_secs(2);
    assert!(cache.get_share("c1").await.is_none());
}

#[tokio::test]
async fn expired_and_never_issued_are_indistinguishable() {
    let (cache, clock) = cache_with_clock(common::default_ttls());

    cache.set_share("c1", "movies/foo.mp4").await.unwrap();
    clock.advance_secs(200_000);

    assert_eq!(cache.get_share("c1").await, cache.get_share("never").await);
}
