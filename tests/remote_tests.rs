use std::{net::SocketAddr, sync::Arc, time::Duration};

use tokio_test::assert_ok;

use cinepick::{
    api::{create_router, AppState},
    models::{CandidateItem, Genre, ListMembership, MediaKind},
    services::watchlist::{RemoteWatchlist, WatchlistStore},
};

async fn spawn_service() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(AppState::in_memory());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

fn client(addr: SocketAddr, token: &str, ttl: Duration) -> WatchlistStore {
    WatchlistStore::new(Arc::new(RemoteWatchlist::new(
        format!("http://{}/api", addr),
        token,
        ttl,
    )))
}

fn series(id: u64) -> CandidateItem {
    CandidateItem {
        id,
        kind: MediaKind::Series,
        title: format!("Series {}", id),
        original_title: Some(format!("Original {}", id)),
        overview: "A family, a secret.".to_string(),
        release_date: None,
        vote_average: 8.3,
        vote_count: 4100,
        genres: vec![Genre {
            id: 80,
            name: "Crime".to_string(),
        }],
        poster_path: None,
        backdrop_path: None,
        runtime: None,
        number_of_seasons: Some(5),
        number_of_episodes: Some(62),
    }
}

#[tokio::test]
async fn test_remote_watchlist_lifecycle() {
    let addr = spawn_service().await;
    let store = client(addr, "alice", Duration::from_secs(60));

    assert!(assert_ok!(store.add(&series(1396), ListMembership::ToWatch).await));
    assert!(!assert_ok!(store.add(&series(1396), ListMembership::ToWatch).await));
    assert!(assert_ok!(store.contains(1396, ListMembership::ToWatch).await));

    assert!(assert_ok!(store.mark_watched(&series(1396)).await));
    assert!(!assert_ok!(store.contains(1396, ListMembership::ToWatch).await));

    let watched = assert_ok!(store.list(ListMembership::Watched).await);
    assert_eq!(watched.len(), 1);
    assert_eq!(watched[0].item.number_of_episodes, Some(62));

    assert!(!assert_ok!(store.remove(1, ListMembership::Watched).await));
    assert!(assert_ok!(store.remove(1396, ListMembership::Watched).await));
    assert!(assert_ok!(store.list(ListMembership::Watched).await).is_empty());
}

#[tokio::test]
async fn test_remote_mark_watched_adds_absent_item() {
    let addr = spawn_service().await;
    let store = client(addr, "alice", Duration::from_secs(60));

    assert!(assert_ok!(store.mark_watched(&series(60059)).await));
    assert!(assert_ok!(store.contains(60059, ListMembership::Watched).await));
}

#[tokio::test]
async fn test_remote_statistics_and_clear() {
    let addr = spawn_service().await;
    let store = client(addr, "carol", Duration::from_secs(60));

    assert_ok!(store.add(&series(1), ListMembership::ToWatch).await);
    assert_ok!(store.add(&series(2), ListMembership::ToWatch).await);
    assert_ok!(store.add(&series(3), ListMembership::Watched).await);

    let stats = assert_ok!(store.statistics().await);
    assert_eq!((stats.to_watch_count, stats.watched_count, stats.total_count), (2, 1, 3));
    assert_eq!(stats.genre_counts.get("Crime"), Some(&3));

    assert_ok!(store.clear_all().await);
    assert!(assert_ok!(store.list(ListMembership::ToWatch).await).is_empty());
}

#[tokio::test]
async fn test_list_cache_serves_reads_until_ttl() {
    let addr = spawn_service().await;
    let cached = client(addr, "dave", Duration::from_secs(60));
    let writer = client(addr, "dave", Duration::from_secs(60));
    let uncached = client(addr, "dave", Duration::ZERO);

    assert!(assert_ok!(cached.list(ListMembership::ToWatch).await).is_empty());

    assert_ok!(writer.add(&series(7), ListMembership::ToWatch).await);

    // Another client's write does not invalidate this client's copy
    assert!(assert_ok!(cached.list(ListMembership::ToWatch).await).is_empty());
    assert_eq!(assert_ok!(uncached.list(ListMembership::ToWatch).await).len(), 1);
}

#[tokio::test]
async fn test_tokens_do_not_share_lists() {
    let addr = spawn_service().await;
    let alice = client(addr, "alice", Duration::ZERO);
    let bob = client(addr, "bob", Duration::ZERO);

    assert_ok!(alice.add(&series(1), ListMembership::ToWatch).await);
    assert!(!assert_ok!(bob.contains(1, ListMembership::ToWatch).await));
}
