//! End-to-end tests: FavoritesSync and DiscoveryClient against a live
//! melodex-server router on an ephemeral port
//!
//! Tests cover:
//! - Add / remove / re-add of one track (isFavorite tracks the server)
//! - Duplicate adds from two clients of the same user
//! - Cache preserved across failed actions
//! - Discovery helpers and their fixed failure messages

use std::sync::Arc;

use async_trait::async_trait;
use melodex_client::discovery::{RECOMMEND_FAILED, SEARCH_FAILED};
use melodex_client::{
    DiscoveryClient, FavoritesSync, HttpTransport, Recommendation, SyncError,
};
use melodex_common::config::Environment;
use melodex_common::{NewFavorite, Track};
use melodex_server::services::{CatalogGateway, CompletionGateway, GatewayError};
use melodex_server::{build_router, db, AppState};

const TOKEN: &str = "alice-session";

struct StaticCatalog(Vec<Track>);

#[async_trait]
impl CatalogGateway for StaticCatalog {
    async fn search(&self, query: &str, _result_type: &str) -> Result<Vec<Track>, GatewayError> {
        if query == "explode" {
            return Err(GatewayError::Status {
                status: 503,
                body: "catalog internals".to_string(),
            });
        }
        Ok(self.0.clone())
    }
}

struct EchoCompletion;

#[async_trait]
impl CompletionGateway for EchoCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        if prompt.contains("explode") {
            return Err(GatewayError::Timeout("completion".to_string()));
        }
        Ok("dreamy shoegaze".to_string())
    }
}

fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("Song {}", id),
        artists: "Artist".to_string(),
        album: "Album".to_string(),
        album_art: None,
        preview_url: Some(format!("https://p.scdn.co/mp3-preview/{}", id)),
        external_url: format!("https://open.spotify.com/track/{}", id),
    }
}

/// Start the server and return its base URL
async fn spawn_server() -> String {
    let pool = db::connect_in_memory().await.unwrap();
    db::sessions::insert(&pool, TOKEN, "alice", None).await.unwrap();

    let state = AppState::new(
        pool,
        Arc::new(StaticCatalog(vec![track("T1"), track("T2")])),
        Arc::new(EchoCompletion),
        Environment::Production,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    format!("http://{}", addr)
}

fn favorites_client(base_url: &str) -> FavoritesSync<HttpTransport> {
    FavoritesSync::new(HttpTransport::with_session(base_url, TOKEN).unwrap())
}

#[tokio::test]
async fn test_add_remove_readd_round_trip() {
    let base_url = spawn_server().await;
    let sync = favorites_client(&base_url);
    sync.load().await.unwrap();
    assert!(!sync.is_favorite("T1"));

    sync.add(NewFavorite::from(&track("T1"))).await.unwrap();
    assert!(sync.is_favorite("T1"));
    let first_id = sync.favorite_id("T1").unwrap();

    sync.remove(&first_id).await.unwrap();
    assert!(!sync.is_favorite("T1"));

    sync.add(NewFavorite::from(&track("T1"))).await.unwrap();
    assert!(sync.is_favorite("T1"));
    let second_id = sync.favorite_id("T1").unwrap();
    assert_ne!(first_id, second_id);

    // A fresh client sees the same state
    let other = favorites_client(&base_url);
    other.load().await.unwrap();
    assert_eq!(other.favorites().len(), 1);
    assert_eq!(other.favorite_id("T1"), Some(second_id));
}

#[tokio::test]
async fn test_duplicate_adds_from_two_clients_converge() {
    let base_url = spawn_server().await;
    let a = favorites_client(&base_url);
    let b = favorites_client(&base_url);

    let (ra, rb) = tokio::join!(
        a.add(NewFavorite::from(&track("T1"))),
        b.add(NewFavorite::from(&track("T1"))),
    );
    ra.unwrap();
    rb.unwrap();

    assert!(a.is_favorite("T1"));
    assert!(b.is_favorite("T1"));

    // Both caches end up pointing at the single stored record
    let reference = favorites_client(&base_url);
    reference.load().await.unwrap();
    assert_eq!(reference.favorites().len(), 1);
    let stored_id = reference.favorite_id("T1");
    assert_eq!(a.favorite_id("T1"), stored_id);
    assert_eq!(b.favorite_id("T1"), stored_id);
}

#[tokio::test]
async fn test_remove_already_deleted_favorite() {
    let base_url = spawn_server().await;
    let a = favorites_client(&base_url);
    let b = favorites_client(&base_url);

    a.add(NewFavorite::from(&track("T1"))).await.unwrap();
    b.load().await.unwrap();
    let id = b.favorite_id("T1").unwrap();

    a.remove(&id).await.unwrap();
    // Server answers 404; the end state already holds
    b.remove(&id).await.unwrap();

    assert!(!b.is_favorite("T1"));
}

#[tokio::test]
async fn test_toggle_follows_heart_button_flow() {
    let base_url = spawn_server().await;
    let sync = favorites_client(&base_url);

    assert!(sync.toggle(&track("T2")).await.unwrap());
    assert!(!sync.toggle(&track("T2")).await.unwrap());
    assert!(sync.favorites().is_empty());
}

#[tokio::test]
async fn test_unauthenticated_client_keeps_cache() {
    let base_url = spawn_server().await;
    let sync = FavoritesSync::new(HttpTransport::with_session(&base_url, "bogus").unwrap());

    let err = sync.add(NewFavorite::from(&track("T1"))).await.unwrap_err();
    assert!(matches!(err, SyncError::Unauthenticated));
    assert!(!sync.is_favorite("T1"));

    assert!(matches!(sync.load().await, Err(SyncError::Unauthenticated)));
    assert!(sync.favorites().is_empty());
}

#[tokio::test]
async fn test_discovery_search_and_history() {
    let base_url = spawn_server().await;
    let client = DiscoveryClient::new(HttpTransport::with_session(&base_url, TOKEN).unwrap());

    let tracks = client.search("shoegaze").await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].preview_url.as_deref(), Some("https://p.scdn.co/mp3-preview/T1"));

    let mut history = Vec::new();
    for _ in 0..100 {
        history = client.history().await.unwrap();
        if !history.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].query, "shoegaze");
    assert_eq!(history[0].result_type, "track");
}

#[tokio::test]
async fn test_discovery_recommend() {
    let base_url = spawn_server().await;
    let client = DiscoveryClient::new(HttpTransport::new(&base_url).unwrap());

    match client.recommend("late night drive").await.unwrap() {
        Recommendation::Tracks(tracks) => assert_eq!(tracks.len(), 2),
        other => panic!("Expected tracks, got {:?}", other),
    }
}

#[tokio::test]
async fn test_discovery_failures_use_fixed_messages() {
    let base_url = spawn_server().await;
    let client = DiscoveryClient::new(HttpTransport::new(&base_url).unwrap());

    let err = client.search("explode").await.unwrap_err();
    assert_eq!(err.to_string(), SEARCH_FAILED);
    assert!(matches!(err.cause(), SyncError::Status { status: 500, .. }));

    let err = client.recommend("explode please").await.unwrap_err();
    assert_eq!(err.to_string(), RECOMMEND_FAILED);
}
