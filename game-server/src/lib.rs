use serde::Deserialize;
use std::sync::Arc;
use warp::Filter;

use crate::session_controller::SessionFactory;
use crate::websocket::ConnectionManager;
use game_core::LeaderboardStore;

pub mod commentary;
pub mod config;
pub mod session_controller;
pub mod timer;
pub mod websocket;

pub const MAX_LEADERBOARD_LIMIT: u64 = 100;

#[derive(Deserialize)]
struct LeaderboardQuery {
    limit: Option<u64>,
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    session_factory: Arc<SessionFactory>,
    leaderboard: Arc<dyn LeaderboardStore>,
    default_limit: u64,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let connection_manager_filter = warp::any().map({
        let connection_manager = connection_manager.clone();
        move || connection_manager.clone()
    });

    let session_factory_filter = warp::any().map({
        let session_factory = session_factory.clone();
        move || session_factory.clone()
    });

    let leaderboard_filter = warp::any().map({
        let leaderboard = leaderboard.clone();
        move || leaderboard.clone()
    });

    // WebSocket endpoint
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(connection_manager_filter)
        .and(session_factory_filter)
        .map(|ws: warp::ws::Ws, conn_mgr, factory| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, factory))
        });

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Leaderboard endpoint
    let leaderboard = warp::path("leaderboard")
        .and(warp::get())
        .and(warp::query::<LeaderboardQuery>())
        .and(warp::any().map(move || default_limit))
        .and(leaderboard_filter)
        .and_then(handle_leaderboard_request);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(leaderboard)
        .with(cors)
        .with(warp::log("number_arena"))
}

async fn handle_leaderboard_request(
    query: LeaderboardQuery,
    default_limit: u64,
    leaderboard: Arc<dyn LeaderboardStore>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = query.limit.unwrap_or(default_limit).min(MAX_LEADERBOARD_LIMIT);

    match leaderboard.fetch_top(limit).await {
        Ok(entries) => Ok(warp::reply::with_status(
            warp::reply::json(&entries),
            warp::http::StatusCode::OK,
        )),
        Err(err) => {
            tracing::error!("Failed to fetch leaderboard: {}", err);
            Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({
                    "error": "Failed to fetch leaderboard"
                })),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

#[cfg(test)]
mod route_tests {
    use super::*;
    use crate::session_controller::ControllerSettings;
    use game_core::{LeaderboardStore, StaticCommentary};
    use game_persistence::repositories::LeaderboardRepository;
    use game_types::{LeaderboardEntry, NewLeaderboardEntry};
    use migration::{Migrator, MigratorTrait};

    async fn setup_repository() -> Arc<LeaderboardRepository> {
        let db = game_persistence::connection::connect_to_memory_database()
            .await
            .unwrap();
        Migrator::up(&db, None).await.unwrap();
        Arc::new(LeaderboardRepository::new(db))
    }

    fn create_test_app(
        store: Arc<dyn LeaderboardStore>,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        create_test_app_with_limit(store, 10)
    }

    fn create_test_app_with_limit(
        store: Arc<dyn LeaderboardStore>,
        default_limit: u64,
    ) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let factory = SessionFactory::new(
            store.clone(),
            Arc::new(StaticCommentary),
            ControllerSettings::default(),
        );
        create_routes(
            Arc::new(ConnectionManager::new()),
            Arc::new(factory),
            store,
            default_limit,
        )
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app(setup_repository().await);

        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "OK");
    }

    #[tokio::test]
    async fn test_leaderboard_endpoint_orders_and_limits() {
        let repo = setup_repository().await;
        for (name, attempts, time) in [("b", 5, 3.0), ("a", 2, 9.0), ("c", 5, 1.5)] {
            repo.insert(NewLeaderboardEntry {
                player_name: name.to_string(),
                attempts,
                time_seconds: time,
            })
            .await
            .unwrap();
        }
        let app = create_test_app(repo);

        let response = warp::test::request()
            .method("GET")
            .path("/leaderboard")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let entries: Vec<LeaderboardEntry> = serde_json::from_slice(response.body()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.player_name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);

        let response = warp::test::request()
            .method("GET")
            .path("/leaderboard?limit=1")
            .reply(&app)
            .await;
        let entries: Vec<LeaderboardEntry> = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].player_name, "a");
    }

    #[tokio::test]
    async fn test_leaderboard_endpoint_reports_store_failure() {
        // No migrations: the table does not exist
        let db = game_persistence::connection::connect_to_memory_database()
            .await
            .unwrap();
        let app = create_test_app(Arc::new(LeaderboardRepository::new(db)));

        let response = warp::test::request()
            .method("GET")
            .path("/leaderboard")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 500);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["error"], "Failed to fetch leaderboard");
    }

    #[tokio::test]
    async fn test_leaderboard_endpoint_uses_configured_default() {
        let repo = setup_repository().await;
        for attempts in 1..=4 {
            repo.insert(NewLeaderboardEntry {
                player_name: format!("Player {}", attempts),
                attempts,
                time_seconds: 5.0,
            })
            .await
            .unwrap();
        }
        let app = create_test_app_with_limit(repo, 2);

        let response = warp::test::request()
            .method("GET")
            .path("/leaderboard")
            .reply(&app)
            .await;
        let entries: Vec<LeaderboardEntry> = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(entries.len(), 2);

        // An explicit limit still wins, capped at the maximum
        let response = warp::test::request()
            .method("GET")
            .path("/leaderboard?limit=500")
            .reply(&app)
            .await;
        let entries: Vec<LeaderboardEntry> = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(entries.len(), 4);
    }
}
