use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use game_core::{CommentaryProvider, LeaderboardStore};
use game_persistence::{connection::connect_and_migrate, repositories::LeaderboardRepository};
use game_server::{
    commentary::GeminiCommentary,
    config::Config,
    create_routes,
    session_controller::{ControllerSettings, SessionFactory},
    websocket::ConnectionManager,
};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    info!("Starting Number Arena server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };
    let leaderboard: Arc<dyn LeaderboardStore> = Arc::new(LeaderboardRepository::new(db));

    let gemini = match GeminiCommentary::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.commentary_language.clone(),
        config.commentary_timeout(),
    ) {
        Ok(gemini) => gemini,
        Err(e) => {
            error!("Failed to build commentary client: {}", e);
            std::process::exit(1);
        }
    };
    if !gemini.is_configured() {
        info!("No Gemini API key set, using fallback commentary");
    }
    let commentary: Arc<dyn CommentaryProvider> = Arc::new(gemini);

    let connection_manager = Arc::new(ConnectionManager::new());
    let session_factory = Arc::new(SessionFactory::new(
        leaderboard.clone(),
        commentary,
        ControllerSettings::from(&config),
    ));

    let routes = create_routes(
        connection_manager.clone(),
        session_factory,
        leaderboard,
        config.leaderboard_limit,
    );

    // Start cleanup task
    let cleanup_connection_manager = connection_manager.clone();
    let connection_timeout = config.connection_timeout();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let closed = cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
            if !closed.is_empty() {
                info!("Closed {} inactive connections", closed.len());
            }
        }
    });

    let host = match config.host.parse::<std::net::IpAddr>() {
        Ok(host) => host,
        Err(e) => {
            error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    info!("Server starting on {}:{}", config.host, config.port);

    let shutdown_connection_manager = connection_manager.clone();
    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown((host, config.port), async move {
            wait_for_shutdown_signal().await;
            shutdown_connection_manager.shutdown_all().await;
        });

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        let (mut sigint, mut sigterm) = match (
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
            signal::unix::signal(signal::unix::SignalKind::terminate()),
        ) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                if let Err(e) = signal::ctrl_c().await {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
