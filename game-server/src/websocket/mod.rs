use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::session_controller::SessionFactory;
use game_types::ClientMessage;

pub mod connection;
pub mod handlers;
pub mod rate_limiter;


use connection::ConnectionId;
pub use connection::ConnectionManager;
use handlers::MessageHandler;
use rate_limiter::RateLimiter;

pub async fn handle_connection(
    websocket: WebSocket,
    connection_manager: Arc<ConnectionManager>,
    session_factory: Arc<SessionFactory>,
) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {}", connection_id);

    let (mut ws_sender, mut ws_receiver) = websocket.split();
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let settings = session_factory.settings().clone();
    let controller = Arc::new(session_factory.create(sender.clone()));
    let connection = connection_manager
        .register(connection_id, controller.clone())
        .await;
    let close_signal = connection.close_signal();

    let message_handler =
        MessageHandler::new(connection_id, connection_manager.clone(), controller.clone(), sender);

    // Initial leaderboard for the lobby
    controller.refresh_leaderboard().await;

    let incoming_handler = {
        let message_handler = message_handler.clone();
        let mut rate_limiter =
            RateLimiter::new_with_limits(settings.rate_limit_burst, settings.rate_limit_refill);

        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) => {
                        if msg.is_close() {
                            break;
                        }
                        handle_message(msg, &mut rate_limiter, &message_handler, connection_id)
                            .await;
                    }
                    Err(e) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    };

    let outgoing_handler = async move {
        while let Some(message) = receiver.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize message: {:?}", e);
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(Message::text(json)).await {
                warn!("Failed to send message to {}: {:?}", connection_id, e);
                break;
            }
        }
        let _ = ws_sender.close().await;
    };

    tokio::select! {
        _ = incoming_handler => {},
        _ = outgoing_handler => {},
        _ = close_signal.notified() => {
            info!("Server closed connection {}", connection_id);
        },
    }

    info!("Connection {} disconnected", connection_id);
    message_handler.handle_disconnect().await;
}

async fn handle_message(
    msg: Message,
    rate_limiter: &mut RateLimiter,
    message_handler: &MessageHandler,
    connection_id: ConnectionId,
) {
    // Only text frames are client messages; control and binary frames cost nothing
    let Ok(text) = msg.to_str() else {
        return;
    };

    if !rate_limiter.check_rate_limit() {
        warn!("Rate limit exceeded for connection {}", connection_id);
        message_handler.send_error("Rate limit exceeded");
        return;
    }

    match serde_json::from_str::<ClientMessage>(text) {
        Ok(client_message) => message_handler.handle_message(client_message).await,
        Err(e) => {
            warn!("Invalid message from {}: {}", connection_id, e);
            message_handler.send_error(&format!("Invalid JSON message: {}", e));
        }
    }
}
