use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::session_controller::SessionController;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use game_types::{ClientMessage, GameError, ServerMessage};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    controller: Arc<SessionController>,
    outbound: mpsc::UnboundedSender<ServerMessage>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        controller: Arc<SessionController>,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            controller,
            outbound,
        }
    }

    /// Dispatch one client message. Rejected actions are reported to the
    /// client and never close the connection.
    pub async fn handle_message(&self, message: ClientMessage) {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        let result = match message {
            ClientMessage::StartGame { player_name } => self.handle_start_game(player_name).await,
            ClientMessage::SubmitGuess { value } => self.handle_submit_guess(value).await,
            ClientMessage::ResetToLobby => {
                self.controller.reset_to_lobby().await;
                Ok(())
            }
            ClientMessage::RefreshLeaderboard => {
                self.controller.refresh_leaderboard().await;
                Ok(())
            }
            ClientMessage::GetState => {
                self.controller.send_state().await;
                Ok(())
            }
            ClientMessage::Heartbeat => {
                debug!("Heartbeat from {}", self.connection_id);
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("Rejected action from {}: {}", self.connection_id, e);
            self.send_error(&e.to_string());
        }
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);
        self.connection_manager
            .remove_connection(self.connection_id)
            .await;
    }

    pub fn send_error(&self, message: &str) {
        let _ = self.outbound.send(ServerMessage::Error {
            message: message.to_string(),
        });
    }

    async fn handle_start_game(&self, player_name: String) -> Result<(), GameError> {
        self.controller.start_game(&player_name).await?;
        Ok(())
    }

    async fn handle_submit_guess(&self, value: String) -> Result<(), GameError> {
        self.controller.submit_guess(&value).await?;
        Ok(())
    }
}
