use game_types::{FinishedGame, GuessId, GuessRecord};

/// Inputs accepted by [`crate::GameSession::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum GameCommand {
    StartGame { player_name: String },
    SubmitGuess { value: u8 },
    Tick,
    ResetToLobby,
}

/// What a successful transition did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameStarted {
        player_name: String,
    },
    GuessSubmitted {
        guess: GuessRecord,
    },
    GameFinished {
        guess: GuessRecord,
        result: FinishedGame,
    },
    Ticked {
        elapsed_seconds: f64,
    },
    ReturnedToLobby {
        abandoned: bool,
    },
}

impl GameEvent {
    /// The guess this event produced, if any.
    pub fn guess(&self) -> Option<&GuessRecord> {
        match self {
            GameEvent::GuessSubmitted { guess } | GameEvent::GameFinished { guess, .. } => {
                Some(guess)
            }
            _ => None,
        }
    }

    pub fn guess_id(&self) -> Option<GuessId> {
        self.guess().map(|guess| guess.id)
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, GameEvent::GameFinished { .. })
    }
}
