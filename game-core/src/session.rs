use chrono::{DateTime, Utc};
use game_types::{
    FinishedGame, GameError, GameStatus, GuessId, GuessRecord, RecordScore, SessionSnapshot,
    Verdict,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    GameCommand, GameEvent, TargetGenerator, evaluate, is_new_record, round_time, validate_guess,
};

/// Seconds added to the clock per tick.
pub const DEFAULT_TICK_SECONDS: f64 = 0.1;

/// One play-through for a single player.
///
/// The target is drawn on [`GameSession::start_game`] and never changes until
/// the session returns to the lobby. History is kept most-recent-first.
#[derive(Debug, Clone)]
pub struct GameSession {
    player_name: Option<String>,
    target: Option<u8>,
    history: Vec<GuessRecord>,
    started_at: Option<DateTime<Utc>>,
    status: GameStatus,
    ticks: u64,
    tick_seconds: f64,
    result: Option<FinishedGame>,
}

/// Collaborators a transition may need besides the session itself.
pub struct TransitionContext<'a> {
    pub targets: &'a mut dyn TargetGenerator,
    /// Current rank-1 score, if the leaderboard has one.
    pub best: Option<RecordScore>,
}

impl GameSession {
    pub fn new() -> Self {
        Self::with_tick_seconds(DEFAULT_TICK_SECONDS)
    }

    pub fn with_tick_seconds(tick_seconds: f64) -> Self {
        Self {
            player_name: None,
            target: None,
            history: Vec::new(),
            started_at: None,
            status: GameStatus::Lobby,
            ticks: 0,
            tick_seconds,
            result: None,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    pub fn target(&self) -> Option<u8> {
        self.target
    }

    pub fn history(&self) -> &[GuessRecord] {
        &self.history
    }

    pub fn attempts(&self) -> u32 {
        self.history.len() as u32
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.ticks as f64 * self.tick_seconds
    }

    pub fn result(&self) -> Option<FinishedGame> {
        self.result
    }

    pub fn is_new_record(&self) -> bool {
        self.result.is_some_and(|result| result.is_new_record)
    }

    /// Guess values oldest first.
    pub fn history_values(&self) -> Vec<u8> {
        self.history.iter().rev().map(|guess| guess.value).collect()
    }

    pub fn start_game(
        &mut self,
        player_name: &str,
        targets: &mut dyn TargetGenerator,
    ) -> Result<GameEvent, GameError> {
        self.require_status(GameStatus::Lobby)?;

        let player_name = player_name.trim();
        if player_name.is_empty() {
            return Err(GameError::InvalidPlayerName);
        }

        self.player_name = Some(player_name.to_string());
        self.target = Some(targets.next_target());
        self.history.clear();
        self.started_at = Some(Utc::now());
        self.ticks = 0;
        self.result = None;
        self.status = GameStatus::Playing;

        debug!("Session started for {}", player_name);
        Ok(GameEvent::GameStarted {
            player_name: player_name.to_string(),
        })
    }

    /// Evaluate a guess and record it.
    ///
    /// A correct guess freezes the clock and finishes the session; `best` is
    /// the score it has to beat to count as a new record.
    pub fn submit_guess(
        &mut self,
        value: u8,
        best: Option<&RecordScore>,
    ) -> Result<GameEvent, GameError> {
        self.require_status(GameStatus::Playing)?;
        let value = validate_guess(i64::from(value))?;
        let target = self.target.ok_or_else(|| GameError::InvalidGameState {
            current_state: self.status.as_str().to_string(),
        })?;

        let guess = GuessRecord {
            id: Uuid::new_v4(),
            value,
            verdict: evaluate(value, target),
            timestamp: Utc::now().to_rfc3339(),
            commentary: None,
        };
        self.history.insert(0, guess.clone());

        if guess.verdict != Verdict::Correct {
            return Ok(GameEvent::GuessSubmitted { guess });
        }

        let score = RecordScore {
            attempts: self.attempts(),
            time_seconds: round_time(self.elapsed_seconds()),
        };
        let result = FinishedGame {
            attempts: score.attempts,
            time_seconds: score.time_seconds,
            is_new_record: is_new_record(&score, best),
        };
        self.result = Some(result);
        self.status = GameStatus::Finished;

        debug!(
            "Session finished in {} attempts, {:.2}s",
            result.attempts, result.time_seconds
        );
        Ok(GameEvent::GameFinished { guess, result })
    }

    /// Advance the clock by one tick. Only a playing session's clock moves.
    pub fn tick(&mut self) -> bool {
        if self.status == GameStatus::Playing {
            self.ticks += 1;
            true
        } else {
            false
        }
    }

    /// Return to the lobby from any state, dropping the current session.
    pub fn reset_to_lobby(&mut self) -> GameEvent {
        let abandoned = self.status == GameStatus::Playing;
        let tick_seconds = self.tick_seconds;
        *self = Self::with_tick_seconds(tick_seconds);
        GameEvent::ReturnedToLobby { abandoned }
    }

    /// Attach commentary to the guess with `guess_id`.
    ///
    /// Returns false when no such guess exists, e.g. after a reset.
    pub fn attach_commentary(&mut self, guess_id: GuessId, commentary: String) -> bool {
        match self.history.iter_mut().find(|guess| guess.id == guess_id) {
            Some(guess) => {
                guess.commentary = Some(commentary);
                true
            }
            None => false,
        }
    }

    pub fn apply(
        &mut self,
        command: GameCommand,
        context: TransitionContext<'_>,
    ) -> Result<GameEvent, GameError> {
        match command {
            GameCommand::StartGame { player_name } => {
                self.start_game(&player_name, context.targets)
            }
            GameCommand::SubmitGuess { value } => self.submit_guess(value, context.best.as_ref()),
            GameCommand::Tick => {
                self.tick();
                Ok(GameEvent::Ticked {
                    elapsed_seconds: self.elapsed_seconds(),
                })
            }
            GameCommand::ResetToLobby => Ok(self.reset_to_lobby()),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            player_name: self.player_name.clone(),
            status: self.status,
            history: self.history.clone(),
            attempts: self.attempts(),
            elapsed_seconds: round_time(self.elapsed_seconds()),
            started_at: self.started_at.map(|at| at.to_rfc3339()),
            result: self.result,
        }
    }

    fn require_status(&self, expected: GameStatus) -> Result<(), GameError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(GameError::InvalidGameState {
                current_state: self.status.as_str().to_string(),
            })
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixedTargetGenerator;

    fn playing_session(target: u8) -> GameSession {
        let mut session = GameSession::new();
        session
            .start_game("Alice", &mut FixedTargetGenerator(target))
            .unwrap();
        session
    }

    #[test]
    fn test_new_session_is_in_lobby() {
        let session = GameSession::new();
        assert_eq!(session.status(), GameStatus::Lobby);
        assert!(session.target().is_none());
        assert_eq!(session.attempts(), 0);
        assert_eq!(session.elapsed_seconds(), 0.0);
    }

    #[test]
    fn test_start_game_trims_name() {
        let session = {
            let mut session = GameSession::new();
            session
                .start_game("  Bob  ", &mut FixedTargetGenerator(5))
                .unwrap();
            session
        };
        assert_eq!(session.player_name(), Some("Bob"));
        assert_eq!(session.status(), GameStatus::Playing);
        assert!(session.history().is_empty());
        assert!(session.started_at().is_some());
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let mut session = GameSession::new();
        for name in ["", "   ", "\t\n"] {
            let result = session.start_game(name, &mut FixedTargetGenerator(5));
            assert_eq!(result, Err(GameError::InvalidPlayerName));
            assert_eq!(session.status(), GameStatus::Lobby);
            assert!(session.target().is_none());
        }
    }

    #[test]
    fn test_start_requires_lobby() {
        let mut session = playing_session(50);
        let result = session.start_game("Carol", &mut FixedTargetGenerator(7));
        assert!(matches!(result, Err(GameError::InvalidGameState { .. })));
        assert_eq!(session.target(), Some(50));
        assert_eq!(session.player_name(), Some("Alice"));
    }

    #[test]
    fn test_guess_before_start_is_rejected() {
        let mut session = GameSession::new();
        let result = session.submit_guess(10, None);
        assert_eq!(
            result,
            Err(GameError::InvalidGameState {
                current_state: "LOBBY".to_string()
            })
        );
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_out_of_range_guess_leaves_history_untouched() {
        let mut session = playing_session(50);
        session.submit_guess(10, None).unwrap();

        for value in [0, 101, 255] {
            let result = session.submit_guess(value, None);
            assert!(matches!(result, Err(GameError::InvalidGuess { .. })));
        }
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.status(), GameStatus::Playing);
    }

    #[test]
    fn test_history_is_most_recent_first() {
        let mut session = playing_session(50);
        for value in [10, 90, 30] {
            session.submit_guess(value, None).unwrap();
        }
        let values: Vec<u8> = session.history().iter().map(|g| g.value).collect();
        assert_eq!(values, vec![30, 90, 10]);
        assert_eq!(session.history_values(), vec![10, 90, 30]);
    }

    #[test]
    fn test_correct_guess_finishes_once() {
        let mut session = playing_session(42);
        let event = session.submit_guess(42, None).unwrap();
        assert!(event.is_finish());
        assert_eq!(session.status(), GameStatus::Finished);

        let again = session.submit_guess(42, None);
        assert!(matches!(again, Err(GameError::InvalidGameState { .. })));
        assert_eq!(session.attempts(), 1);
    }

    #[test]
    fn test_tick_only_moves_playing_clock() {
        let mut session = GameSession::new();
        assert!(!session.tick());

        session
            .start_game("Alice", &mut FixedTargetGenerator(3))
            .unwrap();
        for _ in 0..25 {
            assert!(session.tick());
        }
        assert!((session.elapsed_seconds() - 2.5).abs() < 1e-9);

        session.submit_guess(3, None).unwrap();
        assert!(!session.tick());
        assert!((session.elapsed_seconds() - 2.5).abs() < 1e-9);
        assert_eq!(session.result().unwrap().time_seconds, 2.5);
    }

    #[test]
    fn test_new_record_flag_uses_best() {
        let best = RecordScore {
            attempts: 1,
            time_seconds: 0.5,
        };
        let mut session = playing_session(60);
        session.submit_guess(60, Some(&best)).unwrap();
        assert!(!session.is_new_record());

        session.reset_to_lobby();
        session
            .start_game("Alice", &mut FixedTargetGenerator(60))
            .unwrap();
        session.submit_guess(60, None).unwrap();
        assert!(session.is_new_record());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = GameSession::with_tick_seconds(0.5);
        session
            .start_game("Alice", &mut FixedTargetGenerator(8))
            .unwrap();
        session.tick();
        session.submit_guess(8, None).unwrap();

        let event = session.reset_to_lobby();
        assert_eq!(event, GameEvent::ReturnedToLobby { abandoned: false });
        assert_eq!(session.status(), GameStatus::Lobby);
        assert!(session.player_name().is_none());
        assert!(session.history().is_empty());
        assert_eq!(session.elapsed_seconds(), 0.0);
        assert!(!session.is_new_record());

        session
            .start_game("Alice", &mut FixedTargetGenerator(8))
            .unwrap();
        session.tick();
        assert_eq!(session.elapsed_seconds(), 0.5);
    }

    #[test]
    fn test_reset_while_playing_is_abandon() {
        let mut session = playing_session(70);
        let event = session.reset_to_lobby();
        assert_eq!(event, GameEvent::ReturnedToLobby { abandoned: true });
    }

    #[test]
    fn test_commentary_attaches_by_id() {
        let mut session = playing_session(50);
        let first = session.submit_guess(10, None).unwrap().guess_id().unwrap();
        let second = session.submit_guess(90, None).unwrap().guess_id().unwrap();

        // Replies arrive in reverse order
        assert!(session.attach_commentary(second, "too high".to_string()));
        assert!(session.attach_commentary(first, "too low".to_string()));

        let by_value = |value: u8| {
            session
                .history()
                .iter()
                .find(|g| g.value == value)
                .and_then(|g| g.commentary.clone())
        };
        assert_eq!(by_value(10).as_deref(), Some("too low"));
        assert_eq!(by_value(90).as_deref(), Some("too high"));
    }

    #[test]
    fn test_commentary_after_reset_is_dropped() {
        let mut session = playing_session(50);
        let id = session.submit_guess(10, None).unwrap().guess_id().unwrap();
        session.reset_to_lobby();
        assert!(!session.attach_commentary(id, "late".to_string()));
    }

    #[test]
    fn test_snapshot_hides_target() {
        let mut session = playing_session(77);
        session.submit_guess(20, None).unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, GameStatus::Playing);
        assert_eq!(snapshot.attempts, 1);
        assert_eq!(snapshot.history[0].verdict, Verdict::Up);
        assert!(snapshot.result.is_none());
    }

    #[test]
    fn test_apply_dispatches_commands() {
        let mut session = GameSession::new();
        let mut targets = FixedTargetGenerator(15);

        let event = session
            .apply(
                GameCommand::StartGame {
                    player_name: "Dana".to_string(),
                },
                TransitionContext {
                    targets: &mut targets,
                    best: None,
                },
            )
            .unwrap();
        assert_eq!(
            event,
            GameEvent::GameStarted {
                player_name: "Dana".to_string()
            }
        );

        let event = session
            .apply(
                GameCommand::Tick,
                TransitionContext {
                    targets: &mut targets,
                    best: None,
                },
            )
            .unwrap();
        assert!(matches!(event, GameEvent::Ticked { .. }));

        let event = session
            .apply(
                GameCommand::SubmitGuess { value: 15 },
                TransitionContext {
                    targets: &mut targets,
                    best: None,
                },
            )
            .unwrap();
        assert!(event.is_finish());

        let event = session
            .apply(
                GameCommand::ResetToLobby,
                TransitionContext {
                    targets: &mut targets,
                    best: None,
                },
            )
            .unwrap();
        assert_eq!(event, GameEvent::ReturnedToLobby { abandoned: false });
    }
}
