use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::commentary::comment_or_fallback;
use crate::config::Config;
use crate::timer::TickTimer;
use game_core::{
    CommentaryProvider, CommentaryRequest, GameEvent, GameSession, LeaderboardCache,
    LeaderboardError, LeaderboardStore, RandomTargetGenerator, TargetGenerator, parse_guess,
};
use game_types::{
    FinishedGame, GameError, GuessId, NewLeaderboardEntry, ServerMessage, SessionSnapshot,
};

pub const START_ANNOUNCEMENT: &str = "도전이 시작되었습니다! 숫자를 입력하세요.";

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub tick_interval: Duration,
    pub commentary_timeout: Duration,
    pub leaderboard_limit: u64,
    pub store_timeout: Duration,
    pub rate_limit_burst: u32,
    pub rate_limit_refill: Duration,
}

impl From<&Config> for ControllerSettings {
    fn from(config: &Config) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            commentary_timeout: config.commentary_timeout(),
            leaderboard_limit: config.leaderboard_limit,
            store_timeout: config.store_timeout(),
            rate_limit_burst: config.rate_limit_burst,
            rate_limit_refill: config.rate_limit_refill(),
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

type TargetSource = Arc<dyn Fn() -> Box<dyn TargetGenerator> + Send + Sync>;

/// Builds one [`SessionController`] per connection with shared collaborators.
#[derive(Clone)]
pub struct SessionFactory {
    leaderboard: Arc<dyn LeaderboardStore>,
    commentary: Arc<dyn CommentaryProvider>,
    targets: TargetSource,
    settings: ControllerSettings,
}

impl SessionFactory {
    pub fn new(
        leaderboard: Arc<dyn LeaderboardStore>,
        commentary: Arc<dyn CommentaryProvider>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            leaderboard,
            commentary,
            targets: Arc::new(|| Box::new(RandomTargetGenerator::new()) as Box<dyn TargetGenerator>),
            settings,
        }
    }

    /// Replace how each new session draws its targets.
    pub fn with_targets<F>(mut self, targets: F) -> Self
    where
        F: Fn() -> Box<dyn TargetGenerator> + Send + Sync + 'static,
    {
        self.targets = Arc::new(targets);
        self
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn create(&self, outbound: mpsc::UnboundedSender<ServerMessage>) -> SessionController {
        SessionController::new(
            (self.targets)(),
            self.leaderboard.clone(),
            self.commentary.clone(),
            self.settings.clone(),
            outbound,
        )
    }
}

/// Drives one player's [`GameSession`].
///
/// Owns the session clock, fires commentary requests in the background and
/// records finished games on the leaderboard. Every reply goes out through
/// `outbound`.
pub struct SessionController {
    session: Arc<Mutex<GameSession>>,
    timer: Mutex<TickTimer>,
    targets: Mutex<Box<dyn TargetGenerator>>,
    board: LeaderboardSync,
    commentary: Arc<dyn CommentaryProvider>,
    settings: ControllerSettings,
    outbound: mpsc::UnboundedSender<ServerMessage>,
}

impl SessionController {
    pub fn new(
        targets: Box<dyn TargetGenerator>,
        leaderboard: Arc<dyn LeaderboardStore>,
        commentary: Arc<dyn CommentaryProvider>,
        settings: ControllerSettings,
        outbound: mpsc::UnboundedSender<ServerMessage>,
    ) -> Self {
        let tick_seconds = settings.tick_interval.as_secs_f64();
        Self {
            session: Arc::new(Mutex::new(GameSession::with_tick_seconds(tick_seconds))),
            timer: Mutex::new(TickTimer::new()),
            targets: Mutex::new(targets),
            board: LeaderboardSync {
                store: leaderboard,
                cache: Arc::new(RwLock::new(LeaderboardCache::new())),
                limit: settings.leaderboard_limit,
                timeout: settings.store_timeout,
                outbound: outbound.clone(),
            },
            commentary,
            settings,
            outbound,
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.lock().await.snapshot()
    }

    pub async fn send_state(&self) {
        let state = self.snapshot().await;
        self.send(ServerMessage::StateUpdate { state });
    }

    pub async fn is_timer_running(&self) -> bool {
        self.timer.lock().await.is_running()
    }

    pub async fn start_game(&self, player_name: &str) -> Result<SessionSnapshot, GameError> {
        let state = {
            let mut session = self.session.lock().await;
            let mut targets = self.targets.lock().await;
            session.start_game(player_name, &mut **targets)?;

            let clock = self.session.clone();
            self.timer
                .lock()
                .await
                .start(self.settings.tick_interval, move || {
                    let clock = clock.clone();
                    async move {
                        clock.lock().await.tick();
                    }
                });

            session.snapshot()
        };

        info!(
            "Game started for {}",
            state.player_name.as_deref().unwrap_or_default()
        );
        self.send(ServerMessage::GameStarted {
            state: state.clone(),
            announcement: START_ANNOUNCEMENT.to_string(),
        });
        Ok(state)
    }

    /// Validate and evaluate raw guess input.
    ///
    /// Returns as soon as the verdict is known. Commentary and saving a
    /// finished game both run in the background.
    pub async fn submit_guess(&self, raw: &str) -> Result<GameEvent, GameError> {
        let value = parse_guess(raw)?;
        let best = self.board.cache.read().await.best();

        let (event, state, history, player_name) = {
            let mut session = self.session.lock().await;
            let event = session.submit_guess(value, best.as_ref())?;
            if event.is_finish() {
                self.timer.lock().await.cancel();
            }
            (
                event,
                session.snapshot(),
                session.history_values(),
                session.player_name().unwrap_or_default().to_string(),
            )
        };

        if let Some(guess) = event.guess() {
            self.send(ServerMessage::GuessEvaluated {
                guess: guess.clone(),
                announcement: guess.verdict.announcement().to_string(),
                state,
            });
            self.spawn_commentary(
                guess.id,
                CommentaryRequest {
                    guess: guess.value,
                    verdict: guess.verdict,
                    history,
                },
            );
        }

        if let GameEvent::GameFinished { result, .. } = &event {
            self.spawn_record(player_name, *result);
        }

        Ok(event)
    }

    /// Leave the current session, whatever its state, and reload the board.
    pub async fn reset_to_lobby(&self) {
        let event = {
            let mut session = self.session.lock().await;
            self.timer.lock().await.cancel();
            session.reset_to_lobby()
        };

        if let GameEvent::ReturnedToLobby { abandoned: true } = event {
            info!("Session abandoned before finishing");
        }
        self.send(ServerMessage::ReturnedToLobby);
        self.refresh_leaderboard().await;
    }

    /// Reload the cached top entries. A failing or slow store leaves the old
    /// entries in place and reports a warning instead.
    pub async fn refresh_leaderboard(&self) {
        self.board.refresh().await;
    }

    /// Stop the session clock. Used when the connection goes away.
    pub async fn shutdown(&self) {
        if self.timer.lock().await.cancel() {
            debug!("Cancelled running session timer on shutdown");
        }
    }

    fn spawn_record(&self, player_name: String, result: FinishedGame) {
        let board = self.board.clone();
        tokio::spawn(async move {
            board.record(player_name, result).await;
        });
    }

    fn spawn_commentary(&self, guess_id: GuessId, request: CommentaryRequest) {
        let session = self.session.clone();
        let provider = self.commentary.clone();
        let outbound = self.outbound.clone();
        let timeout = self.settings.commentary_timeout;

        tokio::spawn(async move {
            let commentary = comment_or_fallback(provider.as_ref(), &request, timeout).await;

            // Matched by id: a reset or a newer guess never receives this text
            if !session
                .lock()
                .await
                .attach_commentary(guess_id, commentary.clone())
            {
                debug!("Discarding commentary for stale guess {}", guess_id);
                return;
            }

            let _ = outbound.send(ServerMessage::CommentaryReady {
                guess_id,
                verdict: request.verdict,
                commentary,
            });
        });
    }

    fn send(&self, message: ServerMessage) {
        if self.outbound.send(message).is_err() {
            debug!("Dropping message for closed connection");
        }
    }
}

/// Shared handle to the store and this session's cached view of it.
///
/// Every store call is bounded by `timeout`.
#[derive(Clone)]
struct LeaderboardSync {
    store: Arc<dyn LeaderboardStore>,
    cache: Arc<RwLock<LeaderboardCache>>,
    limit: u64,
    timeout: Duration,
    outbound: mpsc::UnboundedSender<ServerMessage>,
}

impl LeaderboardSync {
    async fn refresh(&self) {
        let fetched = tokio::time::timeout(self.timeout, self.store.fetch_top(self.limit))
            .await
            .unwrap_or(Err(LeaderboardError::Timeout));

        let (entries, warning) = {
            let mut cache = self.cache.write().await;
            match fetched {
                Ok(entries) => cache.replace(entries),
                Err(e) => {
                    warn!("Failed to fetch leaderboard: {}", e);
                    cache.mark_stale(format!("Leaderboard unavailable: {}", e));
                }
            }
            (
                cache.entries().to_vec(),
                cache.warning().map(str::to_string),
            )
        };

        let _ = self
            .outbound
            .send(ServerMessage::LeaderboardUpdate { entries, warning });
    }

    async fn record(&self, player_name: String, result: FinishedGame) {
        let entry = NewLeaderboardEntry {
            player_name,
            attempts: result.attempts,
            time_seconds: result.time_seconds,
        };

        let inserted = tokio::time::timeout(self.timeout, self.store.insert(entry))
            .await
            .unwrap_or(Err(LeaderboardError::Timeout));

        let saved = match inserted {
            Ok(stored) => {
                info!(
                    "Recorded {} in {} attempts ({:.2}s)",
                    stored.player_name, stored.attempts, stored.time_seconds
                );
                true
            }
            Err(e) => {
                warn!("Failed to save result: {}", e);
                false
            }
        };

        let _ = self.outbound.send(ServerMessage::GameFinished {
            attempts: result.attempts,
            time_seconds: result.time_seconds,
            is_new_record: result.is_new_record,
            saved,
        });
        self.refresh().await;
    }
}
