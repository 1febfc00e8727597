use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, DbErr, EntityTrait, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::entities::{game_leaderboard, prelude::*};
use game_core::{LeaderboardError, LeaderboardStore};
use game_types::{LeaderboardEntry, NewLeaderboardEntry};

pub struct LeaderboardRepository {
    db: DatabaseConnection,
}

impl LeaderboardRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_entry(model: game_leaderboard::Model) -> LeaderboardEntry {
        LeaderboardEntry {
            id: model.id,
            player_name: model.player_name,
            attempts: u32::try_from(model.attempts).unwrap_or(0),
            time_seconds: model.time_seconds,
            created_at: model.created_at.to_rfc3339(),
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<LeaderboardEntry>> {
        let model = GameLeaderboard::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Self::model_to_entry))
    }

    /// Best results first: fewest attempts, then shortest time.
    pub async fn get_top(&self, limit: u64) -> Result<Vec<LeaderboardEntry>> {
        let models = GameLeaderboard::find()
            .order_by_asc(game_leaderboard::Column::Attempts)
            .order_by_asc(game_leaderboard::Column::TimeSeconds)
            .order_by_asc(game_leaderboard::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Self::model_to_entry).collect())
    }

    pub async fn create_entry(&self, entry: NewLeaderboardEntry) -> Result<LeaderboardEntry> {
        let attempts = i32::try_from(entry.attempts)?;
        if attempts < 1 {
            anyhow::bail!("Attempts must be positive, got {}", attempts);
        }
        if !entry.time_seconds.is_finite() || entry.time_seconds < 0.0 {
            anyhow::bail!("Invalid time: {}", entry.time_seconds);
        }

        let model = game_leaderboard::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            player_name: ActiveValue::Set(entry.player_name),
            attempts: ActiveValue::Set(attempts),
            time_seconds: ActiveValue::Set(entry.time_seconds),
            created_at: ActiveValue::Set(chrono::Utc::now().into()),
        };

        let saved = GameLeaderboard::insert(model).exec(&self.db).await?;

        // Fetch the stored row
        let created = GameLeaderboard::find_by_id(saved.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created leaderboard entry"))?;

        Ok(Self::model_to_entry(created))
    }
}

fn to_store_error(err: anyhow::Error) -> LeaderboardError {
    match err.downcast_ref::<DbErr>() {
        Some(DbErr::Exec(_)) | Some(DbErr::Query(_)) | Some(DbErr::Type(_)) => {
            LeaderboardError::Schema(err.to_string())
        }
        _ => LeaderboardError::Connectivity(err.to_string()),
    }
}

#[async_trait]
impl LeaderboardStore for LeaderboardRepository {
    async fn fetch_top(&self, limit: u64) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        self.get_top(limit).await.map_err(to_store_error)
    }

    async fn insert(
        &self,
        entry: NewLeaderboardEntry,
    ) -> Result<LeaderboardEntry, LeaderboardError> {
        self.create_entry(entry).await.map_err(to_store_error)
    }
}
