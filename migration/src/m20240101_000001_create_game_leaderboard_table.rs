use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameLeaderboard::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameLeaderboard::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GameLeaderboard::PlayerName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GameLeaderboard::Attempts)
                            .integer()
                            .not_null()
                            .check(Expr::col(GameLeaderboard::Attempts).gt(0)),
                    )
                    .col(
                        ColumnDef::new(GameLeaderboard::TimeSeconds)
                            .double()
                            .not_null()
                            .check(Expr::col(GameLeaderboard::TimeSeconds).gte(0)),
                    )
                    .col(
                        ColumnDef::new(GameLeaderboard::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Ranking query sorts by attempts, then time
        manager
            .create_index(
                Index::create()
                    .name("idx_game_leaderboard_ranking")
                    .table(GameLeaderboard::Table)
                    .col(GameLeaderboard::Attempts)
                    .col(GameLeaderboard::TimeSeconds)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameLeaderboard::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GameLeaderboard {
    Table,
    Id,
    PlayerName,
    Attempts,
    TimeSeconds,
    CreatedAt,
}
