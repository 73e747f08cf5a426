//! Postgres-backed [`RecordStore`].
//!
//! Queries are built at runtime (`sqlx::query_as` + binds) and rows are
//! decoded into the typed models once, here. Composite writes run inside a
//! single transaction.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::models::{MatchRecord, NewMatch, Participant, StatLine};
use crate::db::store::RecordStore;
use crate::error::LadderResult;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Raw `games` row; side/outcome are parsed into enums on decode.
#[derive(FromRow)]
struct MatchRow {
    id: Uuid,
    community_id: i64,
    p1_id: Uuid,
    p2_id: Uuid,
    p1_side: String,
    outcome: String,
    note: Option<String>,
    created_at: DateTime<Utc>,
}

impl MatchRow {
    fn decode(self) -> anyhow::Result<MatchRecord> {
        Ok(MatchRecord {
            id: self.id,
            community_id: self.community_id,
            p1_id: self.p1_id,
            p2_id: self.p2_id,
            p1_side: self.p1_side.parse()?,
            outcome: self.outcome.parse()?,
            note: self.note,
            created_at: self.created_at,
        })
    }
}

const PLAYER_COLS: &str =
    "id, community_id, external_id, name, elo, wins, losses, draws, games_played, created_at";
const GAME_COLS: &str = "id, community_id, p1_id, p2_id, p1_side, outcome, note, created_at";

impl PgStore {
    /// Connect a small pool and run embedded migrations.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("connecting to Postgres")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
        Ok(PgStore { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// UPDATE statement shared by the incremental and replay paths.
const UPDATE_STATS: &str = "UPDATE players
        SET elo = $1, wins = $2, losses = $3, draws = $4, games_played = $5
      WHERE id = $6";

fn bind_stats<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    line: &StatLine,
    id: Uuid,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(line.elo)
        .bind(line.wins)
        .bind(line.losses)
        .bind(line.draws)
        .bind(line.games_played)
        .bind(id)
}

#[async_trait]
impl RecordStore for PgStore {
    async fn create_participant(
        &self,
        community: i64,
        external_id: i64,
        name: &str,
        elo: i32,
    ) -> LadderResult<Participant> {
        let id = Uuid::new_v4();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO players (id, community_id, external_id, name, elo)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING created_at",
        )
        .bind(id)
        .bind(community)
        .bind(external_id)
        .bind(name)
        .bind(elo)
        .fetch_one(&self.pool)
        .await
        .context("inserting participant")?;

        Ok(Participant {
            id,
            community_id: community,
            external_id,
            name: name.to_owned(),
            elo,
            wins: 0,
            losses: 0,
            draws: 0,
            games_played: 0,
            created_at,
        })
    }

    async fn participant_by_id(&self, id: Uuid) -> LadderResult<Option<Participant>> {
        let row = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PLAYER_COLS} FROM players WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("fetching participant by id")?;
        Ok(row)
    }

    async fn participant_by_external(
        &self,
        community: i64,
        external_id: i64,
    ) -> LadderResult<Option<Participant>> {
        let row = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PLAYER_COLS} FROM players WHERE community_id = $1 AND external_id = $2"
        ))
        .bind(community)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .context("fetching participant by external id")?;
        Ok(row)
    }

    async fn participant_by_name(
        &self,
        community: i64,
        name: &str,
    ) -> LadderResult<Option<Participant>> {
        let row = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PLAYER_COLS} FROM players WHERE community_id = $1 AND name = $2"
        ))
        .bind(community)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("fetching participant by name")?;
        Ok(row)
    }

    async fn participants_ranked(&self, community: i64) -> LadderResult<Vec<Participant>> {
        let rows = sqlx::query_as::<_, Participant>(&format!(
            "SELECT {PLAYER_COLS} FROM players
              WHERE community_id = $1
              ORDER BY elo DESC, created_at ASC, id ASC"
        ))
        .bind(community)
        .fetch_all(&self.pool)
        .await
        .context("fetching ranked participants")?;
        Ok(rows)
    }

    async fn set_rating(&self, community: i64, id: Uuid, elo: i32) -> LadderResult<bool> {
        let result = sqlx::query("UPDATE players SET elo = $1 WHERE community_id = $2 AND id = $3")
            .bind(elo)
            .bind(community)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("overriding rating")?;
        Ok(result.rows_affected() > 0)
    }

    async fn rename_participant(
        &self,
        community: i64,
        id: Uuid,
        name: &str,
    ) -> LadderResult<bool> {
        let result =
            sqlx::query("UPDATE players SET name = $1 WHERE community_id = $2 AND id = $3")
                .bind(name)
                .bind(community)
                .bind(id)
                .execute(&self.pool)
                .await
                .context("renaming participant")?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_participant(&self, community: i64, id: Uuid) -> LadderResult<bool> {
        // games rows cascade via the FK
        let result = sqlx::query("DELETE FROM players WHERE community_id = $1 AND id = $2")
            .bind(community)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("removing participant")?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_match(
        &self,
        m: NewMatch,
        p1: (Uuid, StatLine),
        p2: (Uuid, StatLine),
    ) -> LadderResult<MatchRecord> {
        let mut tx = self.pool.begin().await.context("opening transaction")?;

        let id = Uuid::new_v4();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO games (id, community_id, p1_id, p2_id, p1_side, outcome, note)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING created_at",
        )
        .bind(id)
        .bind(m.community_id)
        .bind(m.p1_id)
        .bind(m.p2_id)
        .bind(m.p1_side.as_str())
        .bind(m.outcome.as_str())
        .bind(&m.note)
        .fetch_one(&mut *tx)
        .await
        .context("appending match")?;

        for (pid, line) in [p1, p2] {
            bind_stats(sqlx::query(UPDATE_STATS), &line, pid)
                .execute(&mut *tx)
                .await
                .context("updating stats")?;
        }

        tx.commit().await.context("committing match")?;

        Ok(MatchRecord {
            id,
            community_id: m.community_id,
            p1_id: m.p1_id,
            p2_id: m.p2_id,
            p1_side: m.p1_side,
            outcome: m.outcome,
            note: m.note,
            created_at,
        })
    }

    async fn match_by_id(&self, community: i64, id: Uuid) -> LadderResult<Option<MatchRecord>> {
        let row = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {GAME_COLS} FROM games WHERE community_id = $1 AND id = $2"
        ))
        .bind(community)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("fetching match")?;
        Ok(row.map(MatchRow::decode).transpose()?)
    }

    async fn delete_match(&self, community: i64, id: Uuid) -> LadderResult<bool> {
        let result = sqlx::query("DELETE FROM games WHERE community_id = $1 AND id = $2")
            .bind(community)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("deleting match")?;
        Ok(result.rows_affected() > 0)
    }

    async fn matches_chronological(&self, community: i64) -> LadderResult<Vec<MatchRecord>> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {GAME_COLS} FROM games
              WHERE community_id = $1
              ORDER BY created_at ASC, id ASC"
        ))
        .bind(community)
        .fetch_all(&self.pool)
        .await
        .context("fetching chronological history")?;
        rows.into_iter()
            .map(|r| r.decode().map_err(Into::into))
            .collect()
    }

    async fn matches_recent(
        &self,
        community: i64,
        participant: Option<Uuid>,
        limit: i64,
    ) -> LadderResult<Vec<MatchRecord>> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {GAME_COLS} FROM games
              WHERE community_id = $1
                AND ($2::uuid IS NULL OR p1_id = $2 OR p2_id = $2)
              ORDER BY created_at DESC, id DESC
              LIMIT $3"
        ))
        .bind(community)
        .bind(participant)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("fetching recent matches")?;
        rows.into_iter()
            .map(|r| r.decode().map_err(Into::into))
            .collect()
    }

    async fn write_standings(
        &self,
        community: i64,
        rows: &[(Uuid, StatLine)],
    ) -> LadderResult<()> {
        // Rows always originate from this community's own history; the id
        // is the primary key, so no extra scoping predicate is needed.
        let _ = community;
        let mut tx = self.pool.begin().await.context("opening transaction")?;
        for (pid, line) in rows {
            bind_stats(sqlx::query(UPDATE_STATS), line, *pid)
                .execute(&mut *tx)
                .await
                .context("writing replayed stats")?;
        }
        tx.commit().await.context("committing replay batch")?;
        Ok(())
    }

    async fn communities(&self) -> LadderResult<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT DISTINCT community_id FROM players ORDER BY community_id",
        )
        .fetch_all(&self.pool)
        .await
        .context("listing communities")?;
        Ok(ids)
    }
}
