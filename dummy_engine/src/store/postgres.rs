//! PostgreSQL event log. Schema lives in `migrations/001_dummy_schema.sql`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow, types::Json};
use std::collections::BTreeMap;

use super::{
    CommitBatch, EventLog, GameRecord, StoreError, StoreResult,
    timeouts::{DEFAULT_TRANSACTION_TIMEOUT, LONG_OPERATION_TIMEOUT, with_default_timeout, with_timeout},
};
use crate::game::{
    scoring::{GameResult, GameResultPlayerSummary, ScoreEvent},
    session::{MoveRecord, SessionId, SessionStart, SessionStatus},
};

pub struct PgEventLog {
    pool: PgPool,
}

impl PgEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_record(&self, session_id: SessionId) -> StoreResult<GameRecord> {
        let row = sqlx::query(
            "SELECT room_id, players, rules, deck_order, status, status_reason, started_at
             FROM dummy_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::SessionNotFound(session_id))?;

        let start = SessionStart {
            session_id,
            room_id: row.try_get("room_id")?,
            players: row.try_get::<Json<_>, _>("players")?.0,
            rules: row.try_get::<Json<_>, _>("rules")?.0,
            deck_order: row.try_get::<Json<_>, _>("deck_order")?.0,
            started_at: row.try_get("started_at")?,
        };
        let status = parse_status(row.try_get("status")?, row.try_get("status_reason")?);

        let mut events: BTreeMap<u64, Vec<ScoreEvent>> = BTreeMap::new();
        let event_rows = sqlx::query(
            "SELECT gamer_id, event_type, points, related_meld_id, related_card_ids, move_number, created_at
             FROM dummy_score_events WHERE session_id = $1 ORDER BY id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        for row in &event_rows {
            let event = score_event_from_row(row)?;
            events.entry(event.move_number).or_default().push(event);
        }

        let mut result = self.load_result(session_id).await?;
        let move_rows = sqlx::query(
            "SELECT move_number, gamer_id, action, forced, created_at
             FROM dummy_moves WHERE session_id = $1 ORDER BY move_number",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let mut moves = Vec::with_capacity(move_rows.len());
        for row in &move_rows {
            let record = MoveRecord {
                move_number: row.try_get::<i64, _>("move_number")? as u64,
                gamer_id: row.try_get("gamer_id")?,
                action: row.try_get::<Json<_>, _>("action")?.0,
                forced: row.try_get("forced")?,
                at: row.try_get("created_at")?,
            };
            let settled_here = result
                .as_ref()
                .is_some_and(|r| r.move_count == record.move_number);
            moves.push(CommitBatch {
                events: events.remove(&record.move_number).unwrap_or_default(),
                result: if settled_here { result.take() } else { None },
                record,
            });
        }

        Ok(GameRecord {
            start,
            moves,
            status,
        })
    }

    async fn load_result(&self, session_id: SessionId) -> StoreResult<Option<GameResult>> {
        let Some(row) = sqlx::query(
            "SELECT room_id, winner_id, winning_type, move_count, finished_at
             FROM dummy_game_results WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let player_rows = sqlx::query(
            "SELECT gamer_id, meld_points, bonus_points, penalty_points, hand_points,
                    total_points, is_winner, remaining_cards
             FROM dummy_game_result_players WHERE session_id = $1 ORDER BY seat",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let mut players = Vec::with_capacity(player_rows.len());
        for p in &player_rows {
            players.push(GameResultPlayerSummary {
                gamer_id: p.try_get("gamer_id")?,
                meld_points: p.try_get("meld_points")?,
                bonus_points: p.try_get("bonus_points")?,
                penalty_points: p.try_get("penalty_points")?,
                hand_points: p.try_get("hand_points")?,
                total_points: p.try_get("total_points")?,
                is_winner: p.try_get("is_winner")?,
                remaining_cards: p.try_get::<Json<_>, _>("remaining_cards")?.0,
            });
        }

        Ok(Some(GameResult {
            session_id,
            room_id: row.try_get("room_id")?,
            winner_id: row.try_get("winner_id")?,
            winning_type: parse_label(row.try_get("winning_type")?)?,
            move_count: row.try_get::<i64, _>("move_count")? as u64,
            finished_at: row.try_get("finished_at")?,
            players,
        }))
    }
}

#[async_trait]
impl EventLog for PgEventLog {
    async fn append_start(&self, start: &SessionStart) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "INSERT INTO dummy_sessions (id, room_id, players, rules, deck_order, status, started_at)
                 VALUES ($1, $2, $3, $4, $5, 'active', $6)",
            )
            .bind(start.session_id)
            .bind(&start.room_id)
            .bind(Json(&start.players))
            .bind(Json(&start.rules))
            .bind(Json(&start.deck_order))
            .bind(start.started_at)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn append(&self, session_id: SessionId, batch: &CommitBatch) -> StoreResult<()> {
        let move_number = batch.record.move_number;
        let written = with_timeout(DEFAULT_TRANSACTION_TIMEOUT, async {
            let mut tx = self.pool.begin().await?;

            // Row lock serializes concurrent appends for this session.
            sqlx::query("SELECT id FROM dummy_sessions WHERE id = $1 FOR UPDATE")
                .bind(session_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::SessionNotFound(session_id))?;
            let last: i64 =
                sqlx::query_scalar("SELECT COALESCE(MAX(move_number), 0) FROM dummy_moves WHERE session_id = $1")
                    .bind(session_id)
                    .fetch_one(&mut *tx)
                    .await?;
            let expected = last as u64 + 1;
            if move_number < expected {
                return Err(StoreError::DuplicateMove {
                    session_id,
                    move_number,
                });
            }
            if move_number > expected {
                return Err(StoreError::MoveGap {
                    session_id,
                    expected,
                    found: move_number,
                });
            }

            sqlx::query(
                "INSERT INTO dummy_moves (session_id, move_number, gamer_id, action, forced, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(session_id)
            .bind(move_number as i64)
            .bind(batch.record.gamer_id)
            .bind(Json(&batch.record.action))
            .bind(batch.record.forced)
            .bind(batch.record.at)
            .execute(&mut *tx)
            .await?;

            for event in &batch.events {
                sqlx::query(
                    "INSERT INTO dummy_score_events
                        (session_id, move_number, gamer_id, event_type, points,
                         related_meld_id, related_card_ids, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                )
                .bind(session_id)
                .bind(event.move_number as i64)
                .bind(event.gamer_id)
                .bind(event.event_type.to_string())
                .bind(event.points)
                .bind(event.related_meld_id.map(|id| id as i32))
                .bind(Json(&event.related_card_ids))
                .bind(event.timestamp)
                .execute(&mut *tx)
                .await?;
            }

            if let Some(result) = &batch.result {
                insert_result(&mut tx, result).await?;
            }

            tx.commit().await?;
            Ok::<_, StoreError>(())
        })
        .await;

        match written {
            Err(StoreError::Database(sqlx::Error::Database(db))) if db.is_unique_violation() => {
                Err(StoreError::DuplicateMove {
                    session_id,
                    move_number,
                })
            }
            other => other,
        }
    }

    async fn set_status(&self, session_id: SessionId, status: &SessionStatus) -> StoreResult<()> {
        let (label, reason) = status_label(status);
        let updated = with_default_timeout(
            sqlx::query("UPDATE dummy_sessions SET status = $2, status_reason = $3 WHERE id = $1")
                .bind(session_id)
                .bind(label)
                .bind(reason)
                .execute(&self.pool),
        )
        .await?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::SessionNotFound(session_id));
        }
        Ok(())
    }

    async fn load(&self, session_id: SessionId) -> StoreResult<GameRecord> {
        with_timeout(LONG_OPERATION_TIMEOUT, self.load_record(session_id)).await
    }

    async fn active_sessions(&self) -> StoreResult<Vec<SessionId>> {
        let rows = with_default_timeout(
            sqlx::query("SELECT id FROM dummy_sessions WHERE status = 'active' ORDER BY started_at")
                .fetch_all(&self.pool),
        )
        .await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            ids.push(row.try_get("id")?);
        }
        Ok(ids)
    }
}

async fn insert_result(
    tx: &mut Transaction<'_, Postgres>,
    result: &GameResult,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO dummy_game_results (session_id, room_id, winner_id, winning_type, move_count, finished_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(result.session_id)
    .bind(&result.room_id)
    .bind(result.winner_id)
    .bind(result.winning_type.to_string())
    .bind(result.move_count as i64)
    .bind(result.finished_at)
    .execute(&mut **tx)
    .await?;

    for (seat, player) in result.players.iter().enumerate() {
        sqlx::query(
            "INSERT INTO dummy_game_result_players
                (session_id, gamer_id, seat, meld_points, bonus_points, penalty_points,
                 hand_points, total_points, is_winner, remaining_cards)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(result.session_id)
        .bind(player.gamer_id)
        .bind(seat as i32)
        .bind(player.meld_points)
        .bind(player.bonus_points)
        .bind(player.penalty_points)
        .bind(player.hand_points)
        .bind(player.total_points)
        .bind(player.is_winner)
        .bind(Json(&player.remaining_cards))
        .execute(&mut **tx)
        .await?;
    }

    sqlx::query("UPDATE dummy_sessions SET status = 'finished', finished_at = $2 WHERE id = $1")
        .bind(result.session_id)
        .bind(result.finished_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn score_event_from_row(row: &PgRow) -> StoreResult<ScoreEvent> {
    Ok(ScoreEvent {
        gamer_id: row.try_get("gamer_id")?,
        event_type: parse_label(row.try_get("event_type")?)?,
        points: row.try_get("points")?,
        related_meld_id: row
            .try_get::<Option<i32>, _>("related_meld_id")?
            .map(|id| id as u32),
        related_card_ids: row.try_get::<Json<_>, _>("related_card_ids")?.0,
        move_number: row.try_get::<i64, _>("move_number")? as u64,
        timestamp: row.try_get("created_at")?,
    })
}

/// Reads a snake_case enum label stored as TEXT.
fn parse_label<T: DeserializeOwned>(label: String) -> StoreResult<T> {
    Ok(serde_json::from_value(serde_json::Value::String(label))?)
}

fn status_label(status: &SessionStatus) -> (&'static str, Option<&str>) {
    match status {
        SessionStatus::Active => ("active", None),
        SessionStatus::Finished => ("finished", None),
        SessionStatus::Errored { reason } => ("errored", Some(reason.as_str())),
    }
}

fn parse_status(label: String, reason: Option<String>) -> SessionStatus {
    match label.as_str() {
        "finished" => SessionStatus::Finished,
        "errored" => SessionStatus::Errored {
            reason: reason.unwrap_or_default(),
        },
        _ => SessionStatus::Active,
    }
}
