//! PostgreSQL implementation of the persistence layer.
//!
//! Write-through only: the in-memory ledgers remain authoritative at
//! runtime, the database keeps sessions and viewer totals across
//! restarts and feeds the append-only event log.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::ViewerRow;
use crate::error::FanstageError;
use crate::session::SessionRecord;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts a session record.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::PersistenceError`] on database failure.
    pub async fn save_session(&self, record: &SessionRecord) -> Result<(), FanstageError> {
        sqlx::query(
            "INSERT INTO sessions (session_id, user_id, username, role, created_at, last_active, expires_at, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (session_id) DO UPDATE SET last_active = $6, active = $8",
        )
        .bind(&record.session_id)
        .bind(&record.user_id)
        .bind(&record.username)
        .bind(record.role.as_str())
        .bind(record.created_at)
        .bind(record.last_active)
        .bind(record.expires_at)
        .bind(record.active)
        .execute(&self.pool)
        .await
        .map_err(|e| FanstageError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Marks a session inactive.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::PersistenceError`] on database failure.
    pub async fn deactivate_session(&self, session_id: &str) -> Result<(), FanstageError> {
        sqlx::query("UPDATE sessions SET active = FALSE, last_active = NOW() WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| FanstageError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Deletes sessions past expiry and logged-out sessions idle since
    /// before `stale_cutoff`. Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::PersistenceError`] on database failure.
    pub async fn delete_expired_sessions(
        &self,
        now: DateTime<Utc>,
        stale_cutoff: DateTime<Utc>,
    ) -> Result<u64, FanstageError> {
        let result = sqlx::query(
            "DELETE FROM sessions WHERE expires_at <= $1 OR (active = FALSE AND last_active < $2)",
        )
        .bind(now)
        .bind(stale_cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| FanstageError::PersistenceError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// Writes a viewer's current total through to the `viewers` table.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::PersistenceError`] on database failure.
    pub async fn upsert_viewer(
        &self,
        user_id: &str,
        username: &str,
        points: i64,
        level: u32,
    ) -> Result<(), FanstageError> {
        sqlx::query(
            "INSERT INTO viewers (user_id, username, points, level, updated_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             ON CONFLICT (user_id) DO UPDATE SET username = $2, points = $3, level = $4, updated_at = NOW()",
        )
        .bind(user_id)
        .bind(username)
        .bind(points)
        .bind(i64::from(level))
        .execute(&self.pool)
        .await
        .map_err(|e| FanstageError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Loads all persisted viewers for warm start.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::PersistenceError`] on database failure.
    pub async fn load_viewers(&self) -> Result<Vec<ViewerRow>, FanstageError> {
        let rows = sqlx::query_as::<_, (String, String, i64, i64, DateTime<Utc>)>(
            "SELECT user_id, username, points, level, updated_at FROM viewers",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| FanstageError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(user_id, username, points, level, updated_at)| ViewerRow {
                user_id,
                username,
                points,
                #[allow(clippy::cast_possible_truncation)]
                level: level as i32,
                updated_at,
            })
            .collect())
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, FanstageError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (event_type, payload) VALUES ($1, $2) RETURNING id",
        )
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| FanstageError::PersistenceError(e.to_string()))?;

        Ok(row)
    }
}
