//! Database row models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A viewer row from the `viewers` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerRow {
    /// Stable user identifier (primary key).
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Persisted point total.
    pub points: i64,
    /// Cached level at write time.
    pub level: i32,
    /// Last write-through timestamp.
    pub updated_at: DateTime<Utc>,
}
