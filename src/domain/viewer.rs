//! Viewer profile: points, derived level, and badges.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Ascending point thresholds; a viewer's level is the number of
/// thresholds at or below their total.
pub const LEVEL_THRESHOLDS: [i64; 10] = [
    0, 100, 250, 500, 1_000, 2_000, 4_000, 8_000, 15_000, 30_000,
];

/// Derives the level for a point total against [`LEVEL_THRESHOLDS`].
/// Monotonic: more points never means a lower level.
#[must_use]
pub fn level_for_points(points: i64) -> u32 {
    let mut level = 0u32;
    for threshold in LEVEL_THRESHOLDS {
        if points >= threshold {
            level = level.saturating_add(1);
        }
    }
    level
}

/// A registered viewer with the authoritative running point total.
///
/// `points` is the source of truth. `level` is a cached derivation and
/// is recomputed whenever points change; rank is never stored at all,
/// it is derived on read by the engagement ledger.
#[derive(Debug, Clone)]
pub struct Viewer {
    /// Stable user identifier.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Authoritative running point total.
    pub points: i64,
    /// Cached level derived from `points`.
    pub level: u32,
    /// Earned badge names.
    pub badges: BTreeSet<String>,
    /// First-seen timestamp.
    pub created_at: DateTime<Utc>,
    /// Last interaction timestamp.
    pub last_active: DateTime<Utc>,
}

impl Viewer {
    /// Creates a fresh viewer with zero points and level 1.
    #[must_use]
    pub fn new(user_id: String, username: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            username,
            points: 0,
            level: level_for_points(0),
            badges: BTreeSet::new(),
            created_at: now,
            last_active: now,
        }
    }

    /// Applies a point delta and recomputes the cached level.
    /// Balance checks are the ledger's job; this only mutates.
    pub fn apply_delta(&mut self, delta: i64) {
        self.points = self.points.saturating_add(delta);
        self.level = level_for_points(self.points);
        self.last_active = Utc::now();
    }

    /// Public view of this viewer.
    #[must_use]
    pub fn view(&self) -> ViewerView {
        ViewerView {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            points: self.points,
            level: self.level,
            badges: self.badges.iter().cloned().collect(),
            created_at: self.created_at,
            last_active: self.last_active,
        }
    }
}

/// Serializable viewer profile for API responses and events.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerView {
    /// Stable user identifier.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Current point total.
    pub points: i64,
    /// Derived level.
    pub level: u32,
    /// Earned badge names, sorted.
    pub badges: Vec<String>,
    /// First-seen timestamp.
    pub created_at: DateTime<Utc>,
    /// Last interaction timestamp.
    pub last_active: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_monotonic_in_points() {
        let mut last = 0;
        for points in [0, 50, 100, 600, 5_000, 100_000] {
            let level = level_for_points(points);
            assert!(level >= last, "level dropped at {points} points");
            last = level;
        }
    }

    #[test]
    fn zero_points_is_level_one() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(-10), 0);
    }

    #[test]
    fn apply_delta_recomputes_level() {
        let mut viewer = Viewer::new("user-1".to_string(), "ada".to_string());
        viewer.apply_delta(1_200);
        assert_eq!(viewer.points, 1_200);
        assert_eq!(viewer.level, level_for_points(1_200));

        viewer.apply_delta(-1_150);
        assert_eq!(viewer.points, 50);
        assert_eq!(viewer.level, level_for_points(50));
    }
}
