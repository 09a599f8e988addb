//! Session issuance, verification, and lifecycle.
//!
//! Tokens are HS256 JWTs carrying the session id. Verification is a
//! two-step check: signature and token expiry first, then a live lookup
//! that the referenced session record is still active — a token that is
//! still cryptographically valid dies the moment the session is
//! invalidated server-side.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::FanstageError;
use crate::persistence::PostgresPersistence;

/// Name of the HTTP-only session cookie.
pub const SESSION_COOKIE: &str = "fanstage_session";

/// Days a logged-out session record is kept before the sweep deletes it.
const STALE_AFTER_DAYS: i64 = 30;

/// Role attached to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular viewer.
    Viewer,
    /// Site administrator.
    Admin,
}

impl Role {
    /// Wire name of this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Admin => "admin",
        }
    }
}

/// JWT claims embedded in a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: String,
    /// Session id referencing the server-side record.
    pub sid: String,
    /// Display name at login time.
    pub username: String,
    /// Role at login time.
    pub role: Role,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Server-side session record; the live authority for verification.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    /// Unique session id (UUID v4).
    pub session_id: String,
    /// Owning user.
    pub user_id: String,
    /// Display name at login time.
    pub username: String,
    /// Role at login time.
    pub role: Role,
    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
    /// Touched on every verified call.
    pub last_active: DateTime<Utc>,
    /// Hard expiry; the record is invalid past this point regardless
    /// of activity.
    pub expires_at: DateTime<Utc>,
    /// Cleared on logout.
    pub active: bool,
}

/// Verified caller identity handed to request handlers.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session id.
    pub session_id: String,
    /// User id.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Role.
    pub role: Role,
}

/// Issues, verifies, and invalidates session tokens.
///
/// The in-memory record map is the authority; when persistence is
/// enabled, records are written through so admin tooling can inspect
/// them, but verification never blocks on the database.
pub struct SessionStore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    sessions: RwLock<HashMap<String, SessionRecord>>,
    persistence: Option<Arc<PostgresPersistence>>,
}

// Manual impl: the signing keys carry secret material and have no
// Debug of their own.
impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates a store with the given HS256 secret and TTL in days.
    #[must_use]
    pub fn new(secret: &[u8], ttl_days: i64, persistence: Option<Arc<PostgresPersistence>>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::days(ttl_days.max(1)),
            sessions: RwLock::new(HashMap::new()),
            persistence,
        }
    }

    /// Issues a new session: persists a record with the configured TTL
    /// and returns a signed token embedding the session id.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::Internal`] if token signing fails, or
    /// [`FanstageError::PersistenceError`] if the write-through fails —
    /// fatal to this request, not to the process.
    pub async fn create_session(
        &self,
        user_id: &str,
        username: &str,
        role: Role,
    ) -> Result<(String, SessionRecord), FanstageError> {
        let now = Utc::now();
        let record = SessionRecord {
            session_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            role,
            created_at: now,
            last_active: now,
            expires_at: now + self.ttl,
            active: true,
        };

        let claims = Claims {
            sub: record.user_id.clone(),
            sid: record.session_id.clone(),
            username: record.username.clone(),
            role,
            iat: now.timestamp(),
            exp: record.expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| FanstageError::Internal(format!("token signing failed: {e}")))?;

        if let Some(persistence) = &self.persistence {
            persistence.save_session(&record).await?;
        }

        let mut sessions = self.sessions.write().await;
        sessions.insert(record.session_id.clone(), record.clone());
        tracing::debug!(user_id, session_id = %record.session_id, "session created");

        Ok((token, record))
    }

    /// Verifies a token. Returns `None`, never an error, on signature
    /// mismatch, token expiry, or a missing/inactive/expired record.
    /// Touches `last_active` on success.
    pub async fn verify_session(&self, token: &str) -> Option<SessionInfo> {
        let validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).ok()?;
        let sid = data.claims.sid;

        let mut sessions = self.sessions.write().await;
        let record = sessions.get_mut(&sid)?;
        let now = Utc::now();
        if !record.active || record.expires_at <= now {
            return None;
        }
        record.last_active = now;
        Some(SessionInfo {
            session_id: record.session_id.clone(),
            user_id: record.user_id.clone(),
            username: record.username.clone(),
            role: record.role,
        })
    }

    /// Marks a session inactive. Idempotent; unknown ids are a no-op.
    pub async fn invalidate_session(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(record) = sessions.get_mut(session_id) {
            record.active = false;
            record.last_active = Utc::now();
        }
        drop(sessions);

        if let Some(persistence) = &self.persistence
            && let Err(e) = persistence.deactivate_session(session_id).await
        {
            tracing::warn!(session_id, error = %e, "session deactivation write-through failed");
        }
    }

    /// Sweeps the store: deletes sessions past their expiry and
    /// logged-out sessions idle for 30+ days. Returns the number of
    /// records removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let stale_cutoff = now - Duration::days(STALE_AFTER_DAYS);

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| {
            let expired = record.expires_at <= now;
            let stale = !record.active && record.last_active < stale_cutoff;
            !(expired || stale)
        });
        let removed = before - sessions.len();
        drop(sessions);

        if let Some(persistence) = &self.persistence
            && let Err(e) = persistence.delete_expired_sessions(now, stale_cutoff).await
        {
            tracing::warn!(error = %e, "session sweep write-through failed");
        }

        if removed > 0 {
            tracing::info!(removed, "expired sessions swept");
        }
        removed
    }

    /// Number of live (active, unexpired) sessions.
    pub async fn active_count(&self) -> usize {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        sessions
            .values()
            .filter(|r| r.active && r.expires_at > now)
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_store() -> SessionStore {
        SessionStore::new(b"test-secret-test-secret-32-bytes", 7, None)
    }

    #[tokio::test]
    async fn issued_token_verifies() {
        let store = make_store();
        let Ok((token, record)) = store.create_session("user-a", "ada", Role::Viewer).await
        else {
            panic!("session creation failed");
        };

        let Some(info) = store.verify_session(&token).await else {
            panic!("expected valid session");
        };
        assert_eq!(info.user_id, "user-a");
        assert_eq!(info.session_id, record.session_id);
        assert_eq!(info.role, Role::Viewer);
    }

    #[test]
    fn debug_output_omits_key_material() {
        let rendered = format!("{:?}", make_store());
        assert!(rendered.contains("SessionStore"));
        assert!(!rendered.contains("test-secret"));
    }

    #[tokio::test]
    async fn garbage_token_is_invalid_not_an_error() {
        let store = make_store();
        assert!(store.verify_session("not-a-token").await.is_none());
        assert!(store.verify_session("").await.is_none());
    }

    #[tokio::test]
    async fn token_from_another_secret_is_rejected() {
        let store = make_store();
        let other = SessionStore::new(b"a-completely-different-secret!!!", 7, None);
        let Ok((token, _)) = other.create_session("user-a", "ada", Role::Viewer).await else {
            panic!("session creation failed");
        };
        assert!(store.verify_session(&token).await.is_none());
    }

    #[tokio::test]
    async fn invalidation_kills_a_still_signed_token() {
        let store = make_store();
        let Ok((token, record)) = store.create_session("user-a", "ada", Role::Admin).await
        else {
            panic!("session creation failed");
        };
        assert!(store.verify_session(&token).await.is_some());

        store.invalidate_session(&record.session_id).await;
        assert!(store.verify_session(&token).await.is_none());

        // Idempotent.
        store.invalidate_session(&record.session_id).await;
        assert!(store.verify_session(&token).await.is_none());
    }

    #[tokio::test]
    async fn cleanup_removes_expired_records() {
        let store = make_store();
        let Ok((_, record)) = store.create_session("user-a", "ada", Role::Viewer).await else {
            panic!("session creation failed");
        };

        // Force-expire the record.
        {
            let mut sessions = store.sessions.write().await;
            if let Some(r) = sessions.get_mut(&record.session_id) {
                r.expires_at = Utc::now() - Duration::hours(1);
            }
        }

        assert_eq!(store.cleanup_expired().await, 1);
        assert_eq!(store.active_count().await, 0);
    }

    #[tokio::test]
    async fn cleanup_keeps_recent_logged_out_sessions() {
        let store = make_store();
        let Ok((_, record)) = store.create_session("user-a", "ada", Role::Viewer).await else {
            panic!("session creation failed");
        };
        store.invalidate_session(&record.session_id).await;

        // Logged out but not yet stale: the record stays for audit.
        assert_eq!(store.cleanup_expired().await, 0);
    }

    #[tokio::test]
    async fn active_count_tracks_live_sessions() {
        let store = make_store();
        let Ok((_, a)) = store.create_session("user-a", "ada", Role::Viewer).await else {
            panic!("session creation failed");
        };
        let Ok(_) = store.create_session("user-b", "bob", Role::Viewer).await else {
            panic!("session creation failed");
        };
        assert_eq!(store.active_count().await, 2);

        store.invalidate_session(&a.session_id).await;
        assert_eq!(store.active_count().await, 1);
    }
}
