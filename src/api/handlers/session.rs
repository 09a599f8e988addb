//! Auth handlers: login, logout, current session.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{LoginRequest, LoginResponse, MeResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, FanstageError};
use crate::session::{AuthSession, Role, SESSION_COOKIE};

/// `POST /auth/login` — Issue a session for a username.
///
/// Gets or creates the viewer profile, issues a signed session token,
/// and sets it as an `HttpOnly` cookie. Presenting the configured admin
/// key elevates the session to the admin role.
///
/// # Errors
///
/// Returns [`FanstageError::InvalidRequest`] for an empty username or
/// [`FanstageError::Forbidden`] for a wrong admin key.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    summary = "Log in",
    description = "Issues a session token for the given username, creating the viewer profile on first login. A valid admin key grants the admin role.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Invalid username", body = ErrorResponse),
        (status = 403, description = "Wrong admin key", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, FanstageError> {
    let username = req.username.trim();
    if username.is_empty() || username.chars().count() > 32 {
        return Err(FanstageError::InvalidRequest(
            "username must be 1-32 characters".to_string(),
        ));
    }

    let role = match req.admin_key.as_deref() {
        None => Role::Viewer,
        Some(key) if key == state.config.admin_key => Role::Admin,
        Some(_) => return Err(FanstageError::Forbidden),
    };

    // The stable user id is the lowercased username; display casing is
    // whatever the client sent.
    let user_id = username.to_lowercase();
    let _ = state.engagement.register_viewer(&user_id, username).await;

    let (token, record) = state.sessions.create_session(&user_id, username, role).await?;
    tracing::info!(user_id, role = role.as_str(), "login");

    let max_age = (record.expires_at - record.created_at).num_seconds();
    let cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={max_age}"
    );

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token,
            user_id,
            username: username.to_string(),
            role,
            expires_at: record.expires_at,
        }),
    ))
}

/// `POST /auth/logout` — Invalidate the current session.
///
/// The session record is marked inactive server-side, so the token dies
/// immediately even though its signature stays valid. The cookie is
/// cleared. Idempotent.
pub async fn logout(
    State(state): State<AppState>,
    AuthSession(info): AuthSession,
) -> impl IntoResponse {
    state.sessions.invalidate_session(&info.session_id).await;
    tracing::info!(user_id = %info.user_id, "logout");

    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "logged_out": true })),
    )
}

/// `GET /auth/me` — Describe the current session.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    summary = "Current session",
    description = "Returns the user id, username, and role of the calling session.",
    responses(
        (status = 200, description = "Session details", body = MeResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
    )
)]
pub async fn me(AuthSession(info): AuthSession) -> impl IntoResponse {
    Json(MeResponse {
        user_id: info.user_id,
        username: info.username,
        role: info.role,
        session_id: info.session_id,
    })
}

/// Auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}
