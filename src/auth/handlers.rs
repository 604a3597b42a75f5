use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest};
use super::services;
use crate::error::ApiError;
use crate::session::{CurrentSession, SessionState};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/session", get(session_status))
}

#[instrument(skip(state, session, payload))]
pub async fn register(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (session_token, user) = services::register(&state, payload, session.token).await?;
    Ok(Json(AuthResponse {
        session_token,
        user: PublicUser {
            uuid: user.user_uuid,
            username: user.username,
            full_name: user.full_name,
        },
    }))
}

#[instrument(skip(state, session, payload))]
pub async fn login(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (session_token, user) =
        services::authenticate(&state, &payload.username, &payload.password, session.token)
            .await?;
    Ok(Json(AuthResponse {
        session_token,
        user: PublicUser {
            uuid: user.user_uuid,
            username: user.username,
            full_name: user.full_name,
        },
    }))
}

/// Reports whether the presented session token is authenticated and for whom.
#[instrument(skip_all)]
pub async fn session_status(session: CurrentSession) -> Json<SessionState> {
    Json(session.state)
}
