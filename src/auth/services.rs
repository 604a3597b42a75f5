use tracing::{info, warn};
use uuid::Uuid;

use super::dto::RegisterRequest;
use super::password;
use super::repo::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Signup: reject duplicate usernames, hash the password, persist the row,
/// append the audit record, and mark the caller's session authenticated.
/// Session mutation here and in [`authenticate`] is the only mechanism that
/// establishes authentication for the rest of the conversation.
pub async fn register(
    state: &AppState,
    mut req: RegisterRequest,
    token: Option<Uuid>,
) -> Result<(Uuid, User), ApiError> {
    req.username = req.username.trim().to_string();

    if req.username.is_empty() {
        return Err(ApiError::BadRequest("Username must not be empty.".into()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty.".into()));
    }

    if User::find_by_username(&state.db, &req.username).await?.is_some() {
        warn!(username = %req.username, "signup with existing username");
        return Err(ApiError::DuplicateUsername);
    }

    let hash = password::hash_password(&req.password)?;
    let user_uuid = Uuid::new_v4().to_string();

    let user = User::create(
        &state.db,
        &req.full_name,
        &req.gender,
        req.age,
        &req.username,
        &hash,
        &user_uuid,
    )
    .await?;

    state.audit_log.append(&user)?;

    let token = state.sessions.log_in(token, &user.user_uuid);
    info!(username = %user.username, user_uuid = %user.user_uuid, "user registered");
    Ok((token, user))
}

/// Login: resolve the username, verify the stored hash, mark the session
/// authenticated.
pub async fn authenticate(
    state: &AppState,
    username: &str,
    password_plain: &str,
    token: Option<Uuid>,
) -> Result<(Uuid, User), ApiError> {
    let username = username.trim();

    let user = User::find_by_username(&state.db, username)
        .await?
        .ok_or_else(|| {
            warn!(%username, "login with unknown username");
            ApiError::UserNotFound
        })?;

    if !password::verify_password(password_plain, &user.password_hash)? {
        warn!(%username, "login with incorrect password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.sessions.log_in(token, &user.user_uuid);
    info!(username = %user.username, user_uuid = %user.user_uuid, "user logged in");
    Ok((token, user))
}
