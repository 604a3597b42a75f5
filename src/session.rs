use std::collections::HashMap;
use std::sync::RwLock;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use serde::Serialize;
use uuid::Uuid;

pub const SESSION_HEADER: &str = "x-session-token";

/// Per-conversation authentication state. Lives only in process memory and is
/// mutated exclusively by successful register/login.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub logged_in: bool,
    pub uuid: Option<String>,
}

/// In-process store mapping opaque session tokens to their state. Cleared on
/// restart; nothing is persisted.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<Uuid, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, token: Uuid) -> SessionState {
        self.inner
            .read()
            .expect("session store lock poisoned")
            .get(&token)
            .cloned()
            .unwrap_or_default()
    }

    /// Marks a session as authenticated, minting a token if the caller did
    /// not present one.
    pub fn log_in(&self, token: Option<Uuid>, user_uuid: &str) -> Uuid {
        let token = token.unwrap_or_else(Uuid::new_v4);
        self.inner
            .write()
            .expect("session store lock poisoned")
            .insert(
                token,
                SessionState {
                    logged_in: true,
                    uuid: Some(user_uuid.to_string()),
                },
            );
        token
    }
}

/// Extracts the caller's session token and resolved state. An absent or
/// unknown token reads as a logged-out session rather than an error; the
/// operations that require authentication enforce it themselves.
pub struct CurrentSession {
    pub token: Option<Uuid>,
    pub state: SessionState,
}

#[async_trait]
impl FromRequestParts<crate::state::AppState> for CurrentSession {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        app: &crate::state::AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok());

        let state = match token {
            Some(t) => app.sessions.status(t),
            None => SessionState::default(),
        };

        Ok(CurrentSession { token, state })
    }
}
