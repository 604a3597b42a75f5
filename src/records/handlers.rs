use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::classifier::dto::ClassificationResult;
use crate::error::ApiError;
use crate::session::CurrentSession;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordRequest {
    pub results: ClassificationResult,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub message: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/records", post(record))
}

/// Appends the classification results to the inference log, keyed by the
/// logged-in user's uuid.
#[instrument(skip(state, session, payload))]
pub async fn record(
    State(state): State<AppState>,
    session: CurrentSession,
    Json(payload): Json<RecordRequest>,
) -> Result<Json<RecordResponse>, ApiError> {
    state
        .inference_log
        .record(&payload.results, session.state.uuid.as_deref())?;

    let uuid = session.state.uuid.unwrap_or_default();
    info!(user_uuid = %uuid, "inference recorded");
    Ok(Json(RecordResponse {
        message: format!("Inference saved for User ID: {uuid}"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::RegisterRequest;
    use crate::auth::services;
    use crate::classifier::dto::label_scores;
    use crate::classifier::CONDITIONS;
    use crate::session::SessionState;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_state() -> AppState {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("migrations");
        let mut state = AppState::fake();
        state.db = db;
        state
    }

    #[tokio::test]
    async fn record_without_login_is_not_authenticated() {
        let state = test_state().await;
        let session = CurrentSession {
            token: None,
            state: SessionState::default(),
        };

        let err = record(
            State(state.clone()),
            session,
            Json(RecordRequest {
                results: ClassificationResult::new(),
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::NotAuthenticated));
        assert!(!state.inference_log.path().exists());
    }

    #[tokio::test]
    async fn register_login_record_roundtrip() {
        let state = test_state().await;

        let (_, registered) = services::register(
            &state,
            RegisterRequest {
                full_name: "Alice Smith".into(),
                gender: "F".into(),
                age: 34,
                username: "alice".into(),
                password: "correct-horse".into(),
            },
            None,
        )
        .await
        .expect("signup");

        let (token, _) = services::authenticate(&state, "alice", "correct-horse", None)
            .await
            .expect("login");

        // mocked model output: Pneumonia 0.9, everything else 0.01
        let probs: Vec<f32> = CONDITIONS
            .iter()
            .map(|c| if *c == "Pneumonia" { 0.9 } else { 0.01 })
            .collect();
        let results = label_scores(&probs, 0.3);

        let session = CurrentSession {
            token: Some(token),
            state: state.sessions.status(token),
        };
        let resp = record(State(state.clone()), session, Json(RecordRequest { results }))
            .await
            .expect("record");
        assert!(resp.0.message.contains(&registered.user_uuid));

        let contents = std::fs::read_to_string(state.inference_log.path()).unwrap();
        let last = contents.lines().last().unwrap();
        let cols: Vec<&str> = last.split(',').collect();

        let pneumonia = CONDITIONS.iter().position(|c| *c == "Pneumonia").unwrap();
        assert_eq!(cols[pneumonia], "0.9");
        for (i, name) in CONDITIONS.iter().enumerate() {
            if *name != "Pneumonia" {
                assert_eq!(cols[i], "0.01", "{name}");
            }
        }
        assert_eq!(cols[13], registered.user_uuid);
    }
}
