use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use tracing::{info, instrument};

use super::dto::{label_scores, ClassifyRequest, ClassifyResponse, LoadResponse};
use super::model::CxrModel;
use super::{preprocess, resolve};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/model/load", post(load_model))
        .route("/classify", post(classify))
}

/// Builds the fixed topology and (re)loads weights into the shared handle.
/// Idempotent: repeated calls replace the handle in place.
#[instrument(skip(state))]
pub async fn load_model(State(state): State<AppState>) -> Result<Json<LoadResponse>, ApiError> {
    let path = state.config.weights_path.clone();
    let model = tokio::task::spawn_blocking(move || CxrModel::load(&path))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))??;

    *state.model.write().expect("model lock poisoned") = Some(Arc::new(model));
    info!(weights = %state.config.weights_path.display(), "classification model loaded");
    Ok(Json(LoadResponse {
        message: "Classification model loaded.".into(),
    }))
}

/// Resolves the image reference, preprocesses, runs one forward pass and
/// labels the 13 condition scores against the threshold.
#[instrument(skip(state, payload), fields(image = %payload.image))]
pub async fn classify(
    State(state): State<AppState>,
    Json(payload): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let model = state
        .model
        .read()
        .expect("model lock poisoned")
        .clone()
        .ok_or(ApiError::ModelNotLoaded)?;

    let resolved = resolve::resolve_image_reference(&payload.image, &state.config.image_dir);
    if !resolved.exists() {
        return Err(ApiError::ImageNotFound(payload.image.clone()));
    }

    let analyzed_file = resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| resolved.display().to_string());

    let probs = tokio::task::spawn_blocking(move || -> Result<Vec<f32>, ApiError> {
        let input = preprocess::load_and_preprocess(&resolved)?;
        Ok(model.predict(input))
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))??;

    info!(%analyzed_file, "classification complete");
    Ok(Json(ClassifyResponse {
        analyzed_file,
        results: label_scores(&probs, payload.threshold),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn classify_before_load_is_model_not_loaded() {
        let state = AppState::fake();
        let err = classify(
            State(state),
            Json(ClassifyRequest {
                image: "img1".into(),
                threshold: 0.3,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::ModelNotLoaded));
    }

    #[tokio::test]
    async fn missing_weights_surface_weights_not_found() {
        let state = AppState::fake();
        let err = load_model(State(state)).await.unwrap_err();
        assert!(matches!(err, ApiError::WeightsNotFound(_)));
    }
}
