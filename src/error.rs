use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Crate-wide error taxonomy. Every operation surfaces one of these; nothing
/// escapes a handler as an uncaught fault.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Username already exists.")]
    DuplicateUsername,

    #[error("Username not found.")]
    UserNotFound,

    #[error("Incorrect password.")]
    InvalidCredentials,

    #[error("User not logged in.")]
    NotAuthenticated,

    #[error("Weight file not found at: {0}")]
    WeightsNotFound(String),

    #[error("Load failed: {0}")]
    LoadFailure(String),

    #[error("Model not loaded. Call /model/load first.")]
    ModelNotLoaded,

    #[error("Could not find image for input '{0}'.")]
    ImageNotFound(String),

    #[error("Invalid image format or corrupted file.")]
    InvalidImage,

    #[error("Error generating PDF content: {0}")]
    RenderFailure(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateUsername => StatusCode::CONFLICT,
            ApiError::UserNotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::WeightsNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::LoadFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ModelNotLoaded => StatusCode::CONFLICT,
            ApiError::ImageNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidImage => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RenderFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            status: "error",
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        assert_eq!(ApiError::DuplicateUsername.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotAuthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::ModelNotLoaded.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InvalidImage.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn messages_are_descriptive() {
        let e = ApiError::WeightsNotFound("/data/model/vgg.safetensors".into());
        assert!(e.to_string().contains("/data/model/vgg.safetensors"));

        let e = ApiError::ImageNotFound("image 7".into());
        assert!(e.to_string().contains("image 7"));
    }
}
