use anyhow::Context;
use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::renderer::{or_placeholder, render_report, report_filename, ReportFields};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub age_sex: Option<String>,
    #[serde(default)]
    pub ref_by: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub xray_no: Option<String>,
    #[serde(default)]
    pub exam_title: Option<String>,
    #[serde(default)]
    pub findings: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub advice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub message: String,
    pub filename: String,
    pub version: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports", post(create_report))
        .route("/reports/:filename", get(download_report))
}

/// Renders the report and persists it through the artifact store; the store's
/// version token comes back to the caller alongside the derived filename.
#[instrument(skip(state, payload))]
pub async fn create_report(
    State(state): State<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, ApiError> {
    let fields = ReportFields {
        patient_name: or_placeholder(payload.patient_name, "Unknown"),
        age_sex: or_placeholder(payload.age_sex, ""),
        ref_by: or_placeholder(payload.ref_by, ""),
        date: or_placeholder(payload.date, ""),
        xray_no: or_placeholder(payload.xray_no, "Unknown"),
        exam_title: or_placeholder(payload.exam_title, "X-RAY CHEST PA VIEW"),
        findings: or_placeholder(payload.findings, "No findings recorded."),
        conclusion: or_placeholder(payload.conclusion, ""),
        advice: or_placeholder(payload.advice, ""),
    };

    let filename = report_filename(&fields.xray_no);
    let bytes = render_report(&fields)?;

    let version = state
        .storage
        .save_artifact(&filename, Bytes::from(bytes), "application/pdf")
        .await
        .context("Error saving PDF artifact")?;

    info!(%filename, %version, "report stored");
    Ok(Json(ReportResponse {
        message: "PDF Report generated successfully.".into(),
        filename,
        version,
    }))
}

/// 302 to a presigned download URL for a stored report.
#[instrument(skip(state))]
pub async fn download_report(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Redirect, ApiError> {
    if filename.contains('/') || filename.contains("..") {
        return Err(ApiError::BadRequest("Invalid report filename.".into()));
    }

    let url = state
        .storage
        .presign_get(&filename, 600)
        .await
        .context("presign report url")?;
    Ok(Redirect::temporary(&url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_request_yields_unknown_report() {
        let state = AppState::fake();
        let resp = create_report(State(state), Json(ReportRequest::default()))
            .await
            .expect("render and store");
        assert_eq!(resp.0.filename, "Report_Unknown.pdf");
        assert!(!resp.0.version.is_empty());
    }

    #[tokio::test]
    async fn download_rejects_path_traversal() {
        let state = AppState::fake();
        let err = download_report(State(state), Path("../secrets".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
