//! Axum route handlers for the analysis API.

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::client::{AnalysisOutcome, AnalysisSource};
use crate::analysis::intake::{read_upload, with_deadline};
use crate::errors::AppError;
use crate::models::analysis::{AnalysisResult, ResumeAnalysis};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub success: bool,
    pub data: AnalysisResult,
    pub message: String,
    /// True when `data` is fallback content rather than the model's analysis.
    pub degraded: bool,
    pub source: AnalysisSource,
}

impl AnalysisResponse {
    fn new(outcome: AnalysisOutcome, message: &str) -> Self {
        if let Some(raw) = &outcome.raw_text {
            debug!("Raw model reply ({} chars): {raw}", raw.len());
        }
        Self {
            success: true,
            degraded: outcome.is_degraded(),
            source: outcome.source,
            data: outcome.result,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AtsScoreRequest {
    pub resume: ResumeAnalysis,
    #[serde(default)]
    pub job_keywords: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/analyze
///
/// Multipart upload with a single `file` field (PDF, DOC or DOCX).
/// The whole read-validate-encode-analyze sequence runs under the request deadline.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let multipart = multipart?;
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze_resume", %request_id);

    with_deadline(state.config.request_timeout, process_upload(&state, multipart))
        .instrument(span)
        .await
        .map(Json)
}

async fn process_upload(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<AnalysisResponse, AppError> {
    let upload = read_upload(&mut multipart, state.config.max_upload_bytes).await?;
    info!(
        "Received '{}' ({}, {} bytes)",
        upload.filename,
        upload.kind.mime(),
        upload.len()
    );

    let encoded = upload.encode();
    let outcome = state.analysis.analyze(&encoded).await;

    if let Some(diagnostic) = &outcome.diagnostic {
        info!("Serving fallback analysis ({:?}): {diagnostic}", outcome.source);
    } else if let Some(analysis) = outcome.result.as_resume() {
        info!("ATS score {}", analysis.ats_analysis.score);
    }

    Ok(AnalysisResponse::new(
        outcome,
        "Resume processed successfully",
    ))
}

/// POST /api/v1/resumes/ats-score
///
/// Re-scores an existing analysis against optional job keywords.
pub async fn handle_ats_score(
    State(state): State<AppState>,
    payload: Result<Json<AtsScoreRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let Json(request) = payload?;
    let job_keywords: Vec<String> = request
        .job_keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    let request_id = Uuid::new_v4();
    let span = info_span!("rescore_resume", %request_id, keywords = job_keywords.len());

    let outcome = with_deadline(
        state.config.request_timeout,
        state.analysis.rescore(&request.resume, &job_keywords),
    )
    .instrument(span)
    .await?;

    Ok(Json(AnalysisResponse::new(
        outcome,
        "ATS analysis updated successfully",
    )))
}
