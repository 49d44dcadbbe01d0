//! Analysis Client — obtains a structured ATS analysis from the model and
//! guarantees a well-formed result even when the model misbehaves.
//!
//! Per call: prompt → await model (under the inner timeout) → parse, or fall
//! back. Parse failures and transport failures of `analyze` both resolve to the
//! deterministic fallback analysis; the outcome records which path was taken.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analysis::fallback::{bump_scoring, fallback_analysis};
use crate::analysis::intake::EncodedDocument;
use crate::analysis::prompts::{build_rescore_prompt, ANALYZE_PROMPT};
use crate::config::AnalysisConfig;
use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{
    extract_json_object, GeminiClient, LlmError, ModelBackend, ModelRequest, Part,
};
use crate::models::analysis::{AnalysisResult, AtsAnalysis, ResumeAnalysis, SchemaError};

/// Which path produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Model,
    ParseFallback,
    TransportFallback,
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    /// Raw model text, when the model answered at all.
    pub raw_text: Option<String>,
    pub source: AnalysisSource,
    /// Underlying error message for fallback outcomes.
    pub diagnostic: Option<String>,
}

impl AnalysisOutcome {
    pub fn is_degraded(&self) -> bool {
        self.source != AnalysisSource::Model
    }
}

#[derive(Debug, thiserror::Error)]
enum ReplyError {
    #[error("no JSON object found in model reply")]
    NoJson,

    #[error("model reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Clone)]
pub struct AnalysisClient {
    backend: Arc<dyn ModelBackend>,
    config: AnalysisConfig,
}

impl AnalysisClient {
    /// Builds the production client. Fails fast when the API key is missing.
    pub fn from_config(config: AnalysisConfig) -> Result<Self, LlmError> {
        let gemini = GeminiClient::new(config.api_key.clone(), config.base_url.clone())?;
        Ok(Self::with_backend(Arc::new(gemini), config))
    }

    pub fn with_backend(backend: Arc<dyn ModelBackend>, config: AnalysisConfig) -> Self {
        Self { backend, config }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Analyzes one document. Never fails: unusable replies and transport
    /// errors resolve to the fallback analysis.
    pub async fn analyze(&self, document: &EncodedDocument) -> AnalysisOutcome {
        debug!(
            "Analyzing '{}' as {} with {}",
            document.filename,
            document.kind.model_mime(),
            self.config.model
        );

        let request = ModelRequest {
            model: self.config.model.clone(),
            system: Some(JSON_ONLY_SYSTEM.to_string()),
            parts: vec![
                Part::text(ANALYZE_PROMPT),
                Part::inline(document.kind.model_mime(), document.base64.clone()),
            ],
        };

        let text = match self.call_model(&request).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Model call failed for '{}': {e}", document.filename);
                return AnalysisOutcome {
                    result: AnalysisResult::Resume(fallback_analysis()),
                    raw_text: None,
                    source: AnalysisSource::TransportFallback,
                    diagnostic: Some(e.to_string()),
                };
            }
        };

        match parse_analysis(&text) {
            Ok(result) => {
                info!(
                    "Model analysis parsed for '{}' (is_resume={})",
                    document.filename,
                    result.is_resume()
                );
                AnalysisOutcome {
                    result,
                    raw_text: Some(text),
                    source: AnalysisSource::Model,
                    diagnostic: None,
                }
            }
            Err(e) => {
                warn!("Unusable model reply for '{}': {e}", document.filename);
                AnalysisOutcome {
                    result: AnalysisResult::Resume(fallback_analysis()),
                    raw_text: Some(text),
                    source: AnalysisSource::ParseFallback,
                    diagnostic: Some(e.to_string()),
                }
            }
        }
    }

    /// Recomputes only the scoring block against optional job keywords and
    /// merges it into `analysis`. An unusable reply falls back to a small
    /// local score bump; a failed model call is an error.
    pub async fn rescore(
        &self,
        analysis: &ResumeAnalysis,
        job_keywords: &[String],
    ) -> Result<AnalysisOutcome, AppError> {
        let resume_json = serde_json::to_string_pretty(analysis)
            .map_err(|e| AppError::Internal(e.into()))?;

        let request = ModelRequest {
            model: self.config.rescore_model.clone(),
            system: Some(JSON_ONLY_SYSTEM.to_string()),
            parts: vec![Part::text(build_rescore_prompt(&resume_json, job_keywords))],
        };

        let text = self.call_model(&request).await.map_err(|e| match e {
            LlmError::Timeout { .. } => AppError::Timeout,
            other => AppError::Llm(format!("ATS re-scoring failed: {other}")),
        })?;

        let outcome = match parse_scoring(&text) {
            Ok(ats_analysis) => {
                info!(
                    "Re-scored resume: {} → {}",
                    analysis.ats_analysis.score, ats_analysis.score
                );
                AnalysisOutcome {
                    result: AnalysisResult::Resume(ResumeAnalysis {
                        ats_analysis,
                        ..analysis.clone()
                    }),
                    raw_text: Some(text),
                    source: AnalysisSource::Model,
                    diagnostic: None,
                }
            }
            Err(e) => {
                warn!("Unusable re-scoring reply: {e}");
                AnalysisOutcome {
                    result: AnalysisResult::Resume(bump_scoring(analysis)),
                    raw_text: Some(text),
                    source: AnalysisSource::ParseFallback,
                    diagnostic: Some(e.to_string()),
                }
            }
        };

        Ok(outcome)
    }

    /// Races the backend against the inner timeout. The losing call is dropped.
    async fn call_model(&self, request: &ModelRequest) -> Result<String, LlmError> {
        let limit = self.config.model_timeout;
        match tokio::time::timeout(limit, self.backend.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                secs: limit.as_secs(),
            }),
        }
    }
}

/// Extracts the first JSON object from model text and classifies it.
fn parse_analysis(text: &str) -> Result<AnalysisResult, ReplyError> {
    let json = extract_json_object(text).ok_or(ReplyError::NoJson)?;
    let value: Value = serde_json::from_str(json)?;
    Ok(AnalysisResult::from_model_value(value)?)
}

/// Accepts either `{"ats_analysis": {...}}` or a bare scoring object.
fn parse_scoring(text: &str) -> Result<AtsAnalysis, ReplyError> {
    let json = extract_json_object(text).ok_or(ReplyError::NoJson)?;
    let mut value: Value = serde_json::from_str(json)?;

    let nested = value
        .as_object_mut()
        .and_then(|object| object.remove("ats_analysis"));

    let block = match nested {
        Some(inner) => inner,
        None if value.get("score").is_some() => value,
        None => return Err(SchemaError::MissingField("ats_analysis").into()),
    };

    Ok(serde_json::from_value(block)?)
}
