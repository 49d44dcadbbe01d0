//! Structured ATS analysis returned to the client.
//!
//! `AnalysisResult` is a sum type: a document is either not a resume (with a
//! message) or a fully structured `ResumeAnalysis`. On the wire both variants
//! carry `document_type` and `is_resume` so the JSON matches what the model is
//! asked to produce.

use serde::{
    de::{self, Deserializer},
    ser::{SerializeMap, Serializer},
    Deserialize, Serialize,
};
use serde_json::Value;

pub const NOT_RESUME_DEFAULT_MESSAGE: &str = "Not a resume document";

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    NotAResume { message: String },
    Resume(ResumeAnalysis),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub header: ContactHeader,
    pub sections: ResumeSections,
    pub ats_analysis: AtsAnalysis,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pro_suggestions: ProSuggestions,
}

// Leaf fields accept `null` as their empty value: the model emits it for
// anything it could not find in the document.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactHeader {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeSections {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub education: Vec<EducationEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skills: Skills,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certifications: Option<Vec<Certification>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub degree: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub institution: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default, deserialize_with = "null_as_default")]
    pub technical: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub soft: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub issuer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub year: String,
}

/// The ATS scoring block. `score` is always within 0–100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtsAnalysis {
    #[serde(deserialize_with = "deserialize_score")]
    pub score: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub issues: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keyword_matches: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missing_keywords: Vec<String>,
}

/// Suggestion priority. Unknown or missing values read as `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "critical" => Priority::Critical,
            "high" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionCategory {
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProSuggestions {
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<SuggestionCategory>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summary: SuggestionSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSummary {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_categories: u32,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_suggestions: u32,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub potential_score_increase: u32,
}

/// Why a model reply could not be turned into an `AnalysisResult`.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("expected a JSON object at the top level")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid resume analysis: {0}")]
    Invalid(#[from] serde_json::Error),
}

impl AnalysisResult {
    pub fn is_resume(&self) -> bool {
        matches!(self, AnalysisResult::Resume(_))
    }

    pub fn as_resume(&self) -> Option<&ResumeAnalysis> {
        match self {
            AnalysisResult::Resume(analysis) => Some(analysis),
            AnalysisResult::NotAResume { .. } => None,
        }
    }

    /// Classifies and validates a JSON object produced by the model.
    ///
    /// Either `document_type: "not_resume"` or `is_resume: false` marks a
    /// non-resume. Resumes must carry both `sections` and `ats_analysis`.
    pub fn from_model_value(value: Value) -> Result<Self, SchemaError> {
        let object = value.as_object().ok_or(SchemaError::NotAnObject)?;

        let tagged_not_resume =
            object.get("document_type").and_then(Value::as_str) == Some("not_resume");
        let flagged_not_resume = object.get("is_resume").and_then(Value::as_bool) == Some(false);

        if tagged_not_resume || flagged_not_resume {
            let message = object
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(NOT_RESUME_DEFAULT_MESSAGE)
                .to_string();
            return Ok(AnalysisResult::NotAResume { message });
        }

        for field in ["sections", "ats_analysis"] {
            if object.get(field).map_or(true, Value::is_null) {
                return Err(SchemaError::MissingField(field));
            }
        }

        Ok(AnalysisResult::Resume(serde_json::from_value(value)?))
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AnalysisResult::NotAResume { message } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("document_type", "not_resume")?;
                map.serialize_entry("is_resume", &false)?;
                map.serialize_entry("message", message)?;
                map.end()
            }
            AnalysisResult::Resume(analysis) => {
                #[derive(Serialize)]
                struct Tagged<'a> {
                    document_type: &'static str,
                    is_resume: bool,
                    #[serde(flatten)]
                    analysis: &'a ResumeAnalysis,
                }

                Tagged {
                    document_type: "resume",
                    is_resume: true,
                    analysis,
                }
                .serialize(serializer)
            }
        }
    }
}

/// Accepts integers, floats, or numeric strings; rounds and clamps to 0–100.
fn deserialize_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = lenient_number(Value::deserialize(deserializer)?).map_err(de::Error::custom)?;
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}

fn deserialize_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(0);
    }
    let raw = lenient_number(value).map_err(de::Error::custom)?;
    Ok(raw.round().clamp(0.0, u32::MAX as f64) as u32)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_number(value: Value) -> Result<f64, String> {
    let number = match &value {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("unrepresentable number {n}")),
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map_err(|_| format!("expected a number, got '{s}'")),
        other => Err(format!("expected a number, got {other}")),
    }?;

    if number.is_finite() {
        Ok(number)
    } else {
        Err("expected a finite number".to_string())
    }
}
