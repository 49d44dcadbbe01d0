//! Deterministic analysis content used when the model reply is unusable.

use crate::analysis::prompts::RESCORE_FALLBACK_RECOMMENDATION;
use crate::models::analysis::{
    AtsAnalysis, ContactHeader, Priority, ProSuggestions, ResumeAnalysis, ResumeSections,
    SuggestionCategory, SuggestionSummary,
};

pub const FALLBACK_SCORE: u8 = 65;
/// Score bump applied when re-scoring cannot parse the model reply.
pub const RESCORE_FALLBACK_BUMP: u8 = 5;

/// A complete, generic `ResumeAnalysis`. Always the same value.
pub fn fallback_analysis() -> ResumeAnalysis {
    let suggestions = vec![
        "Use standard section headings (Experience, Education, Skills)".to_string(),
        "Include contact information at the top".to_string(),
        "Use simple bullet points instead of symbols".to_string(),
    ];

    ResumeAnalysis {
        header: ContactHeader {
            name: "Resume Analysis Complete".to_string(),
            ..ContactHeader::default()
        },
        sections: ResumeSections::default(),
        ats_analysis: AtsAnalysis {
            score: FALLBACK_SCORE,
            issues: vec!["Document processed successfully".to_string()],
            recommendations: vec![
                "Review formatting for ATS compatibility".to_string(),
                "Add relevant keywords".to_string(),
            ],
            keyword_matches: vec![],
            missing_keywords: vec![],
        },
        pro_suggestions: ProSuggestions {
            summary: SuggestionSummary {
                total_categories: 1,
                total_suggestions: suggestions.len() as u32,
                potential_score_increase: 15,
            },
            categories: vec![SuggestionCategory {
                category: "Quick Wins".to_string(),
                priority: Priority::High,
                suggestions,
                impact: "Improves ATS parsing significantly".to_string(),
            }],
        },
    }
}

/// Local adjustment when a re-score reply cannot be parsed: nudge the score up
/// and add a generic tailoring recommendation. Everything else is kept.
pub fn bump_scoring(analysis: &ResumeAnalysis) -> ResumeAnalysis {
    let mut bumped = analysis.clone();
    let ats = &mut bumped.ats_analysis;
    ats.score = ats.score.saturating_add(RESCORE_FALLBACK_BUMP).min(100);
    ats.recommendations
        .push(RESCORE_FALLBACK_RECOMMENDATION.to_string());
    bumped
}
