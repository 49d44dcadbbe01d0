// All LLM prompt constants for the analysis module.
// The system instruction comes from llm_client::prompts.

/// Resume analysis prompt. Sent together with the inlined document.
pub const ANALYZE_PROMPT: &str = r#"Analyze the attached document and return structured JSON data.

FIRST: decide whether the document is a resume / CV. If it is NOT, return exactly:
{"document_type": "not_resume", "is_resume": false, "message": "<one sentence describing what the document is>"}

If it IS a resume, extract the key information and return a JSON object with this EXACT schema:
{
  "document_type": "resume",
  "is_resume": true,
  "header": {"name": "", "email": "", "phone": "", "location": "", "linkedin": "", "website": ""},
  "sections": {
    "summary": "",
    "experience": [{"title": "", "company": "", "duration": "", "description": "", "achievements": []}],
    "education": [{"degree": "", "institution": "", "year": "", "gpa": ""}],
    "skills": {"technical": [], "soft": [], "languages": []},
    "certifications": [{"name": "", "issuer": "", "year": ""}]
  },
  "ats_analysis": {
    "score": 75,
    "issues": ["Main ATS issues"],
    "recommendations": ["Key recommendations"],
    "keyword_matches": [],
    "missing_keywords": []
  },
  "pro_suggestions": {
    "categories": [
      {"category": "Header", "priority": "High", "suggestions": ["Optimize contact info"], "impact": "Improves parsing by 25%"},
      {"category": "Experience", "priority": "High", "suggestions": ["Use action verbs", "Add metrics"], "impact": "Increases keywords by 40%"},
      {"category": "Skills", "priority": "Medium", "suggestions": ["Separate technical/soft skills"], "impact": "Boosts recognition by 30%"},
      {"category": "Formatting", "priority": "High", "suggestions": ["Use standard fonts", "Remove graphics"], "impact": "Improves accuracy by 35%"}
    ],
    "summary": {"total_categories": 4, "total_suggestions": 6, "potential_score_increase": 20}
  }
}

Rules:
- "score" is an integer from 0 to 100 reflecting ATS compatibility (structure, section naming, formatting, keyword usage).
- "priority" is exactly one of "Critical", "High", "Medium", "Low".
- Omit optional fields (linkedin, website, summary, gpa, languages, certifications) when the resume has no such data.
- Use empty arrays rather than null.
- Be concise and focus on the information most important for ATS parsing."#;

/// Keyword-targeted re-scoring prompt.
/// Replace: {resume_json}, {job_keywords}
pub const RESCORE_PROMPT_TEMPLATE: &str = r#"Analyze the following structured resume data for ATS compatibility.

====================
Resume Data:
{resume_json}
====================

Job Description Keywords (if provided): {job_keywords}

Evaluate:
1. ATS compatibility score (integer 0-100) based on formatting, structure, keyword usage and section naming.
2. Structural completeness: contact information, professional summary, work experience, skills, education, certifications. Note any missing section as an issue.
3. Formatting problems: tables, columns, graphics, non-standard fonts, content hidden in headers/footers.
4. Keyword matching: which job keywords are present and which important ones are missing.
5. Actionable recommendations tailored to the issues found, including keyword optimization.

Return ONLY a JSON object of the form:
{
  "ats_analysis": {
    "score": 0,
    "issues": [],
    "recommendations": [],
    "keyword_matches": [],
    "missing_keywords": []
  }
}"#;

/// Recommendation appended when re-scoring falls back to a local adjustment.
pub const RESCORE_FALLBACK_RECOMMENDATION: &str =
    "Consider tailoring keywords to specific job postings";

pub fn build_rescore_prompt(resume_json: &str, job_keywords: &[String]) -> String {
    RESCORE_PROMPT_TEMPLATE
        .replace("{resume_json}", resume_json)
        .replace("{job_keywords}", &job_keywords.join(", "))
}
