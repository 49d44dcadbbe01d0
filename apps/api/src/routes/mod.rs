pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes();

    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route("/api/v1/resumes/analyze", post(handlers::handle_analyze))
        .route("/api/v1/resumes/ats-score", post(handlers::handle_ats_score))
        // Legacy path kept for existing frontends
        .route("/api/process-resume", post(handlers::handle_analyze))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::client::AnalysisClient;
    use crate::analysis::intake::{DOCX_MIME, PDF_MIME};
    use crate::config::{Config, DEFAULT_MAX_UPLOAD_BYTES};
    use crate::llm_client::stub::StubBackend;

    const BOUNDARY: &str = "ats-test-boundary";

    fn test_config() -> Config {
        Config {
            gemini_api_key: "test-key".to_string(),
            gemini_base_url: "http://localhost:0".to_string(),
            model: "gemini-1.5-flash".to_string(),
            rescore_model: "gemini-2.5-flash".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout: Duration::from_secs(45),
            model_timeout: Duration::from_secs(30),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }

    fn app(backend: Arc<StubBackend>) -> Router {
        app_with(backend, test_config())
    }

    fn app_with(backend: Arc<StubBackend>, config: Config) -> Router {
        let analysis = AnalysisClient::with_backend(backend, config.analysis());
        build_router(AppState { analysis, config })
    }

    fn multipart_request(
        uri: &str,
        field: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Request<Body> {
        let mut body = Vec::with_capacity(bytes.len() + 256);
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn upload(content_type: &str, bytes: &[u8]) -> Request<Body> {
        multipart_request("/api/v1/resumes/analyze", "file", "cv", content_type, bytes)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn full_reply(score: u8) -> Value {
        json!({
            "document_type": "resume",
            "is_resume": true,
            "header": {"name": "Alan Turing", "email": "alan@example.com", "phone": "", "location": "Manchester"},
            "sections": {
                "summary": "Computer scientist.",
                "experience": [{"title": "Reader", "company": "University of Manchester", "duration": "1948 - 1954", "description": "Computing Machine Laboratory.", "achievements": ["Wrote the Manchester Mark 1 programmers' handbook"]}],
                "education": [{"degree": "PhD", "institution": "Princeton", "year": "1938"}],
                "skills": {"technical": ["Cryptanalysis", "Mathematics"], "soft": ["Research"]}
            },
            "ats_analysis": {
                "score": score,
                "issues": ["Contact details incomplete", "No keywords section"],
                "recommendations": ["Add a phone number", "List tools explicitly"],
                "keyword_matches": ["mathematics"],
                "missing_keywords": ["machine learning"]
            },
            "pro_suggestions": {
                "categories": [
                    {"category": "Header", "priority": "Critical", "suggestions": ["Add a phone number"], "impact": "Improves parsing by 25%"},
                    {"category": "Skills", "priority": "Medium", "suggestions": ["Group tools"], "impact": "Boosts recognition by 30%"}
                ],
                "summary": {"total_categories": 2, "total_suggestions": 2, "potential_score_increase": 10}
            }
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(StubBackend::replying("{}"))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_file_field_is_rejected() {
        let backend = StubBackend::replying("{}");
        let request = multipart_request(
            "/api/v1/resumes/analyze",
            "attachment",
            "cv.pdf",
            PDF_MIME,
            b"%PDF-1.4",
        );
        let response = app(backend.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "MISSING_FILE");
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_types_never_reach_the_model() {
        for content_type in ["image/png", "text/plain", "application/zip"] {
            let backend = StubBackend::replying(&full_reply(80).to_string());
            let response = app(backend.clone())
                .oneshot(upload(content_type, b"not a resume"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{content_type}");
            assert_eq!(json_body(response).await["code"], "UNSUPPORTED_TYPE");
            assert_eq!(backend.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_oversized_pdf_is_rejected_without_model_call() {
        let backend = StubBackend::replying(&full_reply(80).to_string());
        let ten_mb = vec![b'a'; 10 * 1024 * 1024];
        let response = app(backend.clone())
            .oneshot(upload(PDF_MIME, &ten_mb))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "FILE_TOO_LARGE");
        assert!(body["error"].as_str().unwrap().contains("5MB"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_file_at_the_ceiling_is_accepted() {
        let backend = StubBackend::replying(&full_reply(80).to_string());
        let exactly_max = vec![b'a'; DEFAULT_MAX_UPLOAD_BYTES];
        let response = app(backend.clone())
            .oneshot(upload(PDF_MIME, &exactly_max))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_not_resume_reply_is_surfaced_verbatim() {
        let backend = StubBackend::replying(
            r#"{"document_type":"not_resume","is_resume":false,"message":"This appears to be a cover letter."}"#,
        );
        let pdf = vec![b'%'; 200 * 1024];
        let response = app(backend).oneshot(upload(PDF_MIME, &pdf)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["degraded"], false);
        assert_eq!(body["data"]["is_resume"], false);
        assert_eq!(body["data"]["message"], "This appears to be a cover letter.");
    }

    #[tokio::test]
    async fn test_full_reply_is_rendered_unchanged() {
        let reply = full_reply(85);
        let backend = StubBackend::replying(&format!("Here you go:\n{reply}"));
        let response = app(backend).oneshot(upload(PDF_MIME, b"%PDF-1.7")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Resume processed successfully");
        assert_eq!(body["source"], "model");
        assert_eq!(body["data"]["ats_analysis"]["score"], 85);
        assert_eq!(body["data"], reply);
    }

    #[tokio::test]
    async fn test_malformed_reply_serves_fallback() {
        let backend = StubBackend::replying("The resume looks great overall!");
        let response = app(backend).oneshot(upload(PDF_MIME, b"%PDF-1.7")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["degraded"], true);
        assert_eq!(body["source"], "parse_fallback");
        let score = body["data"]["ats_analysis"]["score"].as_u64().unwrap();
        assert!(score <= 100);
        assert!(!body["data"]["pro_suggestions"]["categories"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_model_on_docx_serves_fallback() {
        let backend = StubBackend::slow(Duration::from_secs(300));
        let response = app(backend)
            .oneshot(upload(DOCX_MIME, b"PK\x03\x04"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["source"], "transport_fallback");
        let score = body["data"]["ats_analysis"]["score"].as_u64().unwrap();
        assert!((65..=72).contains(&score));
    }

    #[tokio::test]
    async fn test_legacy_path_is_routed() {
        let backend = StubBackend::replying(&full_reply(70).to_string());
        let request = multipart_request(
            "/api/process-resume",
            "file",
            "cv.doc",
            "application/msword",
            b"\xD0\xCF\x11\xE0",
        );
        let response = app(backend.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_ats_score_endpoint_merges_scoring() {
        let backend = StubBackend::replying(
            r#"{"ats_analysis": {"score": 88, "issues": [], "recommendations": ["Mention PyTorch"], "keyword_matches": ["mathematics"], "missing_keywords": ["pytorch"]}}"#,
        );
        let payload = json!({
            "resume": full_reply(70),
            "job_keywords": ["mathematics", "  ", "pytorch"]
        });
        let request = Request::post("/api/v1/resumes/ats-score")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = app(backend.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "ATS analysis updated successfully");
        assert_eq!(body["data"]["ats_analysis"]["score"], 88);
        assert_eq!(body["data"]["sections"], full_reply(70)["sections"]);

        let prompt = match &backend.last_request().unwrap().parts[0] {
            crate::llm_client::Part::Text(text) => text.clone(),
            other => panic!("expected text part, got {other:?}"),
        };
        assert!(prompt.contains("mathematics, pytorch"));
    }

    #[tokio::test]
    async fn test_ats_score_model_failure_is_bad_gateway() {
        let payload = json!({ "resume": full_reply(70) });
        let request = Request::post("/api/v1/resumes/ats-score")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = app(StubBackend::failing("quota exceeded"))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(json_body(response).await["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_null_leaves_do_not_trigger_fallback() {
        let mut reply = full_reply(85);
        reply["header"]["phone"] = Value::Null;
        reply["pro_suggestions"]["categories"][0]["priority"] = json!("Urgent");
        let backend = StubBackend::replying(&reply.to_string());
        let response = app(backend).oneshot(upload(PDF_MIME, b"%PDF-1.7")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["source"], "model");
        assert_eq!(body["degraded"], false);
        assert_eq!(body["data"]["ats_analysis"]["score"], 85);
        assert_eq!(body["data"]["header"]["phone"], "");
        assert_eq!(body["data"]["pro_suggestions"]["categories"][0]["priority"], "Medium");
    }

    #[tokio::test]
    async fn test_non_multipart_body_gets_error_envelope() {
        let backend = StubBackend::replying("{}");
        let request = Request::post("/api/v1/resumes/analyze")
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app(backend.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_ats_score_without_resume_gets_error_envelope() {
        let backend = StubBackend::replying("{}");
        let request = Request::post("/api/v1/resumes/ats-score")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "job_keywords": ["rust"] }).to_string()))
            .unwrap();
        let response = app(backend.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().contains("resume"));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_deadline_returns_timeout() {
        let config = Config {
            request_timeout: Duration::from_secs(5),
            model_timeout: Duration::from_secs(30),
            ..test_config()
        };
        let backend = StubBackend::slow(Duration::from_secs(300));
        let started = tokio::time::Instant::now();
        let response = app_with(backend, config)
            .oneshot(upload(PDF_MIME, b"%PDF-1.7"))
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(30));
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "TIMEOUT");
    }
}
