pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::sectioning::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/extract", post(handlers::handle_extract))
        .route("/parse", post(handlers::handle_parse))
        .route("/split/headlines", post(handlers::handle_split_headlines))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::extraction::{ExtractionError, TextExtractor};

    /// Returns canned text for any path, or `Empty` when there is none.
    struct StubExtractor(Option<String>);

    #[async_trait]
    impl TextExtractor for StubExtractor {
        async fn extract(&self, _path: &Path) -> Result<String, ExtractionError> {
            self.0.clone().ok_or(ExtractionError::Empty)
        }
    }

    fn app(text: Option<&str>) -> Router {
        build_router(AppState {
            config: Config::default(),
            extractor: Arc::new(StubExtractor(text.map(str::to_string))),
        })
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn resume() -> String {
        format!(
            "Jane Doe\n\nEXPERIENCE\n{}\n\nEDUCATION\n{}",
            "Led the billing platform team and shipped a new ledger service. ".repeat(4),
            "MSc Distributed Systems, Technical University. ".repeat(2),
        )
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["service"], "worker");
    }

    #[tokio::test]
    async fn test_parse_requires_file_path() {
        let (status, body) = post_json(app(Some("x")), "/parse", json!({"file_path": " "})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_parse_without_schema_returns_unknown() {
        let text = resume();
        let (status, body) =
            post_json(app(Some(&text)), "/parse", json!({"file_path": "cv.pdf"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["raw_text"], text.as_str());
        assert_eq!(
            body["sections"],
            json!([{"id": "unknown", "title": "UNKNOWN", "text": text, "parentId": null, "isGroup": false}])
        );
        assert_eq!(body["diagnostics"]["stats"]["parsing_mode"], "fallback_unknown");
        assert_eq!(body["diagnostics"]["stats"]["schema_source"], "none");
    }

    #[tokio::test]
    async fn test_parse_with_inline_schema() {
        let text = resume();
        let (_, body) = post_json(
            app(Some(&text)),
            "/parse",
            json!({
                "file_path": "cv.docx",
                "schema": {
                    "groups": [{"id": "work", "title": "EXPERIENCE"}],
                    "sections": [
                        {"id": "jobs", "title": "Jobs", "parentId": "work",
                         "anchors": {"start": ["EXPERIENCE"], "end": ["EDUCATION"]}},
                        {"id": "edu", "title": "Education", "start": "EDUCATION"}
                    ]
                }
            }),
        )
        .await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["diagnostics"]["stats"]["parsing_mode"], "schema");
        let ids: Vec<&str> = body["sections"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["work", "jobs", "edu"]);
        assert_eq!(body["sections"][1]["parentId"], "work");
        assert_eq!(body["sections"][0]["isGroup"], true);
    }

    #[tokio::test]
    async fn test_parse_empty_document() {
        let (status, body) = post_json(app(None), "/parse", json!({"file_path": "cv.pdf"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"], "parse failed: empty text");
        assert_eq!(
            body["diagnostics"]["summary"],
            "Parse failed: empty or unreadable document"
        );
        assert_eq!(body["diagnostics"]["stats"]["parsing_mode"], "error");
    }

    #[tokio::test]
    async fn test_unreadable_document_reports_requested_schema_source() {
        let (_, body) = post_json(
            app(None),
            "/parse",
            json!({"file_path": "cv.pdf", "schema_path": "schemas/cv.json"}),
        )
        .await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["diagnostics"]["stats"]["schema_source"], "file:cv.json");
    }

    #[tokio::test]
    async fn test_parse_with_malformed_schema() {
        let text = resume();
        let (_, body) = post_json(
            app(Some(&text)),
            "/parse",
            json!({"file_path": "cv.pdf", "schema": {"groups": "nope", "sections": [{"id": "a"}]}}),
        )
        .await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["raw_text"], text.as_str());
        assert_eq!(body["sections"], json!([]));
        assert_eq!(body["diagnostics"]["stats"]["parsing_mode"], "error");
        assert_eq!(body["diagnostics"]["stats"]["schema_source"], "inline");
    }

    #[tokio::test]
    async fn test_extract() {
        let (_, body) =
            post_json(app(Some("Jane Doe")), "/extract", json!({"file_path": "cv.pdf"})).await;
        assert_eq!(body, json!({"ok": true, "raw_text": "Jane Doe"}));

        let (_, body) = post_json(app(None), "/extract", json!({"file_path": "cv.pdf"})).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["raw_text"], "");
    }

    #[tokio::test]
    async fn test_split_headlines() {
        let (_, body) = post_json(
            app(None),
            "/split/headlines",
            json!({"raw_text": "jane@example.com\nSKILLS\nrust, go"}),
        )
        .await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["sections"][0]["title"], "Header");
        assert_eq!(body["sections"][1]["title"], "Skills");
    }
}
