pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/rounds", get(handlers::handle_list_rounds))
        .route("/api/v1/tags", post(handlers::handle_tag))
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/resume",
            post(handlers::handle_upload_resume).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/sessions/:id/generate",
            post(handlers::handle_generate),
        )
        .route(
            "/api/v1/sessions/:id/questions/:index/submit",
            post(handlers::handle_submit),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::interview::generator::tests::{mcq_reply, ScriptedCompletion};
    use crate::interview::store::SessionStore;

    fn test_state(replies: Vec<Result<String, String>>, daily_limit: u32) -> AppState {
        AppState {
            llm: Arc::new(ScriptedCompletion::new(replies)),
            sessions: SessionStore::new(daily_limit),
            config: Config {
                llm_api_key: "test-key".to_string(),
                llm_api_url: "http://localhost:0".to_string(),
                llm_model: "test-model".to_string(),
                llm_timeout_secs: 5,
                daily_limit,
                max_upload_bytes: 1024 * 1024,
                port: 0,
                rust_log: "info".to_string(),
            },
        }
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_session(app: &Router) -> String {
        let (status, body) = send(app, "POST", "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state(vec![], 50));
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["active_sessions"], 0);
    }

    #[tokio::test]
    async fn test_rounds_listing() {
        let app = build_router(test_state(vec![], 50));
        let (status, body) = send(&app, "GET", "/api/v1/rounds", None).await;
        assert_eq!(status, StatusCode::OK);
        let rounds = body.as_array().unwrap();
        assert_eq!(rounds.len(), 5);
        assert_eq!(rounds[0]["round_type"], "hr");
        assert_eq!(rounds[0]["multiple_choice"], false);
        assert_eq!(rounds[3]["label"], "Aptitude + Verbal");
        assert_eq!(rounds[3]["multiple_choice"], true);
    }

    #[tokio::test]
    async fn test_tag_endpoint() {
        let app = build_router(test_state(vec![], 50));
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/tags",
            Some(json!({"resume_text": "React and Machine Learning"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tags"], "Full Stack, Data Science");
        assert_eq!(body["labels"], json!(["Full Stack", "Data Science"]));
    }

    #[tokio::test]
    async fn test_mcq_round_trip_through_api() {
        let app = build_router(test_state(vec![Ok(mcq_reply(5))], 50));
        let id = create_session(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/generate"),
            Some(json!({"round_type": "technical_mcq", "resume_text": "Rust developer"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "generated");
        assert_eq!(body["session"]["questions"].as_array().unwrap().len(), 5);
        assert_eq!(body["session"]["usage"]["used"], 1);
        // Answer keys stay hidden until the question is locked.
        assert!(body["session"]["questions"][0]["result"].is_null());
        assert!(body["session"]["questions"][0].get("answer").is_none());

        let submit = format!("/api/v1/sessions/{id}/questions/0/submit");
        let (status, body) = send(&app, "POST", &submit, Some(json!({"selected": "three"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Correct!");
        assert_eq!(body["status"], "locked");
        assert_eq!(body["score"], 1);
        assert_eq!(body["total"], 5);
        assert_eq!(body["result"]["correct_option"], "C");

        let (status, body) = send(&app, "POST", &submit, Some(json!({"selected": "three"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let (_, body) = send(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(body["score"], 1);
        assert_eq!(body["questions"][0]["status"], "locked");
        assert_eq!(body["questions"][1]["status"], "unanswered");
    }

    #[tokio::test]
    async fn test_unknown_option_is_rejected_without_locking() {
        let app = build_router(test_state(vec![Ok(mcq_reply(5))], 50));
        let id = create_session(&app).await;
        send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/generate"),
            Some(json!({"round_type": "logical_reasoning", "resume_text": "Analyst"})),
        )
        .await;

        let submit = format!("/api/v1/sessions/{id}/questions/2/submit");
        let (status, body) = send(&app, "POST", &submit, Some(json!({"selected": "banana"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (_, body) = send(&app, "GET", &format!("/api/v1/sessions/{id}"), None).await;
        assert_eq!(body["questions"][2]["status"], "unanswered");

        let (status, body) = send(&app, "POST", &submit, Some(json!({"selected": "two"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Incorrect. Answer: C. three");
        assert_eq!(body["score"], 0);
    }

    #[tokio::test]
    async fn test_open_round_feedback_through_api() {
        let app = build_router(test_state(
            vec![
                Ok("Q: Tell me about yourself?\nQ: Why this role?".to_string()),
                Ok("Add a concrete example.".to_string()),
            ],
            50,
        ));
        let id = create_session(&app).await;

        let (_, body) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/generate"),
            Some(json!({"round_type": "hr", "resume_text": "Team lead"})),
        )
        .await;
        assert_eq!(body["session"]["questions"][1]["question"], "Why this role?");
        assert_eq!(body["session"]["questions"][1]["kind"], "open_ended");

        let submit = format!("/api/v1/sessions/{id}/questions/1/submit");
        let (status, body) = send(&app, "POST", &submit, Some(json!({"answer": "   "}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Please enter your answer.");
        assert_eq!(body["status"], "unanswered");

        let (_, body) = send(&app, "POST", &submit, Some(json!({"answer": "I love the product."}))).await;
        assert_eq!(body["message"], "Add a concrete example.");
        assert_eq!(body["status"], "locked");
        assert_eq!(body["result"]["kind"], "feedback");
        assert_eq!(body["score"], 0);
    }

    #[tokio::test]
    async fn test_quota_exhausted_returns_empty_batch() {
        let app = build_router(test_state(vec![Ok(mcq_reply(5)), Ok(mcq_reply(5))], 1));
        let id = create_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}/generate");
        let body = json!({"round_type": "aptitude_verbal", "resume_text": "Analyst"});

        let (_, first) = send(&app, "POST", &uri, Some(body.clone())).await;
        assert_eq!(first["outcome"], "generated");

        let (status, second) = send(&app, "POST", &uri, Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["outcome"], "quota_exceeded");
        assert!(second["session"]["questions"].as_array().unwrap().is_empty());
        assert_eq!(second["session"]["usage"]["remaining"], 0);
    }

    #[tokio::test]
    async fn test_generate_without_resume_is_rejected() {
        let app = build_router(test_state(vec![], 50));
        let id = create_session(&app).await;
        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/generate"),
            Some(json!({"round_type": "hr"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = build_router(test_state(vec![], 50));
        let uri = format!("/api/v1/sessions/{}", uuid::Uuid::new_v4());
        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let app = build_router(test_state(vec![], 50));
        let id = create_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}");
        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
