pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/optimizations", post(handlers::handle_start))
        .route(
            "/api/v1/optimizations/current",
            get(handlers::handle_current),
        )
        .route(
            "/api/v1/optimizations/current/stop",
            post(handlers::handle_stop),
        )
        .route(
            "/api/v1/optimizations/current/suggestions/:index/toggle",
            post(handlers::handle_toggle),
        )
        .route(
            "/api/v1/optimizations/current/apply",
            post(handlers::handle_apply),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use bytes::Bytes;
    use futures_util::{stream, StreamExt};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::models::optimization::OptimizationRequest;
    use crate::models::resume::ResumeData;
    use crate::optimizer_client::{ClientError, EventByteStream, OptimizationBackend};
    use crate::session::controller::OptimizationController;

    const KEYWORDS: &str = "data: {\"step\":\"keywords\",\"progress\":50,\"message\":\"Generated keyword suggestions\",\"suggestions\":[{\"section\":\"skills\",\"type\":\"add_keyword\",\"original\":\"Current skill list\",\"suggested\":\"Docker\",\"reason\":\"Required\",\"impact\":\"high\"}],\"completed\":false}\n\n";
    const COMPLETE: &str = "data: {\"step\":\"complete\",\"progress\":100,\"message\":\"Optimization complete!\",\"suggestions\":[],\"completed\":true}\n\ndata: [DONE]\n\n";

    /// Every stream it opens replays the same two records.
    #[derive(Default)]
    struct ReplayBackend {
        saved: Mutex<Vec<ResumeData>>,
    }

    #[async_trait]
    impl OptimizationBackend for ReplayBackend {
        async fn open_stream(
            &self,
            _request: &OptimizationRequest,
        ) -> Result<EventByteStream, ClientError> {
            Ok(stream::iter([KEYWORDS, COMPLETE].map(|c| Ok::<_, ClientError>(Bytes::from(c)))).boxed())
        }

        async fn save_optimization(
            &self,
            _resume_id: &str,
            optimized_data: &ResumeData,
        ) -> Result<(), ClientError> {
            self.saved.lock().unwrap().push(optimized_data.clone());
            Ok(())
        }
    }

    fn app() -> (Router, Arc<ReplayBackend>) {
        let backend = Arc::new(ReplayBackend::default());
        let controller = OptimizationController::new(
            Arc::clone(&backend) as Arc<dyn OptimizationBackend>,
            crate::stream::DEFAULT_MAX_LINE_BYTES,
        );
        let state = AppState {
            controller: Arc::new(controller),
        };
        (build_router(state), backend)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(value) => Body::from(value.to_string()),
                None => Body::empty(),
            })
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

    fn start_body() -> Value {
        json!({
            "resume": {
                "id": "resume-1",
                "skills": { "technical": ["Python"] }
            },
            "job_id": "job-1"
        })
    }

    async fn wait_until_terminal(app: &Router) -> Value {
        for _ in 0..400 {
            let (_, session) = call(app, "GET", "/api/v1/optimizations/current", None).await;
            if session["status"] != "running" {
                return session;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session never finished");
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "resume-optimizer");
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_current_without_session_is_not_found() {
        let (app, _) = app();
        let (status, body) = call(&app, "GET", "/api/v1/optimizations/current", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_start_rejects_empty_job_id() {
        let (app, _) = app();
        let mut body = start_body();
        body["job_id"] = json!("  ");
        let (status, body) = call(&app, "POST", "/api/v1/optimizations", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_full_flow_start_toggle_apply() {
        let (app, backend) = app();

        let (status, started) =
            call(&app, "POST", "/api/v1/optimizations", Some(start_body())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(started["status"], "running");
        assert_eq!(started["progress"], 0);

        let finished = wait_until_terminal(&app).await;
        assert_eq!(finished["status"], "completed");
        assert_eq!(finished["suggestions"][0]["suggested"], "Docker");
        assert_eq!(finished["suggestions"][0]["type"], "add_keyword");

        let (status, _) = call(&app, "POST", "/api/v1/optimizations/current/apply", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, toggled) = call(
            &app,
            "POST",
            "/api/v1/optimizations/current/suggestions/0/toggle",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["suggestions"][0]["accepted"], true);

        let (status, applied) =
            call(&app, "POST", "/api/v1/optimizations/current/apply", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(applied["resume_id"], "resume-1");
        assert_eq!(
            applied["optimized_data"]["skills"]["technical"],
            json!(["Python", "Docker"])
        );
        assert_eq!(backend.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_out_of_range() {
        let (app, _) = app();
        call(&app, "POST", "/api/v1/optimizations", Some(start_body())).await;
        wait_until_terminal(&app).await;

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/optimizations/current/suggestions/9/toggle",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stop_after_completion_keeps_outcome() {
        let (app, _) = app();
        call(&app, "POST", "/api/v1/optimizations", Some(start_body())).await;
        wait_until_terminal(&app).await;

        let (status, session) =
            call(&app, "POST", "/api/v1/optimizations/current/stop", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(session["status"], "completed");
    }
}
