pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::story::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::health_handler))
        .route("/health", get(health::health_handler))
        .route("/generate-story", post(handlers::handle_generate_story))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::tests::sample_config;
    use crate::llm_client::testing::{api_error, quota_error, ScriptedProvider};
    use crate::story::budget::{BudgetPolicy, TokenBudget};

    fn app(provider: Arc<ScriptedProvider>, budget: Arc<TokenBudget>) -> Router {
        app_with_env(provider, budget, "production")
    }

    fn app_with_env(
        provider: Arc<ScriptedProvider>,
        budget: Arc<TokenBudget>,
        app_env: &str,
    ) -> Router {
        let mut config = sample_config();
        config.app_env = app_env.to_string();
        build_router(AppState {
            provider,
            budget,
            config,
        })
    }

    fn persist_budget() -> Arc<TokenBudget> {
        Arc::new(TokenBudget::new(650, BudgetPolicy::Persist))
    }

    async fn post_story(router: Router, body: Value) -> Response {
        router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate-story")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_reports_running() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let response = app(provider, persist_budget())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "Server is running"}));
    }

    #[tokio::test]
    async fn test_generate_story_returns_cleaned_story() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "Here is a 600 word bedtime story: Tom loved dinosaurs.".to_string(),
        )]));

        let response = post_story(
            app(provider.clone(), persist_budget()),
            json!({"childName": "Tom", "age": "5", "interests": "dinosaurs"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"story": "Tom loved dinosaurs."}));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_required_fields_never_reach_provider() {
        for body in [
            json!({"age": "5"}),
            json!({"childName": "Tom"}),
            json!({"childName": "", "age": ""}),
        ] {
            let provider = Arc::new(ScriptedProvider::new(vec![]));
            let response = post_story(app(provider.clone(), persist_budget()), body).await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(
                body_json(response).await,
                json!({"error": "Child name and age are required"})
            );
            assert_eq!(provider.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_client_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let response = app(provider.clone(), persist_budget())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/generate-story")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_quota_error_is_retried_with_reported_allowance() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(quota_error(320)),
            Ok("A calm night.".to_string()),
        ]));
        let budget = persist_budget();

        let response = post_story(
            app(provider.clone(), budget.clone()),
            json!({"childName": "Tom", "age": "5"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(provider.ceilings(), vec![650, 320]);
        assert_eq!(budget.current(), 320);
    }

    #[tokio::test]
    async fn test_provider_error_maps_to_structured_body() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(api_error(
            400,
            "model is unavailable",
        ))]));

        let response = post_story(
            app(provider.clone(), persist_budget()),
            json!({"childName": "Tom", "age": "5"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to generate story");
        assert_eq!(body["message"], "model is unavailable");
        assert_eq!(body["details"]["currentMaxTokens"], 650);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_report_lowest_ceiling() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(quota_error(650)),
            Err(quota_error(400)),
            Err(quota_error(200)),
        ]));

        let response = post_story(
            app(provider.clone(), persist_budget()),
            json!({"childName": "Tom", "age": "5"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Maximum retry attempts reached");
        assert_eq!(body["details"]["type"], "retries_exhausted");
        assert_eq!(body["details"]["currentMaxTokens"], 200);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_error_stack_only_in_development() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(api_error(400, "bad model"))]));
        let response = post_story(
            app_with_env(provider, persist_budget(), "development"),
            json!({"childName": "Tom", "age": "5"}),
        )
        .await;
        let body = body_json(response).await;
        let stack = body["details"]["stack"].as_str().unwrap();
        assert!(stack.contains("bad model"));

        let provider = Arc::new(ScriptedProvider::new(vec![Err(api_error(400, "bad model"))]));
        let response = post_story(
            app(provider, persist_budget()),
            json!({"childName": "Tom", "age": "5"}),
        )
        .await;
        let body = body_json(response).await;
        assert_eq!(body["message"], "bad model");
        assert!(body["details"].get("stack").is_none());
    }
}
