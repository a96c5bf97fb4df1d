pub mod endpoints;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};

use crate::auth::auth_middleware;
use crate::dto::HealthResponse;
use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    let authed = Router::new()
        .route(
            "/endpoints",
            post(endpoints::create_endpoint).get(endpoints::list_endpoints),
        )
        .route("/endpoints/restore", post(endpoints::restore_endpoints))
        .route(
            "/endpoints/{id}",
            get(endpoints::get_endpoint).delete(endpoints::destroy_endpoint),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(authed)
        .route("/health", get(health))
        .with_state(state)
}

/// Ready once endpoints have been restored.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let ready = state.service.ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(HealthResponse { ready }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use vpn_core::{EndpointService, ProvisionerConfig, TemplateConfigGenerator};
    use vpn_infra::mock::{MockProvider, Op};

    use super::api_router;
    use crate::config::AppConfig;
    use crate::state::AppState;

    const KEY: &str = "test-key";

    fn build_app(provider: Arc<MockProvider>) -> (axum::Router, EndpointService) {
        let service = EndpointService::new(
            provider,
            Arc::new(TemplateConfigGenerator::default()),
            ProvisionerConfig {
                poll_interval: Duration::from_millis(5),
                timeout: Duration::from_secs(5),
                cleanup_failed_instances: false,
            },
        );
        let config = AppConfig {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            api_key: KEY.into(),
            provision_poll_interval_secs: 0,
            provision_timeout_secs: 5,
            cleanup_failed_instances: false,
            config_template: None,
        };
        let app = api_router(AppState {
            service: service.clone(),
            config,
        });
        (app, service)
    }

    fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {KEY}"))
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn rejects_missing_or_wrong_key() {
        let (app, _) = build_app(Arc::new(MockProvider::new()));

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/endpoints").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/endpoints")
                    .header("authorization", "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn create_returns_starting_endpoint_without_internal_fields() {
        let provider = Arc::new(MockProvider::new());
        provider.hold_creates();
        let (app, _) = build_app(provider.clone());

        let resp = app
            .oneshot(
                authed("POST", "/endpoints")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"region":"ams3"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "starting");
        assert_eq!(body["config"], "");
        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(body.get("ip").is_none());
        assert!(body.get("instance_id").is_none());
        provider.release_creates();
    }

    #[tokio::test]
    async fn create_requires_region() {
        let (app, _) = build_app(Arc::new(MockProvider::new()));

        let resp = app
            .oneshot(
                authed("POST", "/endpoints")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"region":"  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_and_destroy_unknown_endpoint_is_404() {
        let provider = Arc::new(MockProvider::new());
        let (app, _) = build_app(provider.clone());

        let resp = app
            .clone()
            .oneshot(authed("GET", "/endpoints/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app
            .oneshot(authed("DELETE", "/endpoints/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn destroy_while_starting_conflicts() {
        let provider = Arc::new(MockProvider::new());
        provider.hold_creates();
        let (app, service) = build_app(provider.clone());
        let created = service.create_endpoint("ams3").await.unwrap();

        let resp = app
            .oneshot(
                authed("DELETE", &format!("/endpoints/{}", created.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        provider.release_creates();
    }

    #[tokio::test]
    async fn destroy_failure_is_bad_gateway() {
        let provider = Arc::new(MockProvider::new());
        provider.with_instance("1", "vpn-abc", Some("1.2.3.4"));
        provider.fail(Op::Delete);
        let (app, service) = build_app(provider.clone());
        service.restore().await.unwrap();

        let resp = app
            .oneshot(authed("DELETE", "/endpoints/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(service.get_endpoint("abc").await.unwrap().status.as_str(), "running");
    }

    #[tokio::test]
    async fn restore_then_list_and_destroy() {
        let provider = Arc::new(MockProvider::new());
        provider.with_instance("1", "vpn-abc", Some("1.2.3.4"));
        let (app, _) = build_app(provider.clone());

        let resp = app
            .clone()
            .oneshot(authed("POST", "/endpoints/restore").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["adopted"], 1);

        let resp = app
            .clone()
            .oneshot(authed("GET", "/endpoints").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let list = body_json(resp).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], "abc");
        assert_eq!(list[0]["status"], "running");

        let resp = app
            .oneshot(authed("DELETE", "/endpoints/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "destroyed");
    }

    #[tokio::test]
    async fn health_reflects_restore() {
        let (app, service) = build_app(Arc::new(MockProvider::new()));

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        service.restore().await.unwrap();

        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["ready"], true);
    }
}
