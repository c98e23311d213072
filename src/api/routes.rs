//! Router assembly: route groups, access gates, the OpenAPI document and the
//! middleware stack.

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, StatusCode},
    middleware,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers::{accounts, attendance, discipline, farmers, health, org, payments};
use crate::api::middleware::{
    auth_middleware, error_envelope_middleware, logging_middleware, request_id_middleware,
    staff_middleware,
};
use crate::config::ServerConfig;
use crate::state::AppState;

/// Creates the application router.
///
/// # Access
/// - public: registration, login, token refresh, health
/// - any signed-in account: profile, sections of a block
/// - staff only (not farmer accounts): everything else
///
/// # Middleware order (outermost first)
/// request id, logging, CORS, compression, error envelope, timeout.
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let authenticate = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let members = OpenApiRouter::new()
        .merge(accounts::member_account_routes())
        .route_layer(authenticate.clone());

    // Layers wrap outward: authentication runs before the staff check.
    let staff = OpenApiRouter::new()
        .merge(accounts::user_admin_routes())
        .merge(org::org_routes())
        .merge(farmers::farmer_routes())
        .merge(attendance::attendance_routes())
        .merge(discipline::discipline_routes())
        .merge(payments::payment_routes())
        .route_layer(middleware::from_fn(staff_middleware))
        .route_layer(authenticate);

    let (router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(health::health_routes())
        .merge(accounts::public_account_routes())
        .merge(members)
        .merge(staff)
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(timeout_layer(Duration::from_secs(server.request_timeout)))
        .layer(middleware::from_fn(error_envelope_middleware))
        .layer(CompressionLayer::new())
        .layer(cors_layer(&server.cors_origins))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Requests running past `limit` are answered with 408.
fn timeout_layer(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit)
}

/// An empty origin list allows any origin. Entries that are not valid
/// header values are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::REQUEST_ID_HEADER;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, header},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(AppState::detached(), &ServerConfig::default())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_liveness_is_public() {
        let response = app().oneshot(get("/health/live")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_unknown_route_gets_json_404() {
        let response = app().oneshot(get("/api/nowhere/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_staff_routes_require_a_token() {
        for uri in [
            "/api/farmers/farmers/",
            "/api/attendance/",
            "/api/discipline/stats/",
            "/api/payments/7/",
            "/api/accounts/users/",
        ] {
            let response = app().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body_json(response).await["code"], "UNAUTHORIZED", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_member_routes_require_a_token() {
        let response = app().oneshot(get("/api/accounts/profile/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_authorization_header_is_rejected() {
        let request = Request::builder()
            .uri("/api/payments/stats/")
            .header(header::AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_body_is_validated_before_any_query() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/accounts/login/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"username":"","password":""}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["details"]["username"].is_array());
        assert!(body["details"]["password"].is_array());
    }

    #[tokio::test]
    async fn test_openapi_document_lists_every_group() {
        let response = app().oneshot(get("/api-docs/openapi.json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let paths = body["paths"].as_object().unwrap();
        for path in [
            "/api/accounts/login/",
            "/api/accounts/users/{id}/",
            "/api/farmers/sections/",
            "/api/farmers/farmers/{id}/",
            "/api/farmers/dashboard/stats/",
            "/api/attendance/penalties/reset/{farmer_id}/",
            "/api/discipline/{id}/resolve/",
            "/api/payments/{id}/verify/",
            "/health",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert!(body["components"]["securitySchemes"]["bearerAuth"].is_object());
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_configured_origin() {
        let server = ServerConfig {
            cors_origins: vec!["https://scheme.example".to_string(), "bad\norigin".to_string()],
            ..ServerConfig::default()
        };
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/payments/")
            .header(header::ORIGIN, "https://scheme.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = create_router(AppState::detached(), &server)
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://scheme.example"
        );
    }

    #[tokio::test]
    async fn test_slow_request_times_out_with_408() {
        let slow = Router::new()
            .route(
                "/slow",
                axum::routing::get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(10)));

        let response = slow.oneshot(get("/slow")).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
