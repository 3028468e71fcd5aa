mod auth;
mod prices;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use argent_service::{PriceService, SourceError};

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PriceService>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    configured: bool,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" | "auth_expired" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" | "vendor_rejected" => StatusCode::BAD_REQUEST,
            "vendor_unavailable" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Maps source errors to API errors. Vendor-supplied messages pass through
/// verbatim; everything else gets a generic body with the detail kept in the
/// log.
pub(super) fn map_source_error(request_id: String, error: &SourceError) -> ApiError {
    match error {
        SourceError::Rejected { message } => {
            ApiError::new(request_id, "vendor_rejected", message.clone())
        }
        SourceError::AuthExpired => ApiError::new(
            request_id,
            "auth_expired",
            "authentication expired; set up again",
        ),
        other => {
            tracing::error!(error = %other, "vendor operation failed");
            ApiError::new(
                request_id,
                "vendor_unavailable",
                "vendor request failed; try again later",
            )
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/setup", post(auth::setup))
        .route("/api/v1/verify", post(auth::verify))
        .route("/api/v1/refresh", post(auth::refresh))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new()
        .route("/", get(prices::dashboard))
        .route("/api/v1/health", get(health))
        .route("/api/v1/prices", get(prices::get_prices));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status: "ok",
                configured: state.service.is_configured(),
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method as http_method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use argent_service::PriceSource;
    use argent_store::StateStore;
    use argent_vendor::VendorClient;

    use super::*;

    fn temp_store() -> StateStore {
        let path = std::env::temp_dir().join(format!(
            "argent-server-{}.yaml",
            uuid::Uuid::new_v4()
        ));
        StateStore::new(path)
    }

    /// Builds the real router over a service backed by a wiremock vendor.
    fn test_app(vendor_base: &str) -> (Router, Arc<PriceService>) {
        let client = VendorClient::new(vendor_base, vendor_base, 5, "argent-test/0.1")
            .expect("test VendorClient");
        let source: Arc<dyn PriceSource> = Arc::new(client);
        let service =
            Arc::new(PriceService::restore(source, temp_store()).expect("service restore"));

        std::env::remove_var("ARGENT_API_KEYS");
        let auth = AuthState::from_env(true).expect("auth");
        let app = build_app(
            AppState {
                service: Arc::clone(&service),
            },
            auth,
        );
        (app, service)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, serde_json::from_slice(&body).expect("json parse"))
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, serde_json::from_slice(&bytes).expect("json parse"))
    }

    #[tokio::test]
    async fn health_reports_configuration_state() {
        let server = MockServer::start().await;
        let (app, _service) = test_app(&server.uri());

        let (status, json) = get_json(app, "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"].as_str(), Some("ok"));
        assert_eq!(json["data"]["configured"].as_bool(), Some(false));
        assert!(json["meta"]["request_id"].is_string());
    }

    #[tokio::test]
    async fn prices_endpoint_serves_an_empty_snapshot_initially() {
        let server = MockServer::start().await;
        let (app, _service) = test_app(&server.uri());

        let (status, json) = get_json(app, "/api/v1/prices").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["prices"].as_array().map(Vec::len), Some(0));
        assert_eq!(json["data"]["configured"].as_bool(), Some(false));
        assert_eq!(json["data"]["placeholder"].as_bool(), Some(false));
    }

    #[tokio::test]
    async fn setup_passes_vendor_rejection_through_verbatim() {
        let server = MockServer::start().await;

        Mock::given(http_method("POST"))
            .and(path("/auth/check-mobile-exists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
                "success": true,
                "data": { "exists": false }
            })))
            .mount(&server)
            .await;

        let (app, _service) = test_app(&server.uri());
        let (status, json) = post_json(
            app,
            "/api/v1/setup",
            json!({ "mobile": "09123456789", "markup_percent": 2.0 }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("vendor_rejected"));
        assert!(
            json["error"]["message"]
                .as_str()
                .unwrap()
                .contains("موجود نیست"),
            "the vendor's message must reach the user unchanged"
        );
    }

    #[tokio::test]
    async fn setup_rejects_a_blank_mobile_number() {
        let server = MockServer::start().await;
        let (app, _service) = test_app(&server.uri());

        let (status, json) = post_json(app, "/api/v1/setup", json!({ "mobile": "  " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    #[tokio::test]
    async fn full_flow_setup_verify_refresh_serves_prices() {
        let server = MockServer::start().await;

        Mock::given(http_method("POST"))
            .and(path("/auth/check-mobile-exists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
                "success": true,
                "data": { "exists": true }
            })))
            .mount(&server)
            .await;

        Mock::given(http_method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
                "success": true,
                "data": { "token": "abc" }
            })))
            .mount(&server)
            .await;

        Mock::given(http_method("GET"))
            .and(path("/profile/homepage"))
            .and(wiremock::matchers::header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
                "success": true,
                "data": {
                    "user_category_id": 2,
                    "user_categories": [
                        { "id": 2, "silvers": [
                            { "id": 11, "buy_price_gheram": 45_000, "sell_price_gheram": 47_000 }
                        ]}
                    ],
                    "features_data": {
                        "silver": [ { "id": 11, "title": "نقره 925", "buy_status": 1, "sell_status": 1 } ]
                    },
                    "buy_status": 1,
                    "sell_status": 1
                }
            })))
            .mount(&server)
            .await;

        let (app, service) = test_app(&server.uri());

        let (status, _) = post_json(
            app.clone(),
            "/api/v1/setup",
            json!({ "mobile": "09123456789", "markup_percent": 10.0 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = post_json(app.clone(), "/api/v1/verify", json!({ "code": "1234" })).await;
        assert_eq!(status, StatusCode::OK);
        assert!(service.is_configured());

        let (status, json) = post_json(app.clone(), "/api/v1/refresh", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["refreshed"].as_bool(), Some(true));

        let (status, json) = get_json(app, "/api/v1/prices").await;
        assert_eq!(status, StatusCode::OK);
        let prices = json["data"]["prices"].as_array().unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0]["buy_price_base"].as_i64(), Some(45_000));
        assert_eq!(prices[0]["buy_price"].as_i64(), Some(49_500));
        assert_eq!(prices[0]["buy_status"].as_i64(), Some(1));
    }

    #[tokio::test]
    async fn verify_without_a_mobile_anywhere_is_a_validation_error() {
        let server = MockServer::start().await;
        let (app, _service) = test_app(&server.uri());

        let (status, json) = post_json(app, "/api/v1/verify", json!({ "code": "1234" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    #[tokio::test]
    async fn refresh_reports_false_when_not_configured() {
        let server = MockServer::start().await;
        let (app, _service) = test_app(&server.uri());

        let (status, json) = post_json(app, "/api/v1/refresh", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["refreshed"].as_bool(), Some(false));
    }

    #[tokio::test]
    async fn dashboard_renders_html() {
        let server = MockServer::start().await;
        let (app, _service) = test_app(&server.uri());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<table"), "dashboard should render a table shell");
    }
}
