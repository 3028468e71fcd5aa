//! Write-side endpoints: the three core entry points of the price service.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_source_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SetupRequest {
    pub mobile: String,
    #[serde(default)]
    pub markup_percent: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct VerifyRequest {
    /// Optional: falls back to the mobile number recorded at setup.
    pub mobile: Option<String>,
    pub code: String,
}

#[derive(Debug, Serialize)]
struct MessageData {
    message: String,
}

#[derive(Debug, Serialize)]
struct RefreshData {
    refreshed: bool,
}

/// Records the markup, then asks the vendor to send an OTP.
pub(super) async fn setup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<SetupRequest>,
) -> Response {
    let mobile = request.mobile.trim().to_owned();
    if mobile.is_empty() {
        return ApiError::new(req_id.0, "validation_error", "mobile number is required")
            .into_response();
    }

    state.service.set_markup(request.markup_percent);

    match state.service.begin_authentication(&mobile).await {
        Ok(message) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: MessageData { message },
                meta: ResponseMeta::new(req_id.0),
            }),
        )
            .into_response(),
        Err(e) => map_source_error(req_id.0, &e).into_response(),
    }
}

/// Completes authentication with the OTP the user received.
pub(super) async fn verify(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<VerifyRequest>,
) -> Response {
    let code = request.code.trim().to_owned();
    if code.is_empty() {
        return ApiError::new(req_id.0, "validation_error", "verification code is required")
            .into_response();
    }

    let Some(mobile) = request
        .mobile
        .map(|m| m.trim().to_owned())
        .filter(|m| !m.is_empty())
        .or_else(|| state.service.mobile())
    else {
        return ApiError::new(
            req_id.0,
            "validation_error",
            "no mobile number on record; run setup first",
        )
        .into_response();
    };

    match state.service.complete_authentication(&mobile, &code).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: MessageData {
                    message: "ورود موفق".to_owned(),
                },
                meta: ResponseMeta::new(req_id.0),
            }),
        )
            .into_response(),
        Err(e) => map_source_error(req_id.0, &e).into_response(),
    }
}

/// Triggers one refresh cycle. A `false` result means the refresh was
/// skipped or failed; the previous snapshot keeps being served either way.
pub(super) async fn refresh(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let refreshed = state.service.refresh_now().await;
    Json(ApiResponse {
        data: RefreshData { refreshed },
        meta: ResponseMeta::new(req_id.0),
    })
}
