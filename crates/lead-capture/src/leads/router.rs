use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use super::domain::{CodeConfirmation, LeadSubmission, VerificationRequest};
use super::service::{LeadCaptureService, LeadWorkflowError};
use super::verification::VerificationError;

pub const SUBMIT_LEAD_PATH: &str = "/api/submit-lead";

/// Actions understood by the lead endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeadAction {
    SendVerification,
    VerifyCode,
    SubmitLead,
}

impl LeadAction {
    fn from_payload(payload: &Value) -> Option<Self> {
        match payload.get("action").and_then(Value::as_str)? {
            "sendVerification" => Some(Self::SendVerification),
            "verifyCode" => Some(Self::VerifyCode),
            "submitLead" => Some(Self::SubmitLead),
            _ => None,
        }
    }
}

/// Router exposing the single action-dispatched lead endpoint.
pub fn lead_router(service: Arc<LeadCaptureService>) -> Router {
    Router::new()
        .route(
            SUBMIT_LEAD_PATH,
            post(dispatch_handler).fallback(method_not_allowed),
        )
        .layer(cors_layer())
        .with_state(service)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

pub(crate) async fn dispatch_handler(
    State(service): State<Arc<LeadCaptureService>>,
    body: Bytes,
) -> Response {
    let payload = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);

    match LeadAction::from_payload(&payload) {
        Some(LeadAction::SendVerification) => send_verification(&service, payload).await,
        Some(LeadAction::VerifyCode) => verify_code(&service, payload),
        Some(LeadAction::SubmitLead) => submit_lead(&service, payload).await,
        None => ApiError::InvalidAction.into_response(),
    }
}

pub(crate) async fn method_not_allowed() -> Response {
    ApiError::MethodNotAllowed.into_response()
}

async fn send_verification(service: &LeadCaptureService, payload: Value) -> Response {
    let request: VerificationRequest = serde_json::from_value(payload).unwrap_or_default();

    match service.send_verification(request).await {
        Ok(issued) => {
            let body = if service.echoes_verification_code() {
                json!({
                    "success": true,
                    "code": issued.code.as_str(),
                    "message": "Verification code sent",
                })
            } else {
                json!({
                    "success": true,
                    "message": "Verification code sent",
                })
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(VerificationError::InvalidPhone(_)) => ApiError::InvalidPhone.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "verification request failed");
            ApiError::Internal.into_response()
        }
    }
}

fn verify_code(service: &LeadCaptureService, payload: Value) -> Response {
    let confirmation: CodeConfirmation = serde_json::from_value(payload).unwrap_or_default();

    match service.confirm_verification(confirmation) {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "verified": true,
                "message": "Phone number verified",
            })),
        )
            .into_response(),
        Err(VerificationError::InvalidPhone(_)) => ApiError::InvalidPhone.into_response(),
        Err(VerificationError::MissingCode | VerificationError::Rejected(_)) => {
            ApiError::InvalidCode.into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "verification check failed");
            ApiError::Internal.into_response()
        }
    }
}

async fn submit_lead(service: &LeadCaptureService, payload: Value) -> Response {
    let Ok(submission) = serde_json::from_value::<LeadSubmission>(payload) else {
        return ApiError::MissingFields.into_response();
    };

    match service.submit_lead(submission).await {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "accessUrl": receipt.access_url,
                "message": "Lead processed successfully",
            })),
        )
            .into_response(),
        Err(LeadWorkflowError::MissingFields(missing)) => {
            tracing::debug!(%missing, "lead rejected");
            ApiError::MissingFields.into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "lead processing error");
            ApiError::LeadProcessing.into_response()
        }
    }
}

/// Client-facing failures. Messages are fixed; details stay in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ApiError {
    InvalidAction,
    InvalidPhone,
    InvalidCode,
    MissingFields,
    MethodNotAllowed,
    Internal,
    LeadProcessing,
}

impl ApiError {
    fn status(self) -> StatusCode {
        match self {
            Self::InvalidAction | Self::InvalidPhone | Self::InvalidCode | Self::MissingFields => {
                StatusCode::BAD_REQUEST
            }
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal | Self::LeadProcessing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::InvalidAction => "Invalid action",
            Self::InvalidPhone => "Invalid phone number",
            Self::InvalidCode => "Invalid verification code",
            Self::MissingFields => "Missing required fields",
            Self::MethodNotAllowed => "Method not allowed",
            Self::Internal => "Internal server error",
            Self::LeadProcessing => "Failed to process lead",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}
