use crate::audit::{AuditEvent, AuditRecord};
use crate::receiver::ReceiverState;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, error, instrument, warn};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LogResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogResponse {
    fn ok() -> Json<Self> {
        Json(Self {
            success: true,
            error: None,
        })
    }

    fn failed(error: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            error: Some(error.into()),
        })
    }
}

/// First `X-Forwarded-For` hop, else `CF-Connecting-IP`.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    header("x-forwarded-for").or_else(|| header("cf-connecting-ip"))
}

fn api_key_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get("apikey")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|key| bool::from(key.as_bytes().ct_eq(expected.as_bytes())))
}

#[utoipa::path(
    post,
    path= "/log-admin-access",
    request_body = AuditEvent,
    params(
        ("apikey" = String, Header, description = "Shared audit API key"),
    ),
    responses (
        (status = 200, description = "Event appended to the audit trail", body = LogResponse, content_type = "application/json"),
        (status = 400, description = "Missing or malformed event", body = LogResponse),
        (status = 401, description = "Missing or wrong API key", body = LogResponse),
    ),
    tag= "audit"
)]
// axum handler for audit events
#[instrument(skip_all)]
pub async fn log_access(
    Extension(state): Extension<Arc<ReceiverState>>,
    headers: HeaderMap,
    payload: Option<Json<AuditEvent>>,
) -> impl IntoResponse {
    if !api_key_matches(&headers, state.api_key.expose_secret()) {
        warn!("audit event rejected: bad api key");
        return (
            StatusCode::UNAUTHORIZED,
            LogResponse::failed("invalid api key"),
        );
    }

    let event = match payload {
        Some(Json(event)) => event,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                LogResponse::failed("missing or malformed audit event"),
            )
        }
    };

    let record = AuditRecord::stamp(event, client_ip(&headers));
    debug!("audit record: {:?}", record);

    match state.trail.append(&record).await {
        Ok(()) => (StatusCode::OK, LogResponse::ok()),
        Err(e) => {
            error!("Error appending audit record: {e}");
            (StatusCode::BAD_REQUEST, LogResponse::failed(e.to_string()))
        }
    }
}
