//! Audit receiver: accepts audit events over HTTP and appends them to the trail.
//!
//! Callers are unauthenticated apart from a shared `apikey` header. The
//! receiver stamps every event with its own clock and the caller's address
//! before it is written.

use crate::audit::{trail::AuditTrail, AuditEvent, EventResult, EventType};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    routing::{get, post},
    Extension, Router,
};
use secrecy::SecretString;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug_span, info, Span};
use ulid::Ulid;
use utoipa::OpenApi;

pub mod handlers;

#[derive(Debug)]
pub struct ReceiverState {
    pub trail: AuditTrail,
    pub api_key: SecretString,
}

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health::health, handlers::log_access::log_access),
    components(schemas(
        AuditEvent,
        EventType,
        EventResult,
        handlers::log_access::LogResponse,
        handlers::health::Health
    )),
    tags(
        (name = "audit", description = "Admin login audit trail"),
        (name = "health", description = "Liveness"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the receiver router around shared state.
pub fn router(state: Arc<ReceiverState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
        // allow requests from any origin
        .allow_origin(Any);

    Router::new()
        .route("/log-admin-access", post(handlers::log_access))
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(handlers::openapi))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(state)),
        )
}

/// Serve the receiver until ctrl-c.
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn new(port: u16, state: ReceiverState) -> Result<()> {
    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!(
        "Listening on [::]:{}, trail {}",
        port,
        state.trail.path().display()
    );

    serve(listener, Arc::new(state), async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Gracefully shutdown");
    })
    .await
}

/// Serve on an already bound listener; used by `new` and by tests on ephemeral ports.
/// # Errors
/// Returns an error if the server fails.
pub async fn serve<F>(listener: TcpListener, state: Arc<ReceiverState>, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = router(state);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let headers = request.headers();
    let path = request.uri().path();
    let request_id = headers
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", path, request_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_routes() {
        let doc = openapi();
        assert!(doc.paths.paths.contains_key("/log-admin-access"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
