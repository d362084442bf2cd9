pub mod health;
pub use self::health::health;

pub mod log_access;
pub use self::log_access::log_access;

use axum::response::{IntoResponse, Json};

// axum handler for the generated OpenAPI document
pub async fn openapi() -> impl IntoResponse {
    Json(super::openapi())
}
