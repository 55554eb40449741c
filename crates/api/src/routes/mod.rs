//! API route definitions.

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use serde_json::json;

use crate::AppState;
use axum::Router;
use driftline_shared::AppError;

pub mod customers;
pub mod health;
pub mod reports;
pub mod transactions;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(transactions::routes())
        .merge(reports::routes())
        .merge(customers::routes())
}

/// Renders an application error as a JSON response with its mapped status.
pub(crate) fn error_response(err: &AppError) -> Response {
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}
