//! Customer wallet routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use sea_orm::EntityTrait;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use crate::routes::error_response;
use driftline_db::entities::customers;
use driftline_db::repositories::BalanceSyncEngine;
use driftline_shared::AppError;

/// Creates the customer routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/customers/{customer_id}/wallet", get(get_wallet))
}

/// GET `/customers/{customer_id}/wallet` - The customer's wallet as
/// recomputed by the balance sync engine.
async fn get_wallet(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> impl IntoResponse {
    match customers::Entity::find_by_id(customer_id).one(&*state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(&AppError::NotFound("Customer not found".to_string()));
        }
        Err(e) => {
            error!(error = %e, %customer_id, "failed to load customer");
            return error_response(&AppError::Database("An error occurred".to_string()));
        }
    }

    let engine = BalanceSyncEngine::new((*state.db).clone());
    match engine.resync(customer_id).await {
        Ok(wallet) => (StatusCode::OK, Json(json!({ "wallet": wallet }))).into_response(),
        Err(e) => {
            error!(error = %e, %customer_id, "wallet resync failed");
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}
