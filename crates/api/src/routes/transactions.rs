//! Transaction deletion routes.
//!
//! The flow is two calls: a read-only dependency review, then the actual
//! deletion parameterized by the caller's selections. The review call
//! performs no mutation, so abandoning the flow there has zero side
//! effects.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use sea_orm::ActiveEnum;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::routes::error_response;
use driftline_core::cascade::{CascadeOption, CascadeStrategyResolver};
use driftline_core::package::PackageUsageExtractor;
use driftline_db::repositories::{
    DeleteOptions, DeletionError, DependencyInspector, TransactionDeletionCoordinator,
};
use driftline_shared::AppError;

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions/{transaction_id}/dependencies",
            get(get_dependencies),
        )
        .route("/transactions/{transaction_id}", delete(delete_transaction))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for deleting a transaction. The body is optional; an
/// absent body is a plain delete with no force, no cascade.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct DeleteTransactionRequest {
    /// Execute the cascade instead of failing on dependents.
    #[serde(default)]
    pub force: bool,
    /// Permanently delete with no reversal entry.
    #[serde(default)]
    pub hard_delete: bool,
    /// Per-package disposition selections.
    #[serde(default)]
    pub cascade: Vec<CascadeSelection>,
    /// Reason recorded on the reversal entry.
    #[validate(length(max = 512))]
    pub reason: Option<String>,
}

/// One package selection in a delete request.
#[derive(Debug, Deserialize)]
pub struct CascadeSelection {
    /// The package this selection applies to.
    pub package_id: Uuid,
    /// `"charge-used"` or `"delete-all-lessons"`; omit for the default.
    pub strategy: Option<String>,
    /// Whether the wallet may go negative for this package's debit.
    pub allow_negative: Option<bool>,
}

impl From<CascadeSelection> for CascadeOption {
    fn from(selection: CascadeSelection) -> Self {
        Self {
            package_id: selection.package_id,
            strategy: selection.strategy,
            allow_negative: selection.allow_negative,
        }
    }
}

/// One dependent booking in the review payload.
#[derive(Debug, Serialize)]
struct BookingSummary {
    id: Uuid,
    service_name: String,
    starts_at: String,
    status: String,
    package_id: Option<Uuid>,
}

/// One dependent package in the review payload, with the strategy the
/// cascade would apply absent a selection.
#[derive(Debug, Serialize)]
struct PackageSummary {
    id: Uuid,
    package_name: String,
    usage: driftline_core::package::PackageUsage,
    default_strategy: &'static str,
}

/// One dependent rental in the review payload.
#[derive(Debug, Serialize)]
struct RentalSummary {
    id: Uuid,
    equipment: String,
    status: String,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/transactions/{transaction_id}/dependencies` - Review what a
/// deletion would touch. Read-only.
async fn get_dependencies(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> impl IntoResponse {
    let inspector = DependencyInspector::new((*state.db).clone());

    match inspector.find_dependencies(transaction_id).await {
        Ok(Some(deps)) => {
            let bookings: Vec<BookingSummary> = deps
                .bookings
                .iter()
                .map(|b| BookingSummary {
                    id: b.id,
                    service_name: b.service_name.clone(),
                    starts_at: b.starts_at.to_rfc3339(),
                    status: b.status.to_value(),
                    package_id: b.package_id,
                })
                .collect();

            let packages: Vec<PackageSummary> = deps
                .packages
                .iter()
                .map(|p| {
                    let usage = PackageUsageExtractor::extract_usage(&p.usage_record());
                    let default_strategy = CascadeStrategyResolver::default_for(&usage).as_str();
                    PackageSummary {
                        id: p.id,
                        package_name: p.package_name.clone(),
                        usage,
                        default_strategy,
                    }
                })
                .collect();

            let rentals: Vec<RentalSummary> = deps
                .rentals
                .iter()
                .map(|r| RentalSummary {
                    id: r.id,
                    equipment: r.equipment.clone(),
                    status: r.status.to_value(),
                })
                .collect();

            (
                StatusCode::OK,
                Json(json!({
                    "transaction_id": transaction_id,
                    "has_dependencies": deps.has_dependencies(),
                    "bookings": bookings,
                    "packages": packages,
                    "rentals": rentals,
                })),
            )
                .into_response()
        }
        Ok(None) => error_response(&AppError::NotFound("Transaction not found".to_string())),
        Err(e) => {
            error!(error = %e, %transaction_id, "failed to inspect dependencies");
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}

/// DELETE `/transactions/{transaction_id}` - Delete a transaction and
/// everything it funded, or refuse with the dependency set.
async fn delete_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
    payload: Option<Json<DeleteTransactionRequest>>,
) -> impl IntoResponse {
    let request = payload.map(|Json(r)| r).unwrap_or_default();

    if let Err(e) = request.validate() {
        return error_response(&AppError::Validation(e.to_string()));
    }

    let options = DeleteOptions {
        force: request.force,
        hard_delete: request.hard_delete,
        cascade: request.cascade.into_iter().map(Into::into).collect(),
        reason: request.reason,
    };

    let coordinator = TransactionDeletionCoordinator::new((*state.db).clone());

    match coordinator.delete_transaction(transaction_id, options).await {
        Ok(report) => (StatusCode::OK, Json(json!({ "result": report }))).into_response(),
        Err(DeletionError::DependencyConflict(conflict)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "dependency_conflict",
                "message": format!(
                    "Transaction still funds {} dependent record(s); review and re-submit with selections",
                    conflict.dependent_count()
                ),
                "dependencies": conflict,
            })),
        )
            .into_response(),
        Err(DeletionError::Cascade(e)) => {
            error_response(&AppError::Validation(e.to_string()))
        }
        Err(DeletionError::Database(e)) => {
            error!(error = %e, %transaction_id, "transaction deletion failed");
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}
