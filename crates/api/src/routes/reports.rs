//! Revenue report routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::AppState;
use crate::routes::error_response;
use driftline_db::repositories::{PeriodFilter, RevenueRepository};
use driftline_shared::AppError;

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/net-revenue", get(get_net_revenue))
}

/// Query parameters for the net revenue report.
#[derive(Debug, Deserialize)]
pub struct NetRevenueQuery {
    /// First day of the period (YYYY-MM-DD).
    pub from: NaiveDate,
    /// Last day of the period (YYYY-MM-DD).
    pub to: NaiveDate,
    /// Optional service filter.
    pub service: Option<String>,
}

/// GET `/reports/net-revenue` - The canonical net revenue figure for a
/// period and service filter.
async fn get_net_revenue(
    State(state): State<AppState>,
    Query(query): Query<NetRevenueQuery>,
) -> impl IntoResponse {
    if query.from > query.to {
        return error_response(&AppError::Validation(
            "'from' must not be after 'to'".to_string(),
        ));
    }

    let repo = RevenueRepository::new((*state.db).clone());
    let period = PeriodFilter {
        from: query.from,
        to: query.to,
    };

    match repo
        .resolve_net_revenue(period, query.service, &state.finance)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(json!({ "net_revenue": result }))).into_response(),
        Err(e) => {
            error!(error = %e, "failed to resolve net revenue");
            error_response(&AppError::Database("An error occurred".to_string()))
        }
    }
}
