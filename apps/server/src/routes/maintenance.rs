//! # Maintenance Routes
//!
//! Health probe and the full data reset used when a shop starts over.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use kulino_db::migrations::migration_status;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub migrations_applied: usize,
    pub migrations_total: usize,
    pub version: &'static str,
}

/// `GET /api/health`
///
/// 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db().health_check().await;
    let (migrations_total, migrations_applied) = match migration_status(state.db().pool()).await {
        Ok(status) => status,
        Err(e) => {
            warn!(error = %e, "Could not read migration status");
            (0, 0)
        }
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if database { "ok" } else { "degraded" },
            database,
            migrations_applied,
            migrations_total,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

/// `POST /api/reset-database`
pub async fn reset_database(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    warn!("Resetting database on request");
    state.db().reset_all().await?;
    Ok(Json(json!({ "success": true })))
}
