//! # Transaction Routes
//!
//! The ledger. Manual entries are created and edited here; entries owned by
//! a sale or a purchase are edited through their owner, but any entry can
//! be deleted here and takes its owner with it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use kulino_core::{
    DateRange, LedgerTransaction, ManualTransactionInput, TransactionSummary, TransactionType,
};

use super::{ApiJson, ApiQuery, IdQuery};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// `GET /api/transactions?startDate&endDate&type`
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<TransactionSummary>> {
    let range = DateRange::parse(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    )?;
    let kind = match query.kind.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<TransactionType>()?),
    };

    Ok(Json(state.db().ledger().list(&range, kind).await?))
}

/// `POST /api/transactions`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ManualTransactionInput>,
) -> ApiResult<(StatusCode, Json<LedgerTransaction>)> {
    debug!(kind = %input.kind, amount = input.amount, "create_transaction");
    let entry = state.db().ledger().create_manual(&input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `PUT /api/transactions`
pub async fn update(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ManualTransactionInput>,
) -> ApiResult<Json<LedgerTransaction>> {
    Ok(Json(state.db().ledger().update_manual(&input).await?))
}

/// `DELETE /api/transactions?id=`
pub async fn delete(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Json<Value>> {
    let id = query.require()?;
    state.db().ledger().delete(&id).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

#[derive(Debug, Default, Deserialize)]
pub struct LatestQuery {
    #[serde(default)]
    pub name: Option<String>,
}

/// `GET /api/transactions/latest?name=`
///
/// 404 when no purchase of that name has been recorded yet.
pub async fn latest(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LatestQuery>,
) -> ApiResult<Json<LedgerTransaction>> {
    let name = query.name.unwrap_or_default();
    state
        .db()
        .ledger()
        .latest_raw_material_expense(&name)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::new(
                ErrorCode::NotFound,
                format!("No purchase recorded for {}", name.trim()),
            )
        })
}
