//! # Pre-Order Routes
//!
//! Saved carts for customers who pay later. Nothing here touches stock
//! except `convert`, which records the sale.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

use kulino_core::{NewPreOrder, PreOrder, PreOrderUpdate, SaleDetail};

use super::{ApiJson, ApiQuery, IdQuery};
use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/preorders`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<PreOrder>>> {
    Ok(Json(state.db().preorders().list().await?))
}

/// `POST /api/preorders`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewPreOrder>,
) -> ApiResult<(StatusCode, Json<PreOrder>)> {
    debug!(buyer = %input.buyer_name, lines = input.items.len(), "create_preorder");
    let order = state.db().preorders().create(&input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `PUT /api/preorders`
pub async fn update(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PreOrderUpdate>,
) -> ApiResult<Json<PreOrder>> {
    Ok(Json(state.db().preorders().update(&input).await?))
}

/// `DELETE /api/preorders?id=`
pub async fn delete(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Json<Value>> {
    let id = query.require()?;
    state.db().preorders().delete(&id).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

/// `POST /api/preorders/{id}/convert`
pub async fn convert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<(StatusCode, Json<SaleDetail>)> {
    debug!(id = %id, "convert_preorder");
    let sale = state.db().preorders().convert(&id).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
