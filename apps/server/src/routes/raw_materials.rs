//! # Raw Material Routes

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

use kulino_core::{RawMaterial, RawMaterialInput};

use super::{ApiJson, ApiQuery, IdQuery};
use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/raw-materials`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<RawMaterial>>> {
    Ok(Json(state.db().raw_materials().list().await?))
}

/// `POST /api/raw-materials`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RawMaterialInput>,
) -> ApiResult<(StatusCode, Json<RawMaterial>)> {
    debug!(name = %input.name, quantity = input.quantity, "create_raw_material");
    let material = state.db().raw_materials().create(&input).await?;
    Ok((StatusCode::CREATED, Json(material)))
}

/// `PUT /api/raw-materials`
pub async fn update(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RawMaterialInput>,
) -> ApiResult<Json<RawMaterial>> {
    Ok(Json(state.db().raw_materials().update(&input).await?))
}

/// `DELETE /api/raw-materials?id=`
pub async fn delete(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Json<Value>> {
    let id = query.require()?;
    state.db().raw_materials().delete(&id).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}
