//! # Menu Routes
//!
//! Catalog management. A menu is saved together with its full size list;
//! `PUT` replaces that list in one unit.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::debug;

use kulino_core::{Menu, MenuInput};

use super::{ApiJson, ApiQuery, IdQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /api/menus`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Menu>>> {
    Ok(Json(state.db().menus().list().await?))
}

/// `POST /api/menus`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MenuInput>,
) -> ApiResult<(StatusCode, Json<Menu>)> {
    debug!(name = %input.name, sizes = input.sizes.len(), "create_menu");
    let menu = state.db().menus().create(&input).await?;
    Ok((StatusCode::CREATED, Json(menu)))
}

/// `PUT /api/menus`
pub async fn update(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MenuInput>,
) -> ApiResult<Json<Menu>> {
    if input.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
        return Err(ApiError::validation("id is required").with_detail("field", "id"));
    }
    debug!(id = ?input.id, "update_menu");
    Ok(Json(state.db().menus().update(&input).await?))
}

/// `DELETE /api/menus?id=`
pub async fn delete(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Json<Value>> {
    let id = query.require()?;
    state.db().menus().delete(&id).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}
