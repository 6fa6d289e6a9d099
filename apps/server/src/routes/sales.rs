//! # Sale Routes
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart: Keripik (Besar) x2, Basreng (Kecil) x1                          │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  POST /api/sales { buyerName, items: [{ sizeId, quantity }] }          │
//! │                    │                                                    │
//! │       ┌────────────┴────────────┐                                       │
//! │       ▼                         ▼                                       │
//! │  201 SaleDetail            400 STOCK_NOT_ENOUGH                         │
//! │  (header, items,           { menuName, sizeName,                        │
//! │   INCOME transaction)        remainingStock, requested }                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GET /api/sales/{id}/receipt ──► HTML (or ?format=text | pdf)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use kulino_core::pdf::render_receipt_pdf;
use kulino_core::render::{render_receipt_html, render_receipt_text, Receipt, MAX_TEXT_WIDTH};
use kulino_core::{NewSale, SaleDetail, SaleEdit};

use super::{ApiJson, ApiQuery, IdQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Text receipt width when `?width=` is not given (58mm printers).
const DEFAULT_TEXT_WIDTH: usize = 32;

/// `POST /api/sales`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(sale): ApiJson<NewSale>,
) -> ApiResult<(StatusCode, Json<SaleDetail>)> {
    debug!(buyer = %sale.buyer_name, lines = sale.items.len(), "create_sale");
    let detail = state.db().sales().create(&sale).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// `GET /api/sales/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    Ok(Json(state.db().sales().get(&id).await?))
}

/// `PUT /api/sales`
pub async fn edit(
    State(state): State<AppState>,
    ApiJson(edit): ApiJson<SaleEdit>,
) -> ApiResult<Json<SaleDetail>> {
    debug!(id = %edit.sales_header_id, lines = edit.items.len(), "edit_sale");
    Ok(Json(state.db().sales().edit(&edit).await?))
}

/// `DELETE /api/sales?id=`
pub async fn delete(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> ApiResult<Json<Value>> {
    let id = query.require()?;
    state.db().sales().delete(&id).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReceiptQuery {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub width: Option<usize>,
}

/// `GET /api/sales/{id}/receipt`
pub async fn receipt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<ReceiptQuery>,
) -> ApiResult<Response> {
    let sale = state.db().sales().get(&id).await?;
    let receipt = Receipt::from_sale(&sale);

    match query.format.as_deref().unwrap_or("html") {
        "html" => Ok(Html(render_receipt_html(&receipt, state.store())).into_response()),
        "text" => {
            let width = query.width.unwrap_or(DEFAULT_TEXT_WIDTH);
            if width > MAX_TEXT_WIDTH {
                return Err(ApiError::validation(format!(
                    "width must be at most {}",
                    MAX_TEXT_WIDTH
                ))
                .with_detail("field", "width"));
            }
            Ok((
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                render_receipt_text(&receipt, state.store(), width),
            )
                .into_response())
        }
        "pdf" => {
            let bytes = render_receipt_pdf(&receipt, state.store())?;
            let disposition = format!("inline; filename=\"struk-{}.pdf\"", sale.header.id);
            Ok((
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
        other => Err(ApiError::validation(format!(
            "format must be one of: html, text, pdf (got '{}')",
            other
        ))
        .with_detail("field", "format")),
    }
}
