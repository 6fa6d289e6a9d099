//! # HTTP Routes
//!
//! ```text
//! /api
//!  ├── health                     GET
//!  ├── menus                      GET POST PUT DELETE?id=
//!  ├── sales                      POST PUT DELETE?id=
//!  │    ├── {id}                  GET
//!  │    └── {id}/receipt          GET  (?format=html|text|pdf&width=)
//!  ├── transactions               GET?startDate&endDate&type POST PUT DELETE?id=
//!  │    └── latest                GET?name=
//!  ├── raw-materials              GET POST PUT DELETE?id=
//!  ├── preorders                  GET POST PUT DELETE?id=
//!  │    └── {id}/convert          POST
//!  ├── reports                    GET?startDate&endDate  (PDF download)
//!  │    └── preview               GET?startDate&endDate  (JSON)
//!  └── reset-database             POST
//! ```
//!
//! Request and response bodies are camelCase JSON; failures are
//! [`ApiError`] bodies.

pub mod maintenance;
pub mod menus;
pub mod preorders;
pub mod raw_materials;
pub mod reports;
pub mod sales;
pub mod transactions;

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use kulino_core::DateRange;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// All API routes, without middleware.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(maintenance::health))
        .route("/api/reset-database", post(maintenance::reset_database))
        .route(
            "/api/menus",
            get(menus::list)
                .post(menus::create)
                .put(menus::update)
                .delete(menus::delete),
        )
        .route(
            "/api/sales",
            post(sales::create).put(sales::edit).delete(sales::delete),
        )
        .route("/api/sales/{id}", get(sales::get))
        .route("/api/sales/{id}/receipt", get(sales::receipt))
        .route(
            "/api/transactions",
            get(transactions::list)
                .post(transactions::create)
                .put(transactions::update)
                .delete(transactions::delete),
        )
        .route("/api/transactions/latest", get(transactions::latest))
        .route(
            "/api/raw-materials",
            get(raw_materials::list)
                .post(raw_materials::create)
                .put(raw_materials::update)
                .delete(raw_materials::delete),
        )
        .route(
            "/api/preorders",
            get(preorders::list)
                .post(preorders::create)
                .put(preorders::update)
                .delete(preorders::delete),
        )
        .route("/api/preorders/{id}/convert", post(preorders::convert))
        .route("/api/reports", get(reports::download))
        .route("/api/reports/preview", get(reports::preview))
}

// =============================================================================
// Extractors
// =============================================================================

/// `Json<T>` whose rejection is an [`ApiError`] body instead of plain text.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(format!("Invalid JSON body: {}", e.body_text())))?;
        Ok(ApiJson(value))
    }
}

/// `Query<T>` whose rejection is an [`ApiError`] body instead of plain text.
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation(format!("Invalid query string: {}", e.body_text())))?;
        Ok(ApiQuery(value))
    }
}

/// `?id=` of the DELETE endpoints.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    #[serde(default)]
    pub id: Option<String>,
}

impl IdQuery {
    /// The id, or a validation error when it is missing or blank.
    pub fn require(self) -> ApiResult<String> {
        match self.id {
            Some(id) if !id.trim().is_empty() => Ok(id.trim().to_string()),
            _ => Err(ApiError::validation("id is required").with_detail("field", "id")),
        }
    }
}

/// `?startDate=&endDate=` of the ledger and report endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl RangeQuery {
    pub fn range(&self) -> ApiResult<DateRange> {
        Ok(DateRange::parse(
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )?)
    }
}
