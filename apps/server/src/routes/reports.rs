//! # Report Routes
//!
//! `preview` returns the report as JSON for the on-screen table;
//! `download` renders the same data as a PDF attachment (or HTML with
//! `?format=html`).

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use kulino_core::pdf::render_report_pdf;
use kulino_core::render::render_report_html;
use kulino_core::{DateRange, Report};

use super::{ApiQuery, RangeQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /api/reports/preview?startDate&endDate`
pub async fn preview(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Json<Report>> {
    let range = query.range()?;
    Ok(Json(state.db().ledger().report(&range).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadQuery {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// `GET /api/reports?startDate&endDate&format=pdf|html`
pub async fn download(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DownloadQuery>,
) -> ApiResult<Response> {
    let range = DateRange::parse(query.start_date.as_deref(), query.end_date.as_deref())?;

    let (content_type, extension) = match query.format.as_deref().unwrap_or("pdf") {
        "pdf" => ("application/pdf", "pdf"),
        "html" => ("text/html; charset=utf-8", "html"),
        other => {
            return Err(ApiError::validation(format!(
                "format must be one of: pdf, html (got '{}')",
                other
            ))
            .with_detail("field", "format"))
        }
    };

    let report = state.db().ledger().report(&range).await?;
    let body = if extension == "pdf" {
        render_report_pdf(&report, state.store())?
    } else {
        render_report_html(&report, state.store()).into_bytes()
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        file_name(&range, extension)
    );
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// `laporan-keuangan[-<start>][-<end>].<ext>`, dates as `YYYY-MM-DD`.
fn file_name(range: &DateRange, extension: &str) -> String {
    let mut name = String::from("laporan-keuangan");
    if let Some(start) = range.start() {
        name.push_str(&start.format("-%Y-%m-%d").to_string());
    }
    if let Some(end) = range.end_exclusive() {
        let last_day = end - chrono::Duration::days(1);
        name.push_str(&last_day.format("-%Y-%m-%d").to_string());
    }
    name.push('.');
    name.push_str(extension);
    name
}
