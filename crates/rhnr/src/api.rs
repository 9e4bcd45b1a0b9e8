use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use polars::prelude::{DataFrame, Series};
use rhnr_core::columns::HIGHLIGHT_COLUMNS;
use rhnr_core::export::{to_xlsx_bytes, DEFAULT_SHEET_NAME};
use rhnr_core::highlight::{HexColor, HighlightRule};
use rhnr_core::selection::{apply_filter, options_for, parse_filter_value, SelectionError};
use rhnr_core::session::ReviewSession;
use rhnr_core::values::FieldValue;
use rhnr_core::RhnrError;
use serde::{Deserialize, Serialize};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct AppState {
    pub session: ReviewSession,
}

pub fn router(session: ReviewSession) -> Router {
    let state = Arc::new(AppState { session });
    Router::new()
        .route("/columns", get(columns))
        .route("/options/{column}", get(options))
        .route("/review", get(review))
        .route("/review.xlsx", get(review_xlsx))
        .route("/reports/retained", get(retained))
        .route("/reports/new", get(newly_added))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ColumnsResponse {
    pub snapshot: String,
    pub loaded_at: String,
    pub filterable: Vec<String>,
    pub highlight: Vec<String>,
}

/// A frame as JSON records, with optional per-row colours.
#[derive(Debug, Serialize)]
pub struct TableResponse {
    pub rows: usize,
    pub columns: Vec<String>,
    pub records: Vec<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Option<HexColor>>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    pub column: Option<String>,
    pub value: Option<String>,
    pub highlight: Option<String>,
}

fn status_for(err: &RhnrError) -> StatusCode {
    match err {
        RhnrError::Selection(SelectionError::UnknownColumn(_))
        | RhnrError::Selection(SelectionError::InvalidValue { .. })
        | RhnrError::Selection(SelectionError::NotHighlightable(_)) => StatusCode::BAD_REQUEST,
        RhnrError::Highlight(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: RhnrError) -> StatusCode {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("request failed: {err}");
    } else {
        tracing::debug!("rejected request: {err}");
    }
    status
}

pub fn table_response(
    frame: &DataFrame,
    colors: Option<Vec<Option<HexColor>>>,
) -> Result<TableResponse, RhnrError> {
    let columns: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let series: Vec<&Series> = frame
        .get_columns()
        .iter()
        .map(|column| column.as_materialized_series())
        .collect();

    let mut records = Vec::with_capacity(frame.height());
    for idx in 0..frame.height() {
        let mut record = serde_json::Map::with_capacity(columns.len());
        for (name, values) in columns.iter().zip(&series) {
            let value = FieldValue::from(values.get(idx)?);
            record.insert(
                name.clone(),
                serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
            );
        }
        records.push(record);
    }

    Ok(TableResponse {
        rows: frame.height(),
        columns,
        records,
        colors,
    })
}

/// Filtered review rows plus the highlight rule, which is built from the
/// unfiltered table so colours do not shift between filters.
fn filtered_review(
    session: &ReviewSession,
    query: &ReviewQuery,
) -> Result<(DataFrame, Option<HighlightRule>), RhnrError> {
    let table = session.final_table()?;
    let rule = match query.highlight.as_deref().filter(|c| !c.is_empty()) {
        Some(column) => Some(HighlightRule::for_review(&table, column)?),
        None => None,
    };
    let Some(column) = query.column.as_deref().filter(|c| !c.is_empty()) else {
        return Ok((table, rule));
    };
    let value = match query.value.as_deref() {
        Some(raw) => parse_filter_value(&table, column, raw)?,
        None => None,
    };
    Ok((apply_filter(&table, Some(column), value.as_ref())?, rule))
}

async fn columns(State(state): State<Arc<AppState>>) -> Json<ColumnsResponse> {
    let session = &state.session;
    Json(ColumnsResponse {
        snapshot: session.key().to_string(),
        loaded_at: session.loaded_at().to_rfc3339(),
        filterable: session
            .schema()
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        highlight: HIGHLIGHT_COLUMNS.iter().map(|c| c.to_string()).collect(),
    })
}

async fn options(
    State(state): State<Arc<AppState>>,
    Path(column): Path<String>,
) -> Result<Json<Vec<FieldValue>>, StatusCode> {
    let table = state.session.final_table().map_err(reject)?;
    options_for(&table, &column)
        .map(Json)
        .map_err(|err| reject(err.into()))
}

async fn review(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<TableResponse>, StatusCode> {
    let (filtered, rule) = filtered_review(&state.session, &query).map_err(reject)?;
    let colors = match &rule {
        Some(rule) => Some(rule.row_colors(&filtered).map_err(|err| reject(err.into()))?),
        None => None,
    };
    table_response(&filtered, colors).map(Json).map_err(reject)
}

async fn review_xlsx(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReviewQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let (filtered, rule) = filtered_review(&state.session, &query).map_err(reject)?;
    let bytes = to_xlsx_bytes(&filtered, DEFAULT_SHEET_NAME, rule.as_ref())
        .map_err(|err| reject(err.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"revisao_rhnr.xlsx\"",
            ),
        ],
        bytes,
    ))
}

async fn retained(State(state): State<Arc<AppState>>) -> Result<Json<TableResponse>, StatusCode> {
    let frame = state.session.retained().map_err(reject)?;
    let colors = HighlightRule::operating_status()
        .row_colors(&frame)
        .map_err(|err| reject(err.into()))?;
    table_response(&frame, Some(colors)).map(Json).map_err(reject)
}

async fn newly_added(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TableResponse>, StatusCode> {
    let frame = state.session.newly_added().map_err(reject)?;
    let colors = HighlightRule::operating_status()
        .row_colors(&frame)
        .map_err(|err| reject(err.into()))?;
    table_response(&frame, Some(colors)).map(Json).map_err(reject)
}
