use std::collections::BTreeSet;

use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::values::{parse_for_dtype, FieldValue};

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("'{value}' is not a valid {dtype} value for column '{column}'")]
    InvalidValue {
        column: String,
        value: String,
        dtype: String,
    },
    #[error("column '{0}' cannot be used for highlighting")]
    NotHighlightable(String),
}

/// Sorted distinct values of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnOptions {
    pub column: String,
    pub values: Vec<FieldValue>,
}

fn column<'a>(table: &'a DataFrame, name: &str) -> Result<&'a Column, SelectionError> {
    table
        .column(name)
        .map_err(|_| SelectionError::UnknownColumn(name.to_string()))
}

/// Every cell of `name`, in row order.
pub fn column_values(table: &DataFrame, name: &str) -> Result<Vec<FieldValue>, SelectionError> {
    let series = column(table, name)?.as_materialized_series();
    (0..series.len())
        .map(|idx| -> Result<FieldValue, SelectionError> { Ok(FieldValue::from(series.get(idx)?)) })
        .collect()
}

pub fn options_for(table: &DataFrame, name: &str) -> Result<Vec<FieldValue>, SelectionError> {
    let distinct: BTreeSet<FieldValue> = column_values(table, name)?.into_iter().collect();
    Ok(distinct.into_iter().collect())
}

/// Option lists for `columns`, in the order requested.
pub fn select_options<S: AsRef<str>>(
    table: &DataFrame,
    columns: &[S],
) -> Result<Vec<ColumnOptions>, SelectionError> {
    columns
        .iter()
        .map(|name| {
            let name = name.as_ref();
            Ok(ColumnOptions {
                column: name.to_string(),
                values: options_for(table, name)?,
            })
        })
        .collect()
}

/// Rows where `column` equals `value`. With no column, an empty column name
/// or no value the table comes back unchanged.
pub fn apply_filter(
    table: &DataFrame,
    column: Option<&str>,
    value: Option<&FieldValue>,
) -> Result<DataFrame, SelectionError> {
    let (Some(name), Some(value)) = (column.filter(|name| !name.is_empty()), value) else {
        return Ok(table.clone());
    };

    let mask: Vec<bool> = column_values(table, name)?
        .iter()
        .map(|cell| cell == value)
        .collect();
    Ok(table.filter(&BooleanChunked::from_slice("mask".into(), &mask))?)
}

/// Rows where `column` equals any of `values`.
pub fn filter_any(
    table: &DataFrame,
    name: &str,
    values: &[FieldValue],
) -> Result<DataFrame, SelectionError> {
    let mask: Vec<bool> = column_values(table, name)?
        .iter()
        .map(|cell| values.contains(cell))
        .collect();
    Ok(table.filter(&BooleanChunked::from_slice("mask".into(), &mask))?)
}

/// Interprets filter text according to the column's dtype. Blank text means
/// no filter.
pub fn parse_filter_value(
    table: &DataFrame,
    name: &str,
    raw: &str,
) -> Result<Option<FieldValue>, SelectionError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let dtype = column(table, name)?.dtype();
    parse_for_dtype(raw, dtype)
        .map(Some)
        .ok_or_else(|| SelectionError::InvalidValue {
            column: name.to_string(),
            value: raw.to_string(),
            dtype: dtype.to_string(),
        })
}
