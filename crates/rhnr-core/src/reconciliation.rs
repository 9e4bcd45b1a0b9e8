//! Pure frame operations that reconcile the initial-selection, validated and
//! proposed station sets into one review table keyed by station code.
//!
//! Precedence when a code appears in several sets: proposed, then
//! initial-only, then validated-only. Inputs are never mutated.

use std::collections::{HashMap, HashSet};

use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::columns::{ReviewSchema, CURRENT_TYPOLOGY, OBJECTIVE_MARKER, SPECIFIC_OBJECTIVES};

#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("{table} table has no key column '{column}'")]
    MissingKey { table: &'static str, column: String },
    #[error("{table} table has a null station code at row {row}")]
    NullKey { table: &'static str, row: usize },
    #[error("column '{0}' is declared more than once")]
    DuplicateColumn(String),
    #[error("column '{0}' is not declared in the schema")]
    UndeclaredColumn(String),
}

/// Projects `table` onto the schema: objective columns are dropped, present
/// columns are cast to their canonical dtype and absent ones become typed
/// nulls.
pub fn standardize(
    table: &DataFrame,
    schema: &ReviewSchema,
) -> Result<DataFrame, ReconciliationError> {
    let height = table.height();
    let mut columns = Vec::with_capacity(schema.len());

    for (name, dtype) in schema.columns() {
        let column = match table.column(name) {
            Ok(existing) if !name.contains(OBJECTIVE_MARKER) => existing.cast(dtype)?,
            _ => Series::full_null(name.into(), height, dtype).into_column(),
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}

/// Sets the schema's initial-selection flag to `value` on every row.
pub fn tag_initial(
    table: &DataFrame,
    schema: &ReviewSchema,
    value: bool,
) -> Result<DataFrame, ReconciliationError> {
    let flag = schema.initial_flag();
    let dtype = schema.dtype(flag).cloned().unwrap_or(DataType::Boolean);
    let mut tagged = table.clone();
    tagged.with_column(Series::new(flag.into(), vec![value; tagged.height()]).cast(&dtype)?)?;
    Ok(tagged)
}

/// Sets a null initial-selection flag from membership in `initial_codes`;
/// flags already present are kept.
fn fill_initial_flag(
    table: &DataFrame,
    schema: &ReviewSchema,
    initial_codes: &HashSet<i64>,
) -> Result<DataFrame, ReconciliationError> {
    let flag = schema.initial_flag();
    let codes = key_values(table, schema.key(), "proposed")?;
    let existing = table.column(flag)?.cast(&DataType::Boolean)?;
    let existing = existing.as_materialized_series().bool()?;

    let filled: Vec<bool> = codes
        .iter()
        .zip(existing.into_iter())
        .map(|(code, current)| current.unwrap_or_else(|| initial_codes.contains(code)))
        .collect();

    let dtype = schema.dtype(flag).cloned().unwrap_or(DataType::Boolean);
    let mut filled_table = table.clone();
    filled_table.with_column(Series::new(flag.into(), filled).cast(&dtype)?)?;
    Ok(filled_table)
}

/// Station codes of `table` in row order. Null codes are an error; a frame
/// without columns has no codes.
pub fn key_values(
    table: &DataFrame,
    key: &str,
    label: &'static str,
) -> Result<Vec<i64>, ReconciliationError> {
    if table.width() == 0 {
        return Ok(Vec::new());
    }
    let column = table
        .column(key)
        .map_err(|_| ReconciliationError::MissingKey {
            table: label,
            column: key.to_string(),
        })?
        .cast(&DataType::Int64)?;
    let codes = column.as_materialized_series().i64()?;

    codes
        .into_iter()
        .enumerate()
        .map(|(row, code)| code.ok_or(ReconciliationError::NullKey { table: label, row }))
        .collect()
}

pub fn key_set(
    table: &DataFrame,
    key: &str,
    label: &'static str,
) -> Result<HashSet<i64>, ReconciliationError> {
    Ok(key_values(table, key, label)?.into_iter().collect())
}

/// Rows of `table` whose code satisfies `keep`.
pub fn retain_keys(
    table: &DataFrame,
    key: &str,
    label: &'static str,
    mut keep: impl FnMut(i64) -> bool,
) -> Result<DataFrame, ReconciliationError> {
    let mask: Vec<bool> = key_values(table, key, label)?
        .into_iter()
        .map(|code| keep(code))
        .collect();
    Ok(table.filter(&BooleanChunked::from_slice("mask".into(), &mask))?)
}

fn exclude_keys(
    table: &DataFrame,
    key: &str,
    label: &'static str,
    excluded: &HashSet<i64>,
) -> Result<DataFrame, ReconciliationError> {
    retain_keys(table, key, label, |code| !excluded.contains(&code))
}

/// Keeps the first row per code.
fn dedupe_keys(
    table: &DataFrame,
    key: &str,
    label: &'static str,
) -> Result<DataFrame, ReconciliationError> {
    let mut seen = HashSet::new();
    let deduped = retain_keys(table, key, label, |code| seen.insert(code))?;
    if deduped.height() != table.height() {
        debug!(
            table = label,
            dropped = table.height() - deduped.height(),
            "Dropped duplicate station codes"
        );
    }
    Ok(deduped)
}

/// Proposal rows joined with their objective summaries and flagged against
/// the initial-selection set.
///
/// `objectives` carries the key column and `Objs. Específicos`; proposals
/// without a summary get null.
pub fn assemble_proposed(
    proposals: &DataFrame,
    objectives: &DataFrame,
    initial: &DataFrame,
    schema: &ReviewSchema,
) -> Result<DataFrame, ReconciliationError> {
    let key = schema.key();
    let codes = key_values(proposals, key, "proposed")?;
    let initial_codes = key_set(initial, key, "initial")?;
    let summaries = text_by_key(objectives, key, SPECIFIC_OBJECTIVES, "objectives")?;

    let objective_values: Vec<Option<String>> =
        codes.iter().map(|code| summaries.get(code).cloned()).collect();
    let in_initial: Vec<bool> = codes
        .iter()
        .map(|code| initial_codes.contains(code))
        .collect();

    let mut assembled = proposals.clone();
    assembled.with_column(Series::new(SPECIFIC_OBJECTIVES.into(), objective_values))?;
    assembled.with_column(Series::new(schema.initial_flag().into(), in_initial))?;

    let standardized = standardize(&assembled, schema)?;
    dedupe_keys(&standardized, key, "proposed")
}

/// Fills `Tipologia Atual` from `typologies` wherever `table` has no value.
pub fn attach_typology(
    table: &DataFrame,
    typologies: &DataFrame,
    key: &str,
) -> Result<DataFrame, ReconciliationError> {
    if table.width() == 0 {
        return Ok(table.clone());
    }
    let codes = key_values(table, key, "station")?;
    let lookup = text_by_key(typologies, key, CURRENT_TYPOLOGY, "typology")?;

    let existing: Vec<Option<String>> = match table.column(CURRENT_TYPOLOGY) {
        Ok(column) => column
            .cast(&DataType::String)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect(),
        Err(_) => vec![None; codes.len()],
    };

    let merged: Vec<Option<String>> = codes
        .iter()
        .zip(existing)
        .map(|(code, current)| current.or_else(|| lookup.get(code).cloned()))
        .collect();

    let mut attached = table.clone();
    attached.with_column(Series::new(CURRENT_TYPOLOGY.into(), merged))?;
    Ok(attached)
}

fn text_by_key(
    table: &DataFrame,
    key: &str,
    column: &str,
    label: &'static str,
) -> Result<HashMap<i64, String>, ReconciliationError> {
    if table.width() == 0 {
        return Ok(HashMap::new());
    }
    let codes = key_values(table, key, label)?;
    let values = table.column(column)?.cast(&DataType::String)?;
    let values = values.as_materialized_series().str()?;

    let mut lookup = HashMap::with_capacity(codes.len());
    for (code, value) in codes.into_iter().zip(values.into_iter()) {
        if let Some(value) = value {
            lookup.entry(code).or_insert_with(|| value.to_string());
        }
    }
    Ok(lookup)
}

/// Unifies the three station sets into the review table, sorted by code.
///
/// `proposed` is expected to come from [`assemble_proposed`]; it is
/// standardized again so hand-built frames line up as well.
pub fn build_final_table(
    initial: &DataFrame,
    validated: &DataFrame,
    proposed: &DataFrame,
    schema: &ReviewSchema,
) -> Result<DataFrame, ReconciliationError> {
    let key = schema.key();

    let initial = dedupe_keys(&standardize(initial, schema)?, key, "initial")?;
    let initial = tag_initial(&initial, schema, true)?;
    let initial_codes = key_set(&initial, key, "initial")?;

    let proposed = dedupe_keys(&standardize(proposed, schema)?, key, "proposed")?;
    let proposed = fill_initial_flag(&proposed, schema, &initial_codes)?;
    let proposed_codes = key_set(&proposed, key, "proposed")?;

    let initial_only = exclude_keys(&initial, key, "initial", &proposed_codes)?;

    let validated = dedupe_keys(&standardize(validated, schema)?, key, "validated")?;
    let validated_only = exclude_keys(&validated, key, "validated", &initial_codes)?;
    let validated_only = tag_initial(&validated_only, schema, false)?;
    let validated_only = exclude_keys(&validated_only, key, "validated", &proposed_codes)?;

    debug!(
        proposed = proposed.height(),
        initial_only = initial_only.height(),
        validated_only = validated_only.height(),
        "Reconciled station sets"
    );

    let mut unified = proposed;
    unified.vstack_mut(&initial_only)?;
    unified.vstack_mut(&validated_only)?;

    Ok(unified.sort(
        [key],
        SortMultipleOptions::default().with_maintain_order(true),
    )?)
}
