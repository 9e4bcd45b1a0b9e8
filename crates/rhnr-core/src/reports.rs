use std::collections::HashSet;

use polars::prelude::*;
use thiserror::Error;

use crate::columns::{ReviewSchema, INTEGRATES, OPERATING};
use crate::reconciliation::{key_set, key_values, retain_keys, ReconciliationError};
use crate::selection::{apply_filter, column_values, SelectionError};
use crate::values::FieldValue;

/// Codes that replaced non-existent codes in the initial selection.
pub const CORRECTED_CODES: [i64; 3] = [10100000, 11500000, 12351000];

/// The non-existent codes, in the same order as [`CORRECTED_CODES`].
pub const REPLACED_CODES: [i64; 3] = [10100001, 11500001, 12351001];

/// The non-existent code that `corrected` replaced.
pub fn replaced_code(corrected: i64) -> Option<i64> {
    CORRECTED_CODES
        .iter()
        .position(|code| *code == corrected)
        .map(|idx| REPLACED_CODES[idx])
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Proposed stations already in the initial selection and confirmed as
/// part of the network (`Integra RHNR? == true`; null is not confirmed).
pub fn retained(
    proposed: &DataFrame,
    initial: &DataFrame,
    schema: &ReviewSchema,
) -> Result<DataFrame, ReportError> {
    let key = schema.key();
    let initial_codes = key_set(initial, key, "initial")?;
    let integrated = integrated_codes(proposed, key)?;

    Ok(retain_keys(proposed, key, "proposed", |code| {
        initial_codes.contains(&code) && integrated.contains(&code)
    })?)
}

/// Proposed stations that were not part of the initial selection.
pub fn newly_added(
    proposed: &DataFrame,
    initial: &DataFrame,
    schema: &ReviewSchema,
) -> Result<DataFrame, ReportError> {
    let key = schema.key();
    let initial_codes = key_set(initial, key, "initial")?;
    Ok(retain_keys(proposed, key, "proposed", |code| {
        !initial_codes.contains(&code)
    })?)
}

fn integrated_codes(proposed: &DataFrame, key: &str) -> Result<HashSet<i64>, ReportError> {
    if proposed.width() == 0 {
        return Ok(HashSet::new());
    }
    let codes = key_values(proposed, key, "proposed")?;
    let flags = column_values(proposed, INTEGRATES)?;
    Ok(codes
        .into_iter()
        .zip(flags)
        .filter(|(_, flag)| *flag == FieldValue::Bool(true))
        .map(|(code, _)| code)
        .collect())
}

/// Breakdown of the initial selection shown in the initial-selection report.
#[derive(Debug, Clone)]
pub struct InitialSelectionReport {
    pub corrected: DataFrame,
    pub not_operating: DataFrame,
    pub operating: DataFrame,
}

pub fn initial_selection_report(
    initial: &DataFrame,
    schema: &ReviewSchema,
) -> Result<InitialSelectionReport, ReportError> {
    let corrected = retain_keys(initial, schema.key(), "initial", |code| {
        CORRECTED_CODES.contains(&code)
    })?;
    let (not_operating, operating) = if initial.width() == 0 {
        (initial.clone(), initial.clone())
    } else {
        (
            apply_filter(initial, Some(OPERATING), Some(&FieldValue::Int(0)))?,
            apply_filter(initial, Some(OPERATING), Some(&FieldValue::Int(1)))?,
        )
    };

    Ok(InitialSelectionReport {
        corrected,
        not_operating,
        operating,
    })
}
