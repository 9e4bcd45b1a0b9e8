use std::collections::HashSet;

use once_cell::sync::Lazy;
use polars::prelude::*;

use crate::reconciliation::ReconciliationError;

pub const CODE: &str = "Código da Estação";
pub const NAME: &str = "Nome";
pub const RESPONSIBLE: &str = "Responsável";
pub const OPERATOR: &str = "Operadora";
pub const BASIN: &str = "Bacia";
pub const OPERATING: &str = "Operando";
pub const CURRENT_TYPOLOGY: &str = "Tipologia Atual";
pub const IN_INITIAL: &str = "RHNR Inicial?";
pub const IMPLEMENTED: &str = "RHNR Implementada";
pub const PROPOSED_ACTION: &str = "Ação Proposta";
pub const PROPOSED_TYPOLOGY: &str = "Tipologia Proposta";
pub const INTEGRATES: &str = "Integra RHNR?";
pub const SPECIFIC_OBJECTIVES: &str = "Objs. Específicos";
pub const OBSERVATION: &str = "Observação";

/// Columns containing this marker are dropped by standardization.
pub const OBJECTIVE_MARKER: &str = "Objetivo";

pub const OBJECTIVE_COLUMNS: [&str; 6] = [
    "Objetivo 1",
    "Objetivo 2",
    "Objetivo 3",
    "Objetivo 4",
    "Objetivo 5",
    "Objetivo 6",
];

/// Columns offered for row highlighting.
pub const HIGHLIGHT_COLUMNS: [&str; 8] = [
    RESPONSIBLE,
    OPERATOR,
    BASIN,
    OPERATING,
    IMPLEMENTED,
    IN_INITIAL,
    INTEGRATES,
    PROPOSED_ACTION,
];

/// Key column plus the ordered, typed columns of a review table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSchema {
    key: String,
    initial_flag: String,
    columns: Vec<(String, DataType)>,
}

pub static REVIEW_SCHEMA: Lazy<ReviewSchema> = Lazy::new(|| ReviewSchema {
    key: CODE.to_string(),
    initial_flag: IN_INITIAL.to_string(),
    columns: vec![
        (CODE.to_string(), DataType::Int64),
        (NAME.to_string(), DataType::String),
        (RESPONSIBLE.to_string(), DataType::String),
        (OPERATOR.to_string(), DataType::String),
        (BASIN.to_string(), DataType::String),
        (OPERATING.to_string(), DataType::Int64),
        (CURRENT_TYPOLOGY.to_string(), DataType::String),
        (IN_INITIAL.to_string(), DataType::Boolean),
        (IMPLEMENTED.to_string(), DataType::Boolean),
        (PROPOSED_ACTION.to_string(), DataType::String),
        (PROPOSED_TYPOLOGY.to_string(), DataType::String),
        (INTEGRATES.to_string(), DataType::Boolean),
        (SPECIFIC_OBJECTIVES.to_string(), DataType::String),
    ],
});

impl ReviewSchema {
    pub fn new(
        key: impl Into<String>,
        initial_flag: impl Into<String>,
        columns: Vec<(String, DataType)>,
    ) -> Result<Self, ReconciliationError> {
        let key = key.into();
        let initial_flag = initial_flag.into();

        let mut seen = HashSet::new();
        for (name, _) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(ReconciliationError::DuplicateColumn(name.clone()));
            }
        }
        for required in [&key, &initial_flag] {
            if !seen.contains(required.as_str()) {
                return Err(ReconciliationError::UndeclaredColumn(required.clone()));
            }
        }

        Ok(Self {
            key,
            initial_flag,
            columns,
        })
    }

    pub fn canonical() -> &'static ReviewSchema {
        &REVIEW_SCHEMA
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn initial_flag(&self) -> &str {
        &self.initial_flag
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &DataType)> {
        self.columns.iter().map(|(name, dtype)| (name.as_str(), dtype))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn dtype(&self, name: &str) -> Option<&DataType> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, dtype)| dtype)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dtype(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Zero-row frame with every column at its canonical dtype.
    pub fn empty_frame(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|(name, dtype)| Series::new_empty(name.as_str().into(), dtype).into_column())
            .collect();
        DataFrame::new(columns)
    }
}
