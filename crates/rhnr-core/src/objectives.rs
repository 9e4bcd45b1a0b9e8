use thiserror::Error;

/// Specific-objective codes in column order, grouped under six objectives.
pub const SPECIFIC_OBJECTIVE_CODES: [&str; 19] = [
    "1a", "1b", "2a", "2b", "2c", "3a", "3b", "4a", "4b", "4c", "4d", "5a", "5b", "6a", "6b", "6c",
    "6d", "6e", "6f",
];

pub const FLAG_PREFIX: &str = "obj_";

/// Columns of `obj_espec_estacoes_propostas` that are not objective flags.
pub const HOUSEKEEPING_COLUMNS: [&str; 2] = ["codigo", "tipo_mapeamento"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjectiveError {
    #[error("unknown specific objective '{0}'")]
    UnknownObjective(String),
}

/// Nullable flag per specific objective.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectiveFlags {
    flags: [Option<i64>; SPECIFIC_OBJECTIVE_CODES.len()],
}

impl ObjectiveFlags {
    pub fn column_name(code: &str) -> String {
        format!("{FLAG_PREFIX}{code}")
    }

    /// Flags in [`SPECIFIC_OBJECTIVE_CODES`] order.
    pub fn from_values(values: [Option<i64>; SPECIFIC_OBJECTIVE_CODES.len()]) -> Self {
        Self { flags: values }
    }

    fn position(code: &str) -> Result<usize, ObjectiveError> {
        SPECIFIC_OBJECTIVE_CODES
            .iter()
            .position(|candidate| *candidate == code)
            .ok_or_else(|| ObjectiveError::UnknownObjective(code.to_string()))
    }

    pub fn set(&mut self, code: &str, value: Option<i64>) -> Result<(), ObjectiveError> {
        let idx = Self::position(code)?;
        self.flags[idx] = value;
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<i64> {
        Self::position(code).ok().and_then(|idx| self.flags[idx])
    }

    /// Parses a comma-separated list such as `"1a, 6d"`, setting each listed
    /// objective to 1 and leaving the rest null.
    pub fn parse_list(list: &str) -> Result<Self, ObjectiveError> {
        let mut flags = Self::default();
        for code in list.split(',').map(str::trim).filter(|code| !code.is_empty()) {
            flags.set(&code.to_lowercase(), Some(1))?;
        }
        Ok(flags)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<i64>)> + '_ {
        SPECIFIC_OBJECTIVE_CODES.iter().copied().zip(self.flags.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.flags.iter().all(|flag| !flag.is_some_and(|value| value != 0))
    }

    pub fn summary(&self) -> String {
        summarize_flags(
            self.iter()
                .map(|(code, value)| (Self::column_name(code), value)),
        )
    }
}

/// Joins the suffixes of all set flag columns (`obj_1a` → `1a`) with `", "`,
/// in the order given. Housekeeping columns are ignored.
pub fn summarize_flags<S: AsRef<str>>(columns: impl IntoIterator<Item = (S, Option<i64>)>) -> String {
    columns
        .into_iter()
        .filter(|(name, _)| !HOUSEKEEPING_COLUMNS.contains(&name.as_ref()))
        .filter(|(_, value)| value.is_some_and(|value| value != 0))
        .map(|(name, _)| {
            let name = name.as_ref();
            name.strip_prefix(FLAG_PREFIX).unwrap_or(name).to_string()
        })
        .collect::<Vec<_>>()
        .join(", ")
}
