use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::SheetError;

/// Cell contents that survey spreadsheets use to mean "no value".
pub const DEFAULT_NULL_VALUES: [&str; 9] = [
    "-",
    "--",
    "---",
    " --",
    "",
    "NOVA",
    "***",
    "NOVA ESTAÇÃO",
    "99999999",
];

/// Declarative description of one spreadsheet source.
///
/// ```toml
/// path = "planilhas/ceara.xlsx"
/// sheet = "Estações"
/// skip_rows = 2
///
/// [[columns]]
/// source = "Código"
/// target = "codigo"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSource {
    pub path: PathBuf,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub skip_rows: usize,
    pub columns: Vec<ColumnMapping>,
    #[serde(default = "default_null_values")]
    pub null_values: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<ExcludeRule>,
    #[serde(default)]
    pub value_remap: Vec<ValueRemap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source: String,
    pub target: String,
}

/// Drops rows whose `column` (a target name) holds one of `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludeRule {
    pub column: String,
    pub values: Vec<String>,
}

/// Rewrites numeric cells equal to `from` in every target column starting
/// with `prefix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRemap {
    pub prefix: String,
    pub from: f64,
    pub to: f64,
}

fn default_null_values() -> Vec<String> {
    DEFAULT_NULL_VALUES.iter().map(|value| value.to_string()).collect()
}

impl SheetSource {
    /// Loads a TOML definition. A relative `path` is resolved against the
    /// definition's own directory.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SheetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&contents, base_dir).map_err(|source| SheetError::Definition {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(contents: &str, base_dir: &Path) -> Result<Self, toml::de::Error> {
        let mut source: SheetSource = toml::from_str(contents)?;
        if source.path.is_relative() {
            source.path = base_dir.join(&source.path);
        }
        Ok(source)
    }

    pub fn target_names(&self) -> Vec<String> {
        self.columns.iter().map(|mapping| mapping.target.clone()).collect()
    }

    pub(crate) fn is_null_text(&self, text: &str) -> bool {
        self.null_values.iter().any(|sentinel| sentinel == text)
    }

    pub(crate) fn remap_for(&self, target: &str, value: f64) -> f64 {
        self.value_remap
            .iter()
            .find(|remap| target.starts_with(&remap.prefix) && remap.from == value)
            .map(|remap| remap.to)
            .unwrap_or(value)
    }
}
