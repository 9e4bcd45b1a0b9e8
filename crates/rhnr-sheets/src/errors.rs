use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("failed to open workbook {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {path} has no sheets")]
    EmptyWorkbook { path: PathBuf },

    #[error("failed to read sheet '{sheet}' from {path}: {source}")]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },

    #[error("sheet '{sheet}' has no header row after skipping {skip_rows} rows")]
    MissingHeader { sheet: String, skip_rows: usize },

    #[error("sheet '{sheet}' has no column '{column}'")]
    MissingColumn { sheet: String, column: String },

    #[error("failed to read source definition {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid source definition {path}: {source}")]
    Definition {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
