use thiserror::Error;

use crate::db::DbError;
use crate::export::ExportError;
use crate::extraction::ExtractionError;
use crate::highlight::HighlightError;
use crate::ingestion::IngestionError;
use crate::reconciliation::ReconciliationError;
use crate::reports::ReportError;
use crate::selection::SelectionError;

#[derive(Error, Debug)]
pub enum RhnrError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Reconciliation(#[from] ReconciliationError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Highlight(#[from] HighlightError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] rhnr_sheets::SheetError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

pub type Result<T> = std::result::Result<T, RhnrError>;
