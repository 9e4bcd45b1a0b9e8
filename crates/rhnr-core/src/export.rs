use std::fs;
use std::path::Path;

use polars::prelude::*;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use thiserror::Error;
use tracing::info;

use crate::highlight::{HexColor, HighlightError, HighlightRule};
use crate::values::FieldValue;

pub const DEFAULT_SHEET_NAME: &str = "Revisão RHNR";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("xlsx write failed: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Highlight(#[from] HighlightError),
}

/// Single-sheet workbook: header row, then one row per frame row, no index
/// column. With a rule, matching rows get the rule's background colour.
pub fn to_xlsx_bytes(
    table: &DataFrame,
    sheet_name: &str,
    highlight: Option<&HighlightRule>,
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;
    write_sheet(worksheet, table, highlight)?;
    Ok(workbook.save_to_buffer()?)
}

pub fn write_xlsx(
    table: &DataFrame,
    path: impl AsRef<Path>,
    sheet_name: &str,
    highlight: Option<&HighlightRule>,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    fs::write(path, to_xlsx_bytes(table, sheet_name, highlight)?)?;
    info!(path = %path.display(), rows = table.height(), "Exported review table");
    Ok(())
}

fn write_sheet(
    worksheet: &mut Worksheet,
    table: &DataFrame,
    highlight: Option<&HighlightRule>,
) -> Result<(), ExportError> {
    let header_format = Format::new().set_bold();
    for (col, name) in table.get_column_names().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name.as_str(), &header_format)?;
    }

    let row_colors = match highlight {
        Some(rule) => rule.row_colors(table)?,
        None => vec![None; table.height()],
    };
    let plain = Format::new();

    let series: Vec<&Series> = table
        .get_columns()
        .iter()
        .map(|column| column.as_materialized_series())
        .collect();

    for (idx, color) in row_colors.iter().enumerate() {
        let row = (idx + 1) as u32;
        let format = color.map(row_format).unwrap_or_else(|| plain.clone());
        for (col, values) in series.iter().enumerate() {
            let col = col as u16;
            match FieldValue::from(values.get(idx)?) {
                FieldValue::Null => {
                    if color.is_some() {
                        worksheet.write_blank(row, col, &format)?;
                    }
                }
                FieldValue::Bool(value) => {
                    worksheet.write_boolean_with_format(row, col, value, &format)?;
                }
                FieldValue::Int(value) => {
                    worksheet.write_number_with_format(row, col, value as f64, &format)?;
                }
                FieldValue::Float(value) => {
                    worksheet.write_number_with_format(row, col, value, &format)?;
                }
                FieldValue::Text(value) => {
                    worksheet.write_string_with_format(row, col, value, &format)?;
                }
            }
        }
    }

    worksheet.autofit();
    Ok(())
}

fn row_format(color: HexColor) -> Format {
    Format::new().set_background_color(Color::RGB(color.as_u32()))
}

/// Header plus one record per row; nulls are written as empty fields.
pub fn write_csv(table: &DataFrame, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;
    write_csv_records(&mut writer, table)?;
    writer.flush()?;
    info!(path = %path.display(), rows = table.height(), "Exported review table");
    Ok(())
}

pub fn to_csv_bytes(table: &DataFrame) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_csv_records(&mut writer, table)?;
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

fn write_csv_records<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    table: &DataFrame,
) -> Result<(), ExportError> {
    writer.write_record(table.get_column_names().iter().map(|name| name.as_str()))?;

    let series: Vec<&Series> = table
        .get_columns()
        .iter()
        .map(|column| column.as_materialized_series())
        .collect();
    for idx in 0..table.height() {
        let mut record = Vec::with_capacity(series.len());
        for values in &series {
            record.push(FieldValue::from(values.get(idx)?).to_string());
        }
        writer.write_record(&record)?;
    }
    Ok(())
}
