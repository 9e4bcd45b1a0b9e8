use calamine::{open_workbook_auto, Data, Reader};

use crate::errors::SheetError;
use crate::model::{SheetCell, SheetRow, SheetTable};
use crate::source::SheetSource;

/// Reads the configured worksheet (the first one when none is named) and
/// maps it through `source`.
pub fn read_sheet(source: &SheetSource) -> Result<SheetTable, SheetError> {
    let mut workbook = open_workbook_auto(&source.path).map_err(|err| SheetError::Open {
        path: source.path.clone(),
        source: err,
    })?;

    let sheet_name = match &source.sheet {
        Some(name) => name.clone(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SheetError::EmptyWorkbook {
                path: source.path.clone(),
            })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| SheetError::Sheet {
            path: source.path.clone(),
            sheet: sheet_name.clone(),
            source: err,
        })?;

    // calamine trims leading empty rows and columns; skip_rows counts
    // physical rows, so pad them back.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<SheetCell>> = (0..start_row).map(|_| Vec::new()).collect();
    for row in range.rows() {
        let mut cells = vec![SheetCell::Empty; start_col as usize];
        cells.extend(row.iter().map(cell_from_data));
        rows.push(cells);
    }

    table_from_rows(&sheet_name, rows, source)
}

fn cell_from_data(data: &Data) -> SheetCell {
    match data {
        Data::Empty | Data::Error(_) => SheetCell::Empty,
        Data::String(text) => SheetCell::Text(text.clone()),
        Data::Float(value) => SheetCell::Number(*value),
        Data::Int(value) => SheetCell::Number(*value as f64),
        Data::Bool(value) => SheetCell::Bool(*value),
        other => SheetCell::Text(other.to_string()),
    }
}

/// Applies header detection, column mapping, null sentinels, value remaps
/// and exclusion rules to raw worksheet rows.
pub fn table_from_rows(
    sheet: &str,
    rows: Vec<Vec<SheetCell>>,
    source: &SheetSource,
) -> Result<SheetTable, SheetError> {
    let mut rows = rows.into_iter().enumerate().skip(source.skip_rows);
    let (_, header) = rows.next().ok_or_else(|| SheetError::MissingHeader {
        sheet: sheet.to_string(),
        skip_rows: source.skip_rows,
    })?;

    let header_names: Vec<Option<String>> = header
        .iter()
        .map(|cell| match cell {
            SheetCell::Text(text) => Some(text.clone()),
            other => other.as_text(),
        })
        .collect();

    let mut positions = Vec::with_capacity(source.columns.len());
    for mapping in &source.columns {
        let position = find_header(&header_names, &mapping.source).ok_or_else(|| {
            SheetError::MissingColumn {
                sheet: sheet.to_string(),
                column: mapping.source.clone(),
            }
        })?;
        positions.push(position);
    }

    let headers = source.target_names();
    let mut table_rows = Vec::new();
    for (idx, raw) in rows {
        let cells: Vec<SheetCell> = positions
            .iter()
            .zip(&headers)
            .map(|(position, target)| {
                let cell = raw.get(*position).cloned().unwrap_or(SheetCell::Empty);
                normalize_cell(cell, target, source)
            })
            .collect();

        if cells.iter().all(SheetCell::is_empty) {
            continue;
        }

        table_rows.push(SheetRow {
            line: idx + 1,
            cells,
        });
    }

    let mut table = SheetTable {
        sheet: sheet.to_string(),
        headers,
        rows: table_rows,
    };
    apply_exclusions(&mut table, source);
    Ok(table)
}

fn find_header(headers: &[Option<String>], wanted: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.as_deref() == Some(wanted))
        .or_else(|| {
            let wanted = collapse_whitespace(wanted);
            headers.iter().position(|header| {
                header
                    .as_deref()
                    .is_some_and(|header| collapse_whitespace(header) == wanted)
            })
        })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_cell(cell: SheetCell, target: &str, source: &SheetSource) -> SheetCell {
    match cell {
        SheetCell::Text(text) => {
            if source.is_null_text(&text) || source.is_null_text(text.trim()) {
                SheetCell::Empty
            } else {
                SheetCell::Text(text)
            }
        }
        SheetCell::Number(value) => {
            let rendered = SheetCell::Number(value).as_text().unwrap_or_default();
            if source.is_null_text(&rendered) {
                SheetCell::Empty
            } else {
                SheetCell::Number(source.remap_for(target, value))
            }
        }
        other => other,
    }
}

fn apply_exclusions(table: &mut SheetTable, source: &SheetSource) {
    for rule in &source.exclude {
        let Some(idx) = table.column_index(&rule.column) else {
            continue;
        };
        table.rows.retain(|row| {
            let value = row.cells.get(idx).and_then(SheetCell::as_text);
            !value.is_some_and(|value| rule.values.iter().any(|excluded| *excluded == value))
        });
    }
}
