use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use polars::prelude::*;
use rhnr_core::highlight::{HexColor, HighlightRule};
use rhnr_core::values::FieldValue;
use rhnr_core::Result;

fn cell_color(color: HexColor) -> Color {
    Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Terminal table of `frame`, rows coloured by `highlight`.
pub fn render_table(frame: &DataFrame, highlight: Option<&HighlightRule>) -> Result<Table> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            frame
                .get_column_names()
                .iter()
                .map(|name| Cell::new(name.as_str())),
        );

    let row_colors = match highlight {
        Some(rule) => rule.row_colors(frame)?,
        None => vec![None; frame.height()],
    };
    let columns: Vec<&Series> = frame
        .get_columns()
        .iter()
        .map(|column| column.as_materialized_series())
        .collect();

    for (idx, color) in row_colors.into_iter().enumerate() {
        let mut cells = Vec::with_capacity(columns.len());
        for series in &columns {
            let value = FieldValue::from(series.get(idx)?);
            let cell = Cell::new(value.to_string());
            cells.push(match color {
                Some(color) => cell.bg(cell_color(color)).fg(Color::Black),
                None => cell,
            });
        }
        table.add_row(cells);
    }

    Ok(table)
}

/// Legend lines for a highlight rule, one per matched value.
pub fn render_legend(rule: &HighlightRule) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec![rule.column(), "Cor"]);
    for (value, color) in rule.legend() {
        let label = match value {
            FieldValue::Null => "(vazio)".to_string(),
            other => other.to_string(),
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(color.to_string()).bg(cell_color(*color)).fg(Color::Black),
        ]);
    }
    table
}
