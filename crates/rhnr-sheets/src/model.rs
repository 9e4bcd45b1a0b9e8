use std::fmt;

/// A single spreadsheet cell after null-sentinel handling.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl SheetCell {
    pub fn is_empty(&self) -> bool {
        match self {
            SheetCell::Empty => true,
            SheetCell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text content. Whole numbers render without a fractional part.
    pub fn as_text(&self) -> Option<String> {
        match self {
            SheetCell::Empty => None,
            SheetCell::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            SheetCell::Number(value) if value.fract() == 0.0 => Some(format!("{}", *value as i64)),
            SheetCell::Number(value) => Some(value.to_string()),
            SheetCell::Bool(value) => Some(value.to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SheetCell::Number(value) if value.fract() == 0.0 && value.is_finite() => {
                Some(*value as i64)
            }
            SheetCell::Text(text) => {
                let trimmed = text.trim();
                trimmed.parse::<i64>().ok().or_else(|| {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|value| value.fract() == 0.0 && value.is_finite())
                        .map(|value| value as i64)
                })
            }
            SheetCell::Bool(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    /// Numeric objective flag. Blank cells read as absent.
    pub fn as_flag(&self) -> Option<i64> {
        self.as_i64()
    }

    /// `Sim`/`Não` answers, also accepting booleans and 0/1.
    pub fn as_yes_no(&self) -> Option<bool> {
        match self {
            SheetCell::Bool(value) => Some(*value),
            SheetCell::Number(value) if *value == 1.0 => Some(true),
            SheetCell::Number(value) if *value == 0.0 => Some(false),
            SheetCell::Text(text) => match text.trim().to_lowercase().as_str() {
                "sim" | "s" | "yes" | "true" => Some(true),
                "não" | "nao" | "n" | "no" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for SheetCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    /// 1-based row number in the worksheet, for error messages.
    pub line: usize,
    pub cells: Vec<SheetCell>,
}

/// Mapped sheet contents: headers are target column names.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet: String,
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

static EMPTY_CELL: SheetCell = SheetCell::Empty;

impl SheetTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell lookup by target column name; unknown columns read as empty.
    pub fn cell<'a>(&self, row: &'a SheetRow, name: &str) -> &'a SheetCell {
        self.column_index(name)
            .and_then(|idx| row.cells.get(idx))
            .unwrap_or(&EMPTY_CELL)
    }
}
