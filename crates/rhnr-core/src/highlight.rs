use std::fmt;
use std::str::FromStr;

use polars::prelude::*;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::columns::{HIGHLIGHT_COLUMNS, OPERATING};
use crate::selection::{column_values, options_for, SelectionError};
use crate::values::FieldValue;

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("column '{column}' has {values} values to highlight but {colors} colors")]
    LengthMismatch {
        column: String,
        values: usize,
        colors: usize,
    },
    #[error("invalid color '{0}', expected #rrggbb")]
    InvalidColor(String),
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB`, as spreadsheet writers expect.
    pub fn as_u32(&self) -> u32 {
        (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

impl FromStr for HexColor {
    type Err = HighlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HighlightError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Twelve-colour qualitative palette used for category highlighting.
pub const PALETTE: [HexColor; 12] = [
    HexColor::rgb(0x8d, 0xd3, 0xc7),
    HexColor::rgb(0xff, 0xff, 0xb3),
    HexColor::rgb(0xbe, 0xba, 0xda),
    HexColor::rgb(0xfb, 0x80, 0x72),
    HexColor::rgb(0x80, 0xb1, 0xd3),
    HexColor::rgb(0xfd, 0xb4, 0x62),
    HexColor::rgb(0xb3, 0xde, 0x69),
    HexColor::rgb(0xfc, 0xcd, 0xe5),
    HexColor::rgb(0xd9, 0xd9, 0xd9),
    HexColor::rgb(0xbc, 0x80, 0xbd),
    HexColor::rgb(0xcc, 0xeb, 0xc5),
    HexColor::rgb(0xff, 0xed, 0x6f),
];

/// Non-operating (`0`) and operating (`1`) row colours.
pub const OPERATING_COLORS: [HexColor; 2] = [
    HexColor::rgb(0xff, 0xe6, 0xe6),
    HexColor::rgb(0xe6, 0xff, 0xf2),
];

/// Maps values of one column to row colours. The first matching value wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightRule {
    column: String,
    entries: Vec<(FieldValue, HexColor)>,
}

impl HighlightRule {
    pub fn new(
        column: impl Into<String>,
        match_values: Vec<FieldValue>,
        colors: Vec<HexColor>,
    ) -> Result<Self, HighlightError> {
        let column = column.into();
        if match_values.len() != colors.len() {
            return Err(HighlightError::LengthMismatch {
                column,
                values: match_values.len(),
                colors: colors.len(),
            });
        }
        Ok(Self {
            column,
            entries: match_values.into_iter().zip(colors).collect(),
        })
    }

    /// One colour per distinct value of `column`, taken from the front of
    /// `palette`.
    pub fn from_options(
        table: &DataFrame,
        column: &str,
        palette: &[HexColor],
    ) -> Result<Self, HighlightError> {
        let values = options_for(table, column)?;
        let colors = palette.iter().take(values.len()).copied().collect();
        Self::new(column, values, colors)
    }

    /// Rule for one of [`HIGHLIGHT_COLUMNS`], coloured from the options of
    /// `table`. Pass the unfiltered review table so each value keeps its
    /// colour under every filter.
    pub fn for_review(table: &DataFrame, column: &str) -> Result<Self, HighlightError> {
        if !HIGHLIGHT_COLUMNS.contains(&column) {
            return Err(SelectionError::NotHighlightable(column.to_string()).into());
        }
        Self::from_options(table, column, &PALETTE)
    }

    pub fn operating_status() -> Self {
        Self {
            column: OPERATING.to_string(),
            entries: vec![
                (FieldValue::Int(0), OPERATING_COLORS[0]),
                (FieldValue::Int(1), OPERATING_COLORS[1]),
            ],
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn legend(&self) -> &[(FieldValue, HexColor)] {
        &self.entries
    }

    pub fn classify(&self, value: &FieldValue) -> Option<&HexColor> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == value)
            .map(|(_, color)| color)
    }

    /// Colour for every row of `table`.
    pub fn row_colors(&self, table: &DataFrame) -> Result<Vec<Option<HexColor>>, HighlightError> {
        Ok(column_values(table, &self.column)?
            .iter()
            .map(|value| self.classify(value).copied())
            .collect())
    }
}
