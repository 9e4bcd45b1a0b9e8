mod errors;
mod model;
mod reader;
mod source;

pub use errors::SheetError;
pub use model::{SheetCell, SheetRow, SheetTable};
pub use reader::{read_sheet, table_from_rows};
pub use source::{ColumnMapping, ExcludeRule, SheetSource, ValueRemap, DEFAULT_NULL_VALUES};
