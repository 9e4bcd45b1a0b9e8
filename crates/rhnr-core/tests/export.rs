mod common;

use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use rhnr_core::columns::{ReviewSchema, CODE, IN_INITIAL, NAME, SPECIFIC_OBJECTIVES};
use rhnr_core::export::{to_csv_bytes, write_csv, write_xlsx, DEFAULT_SHEET_NAME};
use rhnr_core::highlight::HighlightRule;
use rhnr_core::reconciliation::build_final_table;
use tempfile::tempdir;

fn review_table() -> DataFrame {
    build_final_table(
        &common::initial(&[100, 200], &[0, 1]),
        &common::validated(&[300]),
        &DataFrame::empty(),
        ReviewSchema::canonical(),
    )
    .expect("final table")
}

#[test]
fn xlsx_export_has_header_and_no_index_column() {
    let table = review_table();
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("revisao.xlsx");

    let rule = HighlightRule::operating_status();
    write_xlsx(&table, &path, DEFAULT_SHEET_NAME, Some(&rule)).expect("write xlsx");

    let mut workbook = open_workbook_auto(&path).expect("open workbook");
    assert_eq!(workbook.sheet_names(), vec![DEFAULT_SHEET_NAME.to_string()]);

    let range = workbook
        .worksheet_range(DEFAULT_SHEET_NAME)
        .expect("sheet range");
    let rows: Vec<&[Data]> = range.rows().collect();
    assert_eq!(rows.len(), table.height() + 1);

    let header: Vec<String> = rows[0].iter().map(|cell| cell.to_string()).collect();
    assert_eq!(header, ReviewSchema::canonical().column_names());

    let code_col = header.iter().position(|name| name == CODE).unwrap();
    let name_col = header.iter().position(|name| name == NAME).unwrap();
    let flag_col = header.iter().position(|name| name == IN_INITIAL).unwrap();
    assert_eq!(rows[1][code_col], Data::Float(100.0));
    assert_eq!(rows[1][name_col], Data::String("Estação 100".to_string()));
    assert_eq!(rows[3][flag_col], Data::Bool(false));

    let objectives_col = header
        .iter()
        .position(|name| name == SPECIFIC_OBJECTIVES)
        .unwrap();
    assert_eq!(rows[1][objectives_col], Data::Empty);
}

#[test]
fn csv_export_writes_nulls_as_empty_fields() {
    let table = review_table();
    let bytes = to_csv_bytes(&table).expect("csv");
    let text = String::from_utf8(bytes).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Código da Estação,Nome,"));
    assert!(lines[1].starts_with("100,Estação 100,ANA,CPRM,Rio São Francisco,0,"));
    assert!(lines[3].starts_with("300,Validada 300,,,,1,"));

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("revisao.csv");
    write_csv(&table, &path).expect("write csv");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
}

#[test]
fn empty_table_exports_header_only() {
    let empty = ReviewSchema::canonical().empty_frame().unwrap();
    let text = String::from_utf8(to_csv_bytes(&empty).unwrap()).unwrap();
    assert_eq!(text.lines().count(), 1);
}
