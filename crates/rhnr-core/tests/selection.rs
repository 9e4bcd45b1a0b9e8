mod common;

use polars::prelude::*;
use rhnr_core::columns::{ReviewSchema, BASIN, CODE, IN_INITIAL, OPERATING, SPECIFIC_OBJECTIVES};
use rhnr_core::reconciliation::build_final_table;
use rhnr_core::selection::{
    apply_filter, filter_any, options_for, parse_filter_value, select_options, SelectionError,
};
use rhnr_core::values::FieldValue;

use common::codes;

fn review_table() -> DataFrame {
    build_final_table(
        &common::initial(&[100, 200, 300], &[0, 1, 0]),
        &common::validated(&[400]),
        &DataFrame::empty(),
        ReviewSchema::canonical(),
    )
    .expect("final table")
}

#[test]
fn options_are_sorted_and_distinct_with_nulls_last() {
    let table = review_table();

    assert_eq!(
        options_for(&table, OPERATING).unwrap(),
        vec![FieldValue::Int(0), FieldValue::Int(1)]
    );
    assert_eq!(
        options_for(&table, BASIN).unwrap(),
        vec![FieldValue::text("Rio São Francisco"), FieldValue::Null]
    );
    assert_eq!(
        options_for(&table, IN_INITIAL).unwrap(),
        vec![FieldValue::Bool(false), FieldValue::Bool(true)]
    );
    assert_eq!(
        options_for(&table, SPECIFIC_OBJECTIVES).unwrap(),
        vec![FieldValue::Null]
    );
}

#[test]
fn select_options_keeps_requested_column_order() {
    let table = review_table();
    let options = select_options(&table, &[OPERATING, CODE]).expect("options");

    assert_eq!(options.len(), 2);
    assert_eq!(options[0].column, OPERATING);
    assert_eq!(options[1].column, CODE);
    assert_eq!(options[1].values.len(), 4);
}

#[test]
fn unknown_column_is_reported() {
    let table = review_table();
    let err = select_options(&table, &["Município"]).unwrap_err();
    assert!(matches!(err, SelectionError::UnknownColumn(column) if column == "Município"));
}

#[test]
fn filter_keeps_matching_rows_only() {
    let table = review_table();
    let filtered = apply_filter(&table, Some(OPERATING), Some(&FieldValue::Int(0))).unwrap();
    assert_eq!(codes(&filtered), vec![100, 300]);

    let null_basin = apply_filter(&table, Some(BASIN), Some(&FieldValue::Null)).unwrap();
    assert_eq!(codes(&null_basin), vec![400]);
}

#[test]
fn filter_without_column_or_value_is_a_no_op() {
    let table = review_table();

    let unfiltered = apply_filter(&table, None, Some(&FieldValue::Int(0))).unwrap();
    assert!(unfiltered.equals_missing(&table));

    let empty_column = apply_filter(&table, Some(""), Some(&FieldValue::Int(0))).unwrap();
    assert_eq!(empty_column.height(), table.height());

    let no_value = apply_filter(&table, Some(OPERATING), None).unwrap();
    assert_eq!(no_value.height(), table.height());
}

#[test]
fn filter_on_empty_table_is_empty() {
    let empty = ReviewSchema::canonical().empty_frame().unwrap();
    let filtered = apply_filter(&empty, Some(OPERATING), Some(&FieldValue::Int(1))).unwrap();
    assert_eq!(filtered.height(), 0);
    assert!(options_for(&empty, OPERATING).unwrap().is_empty());
}

#[test]
fn filter_values_parse_by_column_type() {
    let table = review_table();

    assert_eq!(
        parse_filter_value(&table, OPERATING, "1").unwrap(),
        Some(FieldValue::Int(1))
    );
    assert_eq!(
        parse_filter_value(&table, IN_INITIAL, "Sim").unwrap(),
        Some(FieldValue::Bool(true))
    );
    assert_eq!(
        parse_filter_value(&table, BASIN, "Rio Paraná").unwrap(),
        Some(FieldValue::text("Rio Paraná"))
    );
    assert_eq!(parse_filter_value(&table, BASIN, "  ").unwrap(), None);
    assert_eq!(
        parse_filter_value(&table, BASIN, "null").unwrap(),
        Some(FieldValue::Null)
    );
    assert!(matches!(
        parse_filter_value(&table, OPERATING, "sim"),
        Err(SelectionError::InvalidValue { .. })
    ));
}

#[test]
fn field_value_ordering_is_total() {
    let mut values = vec![
        FieldValue::Null,
        FieldValue::text("b"),
        FieldValue::Float(1.5),
        FieldValue::Int(2),
        FieldValue::Bool(true),
        FieldValue::Int(1),
        FieldValue::text("a"),
        FieldValue::Bool(false),
    ];
    values.sort();
    assert_eq!(
        values,
        vec![
            FieldValue::Bool(false),
            FieldValue::Bool(true),
            FieldValue::Int(1),
            FieldValue::Float(1.5),
            FieldValue::Int(2),
            FieldValue::text("a"),
            FieldValue::text("b"),
            FieldValue::Null,
        ]
    );
}

#[test]
fn filter_any_keeps_rows_matching_one_of_the_values() {
    let table = review_table();
    let filtered = filter_any(
        &table,
        CODE,
        &[FieldValue::Int(400), FieldValue::Int(100), FieldValue::Int(999)],
    )
    .unwrap();
    assert_eq!(codes(&filtered), vec![100, 400]);
}
