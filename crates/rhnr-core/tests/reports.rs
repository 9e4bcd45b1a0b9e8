mod common;

use polars::prelude::*;
use rhnr_core::columns::{ReviewSchema, CODE, INTEGRATES};
use rhnr_core::reconciliation::{assemble_proposed, standardize};
use rhnr_core::reports::{
    initial_selection_report, newly_added, replaced_code, retained, CORRECTED_CODES,
};

use common::codes;

fn schema() -> &'static ReviewSchema {
    ReviewSchema::canonical()
}

#[test]
fn integrated_initial_station_is_retained_not_new() {
    let initial = common::initial(&[100], &[1]);
    let proposed = assemble_proposed(
        &common::proposals(&[100], &[Some(true)]),
        &DataFrame::empty(),
        &initial,
        schema(),
    )
    .expect("proposed");

    assert_eq!(codes(&retained(&proposed, &initial, schema()).unwrap()), vec![100]);
    assert_eq!(newly_added(&proposed, &initial, schema()).unwrap().height(), 0);
}

#[test]
fn null_or_false_integration_is_not_retained() {
    let initial = common::initial(&[100, 200, 300], &[1, 1, 1]);
    let proposed = assemble_proposed(
        &common::proposals(&[100, 200, 300, 400], &[Some(true), Some(false), None, Some(true)]),
        &DataFrame::empty(),
        &initial,
        schema(),
    )
    .expect("proposed");

    let kept = retained(&proposed, &initial, schema()).unwrap();
    assert_eq!(codes(&kept), vec![100]);
    assert_eq!(
        kept.column(INTEGRATES).unwrap().bool().unwrap().get(0),
        Some(true)
    );

    let added = newly_added(&proposed, &initial, schema()).unwrap();
    assert_eq!(codes(&added), vec![400]);
}

#[test]
fn reports_on_empty_inputs_are_empty() {
    let empty = DataFrame::empty();
    assert_eq!(retained(&empty, &empty, schema()).unwrap().height(), 0);
    assert_eq!(newly_added(&empty, &empty, schema()).unwrap().height(), 0);

    let report = initial_selection_report(&empty, schema()).unwrap();
    assert_eq!(report.corrected.height(), 0);
    assert_eq!(report.operating.height(), 0);
}

#[test]
fn initial_report_splits_by_operating_status() {
    let initial = standardize(
        &common::initial(&[10100000, 11500000, 20000000, 30000000], &[0, 1, 1, 0]),
        schema(),
    )
    .expect("standardize");

    let report = initial_selection_report(&initial, schema()).expect("report");
    assert_eq!(codes(&report.corrected), CORRECTED_CODES[..2].to_vec());
    assert_eq!(codes(&report.not_operating), vec![10100000, 30000000]);
    assert_eq!(codes(&report.operating), vec![11500000, 20000000]);
    assert!(report.corrected.column(CODE).is_ok());
}

#[test]
fn corrected_codes_map_back_to_the_codes_they_replaced() {
    assert_eq!(replaced_code(10100000), Some(10100001));
    assert_eq!(replaced_code(12351000), Some(12351001));
    assert_eq!(replaced_code(20000000), None);
}
