mod common;

use polars::prelude::*;
use rhnr_core::cache::{Fingerprint, Memo, SnapshotKey};
use rhnr_core::columns::{ReviewSchema, IN_INITIAL};
use rhnr_core::session::{ReviewInputs, ReviewSession};

use common::{bools, codes};

fn inputs() -> ReviewInputs {
    ReviewInputs {
        initial: common::initial(&[100, 200], &[1, 0]),
        validated: common::validated(&[200, 300]),
        proposals: common::proposals(&[100, 400], &[Some(true), None]),
        objectives: common::objectives(&[400], &["2a"]),
        typologies: common::typologies(&[200, 300], &[Some("F"), Some("FDT")]),
    }
}

#[test]
fn fingerprints_track_frame_contents() {
    let a = common::initial(&[1, 2], &[1, 0]);
    let b = common::initial(&[1, 2], &[1, 0]);
    let c = common::initial(&[1, 2], &[1, 1]);

    let fa = Fingerprint::of_frame(&a).unwrap();
    assert_eq!(fa, Fingerprint::of_frame(&b).unwrap());
    assert_ne!(fa, Fingerprint::of_frame(&c).unwrap());
    assert_eq!(fa.to_hex().len(), 64);

    let fc = Fingerprint::of_frame(&c).unwrap();
    assert_ne!(
        Fingerprint::combine(&[fa, fc]),
        Fingerprint::combine(&[fc, fa])
    );
}

#[test]
fn memo_computes_once_per_key() {
    let mut memo: Memo<u32, String> = Memo::new();
    let mut calls = 0;

    for _ in 0..3 {
        let value = memo
            .get_or_try_insert_with(1, || {
                calls += 1;
                Ok::<_, std::convert::Infallible>("one".to_string())
            })
            .unwrap();
        assert_eq!(value, "one");
    }
    assert_eq!(calls, 1);

    let stats = memo.stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (2, 1, 1));

    assert_eq!(memo.invalidate(&1).as_deref(), Some("one"));
    assert!(memo.is_empty());
}

#[test]
fn failed_computations_are_not_cached() {
    let mut memo: Memo<&str, i64> = Memo::new();
    let failed: Result<i64, &str> = memo.get_or_try_insert_with("k", || Err("boom"));
    assert_eq!(failed, Err("boom"));
    assert!(memo.get(&"k").is_none());

    let ok: Result<i64, &str> = memo.get_or_try_insert_with("k", || Ok(7));
    assert_eq!(ok, Ok(7));
    memo.clear();
    assert_eq!(memo.len(), 0);
}

#[test]
fn snapshot_keys_identify_store_and_version() {
    let key = SnapshotKey::new("postgres://db.local:5432/rhnr", 1);
    assert_eq!(key.to_string(), "postgres://db.local:5432/rhnr@1");
    assert_eq!(key.next().version, 2);
    assert_ne!(key, key.next());
}

#[test]
fn session_memoizes_final_table() {
    let session = ReviewSession::new(
        SnapshotKey::new("memory", 1),
        inputs(),
        ReviewSchema::canonical().clone(),
    )
    .expect("session");

    let first = session.final_table().expect("first");
    let second = session.final_table().expect("second");
    assert!(first.equals_missing(&second));

    let stats = session.memo_stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));

    assert_eq!(codes(&first), vec![100, 200, 300, 400]);
    assert_eq!(
        bools(&first, IN_INITIAL),
        vec![Some(true), Some(true), Some(false), Some(false)]
    );
}

#[test]
fn session_reports_use_assembled_proposals() {
    let session = ReviewSession::new(
        SnapshotKey::new("memory", 1),
        inputs(),
        ReviewSchema::canonical().clone(),
    )
    .expect("session");

    assert_eq!(codes(&session.retained().unwrap()), vec![100]);
    assert_eq!(codes(&session.newly_added().unwrap()), vec![400]);
    assert_eq!(session.initial_report().unwrap().not_operating.height(), 1);
    assert_eq!(session.key().version, 1);
}

#[test]
fn session_over_empty_inputs_is_empty() {
    let session = ReviewSession::new(
        SnapshotKey::new("memory", 0),
        ReviewInputs::default(),
        ReviewSchema::canonical().clone(),
    )
    .expect("session");

    let table = session.final_table().expect("final");
    assert_eq!(table.height(), 0);
    assert_eq!(table.width(), ReviewSchema::canonical().len());
    assert_eq!(session.proposed().height(), 0);
}
