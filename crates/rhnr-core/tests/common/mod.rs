#![allow(dead_code)]

use polars::prelude::*;
use rhnr_core::columns::{
    BASIN, CODE, CURRENT_TYPOLOGY, IMPLEMENTED, INTEGRATES, NAME, OBJECTIVE_COLUMNS, OPERATING,
    OPERATOR, PROPOSED_ACTION, PROPOSED_TYPOLOGY, RESPONSIBLE, SPECIFIC_OBJECTIVES,
};

/// Initial-selection frame shaped like the extraction output.
pub fn initial(codes: &[i64], operating: &[i64]) -> DataFrame {
    let names: Vec<String> = codes.iter().map(|code| format!("Estação {code}")).collect();
    let mut frame = df![
        CODE => codes,
        NAME => names,
        RESPONSIBLE => vec!["ANA"; codes.len()],
        OPERATOR => vec!["CPRM"; codes.len()],
        BASIN => vec!["Rio São Francisco"; codes.len()],
        OPERATING => operating,
        IMPLEMENTED => vec![false; codes.len()],
    ]
    .expect("initial frame");
    for objective in OBJECTIVE_COLUMNS {
        frame
            .with_column(Series::new(objective.into(), vec![1_i64; codes.len()]))
            .expect("objective column");
    }
    frame
}

pub fn validated(codes: &[i64]) -> DataFrame {
    let names: Vec<String> = codes.iter().map(|code| format!("Validada {code}")).collect();
    df![
        CODE => codes,
        NAME => names,
        BASIN => vec![None::<&str>; codes.len()],
        OPERATING => vec![1_i64; codes.len()],
        IMPLEMENTED => vec![true; codes.len()],
    ]
    .expect("validated frame")
}

/// Proposal frame with `Integra RHNR?` per code.
pub fn proposals(codes: &[i64], integrates: &[Option<bool>]) -> DataFrame {
    let names: Vec<String> = codes.iter().map(|code| format!("Proposta {code}")).collect();
    df![
        CODE => codes,
        NAME => names,
        BASIN => vec!["Rio Paraná"; codes.len()],
        OPERATING => vec![1_i64; codes.len()],
        IMPLEMENTED => vec![false; codes.len()],
        CURRENT_TYPOLOGY => vec!["FD"; codes.len()],
        PROPOSED_TYPOLOGY => vec!["FDQ"; codes.len()],
        INTEGRATES => integrates,
        PROPOSED_ACTION => vec!["Manter"; codes.len()],
    ]
    .expect("proposal frame")
}

pub fn objectives(codes: &[i64], summaries: &[&str]) -> DataFrame {
    df![
        CODE => codes,
        SPECIFIC_OBJECTIVES => summaries,
    ]
    .expect("objectives frame")
}

pub fn typologies(codes: &[i64], typologies: &[Option<&str>]) -> DataFrame {
    df![
        CODE => codes,
        CURRENT_TYPOLOGY => typologies,
    ]
    .expect("typology frame")
}

pub fn codes(frame: &DataFrame) -> Vec<i64> {
    frame
        .column(CODE)
        .expect("code column")
        .i64()
        .expect("i64 codes")
        .into_iter()
        .flatten()
        .collect()
}

pub fn bools(frame: &DataFrame, column: &str) -> Vec<Option<bool>> {
    frame
        .column(column)
        .expect("column")
        .bool()
        .expect("bool column")
        .into_iter()
        .collect()
}

pub fn strings(frame: &DataFrame, column: &str) -> Vec<Option<String>> {
    frame
        .column(column)
        .expect("column")
        .str()
        .expect("str column")
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect()
}
