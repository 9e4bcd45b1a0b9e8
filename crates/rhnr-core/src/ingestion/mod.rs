//! Spreadsheet rows to store rows.
//!
//! `records` turns mapped sheet tables into typed records; the `write_*`
//! functions insert each batch in one transaction. Existing station codes
//! are left untouched; redundancy pairs are appended.

mod records;

pub use records::{
    initial_selection_records, manual_station_records, objective_records, proposal_records,
    redundancy_records, target, Extracted, InitialSelectionRecord, ManualStationRecord,
    ObjectiveRecord, ProposalRecord, RedundancyRecord, MANUAL_MAPPING,
};

use serde::Serialize;
use sqlx::PgConnection;
use thiserror::Error;
use tracing::info;

use crate::db::DbPool;
use crate::objectives::{ObjectiveError, ObjectiveFlags, SPECIFIC_OBJECTIVE_CODES};

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("database write failed: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Sheet(#[from] rhnr_sheets::SheetError),
    #[error("row {line}: invalid redundancy entry '{entry}'")]
    InvalidRedundancy { line: usize, entry: String },
    #[error("row {line}: station {code} has no capability marked 'Sim'")]
    EmptyTypology { line: usize, code: i64 },
    #[error("row {line}: {source}")]
    Objective {
        line: usize,
        #[source]
        source: ObjectiveError,
    },
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    pub read: usize,
    pub skipped: usize,
    pub inserted: u64,
}

impl IngestionSummary {
    pub fn from_extracted<T>(extracted: &Extracted<T>, inserted: u64) -> Self {
        Self {
            read: extracted.read(),
            skipped: extracted.skipped,
            inserted,
        }
    }
}

pub async fn write_proposals(
    pool: &DbPool,
    records: &[ProposalRecord],
) -> Result<u64, IngestionError> {
    let mut tx = pool.begin().await?;
    let inserted = insert_proposals(&mut tx, records).await?;
    tx.commit().await?;
    info!(records = records.len(), inserted, "Wrote station proposals");
    Ok(inserted)
}

async fn insert_proposals(
    conn: &mut PgConnection,
    records: &[ProposalRecord],
) -> Result<u64, IngestionError> {
    let mut inserted = 0;

    for record in records {
        let result = sqlx::query(
            r#"
            INSERT INTO estacoes_proposta_rhnr (
                codigo,
                tipo_estacao,
                proposta_operacao_planilha,
                proposta_operacao,
                proposta_tipo,
                proposta_integra_rhnr,
                observacao
            )
            VALUES ($1::INTEGER, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (codigo) DO NOTHING
            "#,
        )
        .bind(record.code)
        .bind(&record.current_typology)
        .bind(&record.action_text)
        .bind(record.action.map(|action| action.as_str()))
        .bind(&record.proposed_typology)
        .bind(record.integrates)
        .bind(&record.observation)
        .execute(&mut *conn)
        .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

pub async fn write_objectives(
    pool: &DbPool,
    records: &[ObjectiveRecord],
) -> Result<u64, IngestionError> {
    let mut tx = pool.begin().await?;
    let inserted = insert_objectives(&mut tx, records).await?;
    tx.commit().await?;
    info!(records = records.len(), inserted, "Wrote specific objectives");
    Ok(inserted)
}

async fn insert_objectives(
    conn: &mut PgConnection,
    records: &[ObjectiveRecord],
) -> Result<u64, IngestionError> {
    let flag_columns: Vec<String> = SPECIFIC_OBJECTIVE_CODES
        .iter()
        .map(|code| ObjectiveFlags::column_name(code))
        .collect();
    let placeholders: Vec<String> = (0..flag_columns.len())
        .map(|idx| format!("${}::SMALLINT", idx + 2))
        .collect();
    let sql = format!(
        "INSERT INTO obj_espec_estacoes_propostas (codigo, {}, tipo_mapeamento) \
         VALUES ($1::INTEGER, {}, ${}) ON CONFLICT (codigo) DO NOTHING",
        flag_columns.join(", "),
        placeholders.join(", "),
        flag_columns.len() + 2,
    );

    let mut inserted = 0;
    for record in records {
        let mut query = sqlx::query(&sql).bind(record.code);
        for (_, value) in record.flags.iter() {
            query = query.bind(value);
        }
        let result = query
            .bind(&record.mapping_kind)
            .execute(&mut *conn)
            .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

pub async fn write_redundancies(
    pool: &DbPool,
    records: &[RedundancyRecord],
) -> Result<u64, IngestionError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for record in records {
        let result = sqlx::query(
            r#"
            INSERT INTO estacoes_redundantes (codigo, codigo_redundante, tipo_estacao)
            VALUES ($1::INTEGER, $2::INTEGER, $3)
            "#,
        )
        .bind(record.code)
        .bind(record.redundant_code)
        .bind(&record.station_type)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    info!(records = records.len(), inserted, "Wrote redundant stations");
    Ok(inserted)
}

pub async fn write_initial_selection(
    pool: &DbPool,
    records: &[InitialSelectionRecord],
) -> Result<u64, IngestionError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for record in records {
        let mut query = sqlx::query(
            r#"
            INSERT INTO estacoes_rhnr_selecao_inicial (
                codigo, objetivo1, objetivo2, objetivo3, objetivo4, objetivo5, objetivo6
            )
            VALUES (
                $1::INTEGER, $2::SMALLINT, $3::SMALLINT, $4::SMALLINT,
                $5::SMALLINT, $6::SMALLINT, $7::SMALLINT
            )
            ON CONFLICT (codigo) DO NOTHING
            "#,
        )
        .bind(record.code);
        for value in record.objectives {
            query = query.bind(value);
        }
        inserted += query.execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    info!(records = records.len(), inserted, "Wrote initial selection");
    Ok(inserted)
}

/// Inserts proposals and objective flags of manually entered stations,
/// both in one transaction.
pub async fn write_manual_stations(
    pool: &DbPool,
    records: &[ManualStationRecord],
) -> Result<u64, IngestionError> {
    let proposals: Vec<ProposalRecord> = records.iter().map(|r| r.proposal.clone()).collect();
    let objectives: Vec<ObjectiveRecord> = records.iter().map(|r| r.objectives.clone()).collect();

    let mut tx = pool.begin().await?;
    let inserted = insert_proposals(&mut tx, &proposals).await?;
    let flagged = insert_objectives(&mut tx, &objectives).await?;
    tx.commit().await?;

    info!(records = records.len(), inserted, flagged, "Wrote manual stations");
    Ok(inserted)
}
