//! Read-only queries that flatten the station store into per-report frames.
//!
//! Rows are decoded into typed structs first, then assembled column-wise.
//! The description column never leaves this module: it is reduced to the
//! derived `RHNR Implementada` flag.

use polars::prelude::*;
use sqlx::{postgres::PgRow, Row};
use thiserror::Error;
use tracing::{debug, info};

use crate::columns::{
    BASIN, CODE, CURRENT_TYPOLOGY, IMPLEMENTED, INTEGRATES, NAME, OBJECTIVE_COLUMNS, OBSERVATION,
    OPERATING, OPERATOR, PROPOSED_ACTION, PROPOSED_TYPOLOGY, RESPONSIBLE, SPECIFIC_OBJECTIVES,
};
use crate::db::DbPool;
use crate::objectives::{ObjectiveFlags, SPECIFIC_OBJECTIVE_CODES};
use crate::typology::Capabilities;

/// Description marker of stations already implemented in the network.
pub const RHNR_MARKER: &str = "RHNR";

/// Stations downstream of reservoirs considered for inclusion.
pub const POTENTIAL_STATIONS: [i64; 11] = [
    37145910, 37145950, 37145970, 37220100, 37220200, 37220300, 37290050, 37290100, 37290300,
    37290400, 37340200,
];

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("station {code} has no basin in the {query} query")]
    MissingBasin { code: i64, query: &'static str },
}

const STATION_COLUMNS: &str = r#"
    e.codigo::BIGINT AS codigo,
    e.nome,
    resp.sigla AS responsavel,
    oper.sigla AS operadora,
    b.nome AS bacia,
    e.operando::BIGINT AS operando,
    e.descricao
"#;

const STATION_JOINS: &str = r#"
    LEFT JOIN bacia b ON b.codigo = e.bacia_codigo
    LEFT JOIN (
        SELECT r.codigo_estacao, ent.sigla
        FROM responsavel r
        JOIN entidade ent ON ent.codigo = r.responsavel_codigo
    ) resp ON resp.codigo_estacao = e.codigo
    LEFT JOIN (
        SELECT o.codigo_estacao, ent.sigla
        FROM operadora o
        JOIN entidade ent ON ent.codigo = o.operadora_codigo
    ) oper ON oper.codigo_estacao = e.codigo
"#;

/// Station master data shared by every station query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationRow {
    pub code: i64,
    pub name: Option<String>,
    pub responsible: Option<String>,
    pub operator: Option<String>,
    pub basin: Option<String>,
    pub operating: Option<i64>,
    pub description: Option<String>,
}

impl StationRow {
    pub fn rhnr_implemented(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|description| description.contains(RHNR_MARKER))
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            code: row.try_get("codigo")?,
            name: row.try_get("nome")?,
            responsible: row.try_get("responsavel")?,
            operator: row.try_get("operadora")?,
            basin: row.try_get("bacia")?,
            operating: row.try_get("operando")?,
            description: row.try_get("descricao")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialSelectionRow {
    pub station: StationRow,
    pub objectives: [Option<i64>; 6],
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProposalRow {
    pub station: StationRow,
    pub current_typology: Option<String>,
    pub proposed_typology: Option<String>,
    pub integrates: Option<bool>,
    pub action: Option<String>,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecificObjectivesRow {
    pub code: i64,
    pub flags: ObjectiveFlags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypologyRow {
    pub code: i64,
    pub capabilities: Capabilities,
}

pub async fn initial_selection(pool: &DbPool) -> Result<DataFrame, ExtractionError> {
    let sql = format!(
        r#"
        SELECT {STATION_COLUMNS},
            s.objetivo1::BIGINT AS objetivo1,
            s.objetivo2::BIGINT AS objetivo2,
            s.objetivo3::BIGINT AS objetivo3,
            s.objetivo4::BIGINT AS objetivo4,
            s.objetivo5::BIGINT AS objetivo5,
            s.objetivo6::BIGINT AS objetivo6
        FROM estacoes_rhnr_selecao_inicial s
        JOIN estacao_flu e ON e.codigo = s.codigo
        {STATION_JOINS}
        ORDER BY e.codigo
        "#
    );

    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut objectives = [None; 6];
        for (idx, slot) in objectives.iter_mut().enumerate() {
            *slot = row.try_get(format!("objetivo{}", idx + 1).as_str())?;
        }
        records.push(InitialSelectionRow {
            station: StationRow::from_row(row)?,
            objectives,
        });
    }

    info!(rows = records.len(), "Loaded initial selection");
    initial_selection_frame(&records)
}

pub async fn validated_stations(pool: &DbPool) -> Result<DataFrame, ExtractionError> {
    let sql = format!(
        r#"
        SELECT {STATION_COLUMNS}
        FROM estacao_flu e
        {STATION_JOINS}
        WHERE e.descricao LIKE '%RHNR%'
        ORDER BY e.codigo
        "#
    );

    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    let records = rows
        .iter()
        .map(StationRow::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    info!(rows = records.len(), "Loaded validated stations");
    station_frame(&records, None)
}

/// Validated-shape listing restricted to `codes`.
pub async fn stations_by_code(pool: &DbPool, codes: &[i64]) -> Result<DataFrame, ExtractionError> {
    let sql = format!(
        r#"
        SELECT {STATION_COLUMNS}
        FROM estacao_flu e
        {STATION_JOINS}
        WHERE e.codigo::BIGINT = ANY($1)
        ORDER BY e.codigo
        "#
    );

    let rows = sqlx::query(&sql).bind(codes.to_vec()).fetch_all(pool).await?;
    let records = rows
        .iter()
        .map(StationRow::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    if records.len() != codes.len() {
        debug!(
            requested = codes.len(),
            found = records.len(),
            "Some requested stations are not in the store"
        );
    }
    station_frame(&records, None)
}

pub async fn proposed_stations(pool: &DbPool) -> Result<DataFrame, ExtractionError> {
    let sql = format!(
        r#"
        SELECT {STATION_COLUMNS},
            p.tipo_estacao,
            p.proposta_tipo,
            p.proposta_integra_rhnr,
            p.proposta_operacao,
            p.observacao
        FROM estacoes_proposta_rhnr p
        JOIN estacao_flu e ON e.codigo = p.codigo
        {STATION_JOINS}
        ORDER BY e.codigo
        "#
    );

    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        records.push(ProposalRow {
            station: StationRow::from_row(row)?,
            current_typology: row.try_get("tipo_estacao")?,
            proposed_typology: row.try_get("proposta_tipo")?,
            integrates: row.try_get("proposta_integra_rhnr")?,
            action: row.try_get("proposta_operacao")?,
            observation: row.try_get("observacao")?,
        });
    }

    info!(rows = records.len(), "Loaded proposed stations");
    proposal_frame(&records)
}

pub async fn specific_objectives(pool: &DbPool) -> Result<DataFrame, ExtractionError> {
    let flag_columns = SPECIFIC_OBJECTIVE_CODES
        .iter()
        .map(|code| {
            let column = ObjectiveFlags::column_name(code);
            format!("{column}::BIGINT AS {column}")
        })
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT codigo::BIGINT AS codigo, {flag_columns} FROM obj_espec_estacoes_propostas ORDER BY codigo"
    );

    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut values = [None; SPECIFIC_OBJECTIVE_CODES.len()];
        for (slot, code) in values.iter_mut().zip(SPECIFIC_OBJECTIVE_CODES) {
            *slot = row.try_get(ObjectiveFlags::column_name(code).as_str())?;
        }
        records.push(SpecificObjectivesRow {
            code: row.try_get("codigo")?,
            flags: ObjectiveFlags::from_values(values),
        });
    }

    objectives_frame(&records)
}

pub async fn station_typologies(pool: &DbPool) -> Result<DataFrame, ExtractionError> {
    let rows = sqlx::query(
        r#"
        SELECT
            codigo_estacao::BIGINT AS codigo,
            escala,
            descarga_liquida,
            qualidade_agua,
            sedimentos,
            telemetrica
        FROM tipo_estacao_flu
        ORDER BY codigo_estacao
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let flag = |column: &str| -> Result<bool, sqlx::Error> {
            Ok(row.try_get::<Option<bool>, _>(column)?.unwrap_or(false))
        };
        records.push(TypologyRow {
            code: row.try_get("codigo")?,
            capabilities: Capabilities {
                stage: flag("escala")?,
                discharge: flag("descarga_liquida")?,
                water_quality: flag("qualidade_agua")?,
                sediment: flag("sedimentos")?,
                telemetry: flag("telemetrica")?,
            },
        });
    }

    typology_frame(&records)
}

fn require_basin(stations: &[&StationRow], query: &'static str) -> Result<(), ExtractionError> {
    match stations.iter().find(|station| station.basin.is_none()) {
        Some(station) => Err(ExtractionError::MissingBasin {
            code: station.code,
            query,
        }),
        None => Ok(()),
    }
}

/// Station columns shared by every station frame. With `required_basin`
/// set, a station without a basin fails the whole query.
fn station_columns(
    stations: &[&StationRow],
    required_basin: Option<&'static str>,
) -> Result<Vec<Column>, ExtractionError> {
    if let Some(query) = required_basin {
        require_basin(stations, query)?;
    }

    let codes: Vec<i64> = stations.iter().map(|s| s.code).collect();
    let names: Vec<Option<String>> = stations.iter().map(|s| s.name.clone()).collect();
    let responsible: Vec<Option<String>> =
        stations.iter().map(|s| s.responsible.clone()).collect();
    let operators: Vec<Option<String>> = stations.iter().map(|s| s.operator.clone()).collect();
    let basins: Vec<Option<String>> = stations.iter().map(|s| s.basin.clone()).collect();
    let operating: Vec<Option<i64>> = stations.iter().map(|s| s.operating).collect();
    let implemented: Vec<bool> = stations.iter().map(|s| s.rhnr_implemented()).collect();

    Ok(vec![
        Series::new(CODE.into(), codes).into_column(),
        Series::new(NAME.into(), names).into_column(),
        Series::new(RESPONSIBLE.into(), responsible).into_column(),
        Series::new(OPERATOR.into(), operators).into_column(),
        Series::new(BASIN.into(), basins).into_column(),
        Series::new(OPERATING.into(), operating).into_column(),
        Series::new(IMPLEMENTED.into(), implemented).into_column(),
    ])
}

pub fn station_frame(
    stations: &[StationRow],
    required_basin: Option<&'static str>,
) -> Result<DataFrame, ExtractionError> {
    let refs: Vec<&StationRow> = stations.iter().collect();
    Ok(DataFrame::new(station_columns(&refs, required_basin)?)?)
}

pub fn initial_selection_frame(rows: &[InitialSelectionRow]) -> Result<DataFrame, ExtractionError> {
    let stations: Vec<&StationRow> = rows.iter().map(|row| &row.station).collect();
    let mut columns = station_columns(&stations, Some("initial selection"))?;
    for (idx, name) in OBJECTIVE_COLUMNS.iter().enumerate() {
        let values: Vec<Option<i64>> = rows.iter().map(|row| row.objectives[idx]).collect();
        columns.push(Series::new((*name).into(), values).into_column());
    }
    Ok(DataFrame::new(columns)?)
}

pub fn proposal_frame(rows: &[ProposalRow]) -> Result<DataFrame, ExtractionError> {
    let stations: Vec<&StationRow> = rows.iter().map(|row| &row.station).collect();
    let mut columns = station_columns(&stations, Some("proposed stations"))?;

    let current: Vec<Option<String>> = rows.iter().map(|r| r.current_typology.clone()).collect();
    let proposed: Vec<Option<String>> = rows.iter().map(|r| r.proposed_typology.clone()).collect();
    let integrates: Vec<Option<bool>> = rows.iter().map(|r| r.integrates).collect();
    let actions: Vec<Option<String>> = rows.iter().map(|r| r.action.clone()).collect();
    let observations: Vec<Option<String>> = rows.iter().map(|r| r.observation.clone()).collect();

    columns.extend([
        Series::new(CURRENT_TYPOLOGY.into(), current).into_column(),
        Series::new(PROPOSED_TYPOLOGY.into(), proposed).into_column(),
        Series::new(INTEGRATES.into(), integrates).into_column(),
        Series::new(PROPOSED_ACTION.into(), actions).into_column(),
        Series::new(OBSERVATION.into(), observations).into_column(),
    ]);
    Ok(DataFrame::new(columns)?)
}

pub fn objectives_frame(rows: &[SpecificObjectivesRow]) -> Result<DataFrame, ExtractionError> {
    let codes: Vec<i64> = rows.iter().map(|row| row.code).collect();
    let summaries: Vec<String> = rows.iter().map(|row| row.flags.summary()).collect();
    Ok(DataFrame::new(vec![
        Series::new(CODE.into(), codes).into_column(),
        Series::new(SPECIFIC_OBJECTIVES.into(), summaries).into_column(),
    ])?)
}

pub fn typology_frame(rows: &[TypologyRow]) -> Result<DataFrame, ExtractionError> {
    let codes: Vec<i64> = rows.iter().map(|row| row.code).collect();
    let typologies: Vec<Option<String>> = rows
        .iter()
        .map(|row| row.capabilities.typology())
        .collect();
    Ok(DataFrame::new(vec![
        Series::new(CODE.into(), codes).into_column(),
        Series::new(CURRENT_TYPOLOGY.into(), typologies).into_column(),
    ])?)
}
