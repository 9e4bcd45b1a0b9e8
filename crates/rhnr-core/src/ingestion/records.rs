use rhnr_sheets::{SheetRow, SheetTable};
use serde::Serialize;
use tracing::warn;

use super::IngestionError;
use crate::objectives::{ObjectiveFlags, SPECIFIC_OBJECTIVE_CODES};
use crate::proposal::ProposedAction;
use crate::typology::Capabilities;

/// Mapping kind recorded for objective rows entered by hand.
pub const MANUAL_MAPPING: &str = "Manual";

/// Target column names that source definitions map onto.
pub mod target {
    pub const CODE: &str = "codigo";
    pub const TYPOLOGY: &str = "tipo_estacao";
    pub const ACTION: &str = "proposta_operacao";
    pub const PROPOSED_TYPOLOGY: &str = "proposta_tipo";
    pub const INTEGRATES: &str = "proposta_integra_rhnr";
    pub const OBSERVATION: &str = "observacao";
    pub const REDUNDANCY: &str = "redundancia";
    pub const MAPPING_KIND: &str = "tipo_mapeamento";
    pub const STAGE: &str = "escala";
    pub const DISCHARGE: &str = "descarga_liquida";
    pub const WATER_QUALITY: &str = "qualidade_agua";
    pub const SEDIMENT: &str = "sedimentos";
    pub const TELEMETRY: &str = "telemetrica";
    pub const OBJECTIVE_LIST: &str = "objetivos_especificos";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalRecord {
    pub code: i64,
    pub current_typology: Option<String>,
    /// Action as written in the spreadsheet.
    pub action_text: Option<String>,
    pub action: Option<ProposedAction>,
    pub proposed_typology: Option<String>,
    pub integrates: Option<bool>,
    pub observation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveRecord {
    pub code: i64,
    pub flags: ObjectiveFlags,
    pub mapping_kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedundancyRecord {
    pub code: i64,
    pub redundant_code: i64,
    pub station_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialSelectionRecord {
    pub code: i64,
    pub objectives: [Option<i64>; 6],
}

/// A station entered outside the survey spreadsheets: both a proposal and
/// its objective flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualStationRecord {
    pub proposal: ProposalRecord,
    pub objectives: ObjectiveRecord,
}

/// Records read from one sheet, with the count of rows dropped for lacking
/// a station code.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Extracted<T> {
    pub fn read(&self) -> usize {
        self.records.len() + self.skipped
    }
}

fn rows_with_code(table: &SheetTable) -> (Vec<(&SheetRow, i64)>, usize) {
    let mut rows = Vec::with_capacity(table.len());
    let mut skipped = 0;
    for row in &table.rows {
        match table.cell(row, target::CODE).as_i64() {
            Some(code) => rows.push((row, code)),
            None => {
                skipped += 1;
                warn!(sheet = %table.sheet, line = row.line, "Skipping row without station code");
            }
        }
    }
    (rows, skipped)
}

fn text(table: &SheetTable, row: &SheetRow, column: &str) -> Option<String> {
    table.cell(row, column).as_text()
}

pub fn proposal_records(table: &SheetTable) -> Extracted<ProposalRecord> {
    let (rows, skipped) = rows_with_code(table);
    let records = rows
        .into_iter()
        .map(|(row, code)| {
            let action_text = text(table, row, target::ACTION);
            let action = action_text.as_deref().and_then(ProposedAction::parse);
            if action.is_none() && action_text.is_some() {
                warn!(code, line = row.line, action = ?action_text, "Unrecognised proposed action");
            }
            ProposalRecord {
                code,
                current_typology: text(table, row, target::TYPOLOGY),
                action_text,
                action,
                proposed_typology: text(table, row, target::PROPOSED_TYPOLOGY),
                integrates: table.cell(row, target::INTEGRATES).as_yes_no(),
                observation: text(table, row, target::OBSERVATION),
            }
        })
        .collect();
    Extracted { records, skipped }
}

/// Objective flags from `obj_<code>` columns. The sheet's own
/// `tipo_mapeamento` wins over `mapping_kind`.
pub fn objective_records(table: &SheetTable, mapping_kind: Option<&str>) -> Extracted<ObjectiveRecord> {
    let (rows, skipped) = rows_with_code(table);
    let records = rows
        .into_iter()
        .map(|(row, code)| {
            let mut values = [None; SPECIFIC_OBJECTIVE_CODES.len()];
            for (slot, objective) in values.iter_mut().zip(SPECIFIC_OBJECTIVE_CODES) {
                *slot = table
                    .cell(row, &ObjectiveFlags::column_name(objective))
                    .as_flag();
            }
            ObjectiveRecord {
                code,
                flags: ObjectiveFlags::from_values(values),
                mapping_kind: text(table, row, target::MAPPING_KIND)
                    .or_else(|| mapping_kind.map(str::to_string)),
            }
        })
        .collect();
    Extracted { records, skipped }
}

/// Parses the redundancy column: one `"<code> - <type> ..."` entry per line,
/// where the type is the first word after the dash.
pub fn redundancy_records(table: &SheetTable) -> Result<Extracted<RedundancyRecord>, IngestionError> {
    let (rows, skipped) = rows_with_code(table);
    let mut records = Vec::new();
    for (row, code) in rows {
        let cell = table.cell(row, target::REDUNDANCY);
        let Some(entries) = cell.as_text() else {
            continue;
        };
        for entry in entries.lines().map(str::trim).filter(|line| !line.is_empty()) {
            records.push(parse_redundancy(code, entry, row.line)?);
        }
    }
    Ok(Extracted { records, skipped })
}

fn parse_redundancy(code: i64, entry: &str, line: usize) -> Result<RedundancyRecord, IngestionError> {
    let invalid = || IngestionError::InvalidRedundancy {
        line,
        entry: entry.to_string(),
    };
    let (redundant, rest) = entry.split_once('-').ok_or_else(invalid)?;
    let redundant_code = redundant.trim().parse::<i64>().map_err(|_| invalid())?;
    let station_type = rest.split_whitespace().next().ok_or_else(invalid)?;
    Ok(RedundancyRecord {
        code,
        redundant_code,
        station_type: station_type.to_string(),
    })
}

pub fn initial_selection_records(table: &SheetTable) -> Extracted<InitialSelectionRecord> {
    let (rows, skipped) = rows_with_code(table);
    let records = rows
        .into_iter()
        .map(|(row, code)| {
            let mut objectives = [None; 6];
            for (idx, slot) in objectives.iter_mut().enumerate() {
                *slot = table.cell(row, &format!("objetivo{}", idx + 1)).as_flag();
            }
            InitialSelectionRecord { code, objectives }
        })
        .collect();
    Extracted { records, skipped }
}

/// Stations answered `Sim`/`Não` per capability with a comma list of
/// specific objectives. They integrate the network by definition.
pub fn manual_station_records(
    table: &SheetTable,
    observation: Option<&str>,
) -> Result<Extracted<ManualStationRecord>, IngestionError> {
    let (rows, skipped) = rows_with_code(table);
    let mut records = Vec::with_capacity(rows.len());
    for (row, code) in rows {
        let answer = |column: &str| table.cell(row, column).as_yes_no().unwrap_or(false);
        let capabilities = Capabilities {
            stage: answer(target::STAGE),
            discharge: answer(target::DISCHARGE),
            water_quality: answer(target::WATER_QUALITY),
            sediment: answer(target::SEDIMENT),
            telemetry: answer(target::TELEMETRY),
        };
        let typology = capabilities
            .typology()
            .ok_or(IngestionError::EmptyTypology { line: row.line, code })?;

        let list = text(table, row, target::OBJECTIVE_LIST).unwrap_or_default();
        let flags = ObjectiveFlags::parse_list(&list)
            .map_err(|source| IngestionError::Objective { line: row.line, source })?;

        let action_text = text(table, row, target::ACTION);
        records.push(ManualStationRecord {
            proposal: ProposalRecord {
                code,
                current_typology: Some(typology.clone()),
                action: action_text.as_deref().and_then(ProposedAction::parse),
                action_text,
                proposed_typology: Some(typology),
                integrates: Some(true),
                observation: text(table, row, target::OBSERVATION)
                    .or_else(|| observation.map(str::to_string)),
            },
            objectives: ObjectiveRecord {
                code,
                flags,
                mapping_kind: Some(MANUAL_MAPPING.to_string()),
            },
        });
    }
    Ok(Extracted { records, skipped })
}
