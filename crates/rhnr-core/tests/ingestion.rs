use rhnr_core::ingestion::{
    initial_selection_records, manual_station_records, objective_records, proposal_records,
    redundancy_records, IngestionError, IngestionSummary, MANUAL_MAPPING,
};
use rhnr_core::proposal::ProposedAction;
use rhnr_sheets::{read_sheet, SheetCell, SheetRow, SheetSource, SheetTable};
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

fn text(value: &str) -> SheetCell {
    SheetCell::Text(value.to_string())
}

fn table(headers: &[&str], rows: Vec<Vec<SheetCell>>) -> SheetTable {
    SheetTable {
        sheet: "Planilha1".to_string(),
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .into_iter()
            .enumerate()
            .map(|(idx, cells)| SheetRow {
                line: idx + 2,
                cells,
            })
            .collect(),
    }
}

#[test]
fn proposals_skip_rows_without_code_and_normalize_actions() {
    let sheet = table(
        &["codigo", "tipo_estacao", "proposta_operacao", "proposta_integra_rhnr"],
        vec![
            vec![SheetCell::Number(36020000.0), text("FD"), text("Manter"), text("Sim")],
            vec![SheetCell::Empty, text("F"), text("Desativar"), text("Não")],
            vec![text("36045000"), text("FDQ"), text("Transferir p/ COGERH"), text("Não")],
            vec![SheetCell::Number(36050000.0), SheetCell::Empty, text("Avaliar"), SheetCell::Empty],
        ],
    );

    let extracted = proposal_records(&sheet);
    assert_eq!(extracted.skipped, 1);
    assert_eq!(extracted.read(), 4);

    let records = &extracted.records;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].code, 36020000);
    assert_eq!(records[0].action, Some(ProposedAction::Keep));
    assert_eq!(records[0].integrates, Some(true));
    assert_eq!(records[1].action, Some(ProposedAction::Transfer));
    assert_eq!(records[1].action_text.as_deref(), Some("Transferir p/ COGERH"));
    assert_eq!(records[1].integrates, Some(false));
    assert_eq!(records[2].action, None);
    assert_eq!(records[2].integrates, None);
    assert_eq!(records[2].current_typology, None);

    let summary = IngestionSummary::from_extracted(&extracted, 2);
    assert_eq!((summary.read, summary.skipped, summary.inserted), (4, 1, 2));
}

#[test]
fn objective_flags_come_from_obj_columns() {
    let sheet = table(
        &["codigo", "obj_1a", "obj_4c", "obj_6f"],
        vec![vec![
            SheetCell::Number(10.0),
            SheetCell::Number(1.0),
            SheetCell::Empty,
            SheetCell::Number(1.0),
        ]],
    );

    let extracted = objective_records(&sheet, Some("Planilha"));
    let record = &extracted.records[0];
    assert_eq!(record.flags.get("1a"), Some(1));
    assert_eq!(record.flags.get("4c"), None);
    assert_eq!(record.flags.summary(), "1a, 6f");
    assert_eq!(record.mapping_kind.as_deref(), Some("Planilha"));
}

#[test]
fn redundancy_lines_split_into_pairs() {
    let sheet = table(
        &["codigo", "redundancia"],
        vec![
            vec![
                SheetCell::Number(36020000.0),
                text("36021000 - FD (mesmo rio)\n36022000 - F"),
            ],
            vec![SheetCell::Number(36030000.0), SheetCell::Empty],
        ],
    );

    let extracted = redundancy_records(&sheet).expect("redundancies");
    assert_eq!(extracted.records.len(), 2);
    assert_eq!(extracted.records[0].redundant_code, 36021000);
    assert_eq!(extracted.records[0].station_type, "FD");
    assert_eq!(extracted.records[1].station_type, "F");
}

#[test]
fn malformed_redundancy_entry_is_an_error() {
    let sheet = table(
        &["codigo", "redundancia"],
        vec![vec![SheetCell::Number(1.0), text("sem código")]],
    );
    assert!(matches!(
        redundancy_records(&sheet),
        Err(IngestionError::InvalidRedundancy { line: 2, .. })
    ));
}

#[test]
fn initial_selection_reads_six_objectives() {
    let sheet = table(
        &["codigo", "objetivo1", "objetivo3", "objetivo6"],
        vec![vec![
            SheetCell::Number(12351000.0),
            SheetCell::Number(1.0),
            SheetCell::Number(0.0),
            SheetCell::Number(1.0),
        ]],
    );
    let extracted = initial_selection_records(&sheet);
    assert_eq!(
        extracted.records[0].objectives,
        [Some(1), None, Some(0), None, None, Some(1)]
    );
}

#[test]
fn manual_stations_derive_typology_and_objectives() {
    let headers = [
        "codigo",
        "escala",
        "descarga_liquida",
        "qualidade_agua",
        "sedimentos",
        "telemetrica",
        "objetivos_especificos",
    ];
    let sheet = table(
        &headers,
        vec![vec![
            SheetCell::Number(37145910.0),
            text("Sim"),
            text("Sim"),
            text("Não"),
            text("Não"),
            text("Sim"),
            text("1a, 6D"),
        ]],
    );

    let extracted = manual_station_records(&sheet, Some("HidroObserva")).expect("manual");
    let record = &extracted.records[0];
    assert_eq!(record.proposal.current_typology.as_deref(), Some("FDT"));
    assert_eq!(record.proposal.proposed_typology.as_deref(), Some("FDT"));
    assert_eq!(record.proposal.integrates, Some(true));
    assert_eq!(record.proposal.observation.as_deref(), Some("HidroObserva"));
    assert_eq!(record.objectives.flags.summary(), "1a, 6d");
    assert_eq!(record.objectives.mapping_kind.as_deref(), Some(MANUAL_MAPPING));
}

#[test]
fn manual_station_without_capabilities_is_rejected() {
    let sheet = table(
        &["codigo", "escala", "objetivos_especificos"],
        vec![vec![SheetCell::Number(5.0), text("Não"), text("1a")]],
    );
    assert!(matches!(
        manual_station_records(&sheet, None),
        Err(IngestionError::EmptyTypology { code: 5, .. })
    ));

    let unknown = table(
        &["codigo", "escala", "objetivos_especificos"],
        vec![vec![SheetCell::Number(5.0), text("Sim"), text("7z")]],
    );
    assert!(matches!(
        manual_station_records(&unknown, None),
        Err(IngestionError::Objective { line: 2, .. })
    ));
}

#[test]
fn proposals_read_from_a_workbook() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("ceara.xlsx");

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Estações").unwrap();
    sheet.write_string(0, 0, "Levantamento de estações").unwrap();
    sheet.write_string(2, 0, "Código").unwrap();
    sheet.write_string(2, 1, "Operação \nda Estação").unwrap();
    sheet.write_string(2, 2, "Integra RHNR").unwrap();
    sheet.write_number(3, 0, 36020000.0).unwrap();
    sheet.write_string(3, 1, "Manter").unwrap();
    sheet.write_string(3, 2, "Sim").unwrap();
    sheet.write_string(4, 0, "NOVA").unwrap();
    sheet.write_string(4, 1, "Instalar").unwrap();
    sheet.write_string(4, 2, "Sim").unwrap();
    workbook.save(&path).unwrap();

    let definition = format!(
        r#"
path = "{}"
sheet = "Estações"
skip_rows = 2

[[columns]]
source = "Código"
target = "codigo"

[[columns]]
source = "Operação \nda Estação"
target = "proposta_operacao"

[[columns]]
source = "Integra RHNR"
target = "proposta_integra_rhnr"
"#,
        path.display()
    );
    let source = SheetSource::from_toml_str(&definition, dir.path()).expect("definition");

    let sheet = read_sheet(&source).expect("read sheet");
    let extracted = proposal_records(&sheet);
    assert_eq!(extracted.skipped, 1, "NOVA is a null code");
    assert_eq!(extracted.records.len(), 1);
    assert_eq!(extracted.records[0].code, 36020000);
    assert_eq!(extracted.records[0].action, Some(ProposedAction::Keep));
}
