use std::env;

use anyhow::Result;
use rhnr_core::cache::SnapshotKey;
use rhnr_core::columns::{CODE, CURRENT_TYPOLOGY, IMPLEMENTED, IN_INITIAL, OPERATOR};
use rhnr_core::db;
use rhnr_core::extraction;
use rhnr_core::ingestion::{self, ObjectiveRecord, ProposalRecord};
use rhnr_core::objectives::ObjectiveFlags;
use rhnr_core::proposal::ProposedAction;
use rhnr_core::session::ReviewSession;

const FIXTURE: &str = include_str!("fixtures/station_store.sql");

async fn fixture_pool() -> Result<Option<db::DbPool>> {
    let database_url = match env::var("RHNR_TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping extraction test because RHNR_TEST_DATABASE_URL is not set");
            return Ok(None);
        }
    };

    let pool = db::connect(&database_url).await?;
    sqlx::raw_sql(FIXTURE).execute(&pool).await?;
    Ok(Some(pool))
}

fn i64s(frame: &polars::prelude::DataFrame, column: &str) -> Vec<Option<i64>> {
    frame.column(column).unwrap().i64().unwrap().into_iter().collect()
}

#[tokio::test]
async fn extraction_and_ingestion_round_trip_when_database_available() -> Result<()> {
    let Some(pool) = fixture_pool().await? else {
        return Ok(());
    };

    let validated = extraction::validated_stations(&pool).await?;
    assert_eq!(i64s(&validated, CODE), vec![Some(100), Some(300)]);
    assert_eq!(
        validated.column(IMPLEMENTED)?.bool()?.into_iter().collect::<Vec<_>>(),
        vec![Some(true), Some(true)]
    );
    assert_eq!(validated.column(OPERATOR)?.str()?.get(0), Some("CPRM"));

    let typologies = extraction::station_typologies(&pool).await?;
    assert_eq!(typologies.column(CURRENT_TYPOLOGY)?.str()?.get(0), Some("FDQ"));
    assert_eq!(typologies.column(CURRENT_TYPOLOGY)?.str()?.get(1), Some("FT"));

    let potential = extraction::stations_by_code(&pool, &[300, 400, 999]).await?;
    assert_eq!(potential.height(), 2);

    let proposal = ProposalRecord {
        code: 300,
        current_typology: Some("FD".to_string()),
        action_text: Some("Manter".to_string()),
        action: Some(ProposedAction::Keep),
        proposed_typology: Some("FDQ".to_string()),
        integrates: Some(true),
        observation: None,
    };
    assert_eq!(ingestion::write_proposals(&pool, &[proposal.clone()]).await?, 1);
    assert_eq!(ingestion::write_proposals(&pool, &[proposal]).await?, 0);

    let objectives = ObjectiveRecord {
        code: 300,
        flags: ObjectiveFlags::parse_list("2a, 5b")?,
        mapping_kind: Some("Planilha".to_string()),
    };
    assert_eq!(ingestion::write_objectives(&pool, &[objectives]).await?, 1);

    let session = ReviewSession::load(&pool, SnapshotKey::new("fixture", 1)).await?;
    let table = session.final_table()?;
    assert_eq!(i64s(&table, CODE), vec![Some(100), Some(200), Some(300)]);
    assert_eq!(
        table.column(IN_INITIAL)?.bool()?.into_iter().collect::<Vec<_>>(),
        vec![Some(true), Some(true), Some(false)]
    );
    assert_eq!(table.column(CURRENT_TYPOLOGY)?.str()?.get(0), Some("FDQ"));
    assert_eq!(session.newly_added()?.height(), 1);

    // A proposed station without a basin is a data-integrity failure.
    sqlx::query("INSERT INTO estacoes_proposta_rhnr (codigo, proposta_integra_rhnr) VALUES (400, TRUE)")
        .execute(&pool)
        .await?;

    match extraction::proposed_stations(&pool).await {
        Err(extraction::ExtractionError::MissingBasin { code, .. }) => assert_eq!(code, 400),
        other => panic!("expected missing basin, got {other:?}"),
    }
    Ok(())
}
