use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rhnr_core::db::{self, DbPool};
use rhnr_core::ingestion::{self, IngestionSummary};
use rhnr_sheets::{read_sheet, SheetSource};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "RHNR station store administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load spreadsheet rows described by TOML source files into the station store
    Ingest(IngestArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// State proposals (operation, typology, network membership)
    Proposals,
    /// Specific-objective flags per station
    Objectives,
    /// Redundant station pairs
    Redundancies,
    /// Initial selection with its six general objectives
    Initial,
    /// Stations added by hand with capabilities and objective lists
    Manual,
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Source definition files (glob patterns are expanded)
    #[arg(required = true)]
    sources: Vec<String>,
    #[arg(long, value_enum)]
    kind: SourceKind,
    /// Parse and report without writing to the store
    #[arg(long)]
    dry_run: bool,
    /// Mapping kind recorded with objective rows lacking `tipo_mapeamento`
    #[arg(long)]
    mapping_kind: Option<String>,
    /// Observation recorded with manual stations
    #[arg(long)]
    observation: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Ingest(args) => handle_ingest(args).await,
    }
}

async fn connect_pool() -> Result<DbPool> {
    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL")
        .or_else(|_| env::var("RHNR_DATABASE_URL"))
        .context("DATABASE_URL (or RHNR_DATABASE_URL) must be set")?;
    Ok(db::connect(&database_url).await?)
}

fn expand_sources(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let before = paths.len();
        for entry in glob::glob(pattern).with_context(|| format!("invalid pattern '{pattern}'"))? {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(err) => warn!("could not read path from pattern '{pattern}': {err}"),
            }
        }
        if paths.len() == before {
            bail!("no source definition matches '{pattern}'");
        }
    }
    Ok(paths)
}

async fn handle_ingest(args: IngestArgs) -> Result<()> {
    let paths = expand_sources(&args.sources)?;
    let pool = if args.dry_run {
        info!("Dry run: nothing will be written");
        None
    } else {
        Some(connect_pool().await?)
    };

    let mut total = IngestionSummary::default();
    for path in &paths {
        let source = SheetSource::from_toml_file(path)
            .with_context(|| format!("failed to load source definition {}", path.display()))?;
        let table = read_sheet(&source)
            .with_context(|| format!("failed to read {}", source.path.display()))?;
        info!(
            definition = %path.display(),
            workbook = %source.path.display(),
            sheet = %table.sheet,
            rows = table.len(),
            "Read source sheet"
        );

        let summary = ingest_table(pool.as_ref(), &args, &table)
            .await
            .with_context(|| format!("ingestion of {} failed", path.display()))?;
        println!(
            "{}",
            serde_json::to_string(&serde_json::json!({
                "source": path.display().to_string(),
                "kind": format!("{:?}", args.kind).to_lowercase(),
                "dry_run": args.dry_run,
                "summary": summary,
            }))?
        );

        total.read += summary.read;
        total.skipped += summary.skipped;
        total.inserted += summary.inserted;
    }

    info!(
        sources = paths.len(),
        read = total.read,
        skipped = total.skipped,
        inserted = total.inserted,
        "Ingestion finished"
    );
    Ok(())
}

async fn ingest_table(
    pool: Option<&DbPool>,
    args: &IngestArgs,
    table: &rhnr_sheets::SheetTable,
) -> Result<IngestionSummary> {
    let summary = match args.kind {
        SourceKind::Proposals => {
            let extracted = ingestion::proposal_records(table);
            let inserted = match pool {
                Some(pool) => ingestion::write_proposals(pool, &extracted.records).await?,
                None => 0,
            };
            IngestionSummary::from_extracted(&extracted, inserted)
        }
        SourceKind::Objectives => {
            let extracted = ingestion::objective_records(table, args.mapping_kind.as_deref());
            let inserted = match pool {
                Some(pool) => ingestion::write_objectives(pool, &extracted.records).await?,
                None => 0,
            };
            IngestionSummary::from_extracted(&extracted, inserted)
        }
        SourceKind::Redundancies => {
            let extracted = ingestion::redundancy_records(table)?;
            let inserted = match pool {
                Some(pool) => ingestion::write_redundancies(pool, &extracted.records).await?,
                None => 0,
            };
            IngestionSummary::from_extracted(&extracted, inserted)
        }
        SourceKind::Initial => {
            let extracted = ingestion::initial_selection_records(table);
            let inserted = match pool {
                Some(pool) => ingestion::write_initial_selection(pool, &extracted.records).await?,
                None => 0,
            };
            IngestionSummary::from_extracted(&extracted, inserted)
        }
        SourceKind::Manual => {
            let extracted =
                ingestion::manual_station_records(table, args.observation.as_deref())?;
            let inserted = match pool {
                Some(pool) => ingestion::write_manual_stations(pool, &extracted.records).await?,
                None => 0,
            };
            IngestionSummary::from_extracted(&extracted, inserted)
        }
    };
    Ok(summary)
}
