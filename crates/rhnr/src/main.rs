use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rhnr::{api, render};
use rhnr_core::cache::SnapshotKey;
use rhnr_core::db::{self, store_identity};
use rhnr_core::export::{write_csv, write_xlsx, DEFAULT_SHEET_NAME};
use rhnr_core::extraction::{self, POTENTIAL_STATIONS};
use rhnr_core::highlight::HighlightRule;
use rhnr_core::reports::{replaced_code, CORRECTED_CODES};
use rhnr_core::selection::{apply_filter, parse_filter_value, select_options};
use rhnr_core::session::ReviewSession;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "RHNR station review and reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the reconciled review table, optionally filtered, highlighted and exported
    Review(ReviewArgs),
    /// Print one of the comparison reports
    Report {
        #[command(subcommand)]
        report: ReportKind,
    },
    /// List the distinct values of review columns
    Options {
        #[arg(required = true)]
        columns: Vec<String>,
    },
    /// List the stations of the potential-station list found in the store
    Potential,
    /// Serve the review snapshot over HTTP
    Serve(ServeArgs),
}

#[derive(Subcommand, Debug)]
enum ReportKind {
    /// Corrected codes and operating status of the initial selection
    Initial,
    /// Stations retained from the initial selection and newly added ones
    Proposal,
}

#[derive(Args, Debug, Default)]
struct ReviewArgs {
    /// Column to filter on
    #[arg(long)]
    filter_column: Option<String>,
    /// Value the filter column must equal ("null" matches empty cells)
    #[arg(long, requires = "filter_column")]
    filter_value: Option<String>,
    /// Column whose values colour the rows
    #[arg(long)]
    highlight: Option<String>,
    /// Write the table to an .xlsx or .csv file
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0:3000")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Review(args) => handle_review(args).await,
        Command::Report { report } => handle_report(report).await,
        Command::Options { columns } => handle_options(columns).await,
        Command::Potential => handle_potential().await,
        Command::Serve(args) => handle_serve(args).await,
    }
}

async fn connect_pool() -> Result<(db::DbPool, String)> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("RHNR_DATABASE_URL"))
        .context("DATABASE_URL (or RHNR_DATABASE_URL) must be set")?;
    let pool = db::connect(&database_url).await?;
    Ok((pool, store_identity(&database_url)))
}

async fn load_session() -> Result<ReviewSession> {
    let (pool, store) = connect_pool().await?;
    let session = ReviewSession::load(&pool, SnapshotKey::new(store, 1))
        .await
        .context("failed to load review snapshot")?;
    Ok(session)
}

async fn handle_review(args: ReviewArgs) -> Result<()> {
    let session = load_session().await?;
    let table = session.final_table()?;
    let highlight = match args.highlight.as_deref() {
        Some(column) => Some(HighlightRule::for_review(&table, column)?),
        None => None,
    };

    let filtered = match args.filter_column.as_deref() {
        Some(column) => {
            let value = match args.filter_value.as_deref() {
                Some(raw) => parse_filter_value(&table, column, raw)?,
                None => None,
            };
            apply_filter(&table, Some(column), value.as_ref())?
        }
        None => table,
    };

    println!("{}", render::render_table(&filtered, highlight.as_ref())?);
    if let Some(rule) = &highlight {
        println!("{}", render::render_legend(rule));
    }
    println!("{} stations", filtered.height());

    if let Some(path) = args.export {
        export(&filtered, &path, highlight.as_ref())?;
        println!("Exported to {}", path.display());
    }
    Ok(())
}

fn export(
    table: &polars::prelude::DataFrame,
    path: &Path,
    highlight: Option<&HighlightRule>,
) -> Result<()> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    let written = if is_csv {
        write_csv(table, path)
    } else {
        write_xlsx(table, path, DEFAULT_SHEET_NAME, highlight)
    };
    written.with_context(|| format!("failed to export {}", path.display()))
}

async fn handle_report(report: ReportKind) -> Result<()> {
    let session = load_session().await?;
    let operating = HighlightRule::operating_status();

    match report {
        ReportKind::Initial => {
            let report = session.initial_report()?;
            let sections = [
                ("Estações com código corrigido", &report.corrected),
                ("Estações não operantes", &report.not_operating),
                ("Estações operantes", &report.operating),
            ];
            for (title, frame) in sections {
                println!("\n{title} ({})", frame.height());
                println!("{}", render::render_table(frame, None)?);
            }
            for code in CORRECTED_CODES {
                if let Some(replaced) = replaced_code(code) {
                    println!("{code} substitui {replaced}");
                }
            }
        }
        ReportKind::Proposal => {
            let retained = session.retained()?;
            let added = session.newly_added()?;
            println!("\nEstações mantidas da seleção inicial ({})", retained.height());
            println!("{}", render::render_table(&retained, Some(&operating))?);
            println!("\nEstações novas ({})", added.height());
            println!("{}", render::render_table(&added, Some(&operating))?);
            println!("{}", render::render_legend(&operating));
        }
    }
    Ok(())
}

async fn handle_options(columns: Vec<String>) -> Result<()> {
    let session = load_session().await?;
    let table = session.final_table()?;
    for options in select_options(&table, &columns)? {
        let values: Vec<String> = options.values.iter().map(|value| value.to_string()).collect();
        println!("{}: {}", options.column, values.join(" | "));
    }
    Ok(())
}

async fn handle_potential() -> Result<()> {
    let (pool, _) = connect_pool().await?;
    let stations = extraction::stations_by_code(&pool, &POTENTIAL_STATIONS).await?;
    println!("{}", render::render_table(&stations, None)?);
    println!(
        "{} of {} potential stations found",
        stations.height(),
        POTENTIAL_STATIONS.len()
    );
    Ok(())
}

async fn handle_serve(args: ServeArgs) -> Result<()> {
    let session = load_session().await?;
    let router = api::router(session);

    let listener = TcpListener::bind(args.addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}
