use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod api;
mod checkin;
mod config;
mod db;
mod error;
mod models;
mod notify;
mod report;
mod service;
mod store;

use crate::config::ServeArgs;
use crate::db::PgStore;
use crate::notify::DisabledNotifier;
use crate::service::FocusService;

#[derive(Parser)]
#[command(name = "focus-mode")]
#[command(about = "Daily focus check-ins with lock and remediation tracking", long_about = None)]
struct Cli {
    /// Tracing filter directive, e.g. `info` or `focus_mode=debug`
    #[arg(long, global = true, env = "FOCUS_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Create or upgrade the database schema
    InitDb,
    /// Load demo students
    Seed,
    /// Upsert a student roster from a CSV file with `id,name` columns
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown check-in report for one student
    Report {
        #[arg(long)]
        student_id: i32,
        #[arg(long, default_value_t = 30)]
        since_days: i64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::Serve(args) => {
            let notifier = args.notifier()?;
            let service = Arc::new(FocusService::new(PgStore::new(pool), notifier));
            let app = api::router(service, api::cors_layer(args.cors_origins()?));

            let listener = tokio::net::TcpListener::bind(args.bind)
                .await
                .with_context(|| format!("failed to bind {}", args.bind))?;
            tracing::info!(addr = %args.bind, "focus-mode listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let upserted = db::import_csv(&pool, &csv).await?;
            println!("Upserted {upserted} students from {}.", csv.display());
        }
        Commands::Report {
            student_id,
            since_days,
            out,
        } => {
            let cutoff = report::cutoff_date(since_days);
            let service = FocusService::new(PgStore::new(pool.clone()), Arc::new(DisabledNotifier));
            let state = service.get_state(student_id).await?;
            let logs = db::fetch_daily_logs(&pool, student_id, cutoff).await?;
            let interventions = db::fetch_intervention_history(&pool, student_id).await?;
            let report = report::build_report(&state, since_days, cutoff, &logs, &interventions);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
