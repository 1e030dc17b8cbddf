use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

mod db;
mod intent;
mod models;
mod plan;
mod relevance;
mod report;

use models::{Client, IntentClassification, NewsEvent, Signal};
use report::ClientAssessment;

#[derive(Parser)]
#[command(name = "client-intent")]
#[command(
    about = "Intent classification and engagement planning for institutional sales coverage",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a realistic starter book of clients, events, and signals
    Seed,
    /// Import signals from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Classify client intent from signal history
    Classify {
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Generate an engagement plan for one client
    Plan {
        #[arg(long)]
        client: String,
    },
    /// Rank clients by relevance to a news event
    Impact {
        #[arg(long)]
        event: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown coverage report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(serde::Serialize)]
struct ClassificationOutput<'a> {
    client_id: &'a str,
    client_name: &'a str,
    signal_count: usize,
    classification: &'a IntentClassification,
}

/// Recompute a client's classification from its full history and overwrite
/// the cached mode/confidence columns.
async fn classify_client(
    pool: &PgPool,
    client: &Client,
) -> anyhow::Result<(Vec<Signal>, Vec<NewsEvent>, IntentClassification)> {
    let signals = db::fetch_signals(pool, &client.client_id).await?;
    let events = db::fetch_correlated_events(pool, &signals).await?;
    let classification = intent::classify(client, &signals, &events);
    db::store_classification(
        pool,
        &client.client_id,
        classification.mode,
        classification.confidence,
    )
    .await?;
    Ok((signals, events, classification))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} signals from {}.", csv.display());
        }
        Commands::Classify { client, json } => {
            let clients = db::fetch_clients(&pool, client.as_deref()).await?;
            if clients.is_empty() {
                println!("No matching clients.");
                return Ok(());
            }

            let mut assessments = Vec::new();
            for client in &clients {
                let (signals, _events, classification) = classify_client(&pool, client).await?;
                assessments.push(ClientAssessment {
                    client: client.clone(),
                    signal_count: signals.len(),
                    classification,
                });
            }
            report::rank_assessments(&mut assessments);

            if json {
                let outputs: Vec<ClassificationOutput> = assessments
                    .iter()
                    .map(|a| ClassificationOutput {
                        client_id: &a.client.client_id,
                        client_name: &a.client.client_name,
                        signal_count: a.signal_count,
                        classification: &a.classification,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&outputs)?);
                return Ok(());
            }

            println!("Client intent by priority:");
            for assessment in &assessments {
                println!(
                    "- {} ({}) mode {} at {:.0}% confidence across {} signals",
                    assessment.client.client_name,
                    assessment.client.client_id,
                    assessment.classification.mode,
                    assessment.classification.confidence * 100.0,
                    assessment.signal_count
                );
                for top in &assessment.classification.top_signals {
                    println!("    * {} ({:.1}): {}", top.signal, top.contribution, top.reason);
                }
            }
        }
        Commands::Plan { client } => {
            let client = db::fetch_client(&pool, &client).await?;
            let (signals, events, classification) = classify_client(&pool, &client).await?;
            let advice = plan::recommended_channel(classification.mode, client.persona);
            let engagement = plan::generate_plan(&client, &classification, &signals, &events);

            println!("Engagement plan for {} ({})", client.client_name, client.client_id);
            println!(
                "Mode: {} at {:.0}% confidence",
                classification.mode,
                classification.confidence * 100.0
            );
            println!("Why now: {}", engagement.why_now);
            println!("Channel: {} - {}", advice.channel, advice.description);
            println!("Deliver via: {}", engagement.preferred_channel.as_str());
            println!("Tone: {}", engagement.tone.as_str());
            println!("Send: {}", engagement.what_to_send);
            println!("Asset: {}", engagement.content_asset);
            println!("Next step: {}", engagement.next_step);
            println!("Cadence:");
            println!("  Day 0: {}", engagement.cadence.day0);
            println!("  Day 1: {}", engagement.cadence.day1);
            println!("  Day 3: {}", engagement.cadence.day3);
        }
        Commands::Impact { event, limit } => {
            let event = db::fetch_event(&pool, &event).await?;
            let clients = db::fetch_clients(&pool, None).await?;
            if clients.is_empty() {
                println!("No clients on the book.");
                return Ok(());
            }

            let mut ranked: Vec<(i64, &Client)> = clients
                .iter()
                .map(|c| (relevance::relevance(c, &event), c))
                .collect();
            ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.client_id.cmp(&b.1.client_id)));

            println!("Clients most relevant to \"{}\" ({}):", event.title, event.company);
            for (score, client) in ranked.iter().take(limit) {
                println!(
                    "- {} ({}, {}) relevance {score}",
                    client.client_name,
                    client.client_id,
                    client.persona.as_str()
                );
            }
        }
        Commands::Report { out } => {
            let clients = db::fetch_clients(&pool, None).await?;
            let mut assessments = Vec::new();
            for client in &clients {
                let signals = db::fetch_signals(&pool, &client.client_id).await?;
                let events = db::fetch_correlated_events(&pool, &signals).await?;
                let classification = intent::classify(client, &signals, &events);
                assessments.push(ClientAssessment {
                    client: client.clone(),
                    signal_count: signals.len(),
                    classification,
                });
            }
            let all_signals = db::fetch_all_signals(&pool).await?;
            let report = report::build_report(&assessments, &all_signals);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
