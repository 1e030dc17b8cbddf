use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{Client, ClientMode, NewsEvent, Signal};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn client_from_row(row: &PgRow) -> anyhow::Result<Client> {
    let current_mode = match row.get::<Option<String>, _>("current_mode") {
        Some(raw) => Some(raw.parse::<ClientMode>()?),
        None => None,
    };
    Ok(Client {
        client_id: row.get("client_id"),
        client_name: row.get("client_name"),
        tier: row.get::<String, _>("tier").parse()?,
        persona: row.get::<String, _>("persona").parse()?,
        region: row.get("region"),
        sector_interest: row.get("sector_interest"),
        rm_name: row.get("rm_name"),
        preferred_channel: row.get::<String, _>("preferred_channel").parse()?,
        relationship_score: row.get("relationship_score"),
        current_mode,
        confidence: row.get("confidence"),
        funnel_stage: row.get::<String, _>("funnel_stage").parse()?,
        last_contact: row.get("last_contact"),
    })
}

fn signal_from_row(row: &PgRow) -> Signal {
    Signal {
        signal_id: row.get("source_key"),
        client_id: row.get("client_id"),
        timestamp: row.get("occurred_at"),
        signal_type: row.get("signal_type"),
        signal_value: row.get("signal_value"),
        related_event_id: row.get("related_event_id"),
        related_sector: row.get("related_sector"),
        related_company: row.get("related_company"),
    }
}

fn event_from_row(row: &PgRow) -> anyhow::Result<NewsEvent> {
    Ok(NewsEvent {
        event_id: row.get("event_id"),
        source: row.get::<String, _>("source").parse()?,
        timestamp: row.get("occurred_at"),
        sector: row.get("sector"),
        company: row.get("company"),
        title: row.get("title"),
        summary: row.get("summary"),
        sentiment: row.get::<String, _>("sentiment").parse()?,
        urgency: row.get::<String, _>("urgency").parse()?,
        event_type: row.get("event_type"),
    })
}

pub async fn fetch_clients(pool: &PgPool, client_id: Option<&str>) -> anyhow::Result<Vec<Client>> {
    let mut query = String::from(
        "SELECT client_id, client_name, tier, persona, region, sector_interest, \
         rm_name, preferred_channel, relationship_score, current_mode, confidence, \
         funnel_stage, last_contact \
         FROM client_intent.clients",
    );
    if client_id.is_some() {
        query.push_str(" WHERE client_id = $1");
    }
    query.push_str(" ORDER BY client_id");

    let mut rows = sqlx::query(&query);
    if let Some(value) = client_id {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    records.iter().map(client_from_row).collect()
}

pub async fn fetch_client(pool: &PgPool, client_id: &str) -> anyhow::Result<Client> {
    let clients = fetch_clients(pool, Some(client_id)).await?;
    clients
        .into_iter()
        .next()
        .with_context(|| format!("unknown client: {client_id}"))
}

/// Full ordered signal history for one client, oldest first.
pub async fn fetch_signals(pool: &PgPool, client_id: &str) -> anyhow::Result<Vec<Signal>> {
    let records = sqlx::query(
        "SELECT client_id, occurred_at, signal_type, signal_value, \
         related_event_id, related_sector, related_company, source_key \
         FROM client_intent.signals \
         WHERE client_id = $1 \
         ORDER BY occurred_at, source_key",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await?;

    Ok(records.iter().map(signal_from_row).collect())
}

pub async fn fetch_all_signals(pool: &PgPool) -> anyhow::Result<Vec<Signal>> {
    let records = sqlx::query(
        "SELECT client_id, occurred_at, signal_type, signal_value, \
         related_event_id, related_sector, related_company, source_key \
         FROM client_intent.signals \
         ORDER BY occurred_at, source_key",
    )
    .fetch_all(pool)
    .await?;

    Ok(records.iter().map(signal_from_row).collect())
}

/// The news events referenced by a signal history, deduplicated by
/// event_id. Signals pointing at ids missing from the catalog simply get
/// no match.
pub async fn fetch_correlated_events(
    pool: &PgPool,
    signals: &[Signal],
) -> anyhow::Result<Vec<NewsEvent>> {
    let mut ids: Vec<String> = Vec::new();
    for signal in signals {
        if let Some(id) = &signal.related_event_id {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let records = sqlx::query(
        "SELECT event_id, source, occurred_at, sector, company, title, summary, \
         sentiment, urgency, event_type \
         FROM client_intent.news_events \
         WHERE event_id = ANY($1) \
         ORDER BY event_id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    records.iter().map(event_from_row).collect()
}

pub async fn fetch_event(pool: &PgPool, event_id: &str) -> anyhow::Result<NewsEvent> {
    let row = sqlx::query(
        "SELECT event_id, source, occurred_at, sector, company, title, summary, \
         sentiment, urgency, event_type \
         FROM client_intent.news_events \
         WHERE event_id = $1",
    )
    .bind(event_id)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("unknown event: {event_id}"))?;

    event_from_row(&row)
}

/// Write the derived mode/confidence cache back onto the client row. The
/// engine never reads these columns; they exist for dashboards.
pub async fn store_classification(
    pool: &PgPool,
    client_id: &str,
    mode: ClientMode,
    confidence: f64,
) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE client_intent.clients SET current_mode = $2, confidence = $3 \
         WHERE client_id = $1",
    )
    .bind(client_id)
    .bind(mode.as_str())
    .bind(confidence)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let clients = vec![
        (
            "client_001",
            "Orion Capital Partners",
            "existing",
            "hedge_fund",
            "DE",
            "Energy",
            "Marcus Weber",
            "bloomberg_chat",
            85,
            "new_signals",
        ),
        (
            "client_002",
            "BluePeak Asset Management",
            "new",
            "asset_manager",
            "FR",
            "Industrials",
            "Sophie Dubois",
            "email",
            45,
            "new_signals",
        ),
        (
            "client_003",
            "Atlas Pension Fund",
            "existing",
            "pension_fund",
            "UK",
            "Media",
            "James Fletcher",
            "email",
            72,
            "recommended_action",
        ),
        (
            "client_004",
            "Rhein Family Office",
            "existing",
            "family_office",
            "DE",
            "Industrials",
            "Hans Mueller",
            "email",
            68,
            "new_signals",
        ),
    ];

    for (
        client_id,
        client_name,
        tier,
        persona,
        region,
        sector_interest,
        rm_name,
        preferred_channel,
        relationship_score,
        funnel_stage,
    ) in clients
    {
        sqlx::query(
            r#"
            INSERT INTO client_intent.clients
            (id, client_id, client_name, tier, persona, region, sector_interest,
             rm_name, preferred_channel, relationship_score, funnel_stage)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (client_id) DO UPDATE
            SET client_name = EXCLUDED.client_name,
                tier = EXCLUDED.tier,
                persona = EXCLUDED.persona,
                relationship_score = EXCLUDED.relationship_score
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(client_name)
        .bind(tier)
        .bind(persona)
        .bind(region)
        .bind(sector_interest)
        .bind(rm_name)
        .bind(preferred_channel)
        .bind(relationship_score)
        .bind(funnel_stage)
        .execute(pool)
        .await?;
    }

    let events = vec![
        (
            "event_001",
            "quick_take",
            Utc.with_ymd_and_hms(2026, 1, 9, 8, 30, 0).single().context("invalid timestamp")?,
            "Industrials",
            "Alstom",
            "Alstom - New contract worth EUR 920m",
            "Alstom secures major European rail infrastructure contract valued at EUR 920 million.",
            "positive",
            "medium",
            "contract_win",
        ),
        (
            "event_004",
            "daily_digest",
            Utc.with_ymd_and_hms(2026, 1, 9, 6, 0, 0).single().context("invalid timestamp")?,
            "Media",
            "Canal+",
            "Canal+ / Multichoice - Distribution deal at risk",
            "Canal+ faces potential disruption in African distribution partnership with Multichoice.",
            "negative",
            "high",
            "regulatory_risk",
        ),
        (
            "event_005",
            "quick_take",
            Utc.with_ymd_and_hms(2026, 1, 8, 16, 45, 0).single().context("invalid timestamp")?,
            "Energy",
            "TotalEnergies",
            "TotalEnergies - LNG expansion in Mozambique",
            "TotalEnergies resumes Mozambique LNG project with enhanced security protocols.",
            "positive",
            "high",
            "project_update",
        ),
    ];

    for (event_id, source, occurred_at, sector, company, title, summary, sentiment, urgency, event_type) in
        events
    {
        sqlx::query(
            r#"
            INSERT INTO client_intent.news_events
            (id, event_id, source, occurred_at, sector, company, title, summary,
             sentiment, urgency, event_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(source)
        .bind(occurred_at)
        .bind(sector)
        .bind(company)
        .bind(title)
        .bind(summary)
        .bind(sentiment)
        .bind(urgency)
        .bind(event_type)
        .execute(pool)
        .await?;
    }

    let signals: Vec<(&str, &str, DateTime<Utc>, &str, f64, Option<&str>, Option<&str>)> = vec![
        (
            "seed-001",
            "client_001",
            Utc.with_ymd_and_hms(2026, 1, 9, 8, 35, 0).single().context("invalid timestamp")?,
            "read_quick_take",
            1.0,
            Some("event_005"),
            Some("Energy"),
        ),
        (
            "seed-002",
            "client_001",
            Utc.with_ymd_and_hms(2026, 1, 9, 8, 40, 0).single().context("invalid timestamp")?,
            "repeat_check",
            3.0,
            Some("event_005"),
            Some("Energy"),
        ),
        (
            "seed-003",
            "client_001",
            Utc.with_ymd_and_hms(2026, 1, 9, 8, 45, 0).single().context("invalid timestamp")?,
            "stress_level",
            65.0,
            None,
            None,
        ),
        (
            "seed-004",
            "client_002",
            Utc.with_ymd_and_hms(2026, 1, 9, 7, 0, 0).single().context("invalid timestamp")?,
            "read_daily_digest",
            12.0,
            None,
            Some("Industrials"),
        ),
        (
            "seed-005",
            "client_002",
            Utc.with_ymd_and_hms(2026, 1, 9, 7, 30, 0).single().context("invalid timestamp")?,
            "read_quick_take",
            1.0,
            Some("event_001"),
            Some("Industrials"),
        ),
        (
            "seed-006",
            "client_003",
            Utc.with_ymd_and_hms(2026, 1, 9, 9, 0, 0).single().context("invalid timestamp")?,
            "sector_spike",
            4.0,
            None,
            Some("Media"),
        ),
        (
            "seed-007",
            "client_003",
            Utc.with_ymd_and_hms(2026, 1, 9, 9, 15, 0).single().context("invalid timestamp")?,
            "meeting_request",
            1.0,
            None,
            Some("Media"),
        ),
    ];

    for (source_key, client_id, occurred_at, signal_type, signal_value, related_event_id, related_sector) in
        signals
    {
        sqlx::query(
            r#"
            INSERT INTO client_intent.signals
            (id, client_id, occurred_at, signal_type, signal_value,
             related_event_id, related_sector, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(occurred_at)
        .bind(signal_type)
        .bind(signal_value)
        .bind(related_event_id)
        .bind(related_sector)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        client_id: String,
        signal_type: String,
        signal_value: f64,
        timestamp: DateTime<Utc>,
        related_event_id: Option<String>,
        related_sector: Option<String>,
        related_company: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;

        sqlx::query("SELECT client_id FROM client_intent.clients WHERE client_id = $1")
            .bind(&row.client_id)
            .fetch_optional(pool)
            .await?
            .with_context(|| format!("signal references unknown client: {}", row.client_id))?;

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO client_intent.signals
            (id, client_id, occurred_at, signal_type, signal_value,
             related_event_id, related_sector, related_company, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.client_id)
        .bind(row.timestamp)
        .bind(&row.signal_type)
        .bind(row.signal_value)
        .bind(&row.related_event_id)
        .bind(&row.related_sector)
        .bind(&row.related_company)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
