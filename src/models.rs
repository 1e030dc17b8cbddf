use anyhow::bail;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One of four mutually exclusive intent classifications for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientMode {
    EarlyAlert,
    CriticalAlert,
    Learning,
    Alpha,
}

impl ClientMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientMode::EarlyAlert => "early_alert",
            ClientMode::CriticalAlert => "critical_alert",
            ClientMode::Learning => "learning",
            ClientMode::Alpha => "alpha",
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, ClientMode::EarlyAlert | ClientMode::CriticalAlert)
    }
}

impl std::fmt::Display for ClientMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClientMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "early_alert" => Ok(ClientMode::EarlyAlert),
            "critical_alert" => Ok(ClientMode::CriticalAlert),
            "learning" => Ok(ClientMode::Learning),
            "alpha" => Ok(ClientMode::Alpha),
            other => bail!("unknown client mode: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    HedgeFund,
    AssetManager,
    PensionFund,
    FamilyOffice,
    CorporateTreasury,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::HedgeFund => "hedge_fund",
            Persona::AssetManager => "asset_manager",
            Persona::PensionFund => "pension_fund",
            Persona::FamilyOffice => "family_office",
            Persona::CorporateTreasury => "corporate_treasury",
        }
    }
}

impl std::str::FromStr for Persona {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "hedge_fund" => Ok(Persona::HedgeFund),
            "asset_manager" => Ok(Persona::AssetManager),
            "pension_fund" => Ok(Persona::PensionFund),
            "family_office" => Ok(Persona::FamilyOffice),
            "corporate_treasury" => Ok(Persona::CorporateTreasury),
            other => bail!("unknown persona: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    New,
    Existing,
}

impl std::str::FromStr for Tier {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "new" => Ok(Tier::New),
            "existing" => Ok(Tier::Existing),
            other => bail!("unknown tier: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredChannel {
    Email,
    BloombergChat,
    TeamsChat,
    Call,
}

impl PreferredChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferredChannel::Email => "email",
            PreferredChannel::BloombergChat => "bloomberg_chat",
            PreferredChannel::TeamsChat => "teams_chat",
            PreferredChannel::Call => "call",
        }
    }
}

impl std::str::FromStr for PreferredChannel {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "email" => Ok(PreferredChannel::Email),
            "bloomberg_chat" => Ok(PreferredChannel::BloombergChat),
            "teams_chat" => Ok(PreferredChannel::TeamsChat),
            "call" => Ok(PreferredChannel::Call),
            other => bail!("unknown preferred channel: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl std::str::FromStr for Sentiment {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => bail!("unknown sentiment: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl std::str::FromStr for Urgency {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            other => bail!("unknown urgency: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    QuickTake,
    DailyDigest,
}

impl std::str::FromStr for EventSource {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "quick_take" => Ok(EventSource::QuickTake),
            "daily_digest" => Ok(EventSource::DailyDigest),
            other => bail!("unknown event source: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    NewSignals,
    RecommendedAction,
    Executed,
    AwaitingResponse,
    Converted,
}

impl std::str::FromStr for FunnelStage {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> anyhow::Result<Self> {
        match raw {
            "new_signals" => Ok(FunnelStage::NewSignals),
            "recommended_action" => Ok(FunnelStage::RecommendedAction),
            "executed" => Ok(FunnelStage::Executed),
            "awaiting_response" => Ok(FunnelStage::AwaitingResponse),
            "converted" => Ok(FunnelStage::Converted),
            other => bail!("unknown funnel stage: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Conservative,
    Balanced,
    Aggressive,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Conservative => "conservative",
            Tone::Balanced => "balanced",
            Tone::Aggressive => "aggressive",
        }
    }
}

/// A covered institutional account. `current_mode` and `confidence` are a
/// cached copy of the last classification, overwritten on every run and never
/// read back by the engine.
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub client_id: String,
    pub client_name: String,
    pub tier: Tier,
    pub persona: Persona,
    pub region: String,
    pub sector_interest: String,
    pub rm_name: String,
    pub preferred_channel: PreferredChannel,
    pub relationship_score: i32,
    pub current_mode: Option<ClientMode>,
    pub confidence: Option<f64>,
    pub funnel_stage: FunnelStage,
    pub last_contact: Option<NaiveDate>,
}

/// An immutable, append-only behavioral event tied to one client.
///
/// `signal_type` stays a free string: unknown types from newer ingestion
/// layers must pass through classification without error.
#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub signal_id: String,
    pub client_id: String,
    pub timestamp: DateTime<Utc>,
    pub signal_type: String,
    pub signal_value: f64,
    pub related_event_id: Option<String>,
    pub related_sector: Option<String>,
    pub related_company: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsEvent {
    pub event_id: String,
    pub source: EventSource,
    pub timestamp: DateTime<Utc>,
    pub sector: String,
    pub company: String,
    pub title: String,
    pub summary: String,
    pub sentiment: Sentiment,
    pub urgency: Urgency,
    pub event_type: String,
}

/// Raw aggregate score per mode, accumulated additively per classification
/// run before persona/tier multipliers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModeScores {
    pub early_alert: f64,
    pub critical_alert: f64,
    pub learning: f64,
    pub alpha: f64,
}

impl ModeScores {
    pub fn score_for(&self, mode: ClientMode) -> f64 {
        match mode {
            ClientMode::EarlyAlert => self.early_alert,
            ClientMode::CriticalAlert => self.critical_alert,
            ClientMode::Learning => self.learning,
            ClientMode::Alpha => self.alpha,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSignal {
    pub signal: String,
    pub contribution: f64,
    pub reason: String,
}

/// Engine output for one client at one point in time. Recomputed from the
/// full signal history on demand, never persisted as a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentClassification {
    pub mode: ClientMode,
    pub confidence: f64,
    pub scores: ModeScores,
    pub top_signals: Vec<TopSignal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cadence {
    pub day0: String,
    pub day1: String,
    pub day3: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementPlan {
    pub why_now: String,
    pub preferred_channel: PreferredChannel,
    pub tone: Tone,
    pub what_to_send: String,
    pub content_asset: String,
    pub next_step: String,
    pub cadence: Cadence,
}

#[derive(Debug, Clone)]
pub struct SignalTypeSummary {
    pub signal_type: String,
    pub count: usize,
    pub avg_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelAdvice {
    pub channel: String,
    pub description: String,
}
