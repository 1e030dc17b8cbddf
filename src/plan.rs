//! Channel/tone policy and engagement plan generation.
//!
//! Policy is a set of small decision tables keyed by (mode, persona, tier)
//! so the precedence order stays auditable. The plan generator layers
//! event-specific narrative on top when the most recent signal links to a
//! known news event, and falls back to generic wording otherwise.

use crate::models::{
    Cadence, ChannelAdvice, Client, ClientMode, EngagementPlan, IntentClassification, NewsEvent,
    Persona, PreferredChannel, Signal, Tier, Tone,
};

/// Recommended outreach channel for a classified client. Hedge funds run a
/// fixed multi-channel protocol regardless of mode; everyone else is keyed
/// purely by mode.
pub fn recommended_channel(mode: ClientMode, persona: Persona) -> ChannelAdvice {
    if persona == Persona::HedgeFund {
        return ChannelAdvice {
            channel: "Multi-channel cadence".to_string(),
            description: "Chat + Email + Call - Hedge fund protocol".to_string(),
        };
    }

    match mode {
        ClientMode::CriticalAlert => ChannelAdvice {
            channel: "Immediate Call + Bloomberg".to_string(),
            description: "Direct call required for critical situations".to_string(),
        },
        ClientMode::EarlyAlert => ChannelAdvice {
            channel: "Bloomberg/Teams Chat".to_string(),
            description: "Immediate response channel for urgent situations".to_string(),
        },
        ClientMode::Alpha => ChannelAdvice {
            channel: "Sector meeting + idea pack".to_string(),
            description: "Email + chat for idea presentation".to_string(),
        },
        ClientMode::Learning => ChannelAdvice {
            channel: "Focused email".to_string(),
            description: "Single-company deep dive preferred".to_string(),
        },
    }
}

/// Messaging tone: persona first, then the new-client override wins.
pub fn tone_for(persona: Persona, tier: Tier) -> Tone {
    if tier == Tier::New {
        return Tone::Conservative;
    }
    match persona {
        Persona::PensionFund | Persona::FamilyOffice => Tone::Conservative,
        Persona::HedgeFund => Tone::Aggressive,
        _ => Tone::Balanced,
    }
}

/// Compose the full engagement plan from a classification, the client's
/// signal history, and the correlated event catalog.
pub fn generate_plan(
    client: &Client,
    classification: &IntentClassification,
    signals: &[Signal],
    events: &[NewsEvent],
) -> EngagementPlan {
    let mode = classification.mode;
    let confidence = classification.confidence;
    let tone = tone_for(client.persona, client.tier);

    // The linked event of the most recent signal anchors the narrative.
    // A dangling event_id degrades to the generic wording.
    let recent_signal = signals
        .iter()
        .reduce(|best, s| if s.timestamp > best.timestamp { s } else { best });
    let relevant_event = recent_signal
        .and_then(|s| s.related_event_id.as_deref())
        .and_then(|id| events.iter().find(|e| e.event_id == id));

    // Alert modes outrun email; upgrade the plan's channel without touching
    // the stored preference.
    let mut preferred_channel = client.preferred_channel;
    if mode.is_alert() && client.preferred_channel == PreferredChannel::Email {
        preferred_channel = PreferredChannel::BloombergChat;
    }

    let why_now = why_now_for(mode, client, relevant_event);
    let (what_to_send, content_asset) = content_for(mode, client, relevant_event);
    let next_step = next_step_for(mode, confidence);
    let cadence = cadence_for(mode, client.persona);

    EngagementPlan {
        why_now,
        preferred_channel,
        tone,
        what_to_send,
        content_asset,
        next_step,
        cadence,
    }
}

fn why_now_for(mode: ClientMode, client: &Client, event: Option<&NewsEvent>) -> String {
    match (mode, event) {
        (ClientMode::CriticalAlert, Some(e)) => format!(
            "CRITICAL: Major market disruption from \"{}\" ({}). Client exhibiting extreme stress signals requiring immediate senior analyst intervention.",
            e.title, e.company
        ),
        (ClientMode::CriticalAlert, None) =>
            "CRITICAL: Client showing critical stress indicators - multiple distress signals detected. Immediate outreach required.".to_string(),
        (ClientMode::EarlyAlert, Some(e)) => format!(
            "Elevated stress signals following \"{}\" ({}). Behavioral patterns indicate need for immediate analyst support.",
            e.title, e.company
        ),
        (ClientMode::EarlyAlert, None) =>
            "Client exhibiting early alert indicators - repeat content checking and elevated engagement patterns suggest urgent need for market perspective.".to_string(),
        (ClientMode::Learning, Some(e)) => format!(
            "Active research on \"{}\" ({}). Sector: {}. Ideal moment for educational engagement.",
            e.title, e.company, client.sector_interest
        ),
        (ClientMode::Learning, None) =>
            "Client in research mode - consistent engagement with sector digests indicates readiness for deep-dive content.".to_string(),
        (ClientMode::Alpha, Some(e)) => format!(
            "Alpha-seeking behavior following \"{}\" ({}). {} sector spike suggests opportunity appetite.",
            e.title, e.company, client.sector_interest
        ),
        (ClientMode::Alpha, None) =>
            "Client actively seeking investment ideas - sector engagement patterns indicate openness to actionable research.".to_string(),
    }
}

fn content_for(mode: ClientMode, client: &Client, event: Option<&NewsEvent>) -> (String, String) {
    match (mode, event) {
        (ClientMode::CriticalAlert, Some(e)) => (
            format!(
                "URGENT: Direct call to discuss {} situation. Provide immediate risk assessment, hedging options, and portfolio protection strategies.",
                e.company
            ),
            format!("Emergency Brief: {}", e.title),
        ),
        (ClientMode::CriticalAlert, None) => (
            "URGENT: Immediate call required. Assess portfolio exposure and provide real-time guidance. Escalate to senior coverage if needed.".to_string(),
            "Critical Market Alert".to_string(),
        ),
        (ClientMode::EarlyAlert, Some(e)) => (
            format!(
                "Calm context on {}: Explain market impact, provide risk scenarios, and offer positioning guidance. Ask: \"How are you positioned on this?\"",
                e.company
            ),
            format!("Quick Take: {}", e.title),
        ),
        (ClientMode::EarlyAlert, None) => (
            "Provide immediate market context and offer rapid call to address concerns. Keep messaging concise and action-oriented.".to_string(),
            "Flash Note: Market Update".to_string(),
        ),
        (ClientMode::Learning, Some(e)) => (
            format!(
                "Single-company focus: {} analysis with sector context. Link to daily digest. Educational angle: \"Here's what this means for {}...\"",
                e.company, client.sector_interest
            ),
            format!("Daily Digest: {} Overview", e.sector),
        ),
        (ClientMode::Learning, None) => (
            "Curated sector overview with 2-3 key takeaways. Position as educational value-add, not hard sell.".to_string(),
            format!("Sector Digest: {}", client.sector_interest),
        ),
        (ClientMode::Alpha, Some(e)) => (
            format!(
                "Pitch angle: {} opportunity thesis + next catalyst. Include 2-3 related ideas in {}. Meeting agenda with actionable trade themes.",
                e.company, client.sector_interest
            ),
            format!("First Take: {} Investment Case", e.company),
        ),
        (ClientMode::Alpha, None) => (
            "Best ideas pack with sector highlights. Propose strategic meeting to discuss portfolio positioning.".to_string(),
            format!("Sector Ideas Pack: {}", client.sector_interest),
        ),
    }
}

fn next_step_for(mode: ClientMode, confidence: f64) -> String {
    if confidence < 0.65 {
        return "Low certainty: soft-touch recommended. Monitor for additional signals before escalating outreach.".to_string();
    }
    if confidence >= 0.80 {
        let step = match mode {
            ClientMode::CriticalAlert =>
                "CRITICAL: Immediate senior analyst call. Portfolio review within 2 hours. Escalate to desk head if needed.",
            ClientMode::EarlyAlert =>
                "High certainty: Immediate proactive outreach. Book call within 24h and follow up with portfolio review.",
            ClientMode::Alpha =>
                "High certainty: Proactive idea presentation. Schedule sector meeting and prepare pitch materials.",
            ClientMode::Learning =>
                "High certainty: Schedule educational session. Convert interest to formal research subscription discussion.",
        };
        return step.to_string();
    }
    "Medium certainty: balanced outreach recommended. Proceed with engagement and gauge response."
        .to_string()
}

/// Cadence priority: crisis handling first, then persona protocols, then a
/// generic fallback that still distinguishes alert modes on day zero.
fn cadence_for(mode: ClientMode, persona: Persona) -> Cadence {
    if mode == ClientMode::CriticalAlert {
        return Cadence {
            day0: "Immediate: Direct call + Bloomberg alert + Senior analyst loop-in".to_string(),
            day1: "Follow-up call: Portfolio review and risk assessment update".to_string(),
            day3: "Email: Comprehensive situation analysis and positioning recommendations"
                .to_string(),
        };
    }

    match persona {
        Persona::HedgeFund => Cadence {
            day0: "Bloomberg Chat: Quick insight + ask about positioning".to_string(),
            day1: "Follow-up call: Deeper market view + idea discussion".to_string(),
            day3: "Email: Idea pack with sector themes".to_string(),
        },
        Persona::PensionFund => Cadence {
            day0: "Email: Thoughtful market perspective with risk context".to_string(),
            day1: "Email follow-up: Additional research materials".to_string(),
            day3: "Propose webinar or group call on sector outlook".to_string(),
        },
        Persona::FamilyOffice => Cadence {
            day0: "Email: Personalized note with relevant insights".to_string(),
            day1: "Follow-up email: Offer private call with analyst".to_string(),
            day3: "Meeting invitation: Quarterly portfolio review".to_string(),
        },
        _ => Cadence {
            day0: if mode.is_alert() {
                "Email + Call: Immediate outreach".to_string()
            } else {
                "Email: Key insights summary".to_string()
            },
            day1: "Call: Follow-up discussion on implications".to_string(),
            day3: "Email: Sector update with forward-looking view".to_string(),
        },
    }
}
