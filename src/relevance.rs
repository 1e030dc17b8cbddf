//! Static news-to-client relevance heuristic.
//!
//! Ranks which clients a news item should be pushed to. Unlike intent
//! classification this never consults signal history: it is an additive
//! score over the client profile and the event's attributes, capped at 100.

use crate::models::{Client, NewsEvent, Persona, Sentiment, Tier, Urgency};

pub fn relevance(client: &Client, event: &NewsEvent) -> i64 {
    let mut score = 0.0;

    if client.sector_interest.eq_ignore_ascii_case(&event.sector) {
        score += 40.0;
    }

    match client.persona {
        Persona::HedgeFund => score += 15.0,
        Persona::AssetManager => score += 10.0,
        _ => {}
    }

    match event.urgency {
        Urgency::High => score += 20.0,
        Urgency::Medium => score += 10.0,
        Urgency::Low => {}
    }

    match event.sentiment {
        Sentiment::Negative => match client.persona {
            Persona::PensionFund => score += 15.0,
            Persona::HedgeFund => score += 10.0,
            _ => {}
        },
        Sentiment::Positive => score += 10.0,
        Sentiment::Neutral => {}
    }

    score += client.relationship_score as f64 / 10.0;

    if client.tier == Tier::Existing {
        score += 5.0;
    }

    (score.round() as i64).min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventSource, FunnelStage, PreferredChannel};
    use chrono::{TimeZone, Utc};

    fn sample_client(persona: Persona, tier: Tier, relationship_score: i32) -> Client {
        Client {
            client_id: "client_003".to_string(),
            client_name: "Atlas Pension Fund".to_string(),
            tier,
            persona,
            region: "UK".to_string(),
            sector_interest: "Media".to_string(),
            rm_name: "James Fletcher".to_string(),
            preferred_channel: PreferredChannel::Email,
            relationship_score,
            current_mode: None,
            confidence: None,
            funnel_stage: FunnelStage::RecommendedAction,
            last_contact: None,
        }
    }

    fn sample_event(sector: &str, sentiment: Sentiment, urgency: Urgency) -> NewsEvent {
        NewsEvent {
            event_id: "event_004".to_string(),
            source: EventSource::DailyDigest,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 9, 6, 0, 0).unwrap(),
            sector: sector.to_string(),
            company: "Canal+".to_string(),
            title: "Canal+ / Multichoice - Distribution deal at risk".to_string(),
            summary: "Regulatory concerns".to_string(),
            sentiment,
            urgency,
            event_type: "regulatory_risk".to_string(),
        }
    }

    #[test]
    fn sector_match_is_case_insensitive() {
        let client = sample_client(Persona::CorporateTreasury, Tier::New, 0);
        let event = sample_event("MEDIA", Sentiment::Neutral, Urgency::Low);
        assert_eq!(relevance(&client, &event), 40);
    }

    #[test]
    fn risk_sensitive_pension_fund_weights_negative_news() {
        let client = sample_client(Persona::PensionFund, Tier::Existing, 72);
        let event = sample_event("Media", Sentiment::Negative, Urgency::High);
        // 40 sector + 20 urgency + 15 negative/pension + 7.2 relationship + 5 existing
        assert_eq!(relevance(&client, &event), 87);
    }

    #[test]
    fn monotonic_in_relationship_score() {
        let event = sample_event("Media", Sentiment::Negative, Urgency::Medium);
        let mut previous = i64::MIN;
        for rel in (0..=100).step_by(10) {
            let client = sample_client(Persona::AssetManager, Tier::Existing, rel);
            let score = relevance(&client, &event);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn stacked_bonuses_cap_at_one_hundred() {
        let client = sample_client(Persona::HedgeFund, Tier::Existing, 100);
        let event = sample_event("Media", Sentiment::Negative, Urgency::High);
        // 40 + 15 + 20 + 10 + 10 + 5 = 100 exactly; nothing can exceed it
        assert_eq!(relevance(&client, &event), 100);

        let positive = sample_event("Media", Sentiment::Positive, Urgency::High);
        assert!(relevance(&client, &positive) <= 100);
    }

    #[test]
    fn neutral_off_sector_event_scores_low() {
        let client = sample_client(Persona::FamilyOffice, Tier::New, 30);
        let event = sample_event("Energy", Sentiment::Neutral, Urgency::Low);
        assert_eq!(relevance(&client, &event), 3);
    }
}
