//! Intent classification engine.
//!
//! Pure and deterministic: a classification is a function of (client,
//! signal history, correlated events) and nothing else. Scoring folds the
//! signal list into a four-mode accumulator, applies persona/tier
//! multipliers, then resolves the winning mode through a fixed precedence
//! cascade and calibrates a confidence in [0.50, 0.92].

use std::cmp::Ordering;

use crate::models::{
    Client, ClientMode, IntentClassification, ModeScores, NewsEvent, Persona, Sentiment, Signal,
    Tier, TopSignal, Urgency,
};

/// Fixed enumeration of scorable signal types. Anything else coming out of
/// the ingestion layer is skipped without error.
enum SignalKind {
    BreakingNewsEvent,
    RepeatCheck,
    ChatSpike,
    StressLevel,
    ReadDailyDigest,
    ReadReport,
    ReadQuickTake,
    SectorSpike,
    MeetingRequest,
}

impl SignalKind {
    fn parse(raw: &str) -> Option<SignalKind> {
        match raw {
            "breaking_news_event" => Some(SignalKind::BreakingNewsEvent),
            "repeat_check" => Some(SignalKind::RepeatCheck),
            "chat_spike" => Some(SignalKind::ChatSpike),
            "stress_level" => Some(SignalKind::StressLevel),
            "read_daily_digest" => Some(SignalKind::ReadDailyDigest),
            "read_report" => Some(SignalKind::ReadReport),
            "read_quick_take" => Some(SignalKind::ReadQuickTake),
            "sector_spike" => Some(SignalKind::SectorSpike),
            "meeting_request" => Some(SignalKind::MeetingRequest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Contribution {
    signal: String,
    contribution: f64,
    reason: String,
    mode: ClientMode,
}

#[derive(Default)]
struct ScoreAccumulator {
    scores: ModeScores,
    contributions: Vec<Contribution>,
}

impl ScoreAccumulator {
    fn credit(&mut self, mode: ClientMode, amount: f64) {
        match mode {
            ClientMode::EarlyAlert => self.scores.early_alert += amount,
            ClientMode::CriticalAlert => self.scores.critical_alert += amount,
            ClientMode::Learning => self.scores.learning += amount,
            ClientMode::Alpha => self.scores.alpha += amount,
        }
    }

    fn explain(&mut self, signal: &str, mode: ClientMode, amount: f64, reason: String) {
        self.contributions.push(Contribution {
            signal: signal.to_string(),
            contribution: amount,
            reason,
            mode,
        });
    }

    fn record(&mut self, signal: &str, mode: ClientMode, amount: f64, reason: String) {
        self.credit(mode, amount);
        self.explain(signal, mode, amount, reason);
    }
}

/// Classify one client from its full signal history and the news events
/// correlated to those signals (deduplicated by event_id upstream).
pub fn classify(
    client: &Client,
    signals: &[Signal],
    events: &[NewsEvent],
) -> IntentClassification {
    let mut acc = ScoreAccumulator::default();

    for signal in signals {
        let related = signal
            .related_event_id
            .as_deref()
            .and_then(|id| events.iter().find(|e| e.event_id == id));
        evaluate_signal(signal, related, &mut acc);
    }

    amplify_urgent_events(events, &mut acc);
    apply_adjustments(client, &mut acc.scores);

    let mode = resolve_mode(&acc.scores);
    let confidence =
        estimate_confidence(client.tier, signals.len(), &acc.scores, &acc.contributions, mode);
    let top_signals = rank_top_signals(&acc.contributions, mode);

    IntentClassification {
        mode,
        confidence,
        scores: acc.scores,
        top_signals,
    }
}

fn evaluate_signal(signal: &Signal, related: Option<&NewsEvent>, acc: &mut ScoreAccumulator) {
    let Some(kind) = SignalKind::parse(&signal.signal_type) else {
        return;
    };
    let value = signal.signal_value;

    match kind {
        SignalKind::BreakingNewsEvent => {
            let contribution = value * 3.0;
            if value >= 7.0 {
                acc.record(
                    "breaking_news_event",
                    ClientMode::CriticalAlert,
                    contribution,
                    format!("Breaking news severity {value} triggered critical alert"),
                );
            } else {
                acc.record(
                    "breaking_news_event",
                    ClientMode::EarlyAlert,
                    contribution,
                    format!("Breaking news severity {value} triggered early alert"),
                );
            }
        }
        SignalKind::RepeatCheck => {
            let contribution = value * 2.0;
            if value >= 5.0 {
                acc.record(
                    "repeat_check",
                    ClientMode::CriticalAlert,
                    contribution,
                    format!("Client checked same content {value}x - indicates high anxiety"),
                );
            } else {
                acc.record(
                    "repeat_check",
                    ClientMode::EarlyAlert,
                    contribution,
                    format!("Client checked same content {value}x - indicates concern"),
                );
            }
        }
        SignalKind::ChatSpike => {
            acc.record(
                "chat_spike",
                ClientMode::EarlyAlert,
                value * 2.0,
                format!("{value}x increase in messaging activity"),
            );
        }
        SignalKind::StressLevel => {
            // Score always accumulates; the explanation is only visible above
            // 50%. Confidence's consistency term depends on this asymmetry,
            // so the two must not be unified.
            let contribution = value / 10.0;
            if value >= 80.0 {
                acc.credit(ClientMode::CriticalAlert, contribution * 2.0);
                if value > 50.0 {
                    acc.explain(
                        "stress_level",
                        ClientMode::CriticalAlert,
                        contribution * 2.0,
                        format!("Critical stress level at {value}% based on behavioral patterns"),
                    );
                }
            } else {
                acc.credit(ClientMode::EarlyAlert, contribution);
                if value > 50.0 {
                    acc.explain(
                        "stress_level",
                        ClientMode::EarlyAlert,
                        contribution,
                        format!("Stress level at {value}% based on behavioral patterns"),
                    );
                }
            }
        }
        SignalKind::ReadDailyDigest => {
            acc.record(
                "read_daily_digest",
                ClientMode::Learning,
                value / 2.0,
                format!("Spent {value} minutes reading sector digest"),
            );
        }
        SignalKind::ReadReport => {
            acc.record(
                "read_report",
                ClientMode::Learning,
                value / 2.0,
                format!("Engaged with research report for {value} minutes"),
            );
        }
        SignalKind::ReadQuickTake => match related {
            Some(event) if event.sentiment == Sentiment::Positive => {
                acc.record(
                    "read_quick_take",
                    ClientMode::Alpha,
                    2.0,
                    format!("Read positive quick take on {}", event.company),
                );
            }
            Some(event) => {
                acc.record(
                    "read_quick_take",
                    ClientMode::Learning,
                    1.0,
                    format!("Read quick take on {}", event.company),
                );
            }
            None => {
                acc.record(
                    "read_quick_take",
                    ClientMode::Learning,
                    1.0,
                    "Read quick take".to_string(),
                );
            }
        },
        SignalKind::SectorSpike => {
            let sector = signal.related_sector.as_deref().unwrap_or("sector");
            acc.record(
                "sector_spike",
                ClientMode::Alpha,
                value * 3.0,
                format!("{value}x increase in {sector} content consumption"),
            );
        }
        SignalKind::MeetingRequest => {
            acc.record(
                "meeting_request",
                ClientMode::Alpha,
                value * 2.0,
                "Client proactively requested engagement".to_string(),
            );
        }
    }
}

/// Flat +5 to critical alert per correlated event that is both high urgency
/// and negative. Each qualifying event fires once; the caller supplies the
/// event set already deduplicated by event_id.
fn amplify_urgent_events(events: &[NewsEvent], acc: &mut ScoreAccumulator) {
    for event in events {
        if event.urgency == Urgency::High && event.sentiment == Sentiment::Negative {
            acc.record(
                "high_urgency_negative",
                ClientMode::CriticalAlert,
                5.0,
                format!("{}: {} - requires immediate attention", event.company, event.title),
            );
        }
    }
}

fn apply_adjustments(client: &Client, scores: &mut ModeScores) {
    if client.persona == Persona::HedgeFund {
        scores.alpha *= 1.3;
    }
    // New clients have thin history; dampen alert escalation sensitivity.
    if client.tier == Tier::New {
        scores.early_alert *= 0.8;
        scores.critical_alert *= 0.8;
    }
}

/// Winning mode under the fixed tie-break precedence
/// critical_alert > early_alert > alpha > learning. This is an ordered
/// cascade, not an argmax: a generic max would pick the wrong mode on
/// exact ties.
pub fn resolve_mode(scores: &ModeScores) -> ClientMode {
    let max = scores
        .early_alert
        .max(scores.critical_alert)
        .max(scores.learning)
        .max(scores.alpha);

    if max == 0.0 {
        ClientMode::Learning
    } else if scores.critical_alert >= scores.early_alert
        && scores.critical_alert >= scores.learning
        && scores.critical_alert >= scores.alpha
    {
        ClientMode::CriticalAlert
    } else if scores.early_alert >= scores.learning && scores.early_alert >= scores.alpha {
        ClientMode::EarlyAlert
    } else if scores.alpha >= scores.learning {
        ClientMode::Alpha
    } else {
        ClientMode::Learning
    }
}

fn estimate_confidence(
    tier: Tier,
    signal_count: usize,
    scores: &ModeScores,
    contributions: &[Contribution],
    mode: ClientMode,
) -> f64 {
    // Diminishing returns on signal volume. Counts every supplied signal,
    // including types the evaluator skipped.
    let base = match signal_count {
        0 => 0.50,
        n @ 1..=2 => 0.55 + n as f64 * 0.05,
        n @ 3..=5 => 0.65 + (n as f64 - 2.0) * 0.05,
        n => 0.80 + ((n as f64 - 5.0) * 0.02).min(0.12),
    };

    let mut sorted = [
        scores.early_alert,
        scores.critical_alert,
        scores.learning,
        scores.alpha,
    ];
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    let separation = if sorted[0] > 0.0 {
        (sorted[0] - sorted[1]) / sorted[0]
    } else {
        0.0
    };

    let supporting = contributions.iter().filter(|c| c.mode == mode).count();
    let consistency = if contributions.is_empty() {
        0.0
    } else {
        supporting as f64 / contributions.len() as f64
    };

    let mut confidence = base + separation * 0.08 + consistency * 0.06;
    confidence = confidence.clamp(0.50, 0.92);
    if tier == Tier::New {
        confidence = (confidence - 0.05).max(0.50);
    }

    (confidence * 100.0).round() / 100.0
}

/// Up to three explanations for the winning mode, highest contribution
/// first, backfilled from the other modes when the winner has fewer than
/// three of its own.
fn rank_top_signals(contributions: &[Contribution], mode: ClientMode) -> Vec<TopSignal> {
    let by_contribution = |a: &usize, b: &usize| {
        contributions[*b]
            .contribution
            .partial_cmp(&contributions[*a].contribution)
            .unwrap_or(Ordering::Equal)
    };

    let mut selected: Vec<usize> = (0..contributions.len())
        .filter(|&i| contributions[i].mode == mode)
        .collect();
    selected.sort_by(by_contribution);
    selected.truncate(3);

    if selected.len() < 3 {
        let mut rest: Vec<usize> = (0..contributions.len())
            .filter(|i| !selected.contains(i))
            .collect();
        rest.sort_by(by_contribution);
        rest.truncate(3 - selected.len());
        selected.extend(rest);
    }

    selected
        .into_iter()
        .map(|i| TopSignal {
            signal: contributions[i].signal.clone(),
            contribution: contributions[i].contribution,
            reason: contributions[i].reason.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventSource, FunnelStage, PreferredChannel};
    use chrono::{Duration, TimeZone, Utc};

    fn sample_client(persona: Persona, tier: Tier) -> Client {
        Client {
            client_id: "client_001".to_string(),
            client_name: "Orion Capital Partners".to_string(),
            tier,
            persona,
            region: "DE".to_string(),
            sector_interest: "Energy".to_string(),
            rm_name: "Marcus Weber".to_string(),
            preferred_channel: PreferredChannel::BloombergChat,
            relationship_score: 85,
            current_mode: None,
            confidence: None,
            funnel_stage: FunnelStage::NewSignals,
            last_contact: None,
        }
    }

    fn sample_signal(signal_type: &str, value: f64, minutes_ago: i64) -> Signal {
        Signal {
            signal_id: format!("sig-{signal_type}-{minutes_ago}"),
            client_id: "client_001".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 9, 9, 0, 0).unwrap()
                - Duration::minutes(minutes_ago),
            signal_type: signal_type.to_string(),
            signal_value: value,
            related_event_id: None,
            related_sector: None,
            related_company: None,
        }
    }

    fn sample_event(event_id: &str, sentiment: Sentiment, urgency: Urgency) -> NewsEvent {
        NewsEvent {
            event_id: event_id.to_string(),
            source: EventSource::QuickTake,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 9, 8, 30, 0).unwrap(),
            sector: "Energy".to_string(),
            company: "TotalEnergies".to_string(),
            title: "TotalEnergies - LNG expansion in Mozambique".to_string(),
            summary: "Project update".to_string(),
            sentiment,
            urgency,
            event_type: "project_update".to_string(),
        }
    }

    #[test]
    fn zero_signals_defaults_to_learning() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let result = classify(&client, &[], &[]);

        assert_eq!(result.mode, ClientMode::Learning);
        assert_eq!(result.confidence, 0.50);
        assert_eq!(result.scores, ModeScores::default());
        assert!(result.top_signals.is_empty());
    }

    #[test]
    fn severe_breaking_news_routes_to_critical() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let signals = vec![sample_signal("breaking_news_event", 9.0, 0)];
        let result = classify(&client, &signals, &[]);

        assert_eq!(result.mode, ClientMode::CriticalAlert);
        assert_eq!(result.scores.critical_alert, 27.0);
        assert_eq!(result.scores.early_alert, 0.0);
    }

    #[test]
    fn mild_breaking_news_routes_to_early_alert() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let signals = vec![sample_signal("breaking_news_event", 4.0, 0)];
        let result = classify(&client, &signals, &[]);

        assert_eq!(result.mode, ClientMode::EarlyAlert);
        assert_eq!(result.scores.early_alert, 12.0);
    }

    #[test]
    fn repeat_check_threshold_splits_routing() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);

        let high = classify(&client, &[sample_signal("repeat_check", 5.0, 0)], &[]);
        assert_eq!(high.scores.critical_alert, 10.0);

        let low = classify(&client, &[sample_signal("repeat_check", 4.0, 0)], &[]);
        assert_eq!(low.scores.early_alert, 8.0);
    }

    #[test]
    fn critical_stress_worked_example() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let signals = vec![sample_signal("stress_level", 85.0, 0)];
        let result = classify(&client, &signals, &[]);

        assert_eq!(result.mode, ClientMode::CriticalAlert);
        assert_eq!(result.scores.critical_alert, 17.0);
        // base 0.60 (N=1) + separation 0.08 + consistency 0.06
        assert_eq!(result.confidence, 0.74);
    }

    #[test]
    fn low_stress_scores_without_explanation() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let signals = vec![sample_signal("stress_level", 40.0, 0)];
        let result = classify(&client, &signals, &[]);

        assert_eq!(result.scores.early_alert, 4.0);
        assert!(result.top_signals.is_empty());
        // No explanation means zero consistency bonus; separation still applies.
        assert_eq!(result.confidence, 0.68);
    }

    #[test]
    fn moderate_stress_is_explained() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let signals = vec![sample_signal("stress_level", 60.0, 0)];
        let result = classify(&client, &signals, &[]);

        assert_eq!(result.scores.early_alert, 6.0);
        assert_eq!(result.top_signals.len(), 1);
        assert_eq!(result.top_signals[0].signal, "stress_level");
    }

    #[test]
    fn quick_take_follows_linked_event_sentiment() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let events = vec![sample_event("event_005", Sentiment::Positive, Urgency::Low)];
        let mut signal = sample_signal("read_quick_take", 1.0, 0);
        signal.related_event_id = Some("event_005".to_string());

        let result = classify(&client, &[signal], &events);
        assert_eq!(result.scores.alpha, 2.0);
        assert_eq!(result.scores.learning, 0.0);
    }

    #[test]
    fn quick_take_without_event_defaults_to_learning() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let signal = sample_signal("read_quick_take", 1.0, 0);

        let result = classify(&client, &[signal], &[]);
        assert_eq!(result.scores.learning, 1.0);
        assert_eq!(result.top_signals[0].reason, "Read quick take");
    }

    #[test]
    fn unknown_signal_types_are_ignored_but_counted() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let signals = vec![sample_signal("portfolio_rebalance", 5.0, 0)];
        let result = classify(&client, &signals, &[]);

        assert_eq!(result.scores, ModeScores::default());
        assert_eq!(result.mode, ClientMode::Learning);
        // Volume base still sees the signal: 0.55 + 0.05, no bonuses.
        assert_eq!(result.confidence, 0.60);
    }

    #[test]
    fn urgent_negative_event_amplifies_critical() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let events = vec![sample_event("event_004", Sentiment::Negative, Urgency::High)];
        let result = classify(&client, &[], &events);

        assert_eq!(result.scores.critical_alert, 5.0);
        assert_eq!(result.mode, ClientMode::CriticalAlert);
        assert_eq!(result.top_signals[0].signal, "high_urgency_negative");
    }

    #[test]
    fn hedge_fund_persona_boosts_alpha() {
        let client = sample_client(Persona::HedgeFund, Tier::Existing);
        let signals = vec![sample_signal("meeting_request", 5.0, 0)];
        let result = classify(&client, &signals, &[]);

        assert_eq!(result.scores.alpha, 13.0);
    }

    #[test]
    fn new_tier_dampens_alert_scores() {
        let client = sample_client(Persona::AssetManager, Tier::New);
        let signals = vec![
            sample_signal("chat_spike", 5.0, 0),
            sample_signal("repeat_check", 5.0, 1),
        ];
        let result = classify(&client, &signals, &[]);

        assert_eq!(result.scores.early_alert, 8.0);
        assert_eq!(result.scores.critical_alert, 8.0);
    }

    #[test]
    fn exact_tie_resolves_by_precedence() {
        let scores = ModeScores {
            early_alert: 10.0,
            critical_alert: 10.0,
            learning: 10.0,
            alpha: 10.0,
        };
        assert_eq!(resolve_mode(&scores), ClientMode::CriticalAlert);

        let scores = ModeScores {
            early_alert: 10.0,
            critical_alert: 0.0,
            learning: 10.0,
            alpha: 10.0,
        };
        assert_eq!(resolve_mode(&scores), ClientMode::EarlyAlert);

        let scores = ModeScores {
            early_alert: 0.0,
            critical_alert: 0.0,
            learning: 10.0,
            alpha: 10.0,
        };
        assert_eq!(resolve_mode(&scores), ClientMode::Alpha);

        let scores = ModeScores {
            early_alert: 0.0,
            critical_alert: 0.0,
            learning: 10.0,
            alpha: 4.0,
        };
        assert_eq!(resolve_mode(&scores), ClientMode::Learning);
    }

    #[test]
    fn top_signals_backfill_from_other_modes() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let signals = vec![
            sample_signal("sector_spike", 10.0, 0),
            sample_signal("read_report", 6.0, 1),
            sample_signal("read_daily_digest", 4.0, 2),
        ];
        let result = classify(&client, &signals, &[]);

        assert_eq!(result.mode, ClientMode::Alpha);
        let names: Vec<&str> = result.top_signals.iter().map(|t| t.signal.as_str()).collect();
        assert_eq!(names, vec!["sector_spike", "read_report", "read_daily_digest"]);
    }

    #[test]
    fn confidence_stays_within_bounds() {
        let client = sample_client(Persona::AssetManager, Tier::Existing);
        let signals: Vec<Signal> = (0..20)
            .map(|i| sample_signal("breaking_news_event", 9.0, i))
            .collect();
        let result = classify(&client, &signals, &[]);

        assert!(result.confidence >= 0.50 && result.confidence <= 0.92);
        assert_eq!(result.confidence, 0.92);
    }

    #[test]
    fn new_tier_penalty_keeps_floor() {
        let client = sample_client(Persona::AssetManager, Tier::New);
        let result = classify(&client, &[], &[]);
        assert_eq!(result.confidence, 0.50);
    }

    #[test]
    fn classification_is_idempotent() {
        let client = sample_client(Persona::HedgeFund, Tier::Existing);
        let events = vec![sample_event("event_004", Sentiment::Negative, Urgency::High)];
        let mut signals = vec![
            sample_signal("stress_level", 85.0, 0),
            sample_signal("repeat_check", 6.0, 5),
            sample_signal("sector_spike", 4.0, 10),
        ];
        signals[1].related_event_id = Some("event_004".to_string());

        let first = classify(&client, &signals, &events);
        let second = classify(&client, &signals, &events);
        assert_eq!(first, second);
    }
}
