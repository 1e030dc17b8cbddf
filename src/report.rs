use std::fmt::Write;

use crate::models::{Client, ClientMode, IntentClassification, Signal, SignalTypeSummary};

/// One classified client, paired with the evidence volume behind it.
#[derive(Debug, Clone)]
pub struct ClientAssessment {
    pub client: Client,
    pub signal_count: usize,
    pub classification: IntentClassification,
}

/// Outreach priority: alerts first, then opportunity, then education.
pub fn mode_priority(mode: ClientMode) -> u8 {
    match mode {
        ClientMode::CriticalAlert => 0,
        ClientMode::EarlyAlert => 1,
        ClientMode::Alpha => 2,
        ClientMode::Learning => 3,
    }
}

/// Order assessments for coverage triage: mode priority, then the winning
/// mode's score descending, then client_id for a stable listing.
pub fn rank_assessments(assessments: &mut [ClientAssessment]) {
    assessments.sort_by(|a, b| {
        let pa = mode_priority(a.classification.mode);
        let pb = mode_priority(b.classification.mode);
        pa.cmp(&pb)
            .then_with(|| {
                let sa = a.classification.scores.score_for(a.classification.mode);
                let sb = b.classification.scores.score_for(b.classification.mode);
                sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.client.client_id.cmp(&b.client.client_id))
    });
}

pub fn summarize_by_type(signals: &[Signal]) -> Vec<SignalTypeSummary> {
    let mut map: std::collections::HashMap<String, (usize, f64)> =
        std::collections::HashMap::new();

    for signal in signals {
        let entry = map.entry(signal.signal_type.clone()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += signal.signal_value;
    }

    let mut summaries: Vec<SignalTypeSummary> = map
        .into_iter()
        .map(|(signal_type, (count, total_value))| SignalTypeSummary {
            signal_type,
            count,
            avg_value: if count == 0 {
                0.0
            } else {
                total_value / count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.signal_type.cmp(&b.signal_type)));
    summaries
}

pub fn build_report(assessments: &[ClientAssessment], signals: &[Signal]) -> String {
    let summaries = summarize_by_type(signals);
    let mut ranked = assessments.to_vec();
    rank_assessments(&mut ranked);

    let mut output = String::new();

    let _ = writeln!(output, "# Client Coverage Report");
    let _ = writeln!(
        output,
        "Classified {} clients from {} signals",
        assessments.len(),
        signals.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Mode Distribution");

    if ranked.is_empty() {
        let _ = writeln!(output, "No clients classified.");
    } else {
        for mode in [
            ClientMode::CriticalAlert,
            ClientMode::EarlyAlert,
            ClientMode::Alpha,
            ClientMode::Learning,
        ] {
            let count = ranked
                .iter()
                .filter(|a| a.classification.mode == mode)
                .count();
            let _ = writeln!(output, "- {}: {} clients", mode, count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Priority Clients");

    if ranked.is_empty() {
        let _ = writeln!(output, "No clients with signal history.");
    } else {
        for assessment in ranked.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}) mode {} at {:.0}% confidence, score {:.1} across {} signals",
                assessment.client.client_name,
                assessment.client.client_id,
                assessment.classification.mode,
                assessment.classification.confidence * 100.0,
                assessment
                    .classification
                    .scores
                    .score_for(assessment.classification.mode),
                assessment.signal_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Signal Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No signals recorded.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} signals (avg value {:.1})",
                summary.signal_type, summary.count, summary.avg_value
            );
        }
    }

    let mut recent_signals = signals.to_vec();
    recent_signals.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Signals");

    if recent_signals.is_empty() {
        let _ = writeln!(output, "No signals recorded.");
    } else {
        for signal in recent_signals.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}) value {} at {}",
                signal.client_id,
                signal.signal_type,
                signal.signal_value,
                signal.timestamp.format("%Y-%m-%d %H:%M")
            );
        }
    }

    output
}
