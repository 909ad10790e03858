//! Cycle-recommendation generator.
//!
//! Phase and cycle-day arithmetic is computed here, deterministically, from
//! the flow log; the model only writes the recommendation cards. Invalid
//! model output swaps in fixed per-phase recommendations.

use super::{complete_json, Outcome, JSON_ONLY};
use crate::gateway::LlmGateway;
use benji_common::{CyclePhase, CycleRecommendation, CycleSummary, FlowEntry};
use chrono::{Duration, NaiveDate};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

const CYCLE_LENGTH_DAYS: i64 = 28;
/// A gap of more than this many flow-free days separates two periods.
const PERIOD_GAP_DAYS: i64 = 5;
const DEFAULT_ICON: &str = "fa-heart";

/// Parsed flow log, keyed and ordered by date.
pub fn parse_flow_log(value: &Value) -> BTreeMap<NaiveDate, FlowEntry> {
    let mut log = BTreeMap::new();
    let Some(map) = value.as_object() else {
        return log;
    };
    for (key, entry) in map {
        let Ok(date) = NaiveDate::parse_from_str(key, "%Y-%m-%d") else {
            continue;
        };
        if let Ok(entry) = serde_json::from_value::<FlowEntry>(entry.clone()) {
            log.insert(date, entry);
        }
    }
    log
}

/// Start of the most recent period: the first flow day that follows a gap of
/// more than `PERIOD_GAP_DAYS` flow-free days (or the very first flow day).
pub fn most_recent_period_start(log: &BTreeMap<NaiveDate, FlowEntry>) -> Option<NaiveDate> {
    let flow_days: Vec<NaiveDate> = log
        .iter()
        .filter(|(_, e)| e.has_flow())
        .map(|(d, _)| *d)
        .collect();

    let mut start = *flow_days.first()?;
    for pair in flow_days.windows(2) {
        if (pair[1] - pair[0]).num_days() > PERIOD_GAP_DAYS {
            start = pair[1];
        }
    }
    Some(start)
}

/// Deterministic phase arithmetic from the most recent period start.
pub fn summarize(log: &BTreeMap<NaiveDate, FlowEntry>, today: NaiveDate) -> CycleSummary {
    let Some(start) = most_recent_period_start(log) else {
        return CycleSummary::default();
    };

    let elapsed = (today - start).num_days().max(0);
    let cycle_day = (elapsed % CYCLE_LENGTH_DAYS) as u32 + 1;
    let onset = start + Duration::days(CYCLE_LENGTH_DAYS);

    CycleSummary {
        current_phase: CyclePhase::from_cycle_day(cycle_day),
        cycle_day: Some(cycle_day),
        predicted_period_onset: Some(onset.format("%Y-%m-%d").to_string()),
        recommendations: Vec::new(),
        personalization_notes: None,
    }
}

fn default_recommendations(phase: CyclePhase) -> Vec<CycleRecommendation> {
    let cards: &[(&str, &str, &str)] = match phase {
        CyclePhase::Menstrual => &[
            ("fa-bed", "Prioritize rest", "Favor gentle movement like walking or stretching and let intensity drop this week."),
            ("fa-mug-hot", "Stay warm and hydrated", "Warm fluids and steady hydration can ease cramps."),
        ],
        CyclePhase::Follicular => &[
            ("fa-dumbbell", "Build intensity", "Energy tends to climb now; a good window for harder strength sessions."),
            ("fa-apple-whole", "Fuel the work", "Support heavier training with protein-rich meals."),
        ],
        CyclePhase::Ovulation => &[
            ("fa-bolt", "Peak output", "Strength and power often peak here; schedule key workouts accordingly."),
            ("fa-person-running", "Mind your joints", "Warm up thoroughly; take extra care with explosive movements."),
        ],
        CyclePhase::Luteal => &[
            ("fa-moon", "Taper gradually", "Shift toward moderate sessions and prioritize sleep as energy dips."),
            ("fa-bowl-food", "Steady fuel", "Regular balanced meals help with late-cycle cravings."),
        ],
    };
    cards
        .iter()
        .map(|(icon, title, text)| CycleRecommendation {
            icon: icon.to_string(),
            title: title.to_string(),
            text: text.to_string(),
        })
        .collect()
}

fn build_prompt(summary: &CycleSummary, log: &BTreeMap<NaiveDate, FlowEntry>) -> String {
    let symptoms: Vec<&str> = log
        .values()
        .flat_map(|e| e.symptoms.iter().map(String::as_str))
        .collect();
    format!(
        "Write 2-4 cycle-aware wellness recommendation cards.\n\
         Current phase: {}\n\
         Cycle day: {}\n\
         Recently logged symptoms: {:?}\n\
         Output shape: {{\"recommendations\": [{{\"icon\": \"fa-bed\", \
         \"title\": \"...\", \"text\": \"...\"}}], \
         \"personalization_notes\": \"...\"}}\n\
         `icon` is a Font Awesome class. Keep advice about training, rest \
         and nutrition; no medical diagnoses.\n{}",
        summary
            .current_phase
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        summary.cycle_day.unwrap_or(0),
        symptoms,
        JSON_ONLY
    )
}

/// Field-by-field validation: every card needs a non-empty title and text;
/// a missing icon gets the default.
fn parse_recommendations(value: &Value) -> Option<Vec<CycleRecommendation>> {
    let items = value.get("recommendations")?.as_array()?;
    if items.is_empty() {
        return None;
    }
    let mut cards = Vec::with_capacity(items.len());
    for item in items {
        let title = item.get("title")?.as_str()?.trim();
        let text = item.get("text")?.as_str()?.trim();
        if title.is_empty() || text.is_empty() {
            return None;
        }
        let icon = item
            .get("icon")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_ICON);
        cards.push(CycleRecommendation {
            icon: icon.to_string(),
            title: title.to_string(),
            text: text.to_string(),
        });
    }
    Some(cards)
}

/// Full cycle summary for one user. No flow data yields an empty summary
/// without calling the model; otherwise the arithmetic is local and only the
/// recommendation text is generated.
pub async fn generate(
    gateway: &dyn LlmGateway,
    flow_log: &Value,
    today: NaiveDate,
) -> Outcome<CycleSummary> {
    let log = parse_flow_log(flow_log);
    let mut summary = summarize(&log, today);
    let Some(phase) = summary.current_phase else {
        return Outcome::Generated(summary);
    };

    let parsed = complete_json(gateway, build_prompt(&summary, &log)).await;
    match parsed.as_ref().and_then(parse_recommendations) {
        Some(cards) => {
            summary.recommendations = cards;
            summary.personalization_notes = parsed
                .as_ref()
                .and_then(|v| v.get("personalization_notes"))
                .and_then(Value::as_str)
                .map(str::to_string);
            Outcome::Generated(summary)
        }
        None => {
            warn!("Cycle recommendations failed validation, using defaults");
            summary.recommendations = default_recommendations(phase);
            Outcome::Fallback(summary)
        }
    }
}
