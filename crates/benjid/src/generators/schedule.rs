//! AI medication-schedule generator with a strict validation gate.
//!
//! This is the one generator with a real circuit-breaker: any structural
//! problem in the model output (empty slots, bad times, zero assignments)
//! swaps in the deterministic rule-based schedule rendered at fixed clock
//! times, so the caller always gets a usable schedule.

use super::{complete_json, Outcome, JSON_ONLY};
use crate::gateway::LlmGateway;
use crate::tools::medication::assign_time_slots;
use benji_common::{DetailedSchedule, Medication, ScheduleSlot};
use chrono::NaiveTime;
use tracing::warn;

const SCHEMA_EXAMPLE: &str = r#"{
  "time_slots": [
    {"time": "08:00", "label": "Morning", "medications": ["..."], "food_note": "..."}
  ],
  "spacing_notes": ["..."],
  "personalization_notes": "..."
}"#;

fn build_prompt(
    medications: &[Medication],
    warnings: &[String],
    food_instructions: &[String],
) -> String {
    let meds_json = serde_json::to_string(medications).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Build a daily medication schedule.\n\
         Medications: {}\n\
         Known interaction warnings: {:?}\n\
         Food instructions: {:?}\n\
         Use exactly this output shape:\n{}\n\
         Times are 24h \"HH:mm\". Every medication must appear in at least \
         one slot. Respect the warnings when spacing doses. Do not invent \
         dosing advice.\n{}",
        meds_json, warnings, food_instructions, SCHEMA_EXAMPLE, JSON_ONLY
    )
}

fn valid_time(time: &str) -> bool {
    NaiveTime::parse_from_str(time, "%H:%M").is_ok()
}

/// Structural validation: non-empty well-formed slots, every time parseable,
/// and at least one assignment when medications were supplied.
fn validate(schedule: &DetailedSchedule, medications: &[Medication]) -> bool {
    if schedule.time_slots.is_empty() {
        return false;
    }
    if schedule.time_slots.iter().any(|s| !valid_time(&s.time) || s.label.trim().is_empty()) {
        return false;
    }
    if !medications.is_empty() && schedule.assigned_count() == 0 {
        return false;
    }
    true
}

/// The rule-based schedule rendered into the detailed shape, used whenever
/// the model output fails validation.
pub fn deterministic_schedule(medications: &[Medication]) -> DetailedSchedule {
    let rules = assign_time_slots(medications);
    let buckets = [
        ("08:00", "Morning", &rules.time_slots.morning),
        ("13:00", "Afternoon", &rules.time_slots.afternoon),
        ("19:00", "Evening", &rules.time_slots.evening),
        ("22:00", "Night", &rules.time_slots.night),
    ];

    let time_slots = buckets
        .into_iter()
        .filter(|(_, _, meds)| !meds.is_empty())
        .map(|(time, label, meds)| ScheduleSlot {
            time: time.to_string(),
            label: label.to_string(),
            medications: meds.clone(),
            food_note: None,
        })
        .collect();

    let mut spacing_notes = rules.warnings;
    spacing_notes.extend(rules.spacing_notes);
    DetailedSchedule {
        time_slots,
        spacing_notes,
        personalization_notes: None,
    }
}

/// Generate the detailed schedule, falling back to the deterministic one on
/// any parse or validation failure. Slots are sorted by time before return.
pub async fn generate(
    gateway: &dyn LlmGateway,
    medications: &[Medication],
    warnings: &[String],
    food_instructions: &[String],
) -> Outcome<DetailedSchedule> {
    let prompt = build_prompt(medications, warnings, food_instructions);
    let parsed = complete_json(gateway, prompt)
        .await
        .and_then(|v| serde_json::from_value::<DetailedSchedule>(v).ok());

    match parsed {
        Some(mut schedule) if validate(&schedule, medications) => {
            schedule.time_slots.sort_by(|a, b| a.time.cmp(&b.time));
            Outcome::Generated(schedule)
        }
        _ => {
            warn!("AI schedule failed validation, using rule-based schedule");
            Outcome::Fallback(deterministic_schedule(medications))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FakeGateway;
    use serde_json::json;

    fn meds() -> Vec<Medication> {
        serde_json::from_value(json!([
            {"name": "Levothyroxine", "frequency": "once daily"},
            {"name": "Metformin", "frequency": "twice daily, with food"}
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn valid_response_is_sorted_by_time() {
        let fake = FakeGateway::always(
            json!({
                "time_slots": [
                    {"time": "19:00", "label": "Evening", "medications": ["Metformin (2nd dose)"]},
                    {"time": "08:00", "label": "Morning", "medications": ["Levothyroxine", "Metformin (1st dose)"]}
                ],
                "spacing_notes": []
            })
            .to_string(),
        );
        let outcome = generate(&fake, &meds(), &[], &[]).await;
        assert!(!outcome.is_fallback());
        let schedule = outcome.into_inner();
        assert_eq!(schedule.time_slots[0].time, "08:00");
        assert_eq!(schedule.time_slots[1].time, "19:00");
    }

    #[tokio::test]
    async fn zero_assignments_triggers_fallback() {
        let fake = FakeGateway::always(
            json!({
                "time_slots": [{"time": "08:00", "label": "Morning", "medications": []}],
                "spacing_notes": []
            })
            .to_string(),
        );
        let outcome = generate(&fake, &meds(), &[], &[]).await;
        assert!(outcome.is_fallback());
        // The fallback still covers every medication.
        assert!(outcome.into_inner().assigned_count() >= meds().len());
    }

    #[tokio::test]
    async fn malformed_time_triggers_fallback() {
        let fake = FakeGateway::always(
            json!({
                "time_slots": [{"time": "8am", "label": "Morning", "medications": ["Metformin"]}]
            })
            .to_string(),
        );
        assert!(generate(&fake, &meds(), &[], &[]).await.is_fallback());
    }

    #[tokio::test]
    async fn non_json_triggers_fallback() {
        let fake = FakeGateway::always("schedule unavailable");
        assert!(generate(&fake, &meds(), &[], &[]).await.is_fallback());
    }

    #[test]
    fn deterministic_schedule_skips_empty_buckets() {
        let schedule = deterministic_schedule(&meds());
        assert!(schedule.time_slots.iter().all(|s| !s.medications.is_empty()));
        assert!(schedule.time_slots.iter().any(|s| s.label == "Morning"));
        assert!(schedule.time_slots.iter().any(|s| s.label == "Evening"));
    }

    #[tokio::test]
    async fn empty_medication_list_accepts_informational_slots() {
        let fake = FakeGateway::always(
            json!({
                "time_slots": [{"time": "08:00", "label": "Morning", "medications": []}]
            })
            .to_string(),
        );
        let outcome = generate(&fake, &[], &[], &[]).await;
        assert!(!outcome.is_fallback());
    }
}
