//! Medication tools: rule-based time-slot assignment and the pairwise
//! contraindication check. The slot assigner is the reliable path the AI
//! schedule generator falls back to.

use benji_common::{FactBundle, FoodInstruction, Medication, MedicationSchedule, Slot};
use serde_json::{json, Value};

/// Slot keyword groups, scanned in this order against the lowercased
/// frequency text.
const SLOT_KEYWORDS: &[(Slot, &[&str])] = &[
    (Slot::Morning, &["morning", "am", "breakfast", "wake"]),
    (Slot::Afternoon, &["lunch", "noon", "afternoon"]),
    (Slot::Evening, &["evening", "dinner", "pm"]),
    (Slot::Night, &["night", "bedtime", "sleep"]),
];

/// Known interaction pairs, matched case-insensitively as substrings of the
/// medication names.
const INTERACTIONS: &[(&str, &[&str])] = &[
    ("levothyroxine", &["calcium", "iron", "antacid", "omeprazole"]),
    ("warfarin", &["aspirin", "ibuprofen", "naproxen", "vitamin k"]),
    ("metformin", &["alcohol"]),
    ("lisinopril", &["potassium", "spironolactone"]),
    ("simvastatin", &["amiodarone", "clarithromycin", "gemfibrozil"]),
    ("sertraline", &["tramadol", "sumatriptan"]),
    ("ciprofloxacin", &["antacid", "calcium", "iron", "dairy"]),
];

fn display_name(med: &Medication) -> String {
    if med.strength.trim().is_empty() {
        med.name.clone()
    } else {
        format!("{} {}", med.name, med.strength)
    }
}

fn ordinal(n: usize) -> &'static str {
    match n {
        1 => "1st",
        2 => "2nd",
        3 => "3rd",
        _ => "4th",
    }
}

fn keyword_slot(frequency: &str) -> Option<Slot> {
    for (slot, keywords) in SLOT_KEYWORDS {
        if keywords.iter().any(|k| frequency.contains(k)) {
            return Some(*slot);
        }
    }
    None
}

fn push_unique(list: &mut Vec<String>, entry: String) {
    if !list.contains(&entry) {
        list.push(entry);
    }
}

fn food_instruction_line(med: &Medication, frequency: &str) -> Option<String> {
    let wants_food = matches!(med.food_instruction, Some(FoodInstruction::WithFood))
        || frequency.contains("with food")
        || frequency.contains("with meal");
    if wants_food {
        return Some(format!("{}: Take with food", med.name));
    }
    let empty_stomach = matches!(med.food_instruction, Some(FoodInstruction::EmptyStomach))
        || frequency.contains("empty stomach")
        || frequency.contains("without food");
    if empty_stomach {
        return Some(format!("{}: Take on an empty stomach", med.name));
    }
    None
}

/// Build the deterministic schedule. Every medication lands in at least one
/// bucket: multiplier keywords spread doses across fixed slots, single-slot
/// keywords pin one bucket, and anything ambiguous alternates between
/// morning and evening via a counter scoped to this call.
pub fn assign_time_slots(medications: &[Medication]) -> MedicationSchedule {
    let mut schedule = MedicationSchedule::default();
    let mut round_robin = 0usize;

    for med in medications {
        let frequency = med.frequency.to_lowercase();
        let display = display_name(med);

        if frequency.contains("three times") || frequency.contains("3x") {
            for (i, slot) in [Slot::Morning, Slot::Afternoon, Slot::Evening].iter().enumerate() {
                schedule
                    .time_slots
                    .push(*slot, format!("{} ({} dose)", display, ordinal(i + 1)));
            }
        } else if frequency.contains("twice") || frequency.contains("2x") {
            schedule
                .time_slots
                .push(Slot::Morning, format!("{} (1st dose)", display));
            schedule
                .time_slots
                .push(Slot::Evening, format!("{} (2nd dose)", display));
        } else if let Some(slot) = keyword_slot(&frequency) {
            schedule.time_slots.push(slot, display);
        } else {
            let slot = if round_robin % 2 == 0 { Slot::Morning } else { Slot::Evening };
            round_robin += 1;
            schedule.time_slots.push(slot, display);
        }

        if let Some(line) = food_instruction_line(med, &frequency) {
            push_unique(&mut schedule.food_instructions, line);
        }
    }

    let report = check_interactions(medications);
    schedule.warnings = report.warnings;
    schedule.spacing_notes = report.spacing_tips;
    if let Some(note) = report.note {
        schedule.spacing_notes.push(note);
    }
    schedule
}

/// Result of the pairwise interaction scan. An empty warnings list always
/// means "no concerns found"; `note` carries the too-few-medications message
/// so that case is distinguishable.
pub struct InteractionReport {
    pub warnings: Vec<String>,
    pub spacing_tips: Vec<String>,
    pub note: Option<String>,
}

/// Pairwise scan of medication names against the interaction table, matching
/// in both directions of each pair.
pub fn check_interactions(medications: &[Medication]) -> InteractionReport {
    if medications.len() < 2 {
        return InteractionReport {
            warnings: Vec::new(),
            spacing_tips: Vec::new(),
            note: Some(
                "Add at least two medications to check for interactions.".to_string(),
            ),
        };
    }

    let mut warnings = Vec::new();
    for (i, a) in medications.iter().enumerate() {
        for b in &medications[i + 1..] {
            if names_interact(&a.name, &b.name) || names_interact(&b.name, &a.name) {
                push_unique(
                    &mut warnings,
                    format!(
                        "Caution: {} may interact with {}. Ask your pharmacist about spacing these doses.",
                        a.name, b.name
                    ),
                );
            }
        }
    }

    let spacing_tips = if warnings.is_empty() {
        vec![
            "No known interactions found. As a general rule, space medications by at least 2 hours unless directed otherwise.".to_string(),
        ]
    } else {
        Vec::new()
    };

    InteractionReport { warnings, spacing_tips, note: None }
}

fn names_interact(drug: &str, other: &str) -> bool {
    let drug = drug.to_lowercase();
    let other = other.to_lowercase();
    INTERACTIONS.iter().any(|(name, substances)| {
        drug.contains(name) && substances.iter().any(|s| other.contains(s))
    })
}

pub fn medication_slots_tool(bundle: &FactBundle) -> Value {
    let medications = bundle.medications();
    serde_json::to_value(assign_time_slots(&medications)).unwrap_or_else(|_| json!({}))
}

pub fn contraindication_tool(bundle: &FactBundle) -> Value {
    let medications = bundle.medications();
    let report = check_interactions(&medications);
    json!({
        "warnings": report.warnings,
        "spacing_tips": report.spacing_tips,
        "note": report.note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn med(name: &str, frequency: &str) -> Medication {
        Medication {
            id: String::new(),
            name: name.to_string(),
            strength: String::new(),
            frequency: frequency.to_string(),
            food_instruction: None,
            notes: None,
        }
    }

    #[test]
    fn no_medication_is_dropped() {
        let meds = vec![
            med("Levothyroxine", "once daily"),
            med("Metformin", "twice daily, with food"),
            med("Vitamin D", ""),
            med("Melatonin", "at bedtime"),
        ];
        let schedule = assign_time_slots(&meds);
        for m in &meds {
            assert!(
                schedule.time_slots.all_entries().any(|e| e.starts_with(&m.name)),
                "{} missing from schedule",
                m.name
            );
        }
    }

    #[test]
    fn twice_daily_splits_morning_and_evening() {
        let schedule = assign_time_slots(&[med("Metformin", "twice daily, with food")]);
        assert_eq!(schedule.time_slots.morning, vec!["Metformin (1st dose)"]);
        assert_eq!(schedule.time_slots.evening, vec!["Metformin (2nd dose)"]);
        assert_eq!(
            schedule.food_instructions,
            vec!["Metformin: Take with food"]
        );
    }

    #[test]
    fn three_times_daily_gets_ordinals() {
        let schedule = assign_time_slots(&[med("Amoxicillin", "three times daily")]);
        assert_eq!(schedule.time_slots.morning, vec!["Amoxicillin (1st dose)"]);
        assert_eq!(schedule.time_slots.afternoon, vec!["Amoxicillin (2nd dose)"]);
        assert_eq!(schedule.time_slots.evening, vec!["Amoxicillin (3rd dose)"]);
    }

    #[test]
    fn ambiguous_frequencies_alternate_slots() {
        let schedule = assign_time_slots(&[
            med("A", "once daily"),
            med("B", "once daily"),
            med("C", "once daily"),
        ]);
        assert_eq!(schedule.time_slots.morning, vec!["A", "C"]);
        assert_eq!(schedule.time_slots.evening, vec!["B"]);
    }

    #[test]
    fn bedtime_keyword_pins_night_slot() {
        let schedule = assign_time_slots(&[med("Melatonin", "at bedtime")]);
        assert_eq!(schedule.time_slots.night, vec!["Melatonin"]);
    }

    #[test]
    fn food_instructions_deduplicated() {
        let schedule = assign_time_slots(&[
            med("Metformin", "twice daily with food"),
            med("Metformin", "with food"),
        ]);
        assert_eq!(
            schedule.food_instructions,
            vec!["Metformin: Take with food"]
        );
    }

    #[test]
    fn fewer_than_two_meds_yields_note_not_warnings() {
        let report = check_interactions(&[med("Metformin", "")]);
        assert!(report.warnings.is_empty());
        assert!(report.spacing_tips.is_empty());
        assert!(report.note.unwrap().contains("at least two"));
    }

    #[test]
    fn no_match_yields_exactly_one_generic_tip() {
        let report = check_interactions(&[med("Metformin", ""), med("Sertraline", "")]);
        assert!(report.warnings.is_empty());
        assert_eq!(report.spacing_tips.len(), 1);
        assert!(report.note.is_none());
    }

    #[test]
    fn interaction_detected_both_directions() {
        let report = check_interactions(&[
            med("Calcium Carbonate", ""),
            med("Levothyroxine", ""),
        ]);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Calcium Carbonate"));
        assert!(report.warnings[0].contains("Levothyroxine"));
        assert!(report.spacing_tips.is_empty());
    }

    #[test]
    fn strength_included_in_display() {
        let mut m = med("Metformin", "morning");
        m.strength = "500mg".to_string();
        let schedule = assign_time_slots(&[m]);
        assert_eq!(schedule.time_slots.morning, vec!["Metformin 500mg"]);
    }
}
