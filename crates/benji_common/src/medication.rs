//! Medication records and schedule shapes.
//!
//! Two schedule representations exist on purpose: the deterministic
//! rule-based `MedicationSchedule` (four named buckets, guaranteed to place
//! every medication) and the LLM-produced `DetailedSchedule` (clock-time
//! slots, validated after generation and replaced by the deterministic one
//! when validation fails).

use serde::{Deserialize, Serialize};

/// One medication as entered by the user. `frequency` is free text
/// ("twice daily, with food") and is only ever keyword-scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub strength: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(rename = "foodInstruction", default, skip_serializing_if = "Option::is_none")]
    pub food_instruction: Option<FoodInstruction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodInstruction {
    WithFood,
    EmptyStomach,
    NoPreference,
}

/// Named time-of-day bucket used by the deterministic scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// The four slot buckets, each an ordered list of medication display strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotBuckets {
    pub morning: Vec<String>,
    pub afternoon: Vec<String>,
    pub evening: Vec<String>,
    pub night: Vec<String>,
}

impl TimeSlotBuckets {
    pub fn push(&mut self, slot: Slot, entry: String) {
        match slot {
            Slot::Morning => self.morning.push(entry),
            Slot::Afternoon => self.afternoon.push(entry),
            Slot::Evening => self.evening.push(entry),
            Slot::Night => self.night.push(entry),
        }
    }

    /// Every display string across all buckets, in bucket order.
    pub fn all_entries(&self) -> impl Iterator<Item = &String> {
        self.morning
            .iter()
            .chain(self.afternoon.iter())
            .chain(self.evening.iter())
            .chain(self.night.iter())
    }

    pub fn total(&self) -> usize {
        self.morning.len() + self.afternoon.len() + self.evening.len() + self.night.len()
    }
}

/// Rule-based schedule. Constructed so that every input medication lands in
/// at least one bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSchedule {
    pub time_slots: TimeSlotBuckets,
    pub food_instructions: Vec<String>,
    pub warnings: Vec<String>,
    pub spacing_notes: Vec<String>,
}

/// One clock-time slot in the LLM-generated schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    /// "HH:mm", used as the sort key.
    pub time: String,
    pub label: String,
    pub medications: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_note: Option<String>,
}

/// Validated LLM schedule. Slots are sorted by time ascending before this
/// struct is handed to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedSchedule {
    pub time_slots: Vec<ScheduleSlot>,
    #[serde(default)]
    pub spacing_notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalization_notes: Option<String>,
}

impl DetailedSchedule {
    /// Total medication references across all slots.
    pub fn assigned_count(&self) -> usize {
        self.time_slots.iter().map(|s| s.medications.len()).sum()
    }
}
