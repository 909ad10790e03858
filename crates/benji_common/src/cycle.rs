//! Menstrual-cycle types: flow log entries, phases, and the summary returned
//! by the cycle-recommendation flow.

use serde::{Deserialize, Serialize};

/// One flow-log entry, keyed by ISO date string in the stored `flow_log` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub symptoms: Vec<String>,
    #[serde(rename = "crampPain", default, skip_serializing_if = "Option::is_none")]
    pub cramp_pain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge: Option<String>,
}

impl FlowEntry {
    /// An entry counts as a flow day when any flow intensity was logged.
    pub fn has_flow(&self) -> bool {
        self.flow.as_deref().is_some_and(|f| !f.is_empty() && f != "none")
    }
}

/// Cycle phase, bucketed from the cycle day (1-5 / 6-13 / 14-16 / 17-28).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CyclePhase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl CyclePhase {
    pub fn from_cycle_day(day: u32) -> Option<Self> {
        match day {
            1..=5 => Some(Self::Menstrual),
            6..=13 => Some(Self::Follicular),
            14..=16 => Some(Self::Ovulation),
            17..=28 => Some(Self::Luteal),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Menstrual" => Some(Self::Menstrual),
            "Follicular" => Some(Self::Follicular),
            "Ovulation" => Some(Self::Ovulation),
            "Luteal" => Some(Self::Luteal),
            _ => None,
        }
    }
}

impl std::fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Menstrual => "Menstrual",
            Self::Follicular => "Follicular",
            Self::Ovulation => "Ovulation",
            Self::Luteal => "Luteal",
        };
        write!(f, "{}", s)
    }
}

/// One phase recommendation card. `icon` is a Font Awesome class name the
/// frontend renders directly; it gets a default when the generator omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecommendation {
    pub icon: String,
    pub title: String,
    pub text: String,
}

/// Full cycle summary for one user. All fields are nullable because the
/// summary is still returned (empty) when no flow data exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub current_phase: Option<CyclePhase>,
    pub cycle_day: Option<u32>,
    pub predicted_period_onset: Option<String>,
    pub recommendations: Vec<CycleRecommendation>,
    pub personalization_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_buckets() {
        assert_eq!(CyclePhase::from_cycle_day(1), Some(CyclePhase::Menstrual));
        assert_eq!(CyclePhase::from_cycle_day(5), Some(CyclePhase::Menstrual));
        assert_eq!(CyclePhase::from_cycle_day(6), Some(CyclePhase::Follicular));
        assert_eq!(CyclePhase::from_cycle_day(13), Some(CyclePhase::Follicular));
        assert_eq!(CyclePhase::from_cycle_day(14), Some(CyclePhase::Ovulation));
        assert_eq!(CyclePhase::from_cycle_day(16), Some(CyclePhase::Ovulation));
        assert_eq!(CyclePhase::from_cycle_day(17), Some(CyclePhase::Luteal));
        assert_eq!(CyclePhase::from_cycle_day(28), Some(CyclePhase::Luteal));
        assert_eq!(CyclePhase::from_cycle_day(29), None);
        assert_eq!(CyclePhase::from_cycle_day(0), None);
    }

    #[test]
    fn flow_entry_none_is_not_flow() {
        let none = FlowEntry { flow: Some("none".to_string()), ..Default::default() };
        assert!(!none.has_flow());
        let light = FlowEntry { flow: Some("light".to_string()), ..Default::default() };
        assert!(light.has_flow());
        assert!(!FlowEntry::default().has_flow());
    }

    #[test]
    fn phase_wire_names_are_capitalized() {
        let json = serde_json::to_value(CyclePhase::Follicular).unwrap();
        assert_eq!(json, "Follicular");
        assert_eq!(CyclePhase::parse("Luteal"), Some(CyclePhase::Luteal));
        assert_eq!(CyclePhase::parse("luteal"), None);
    }
}
