//! SMART goal records and goal-type classification labels.
//!
//! Wire field names are capitalized (`Specific`, `Time_Bound`, ...) because
//! that is what the stored documents and the frontend already use.

use serde::{Deserialize, Serialize};

/// A single SMART goal as generated and persisted.
///
/// `measurable` is asked to contain a numeric target but this is a soft
/// contract with the generator, not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartGoal {
    #[serde(rename = "Specific")]
    pub specific: String,
    #[serde(rename = "Measurable")]
    pub measurable: String,
    #[serde(rename = "Attainable")]
    pub attainable: String,
    #[serde(rename = "Relevant")]
    pub relevant: String,
    #[serde(rename = "Time_Bound")]
    pub time_bound: String,
    /// Requested of the generator; when present, `end_date` is computed
    /// locally as now + duration_days, never taken from the LLM.
    #[serde(rename = "Duration_Days", default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    #[serde(rename = "EndDate", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<GoalKind>,
}

/// Coarse goal bucket used to tag stored goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    Fitness,
    Wellness,
}

/// Classified goal category, gating which plan template downstream tools pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    WeightLoss,
    WeightGain,
    BodyRecomposition,
    MuscleStrength,
    CardioEndurance,
    Mobility,
    InjuryRecovery,
    SportPerformance,
    GeneralFitness,
}

impl std::fmt::Display for GoalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::WeightLoss => "weight_loss",
            Self::WeightGain => "weight_gain",
            Self::BodyRecomposition => "body_recomposition",
            Self::MuscleStrength => "muscle_strength",
            Self::CardioEndurance => "cardio_endurance",
            Self::Mobility => "mobility",
            Self::InjuryRecovery => "injury_recovery",
            Self::SportPerformance => "sport_performance",
            Self::GeneralFitness => "general_fitness",
        };
        write!(f, "{}", s)
    }
}

impl GoalType {
    /// Parse the snake_case label back into a type. Unknown labels fall
    /// through to None; callers default to `GeneralFitness`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "weight_loss" => Some(Self::WeightLoss),
            "weight_gain" => Some(Self::WeightGain),
            "body_recomposition" => Some(Self::BodyRecomposition),
            "muscle_strength" => Some(Self::MuscleStrength),
            "cardio_endurance" => Some(Self::CardioEndurance),
            "mobility" => Some(Self::Mobility),
            "injury_recovery" => Some(Self::InjuryRecovery),
            "sport_performance" => Some(Self::SportPerformance),
            "general_fitness" => Some(Self::GeneralFitness),
            _ => None,
        }
    }
}
