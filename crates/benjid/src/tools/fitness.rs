//! Fitness tools: goal classification, body stats, plan templates, progress.

use benji_common::{FactBundle, GoalType};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

/// Ordered keyword table for goal classification. Checked top to bottom,
/// first match wins, so "lose weight and gain strength" is weight_loss.
const GOAL_KEYWORDS: &[(&str, GoalType)] = &[
    ("lose", GoalType::WeightLoss),
    ("cut", GoalType::WeightLoss),
    ("gain", GoalType::WeightGain),
    ("bulk", GoalType::WeightGain),
    ("recomp", GoalType::BodyRecomposition),
    ("muscle", GoalType::MuscleStrength),
    ("strength", GoalType::MuscleStrength),
    ("cardio", GoalType::CardioEndurance),
    ("run", GoalType::CardioEndurance),
    ("mobility", GoalType::Mobility),
    ("injury", GoalType::InjuryRecovery),
    ("rehab", GoalType::InjuryRecovery),
    ("sport", GoalType::SportPerformance),
];

/// Classify the free-text `goal` fact into a goal type with a confidence
/// score. Case-insensitive substring match against the ordered table; no
/// match falls back to general_fitness at low confidence.
pub fn classify_goal_type(bundle: &FactBundle) -> (GoalType, f64) {
    let goal = bundle.text("goal").unwrap_or_default().to_lowercase();
    for (keyword, goal_type) in GOAL_KEYWORDS {
        if goal.contains(keyword) {
            return (*goal_type, 0.9);
        }
    }
    (GoalType::GeneralFitness, 0.5)
}

pub fn goal_classifier_tool(bundle: &FactBundle) -> Value {
    let (goal_type, confidence) = classify_goal_type(bundle);
    json!({
        "goal_type": goal_type.to_string(),
        "confidence": confidence,
    })
}

/// Summarize the physical stats on file. BMI estimate uses the imperial
/// formula and is omitted when weight or height is not numeric; no unit
/// validation beyond that.
pub fn body_stats_tool(bundle: &FactBundle) -> Value {
    let weight = bundle.number("weight");
    let height = bundle.number("height");

    let mut stats = json!({
        "age": bundle.number("age"),
        "weight": weight,
        "height": height,
        "fitness_level": bundle.text("fitness_level"),
    });
    if let (Some(w), Some(h)) = (weight, height) {
        if h > 0.0 {
            let bmi = w / (h * h) * 703.0;
            stats["bmi_estimate"] = json!((bmi * 10.0).round() / 10.0);
        }
    }
    stats
}

/// Short training recommendation per goal type. Fixed table, one line each.
fn plan_template(goal_type: GoalType) -> &'static str {
    match goal_type {
        GoalType::WeightLoss => {
            "Calorie deficit with 3-4 weekly sessions mixing strength work and zone-2 cardio."
        }
        GoalType::WeightGain => {
            "Calorie surplus with progressive overload lifting 4 days per week; cardio kept light."
        }
        GoalType::BodyRecomposition => {
            "Maintenance calories, high protein, 4 strength sessions per week with slow progression."
        }
        GoalType::MuscleStrength => {
            "Compound-lift focus (squat, hinge, press, pull) 3-5 days per week with planned deloads."
        }
        GoalType::CardioEndurance => {
            "Weekly volume build of mostly easy-pace sessions plus one interval day; strength twice weekly."
        }
        GoalType::Mobility => {
            "Daily 15-minute mobility routine targeting hips, shoulders and thoracic spine."
        }
        GoalType::InjuryRecovery => {
            "Pain-free range-of-motion work first, then gradual loading; stop on sharp pain."
        }
        GoalType::SportPerformance => {
            "Sport-specific drills twice weekly plus strength and conditioning blocks around them."
        }
        GoalType::GeneralFitness => {
            "Mix of strength, cardio and mobility across 3 balanced sessions per week."
        }
    }
}

pub fn fitness_plan_tool(_bundle: &FactBundle, goal_type: GoalType) -> Value {
    json!({
        "goal_type": goal_type.to_string(),
        "recommendation": plan_template(goal_type),
    })
}

/// Progress against the active goal window. A missing start date yields the
/// zero-progress sentinel, not an error.
pub fn goal_progress_tool(bundle: &FactBundle) -> Value {
    let meta = bundle.get("goal_meta").cloned().unwrap_or(Value::Null);
    let start_date = meta
        .get("start_date")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
    let duration_days = meta
        .get("duration_days")
        .and_then(Value::as_i64)
        .filter(|d| *d > 0)
        .unwrap_or(30);

    let Some(start) = start_date else {
        return json!({
            "completion_pct": 0,
            "days_elapsed": 0,
            "days_remaining": duration_days,
        });
    };

    let today = Utc::now().date_naive();
    let elapsed = (today - start).num_days().max(0);
    let completion_pct = ((elapsed * 100) / duration_days).min(100);
    json!({
        "completion_pct": completion_pct,
        "days_elapsed": elapsed,
        "days_remaining": (duration_days - elapsed).max(0),
    })
}
