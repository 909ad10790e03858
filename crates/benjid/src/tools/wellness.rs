//! Wellness tools: daily check-in scoring, trend analysis, injury safety.

use benji_common::FactBundle;
use serde_json::{json, Value};

fn score_or_default(entry: &Value, key: &str) -> f64 {
    entry.get(key).and_then(Value::as_f64).unwrap_or(3.0)
}

/// Score the latest check-in. Each of the four 1-5 scores defaults to 3
/// when absent so a partial check-in still yields a day score.
pub fn checkin_score_tool(bundle: &FactBundle) -> Value {
    let entry = bundle.get("latest_checkin").cloned().unwrap_or(json!({}));
    let sleep = score_or_default(&entry, "sleep");
    let stress = score_or_default(&entry, "stress");
    let mood = score_or_default(&entry, "mood");
    let fitness = score_or_default(&entry, "fitness");

    let day_score = (sleep + stress + mood + fitness) / 4.0;
    json!({
        "day_score": (day_score * 100.0).round() / 100.0,
        "low_sleep": sleep <= 2.0,
        "high_stress": stress >= 4.0,
    })
}

/// Average sleep and stress across the check-in history and flag sustained
/// problems against fixed thresholds.
pub fn trend_tool(history: &[Value]) -> Value {
    if history.is_empty() {
        return json!({"entries": 0, "insights": []});
    }

    let n = history.len() as f64;
    let avg_sleep: f64 = history.iter().map(|e| score_or_default(e, "sleep")).sum::<f64>() / n;
    let avg_stress: f64 = history.iter().map(|e| score_or_default(e, "stress")).sum::<f64>() / n;

    let mut insights = Vec::new();
    if avg_sleep < 3.0 {
        insights.push("Sleep has been consistently low; consider an earlier wind-down routine.");
    }
    if avg_stress > 3.5 {
        insights.push("Stress has been running high; lighter training days may help recovery.");
    }

    json!({
        "entries": history.len(),
        "avg_sleep": (avg_sleep * 100.0).round() / 100.0,
        "avg_stress": (avg_stress * 100.0).round() / 100.0,
        "insights": insights,
    })
}

/// Flag high-risk training when reported pain crosses the threshold.
pub fn injury_check_tool(bundle: &FactBundle) -> Value {
    let pain = bundle.number("pain_level").unwrap_or(0.0);
    if pain >= 6.0 {
        json!({
            "risk": "high",
            "restrictions": [
                "Avoid loading the affected area until pain subsides",
                "No high-impact or explosive movements",
                "Consider consulting a physiotherapist before resuming training",
            ],
        })
    } else {
        json!({"risk": "low", "restrictions": []})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_scores_default_to_three() {
        let result = checkin_score_tool(&FactBundle::new());
        assert_eq!(result["day_score"], 3.0);
        assert_eq!(result["low_sleep"], false);
        assert_eq!(result["high_stress"], false);
    }

    #[test]
    fn flags_fire_at_thresholds() {
        let bundle = FactBundle::from_value(
            json!({"latest_checkin": {"sleep": 2, "stress": 4, "mood": 3, "fitness": 3}}),
        );
        let result = checkin_score_tool(&bundle);
        assert_eq!(result["low_sleep"], true);
        assert_eq!(result["high_stress"], true);
        assert_eq!(result["day_score"], 3.0);
    }

    #[test]
    fn trend_insights_cross_thresholds() {
        let history = vec![
            json!({"sleep": 2, "stress": 4}),
            json!({"sleep": 2, "stress": 4}),
        ];
        let result = trend_tool(&history);
        assert_eq!(result["avg_sleep"], 2.0);
        assert_eq!(result["insights"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn healthy_trend_has_no_insights() {
        let history = vec![json!({"sleep": 4, "stress": 2})];
        let result = trend_tool(&history);
        assert!(result["insights"].as_array().unwrap().is_empty());
    }

    #[test]
    fn empty_history_is_flat() {
        let result = trend_tool(&[]);
        assert_eq!(result["entries"], 0);
    }

    #[test]
    fn high_pain_restricts_training() {
        let bundle = FactBundle::from_value(json!({"pain_level": 6}));
        let result = injury_check_tool(&bundle);
        assert_eq!(result["risk"], "high");
        assert!(!result["restrictions"].as_array().unwrap().is_empty());
    }

    #[test]
    fn low_pain_is_low_risk() {
        let bundle = FactBundle::from_value(json!({"pain_level": 5}));
        let result = injury_check_tool(&bundle);
        assert_eq!(result["risk"], "low");
    }
}
