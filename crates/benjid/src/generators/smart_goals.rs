//! SMART-goal generator. The model writes the goal phrasing; end dates are
//! computed locally from `Duration_Days`, never taken from the model.

use super::{complete_json, Outcome, JSON_ONLY};
use crate::gateway::LlmGateway;
use benji_common::{FactBundle, SmartGoal};
use chrono::{Duration, Utc};
use serde_json::Value;

const SCHEMA_EXAMPLE: &str = r#"{
  "smart_goals": [
    {
      "Specific": "...",
      "Measurable": "... (include a numeric target)",
      "Attainable": "...",
      "Relevant": "...",
      "Time_Bound": "...",
      "Duration_Days": 30,
      "type": "fitness"
    }
  ]
}"#;

fn build_prompt(user_goal: &str, facts: &FactBundle, budget: usize) -> String {
    format!(
        "Turn this user goal into 1-3 SMART goals.\n\
         User goal: {}\n\
         Known facts about the user: {}\n\
         Use exactly this output shape:\n{}\n\
         `type` must be \"fitness\" or \"wellness\". Include `Duration_Days` \
         as a whole number of days. Do not include an EndDate.\n{}",
        user_goal,
        facts.excerpt(budget),
        SCHEMA_EXAMPLE,
        JSON_ONLY
    )
}

/// Deterministic date arithmetic: every goal carrying a duration gets
/// `EndDate = today + Duration_Days`, overwriting anything the model wrote.
fn finalize(mut goals: Vec<SmartGoal>) -> Vec<SmartGoal> {
    let today = Utc::now().date_naive();
    for goal in &mut goals {
        if let Some(days) = goal.duration_days {
            let end = today + Duration::days(days as i64);
            goal.end_date = Some(end.format("%Y-%m-%d").to_string());
        }
    }
    goals
}

fn parse_goals(value: Value) -> Option<Vec<SmartGoal>> {
    // Accept either the documented wrapper object or a bare array.
    let list = match value {
        Value::Array(_) => value,
        Value::Object(ref map) => map.get("smart_goals")?.clone(),
        _ => return None,
    };
    serde_json::from_value(list).ok()
}

/// Generate SMART goals for one user goal. Fallback shape is an empty list.
pub async fn generate(
    gateway: &dyn LlmGateway,
    user_goal: &str,
    facts: &FactBundle,
    fact_budget: usize,
) -> Outcome<Vec<SmartGoal>> {
    let prompt = build_prompt(user_goal, facts, fact_budget);
    match complete_json(gateway, prompt).await.and_then(parse_goals) {
        Some(goals) => Outcome::Generated(finalize(goals)),
        None => Outcome::Fallback(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FakeGateway;
    use serde_json::json;

    fn goal_json(duration: Option<u32>) -> Value {
        let mut goal = json!({
            "Specific": "Run three times per week",
            "Measurable": "3 runs of 30 minutes",
            "Attainable": "Starting from 2 runs per week",
            "Relevant": "Supports the 10k goal",
            "Time_Bound": "Within 6 weeks",
        });
        if let Some(d) = duration {
            goal["Duration_Days"] = json!(d);
        }
        json!({"smart_goals": [goal]})
    }

    #[tokio::test]
    async fn end_date_is_local_date_arithmetic() {
        let fake = FakeGateway::always(goal_json(Some(42)).to_string());
        let outcome = generate(&fake, "run a 10k", &FactBundle::new(), 2000).await;

        let goals = outcome.into_inner();
        let expected = (Utc::now().date_naive() + Duration::days(42))
            .format("%Y-%m-%d")
            .to_string();
        assert_eq!(goals[0].end_date.as_deref(), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn model_supplied_end_date_is_overwritten() {
        let mut body = goal_json(Some(10));
        body["smart_goals"][0]["EndDate"] = json!("1999-01-01");
        let fake = FakeGateway::always(body.to_string());

        let goals = generate(&fake, "run", &FactBundle::new(), 2000).await.into_inner();
        assert_ne!(goals[0].end_date.as_deref(), Some("1999-01-01"));
    }

    #[tokio::test]
    async fn no_duration_means_no_end_date() {
        let fake = FakeGateway::always(goal_json(None).to_string());
        let goals = generate(&fake, "run", &FactBundle::new(), 2000).await.into_inner();
        assert!(goals[0].end_date.is_none());
    }

    #[tokio::test]
    async fn fenced_response_parses_like_unfenced() {
        let body = goal_json(Some(30)).to_string();
        let fenced = FakeGateway::always(format!("```json\n{}\n```", body));
        let plain = FakeGateway::always(body);

        let a = generate(&fenced, "run", &FactBundle::new(), 2000).await.into_inner();
        let b = generate(&plain, "run", &FactBundle::new(), 2000).await.into_inner();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn malformed_response_falls_back_to_empty() {
        let fake = FakeGateway::always("I can't produce JSON right now, sorry!");
        let outcome = generate(&fake, "run", &FactBundle::new(), 2000).await;
        assert!(outcome.is_fallback());
        assert!(outcome.into_inner().is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_falls_back_to_empty() {
        let fake = FakeGateway::new();
        fake.push_error("quota exceeded");
        let outcome = generate(&fake, "run", &FactBundle::new(), 2000).await;
        assert!(outcome.is_fallback());
    }
}
