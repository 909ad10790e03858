//! Upcoming-plan generator: concrete action items for today and tomorrow,
//! each traceable to an accepted SMART goal.

use super::{complete_json, Outcome, JSON_ONLY};
use crate::gateway::LlmGateway;
use benji_common::{FactBundle, SmartGoal};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpcomingPlan {
    #[serde(default)]
    pub today: Vec<String>,
    #[serde(default)]
    pub tomorrow: Vec<String>,
}

const SCHEMA_EXAMPLE: &str = r#"{
  "upcoming": {
    "today": ["...", "..."],
    "tomorrow": ["...", "..."]
  }
}"#;

fn build_prompt(facts: &FactBundle, goals: &[SmartGoal], budget: usize) -> String {
    let goals_json = serde_json::to_string(goals).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Plan concrete action items for today and tomorrow.\n\
         Active SMART goals: {}\n\
         Known facts about the user: {}\n\
         Use exactly this output shape:\n{}\n\
         Each day gets 2-4 items. Every item must directly advance one of \
         the SMART goals above; no generic filler like \"stay hydrated\".\n{}",
        goals_json,
        facts.excerpt(budget),
        SCHEMA_EXAMPLE,
        JSON_ONLY
    )
}

fn parse_plan(value: Value) -> Option<UpcomingPlan> {
    // The wrapper key is documented but tolerate a bare {today, tomorrow}.
    let inner = match value.get("upcoming") {
        Some(inner) => inner.clone(),
        None => value,
    };
    let plan: UpcomingPlan = serde_json::from_value(inner).ok()?;
    if plan.today.is_empty() && plan.tomorrow.is_empty() {
        return None;
    }
    Some(plan)
}

/// Generate the two-day plan. Fallback shape is empty lists for both days.
pub async fn generate(
    gateway: &dyn LlmGateway,
    facts: &FactBundle,
    goals: &[SmartGoal],
    fact_budget: usize,
) -> Outcome<UpcomingPlan> {
    let prompt = build_prompt(facts, goals, fact_budget);
    match complete_json(gateway, prompt).await.and_then(parse_plan) {
        Some(plan) => Outcome::Generated(plan),
        None => Outcome::Fallback(UpcomingPlan::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::FakeGateway;
    use serde_json::json;

    #[tokio::test]
    async fn well_formed_response_is_generated() {
        let fake = FakeGateway::always(
            json!({"upcoming": {"today": ["30 min run", "log dinner"], "tomorrow": ["strength session"]}})
                .to_string(),
        );
        let outcome = generate(&fake, &FactBundle::new(), &[], 2000).await;
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.into_inner().today.len(), 2);
    }

    #[tokio::test]
    async fn bare_shape_without_wrapper_is_accepted() {
        let fake = FakeGateway::always(
            json!({"today": ["30 min run"], "tomorrow": []}).to_string(),
        );
        let outcome = generate(&fake, &FactBundle::new(), &[], 2000).await;
        assert_eq!(outcome.into_inner().today, vec!["30 min run"]);
    }

    #[tokio::test]
    async fn malformed_response_yields_empty_days() {
        let fake = FakeGateway::always("no plan today");
        let outcome = generate(&fake, &FactBundle::new(), &[], 2000).await;
        assert!(outcome.is_fallback());
        let plan = outcome.into_inner();
        assert!(plan.today.is_empty() && plan.tomorrow.is_empty());
    }

    #[tokio::test]
    async fn prompt_carries_goals_and_facts() {
        let fake = FakeGateway::always("{}");
        let goals = vec![SmartGoal {
            specific: "Run a 10k".to_string(),
            measurable: "10 kilometers".to_string(),
            attainable: "yes".to_string(),
            relevant: "yes".to_string(),
            time_bound: "8 weeks".to_string(),
            duration_days: None,
            end_date: None,
            kind: None,
        }];
        let facts = FactBundle::from_value(json!({"fitness_level": "beginner"}));
        let _ = generate(&fake, &facts, &goals, 2000).await;

        let prompt = fake.user_text(0).unwrap();
        assert!(prompt.contains("Run a 10k"));
        assert!(prompt.contains("beginner"));
    }
}
