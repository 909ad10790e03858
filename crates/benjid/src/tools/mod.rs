//! Tool registry - named deterministic computations over the fact bundle.
//!
//! Each tool is registered with an explicit contract tag describing its call
//! shape, and the registry dispatches by tag. A tool whose required input is
//! missing from the bundle is a checked skip (`{"skipped": true}`), not a
//! caught error, and never blocks sibling tools or the generation step.
//!
//! The registry is a Vec on purpose: insertion order is the iteration order,
//! and the generation context depends on it being stable.

pub mod fitness;
pub mod medication;
pub mod wellness;

use benji_common::{FactBundle, GoalType};
use serde_json::{json, Value};

/// Call shape of a registered tool.
pub enum ToolContract {
    /// Takes the whole fact bundle.
    Facts(fn(&FactBundle) -> Value),
    /// Takes the bundle plus the classified goal type; skipped when no goal
    /// type has been computed yet.
    FactsWithGoalType(fn(&FactBundle, GoalType) -> Value),
    /// Takes the check-in history list; skipped when the bundle has none.
    History(fn(&[Value]) -> Value),
}

pub struct ToolEntry {
    pub name: &'static str,
    pub mandatory: bool,
    pub contract: ToolContract,
}

/// Order-preserving name → tool map.
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
}

/// Sentinel result for a tool that could not run with the inputs at hand.
pub fn skipped() -> Value {
    json!({"skipped": true})
}

impl ToolRegistry {
    /// The standard tool set. The goal classifier comes first: its result is
    /// threaded into goal-type-aware tools later in the batch.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                ToolEntry {
                    name: "goal_classifier",
                    mandatory: true,
                    contract: ToolContract::Facts(fitness::goal_classifier_tool),
                },
                ToolEntry {
                    name: "body_stats",
                    mandatory: true,
                    contract: ToolContract::Facts(fitness::body_stats_tool),
                },
                ToolEntry {
                    name: "fitness_plan",
                    mandatory: true,
                    contract: ToolContract::FactsWithGoalType(fitness::fitness_plan_tool),
                },
                ToolEntry {
                    name: "checkin_score",
                    mandatory: false,
                    contract: ToolContract::Facts(wellness::checkin_score_tool),
                },
                ToolEntry {
                    name: "trend_analysis",
                    mandatory: false,
                    contract: ToolContract::History(wellness::trend_tool),
                },
                ToolEntry {
                    name: "goal_progress",
                    mandatory: false,
                    contract: ToolContract::Facts(fitness::goal_progress_tool),
                },
                ToolEntry {
                    name: "injury_check",
                    mandatory: false,
                    contract: ToolContract::Facts(wellness::injury_check_tool),
                },
                ToolEntry {
                    name: "medication_slots",
                    mandatory: false,
                    contract: ToolContract::Facts(medication::medication_slots_tool),
                },
                ToolEntry {
                    name: "contraindication_check",
                    mandatory: false,
                    contract: ToolContract::Facts(medication::contraindication_tool),
                },
            ],
        }
    }

    pub fn entries(&self) -> &[ToolEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    pub fn optional_names(&self) -> Vec<&'static str> {
        self.entries.iter().filter(|e| !e.mandatory).map(|e| e.name).collect()
    }

    /// Run one tool against the bundle. Contract mismatches (missing goal
    /// type, missing history) yield the skip sentinel.
    pub fn run(&self, entry: &ToolEntry, bundle: &FactBundle, goal_type: Option<GoalType>) -> Value {
        match &entry.contract {
            ToolContract::Facts(f) => f(bundle),
            ToolContract::FactsWithGoalType(f) => match goal_type {
                Some(gt) => f(bundle, gt),
                None => skipped(),
            },
            ToolContract::History(f) => match bundle.array("checkin_history") {
                Some(history) => f(history),
                None => skipped(),
            },
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_registered_first() {
        let registry = ToolRegistry::standard();
        assert_eq!(registry.entries()[0].name, "goal_classifier");
        assert!(registry.entries()[0].mandatory);
    }

    #[test]
    fn registry_order_is_stable() {
        let registry = ToolRegistry::standard();
        let names = registry.names();
        assert_eq!(names, ToolRegistry::standard().names());
        assert!(names.contains(&"medication_slots"));
    }

    #[test]
    fn goal_type_tool_skips_without_goal_type() {
        let registry = ToolRegistry::standard();
        let entry = registry.get("fitness_plan").unwrap();
        let result = registry.run(entry, &FactBundle::new(), None);
        assert_eq!(result["skipped"], true);
    }

    #[test]
    fn history_tool_skips_without_history() {
        let registry = ToolRegistry::standard();
        let entry = registry.get("trend_analysis").unwrap();
        let result = registry.run(entry, &FactBundle::new(), None);
        assert_eq!(result["skipped"], true);
    }
}
