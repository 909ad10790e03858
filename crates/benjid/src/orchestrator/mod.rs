//! Tool orchestrator: decides which tools run for a request, runs them
//! safely, and turns the results into one generation context.
//!
//! A `Session` is constructed per request and owns its own fact bundle, so
//! there is no shared mutable state between concurrent users. Tool failures
//! are contained as skip sentinels; gateway failures are the one error class
//! that propagates to the transport layer.

use crate::gateway::{ChatMessage, GatewayError, LlmGateway};
use crate::instructions;
use crate::tools::ToolRegistry;
use benji_common::{parse_json_response, FactBundle, GoalType};
use serde_json::Value;
use tracing::{debug, info};

/// Named tool results in execution order.
pub type ToolResults = Vec<(&'static str, Value)>;

/// One request's orchestration state: the fact bundle, the registry, and the
/// goal type once classified.
pub struct Session<'a> {
    gateway: &'a dyn LlmGateway,
    registry: ToolRegistry,
    bundle: FactBundle,
    fact_budget: usize,
    goal_type: Option<GoalType>,
}

impl<'a> Session<'a> {
    pub fn new(gateway: &'a dyn LlmGateway, bundle: FactBundle, fact_budget: usize) -> Self {
        Self {
            gateway,
            registry: ToolRegistry::standard(),
            bundle,
            fact_budget,
            goal_type: None,
        }
    }

    pub fn bundle(&self) -> &FactBundle {
        &self.bundle
    }

    pub fn goal_type(&self) -> Option<GoalType> {
        self.goal_type
    }

    /// Caller-supplied facts win over stored facts for any key present in
    /// both; null and empty-string values are ignored.
    pub fn merge_facts(&mut self, incoming: &Value) {
        self.bundle.merge(incoming);
    }

    /// Run the fixed mandatory set in registry order. The goal classifier is
    /// first in the registry; its result is captured and threaded into
    /// goal-type-aware tools later in the same pass.
    pub fn run_mandatory_tools(&mut self) -> ToolResults {
        let mut results = ToolResults::new();
        for entry in self.registry.entries() {
            if !entry.mandatory {
                continue;
            }
            let result = self.registry.run(entry, &self.bundle, self.goal_type);
            if entry.name == "goal_classifier" {
                self.goal_type = result
                    .get("goal_type")
                    .and_then(Value::as_str)
                    .and_then(GoalType::parse);
            }
            results.push((entry.name, result));
        }
        results
    }

    /// Ask the model which optional tools apply to this input. The response
    /// is fence-stripped and parsed as a JSON array; anything unparseable or
    /// non-array means no optional tools. Hallucinated names are filtered
    /// out. Gateway failures propagate.
    pub async fn select_optional_tools(
        &self,
        user_input: &str,
    ) -> Result<Vec<String>, GatewayError> {
        let available = self.registry.optional_names();
        let prompt = format!(
            "Given this user message, choose which of the following tools are \
             relevant. Available tools: {}.\n\
             User message: {}\n\
             Reply with a JSON array of tool names only, no markdown, no \
             explanations. Reply [] if none apply.",
            serde_json::to_string(&available).unwrap_or_default(),
            user_input
        );
        let response = self.gateway.complete(&[ChatMessage::user(prompt)]).await?;

        let selected: Vec<String> = match parse_json_response(&response) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .filter(|name| {
                    self.registry
                        .get(name)
                        .map(|e| !e.mandatory)
                        .unwrap_or(false)
                })
                .collect(),
            _ => {
                debug!("Optional tool selection unparseable, running none");
                Vec::new()
            }
        };
        info!("[Q] Optional tools selected: {:?}", selected);
        Ok(selected)
    }

    /// Same contained-failure semantics as the mandatory pass.
    pub fn run_optional_tools(&mut self, names: &[String]) -> ToolResults {
        let mut results = ToolResults::new();
        for entry in self.registry.entries() {
            if entry.mandatory || !names.iter().any(|n| n == entry.name) {
                continue;
            }
            let result = self.registry.run(entry, &self.bundle, self.goal_type);
            results.push((entry.name, result));
        }
        results
    }

    /// Deterministic context assembly: user input, background facts, then
    /// one line per tool result in registry insertion order.
    pub fn build_context(&self, user_input: &str, results: &ToolResults) -> String {
        let mut lines = vec![format!("User input: {}", user_input)];
        lines.push(format!(
            "Background facts: {}",
            self.bundle.excerpt(self.fact_budget)
        ));
        for entry in self.registry.entries() {
            if let Some((_, result)) = results.iter().find(|(name, _)| *name == entry.name) {
                lines.push(format!("{}: {}", entry.name, result));
            }
        }
        lines.join("\n")
    }

    /// Single [system, user] generation call. Raw text out, unprocessed.
    pub async fn generate(&self, context: &str) -> Result<String, GatewayError> {
        self.gateway
            .complete(&[
                ChatMessage::system(instructions::system_instructions()),
                ChatMessage::user(context.to_string()),
            ])
            .await
    }

    /// Full chat pipeline for one user message: mandatory tools, optional
    /// tool selection and execution, context assembly, generation.
    pub async fn respond(&mut self, user_input: &str) -> Result<String, GatewayError> {
        let mut results = self.run_mandatory_tools();
        let selected = self.select_optional_tools(user_input).await?;
        results.extend(self.run_optional_tools(&selected));
        let context = self.build_context(user_input, &results);
        self.generate(&context).await
    }
}
