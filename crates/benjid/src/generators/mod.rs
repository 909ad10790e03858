//! Structured generators: LLM-backed flows producing one specific JSON
//! artifact each, with the generate-validate-repair pattern.
//!
//! Every generator is infallible to its caller. A gateway failure,
//! unparseable response, or validation failure degrades to the generator's
//! documented fallback shape, tagged as `Outcome::Fallback` so callers can
//! tell a generated artifact from a degraded one.

pub mod cycle;
pub mod schedule;
pub mod smart_goals;
pub mod upcoming;

use crate::gateway::{ChatMessage, LlmGateway};
use benji_common::parse_json_response;
use serde_json::Value;
use tracing::warn;

/// Generator result. Both variants carry a usable value; `Fallback` means
/// the value came from the deterministic/empty path, not the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Generated(T),
    Fallback(T),
}

impl<T> Outcome<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Generated(v) | Self::Fallback(v) => v,
        }
    }

    pub fn inner(&self) -> &T {
        match self {
            Self::Generated(v) | Self::Fallback(v) => v,
        }
    }
}

/// Formatting constraint appended to every generator prompt.
pub(crate) const JSON_ONLY: &str =
    "Respond with JSON only. No markdown, no code fences, no explanations.";

/// One generation call returning parsed JSON, or None on any failure
/// (gateway error, empty response, unparseable text). Callers fall back.
pub(crate) async fn complete_json(gateway: &dyn LlmGateway, prompt: String) -> Option<Value> {
    match gateway.complete(&[ChatMessage::user(prompt)]).await {
        Ok(text) => {
            let parsed = parse_json_response(&text);
            if parsed.is_none() {
                warn!("Generator response was not valid JSON, using fallback");
            }
            parsed
        }
        Err(e) => {
            warn!("Generator gateway call failed, using fallback: {}", e);
            None
        }
    }
}
