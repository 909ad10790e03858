//! Daily check-in record.

use serde::{Deserialize, Serialize};

/// One daily check-in. Scores are 1-5; absent scores are defaulted to 3 by
/// the day scorer, not here, so a stored document reflects what the user
/// actually submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
