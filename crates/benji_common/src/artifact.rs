//! Versioned envelope for persisted generator artifacts.
//!
//! The source documents carried no schema version; stored goals, plans and
//! schedules now get a tag so the format can evolve.

use serde::{Deserialize, Serialize};

/// Current artifact schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Wraps a persisted artifact with its schema version. The payload fields
/// are flattened so existing readers keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub schema_version: u32,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Versioned<T> {
    pub fn new(data: T) -> Self {
        Self { schema_version: SCHEMA_VERSION, data }
    }
}
