//! Shared data model for the Benji wellness backend.
//!
//! Everything the daemon's tools, generators and HTTP layer agree on lives
//! here: the fact bundle, medication and goal records, cycle types, and the
//! code-fence stripping utility used on every LLM response.

pub mod artifact;
pub mod checkin;
pub mod cycle;
pub mod facts;
pub mod fences;
pub mod goals;
pub mod medication;

pub use artifact::Versioned;
pub use checkin::CheckIn;
pub use cycle::{CyclePhase, CycleRecommendation, CycleSummary, FlowEntry};
pub use facts::FactBundle;
pub use fences::{parse_json_response, strip_code_fences};
pub use goals::{GoalKind, GoalType, SmartGoal};
pub use medication::{
    DetailedSchedule, FoodInstruction, Medication, MedicationSchedule, ScheduleSlot, Slot,
    TimeSlotBuckets,
};
