//! Rostering domain models.
//!
//! Plain data types for a rostering request and its solution. Created fresh
//! per request; nothing here holds process-wide state.
//!
//! # Domain Mappings
//!
//! | u-roster | Hospital | Retail | Warehouse |
//! |----------|----------|--------|-----------|
//! | Employee | Nurse | Clerk | Picker |
//! | Shift | Ward shift | Till shift | Dock slot |
//! | skill | Qualification | Role | Certification |
//! | Assignment | Rota entry | Schedule entry | Crew slot |

mod employee;
mod request;
mod roster;
mod shift;

use serde::{Deserialize, Deserializer};

pub use employee::Employee;
pub use request::ScheduleRequest;
pub use roster::{Assignment, Metrics, OptimizationResponse, SolveStatus, CONSTRAINTS_APPLIED};
pub use shift::Shift;

/// Accepts identifiers given either as JSON strings or integers.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}
