use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Caller role supplied by the upstream identity provider.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Employee,
    Hr,
    Boss,
}

impl Role {
    /// HR and the boss may decide leave requests.
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Role::Hr | Role::Boss)
    }
}
