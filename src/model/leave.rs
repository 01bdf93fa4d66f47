use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::LeaveError;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

impl LeaveType {
    /// Sick and unpaid leave must carry a reason; annual leave does not.
    pub fn requires_reason(&self) -> bool {
        matches!(self, LeaveType::Sick | LeaveType::Unpaid)
    }
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

/// Whether a request charges whole days or a single half day.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveDuration {
    Full,
    Half,
}

impl Default for LeaveDuration {
    fn default() -> Self {
        LeaveDuration::Full
    }
}

/// The decision a reviewer takes on a pending request.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn status(self) -> LeaveStatus {
        match self {
            Decision::Approved => LeaveStatus::Approved,
            Decision::Rejected => LeaveStatus::Rejected,
        }
    }
}

/// Leave quantity with half-day precision, stored as a count of half-day
/// units so ledger arithmetic stays exact. Serialized as a day number
/// (`1.5` is one and a half days).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LeaveDays(u32);

impl LeaveDays {
    pub const ZERO: LeaveDays = LeaveDays(0);
    pub const HALF: LeaveDays = LeaveDays(1);

    pub fn from_half_days(units: u32) -> Self {
        LeaveDays(units)
    }

    pub fn from_whole_days(days: u32) -> Self {
        LeaveDays(days * 2)
    }

    /// Derived day count for a request: a half-day request charges 0.5
    /// regardless of the range; a full request charges every calendar day
    /// in `[start, end]` inclusive, weekends and holidays included.
    pub fn for_range(
        start: NaiveDate,
        end: NaiveDate,
        duration: LeaveDuration,
    ) -> Result<Self, LeaveError> {
        if end < start {
            return Err(LeaveError::InvalidDateRange);
        }
        match duration {
            LeaveDuration::Half => Ok(LeaveDays::HALF),
            LeaveDuration::Full => {
                let days = (end - start).num_days() as u32 + 1;
                Ok(LeaveDays::from_whole_days(days))
            }
        }
    }

    pub fn half_days(self) -> u32 {
        self.0
    }

    pub fn as_days(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    pub fn checked_add(self, other: LeaveDays) -> Option<LeaveDays> {
        self.0.checked_add(other.0).map(LeaveDays)
    }

    pub fn checked_sub(self, other: LeaveDays) -> Option<LeaveDays> {
        self.0.checked_sub(other.0).map(LeaveDays)
    }

    pub fn saturating_sub(self, other: LeaveDays) -> LeaveDays {
        LeaveDays(self.0.saturating_sub(other.0))
    }
}

impl std::fmt::Display for LeaveDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_days())
    }
}

impl TryFrom<f64> for LeaveDays {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err("leave days must be a non-negative number".into());
        }
        let units = value * 2.0;
        if units.fract() != 0.0 {
            return Err("leave days must be a multiple of 0.5".into());
        }
        if units > f64::from(u32::MAX) {
            return Err("leave days out of range".into());
        }
        Ok(LeaveDays(units as u32))
    }
}

impl Serialize for LeaveDays {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_days())
    }
}

impl<'de> Deserialize<'de> for LeaveDays {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        LeaveDays::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Token referencing a ledger hold; attached to the request internally and
/// never serialized to callers.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct HoldToken(Uuid);

impl HoldToken {
    pub fn new() -> Self {
        HoldToken(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(HoldToken)
    }
}

impl Default for HoldToken {
    fn default() -> Self {
        HoldToken::new()
    }
}

impl std::fmt::Display for HoldToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A submitted leave request. Created as `Pending`, decided at most once,
/// never mutated after a terminal status and never deleted.
///
/// Deliberately not `Serialize`: the API layer maps it to a response type
/// so the hold token cannot leak to callers.
#[derive(Debug, Clone)]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: LeaveDays,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    pub hold_token: HoldToken,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<u64>,
}

impl LeaveRequest {
    /// Does `[start, end]` intersect this request's range?
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

/// A validated submission, day count already derived. The only way to get
/// one is through [`NewLeaveRequest::new`], so stores never see an invalid
/// range or a client-supplied day count.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: LeaveDays,
    pub reason: Option<String>,
}

impl NewLeaveRequest {
    pub fn new(
        employee_id: u64,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        duration: LeaveDuration,
        reason: Option<String>,
    ) -> Result<Self, LeaveError> {
        let days = LeaveDays::for_range(start_date, end_date, duration)?;
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if leave_type.requires_reason() && reason.is_none() {
            return Err(LeaveError::InvalidReason);
        }
        Ok(NewLeaveRequest {
            employee_id,
            leave_type,
            start_date,
            end_date,
            days,
            reason,
        })
    }
}
