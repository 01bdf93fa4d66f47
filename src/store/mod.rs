//! Storage ports for the lifecycle engine.
//!
//! Two adapters implement them: [`memory`] (mutex-guarded maps, used by
//! every test) and [`mysql`] (sqlx, used in production). Both satisfy the
//! same atomicity contracts: each ledger operation and each `decide` is
//! internally atomic, so concurrent callers can never observe a partial
//! mutation of a single row.

use async_trait::async_trait;

use crate::error::LeaveError;
use crate::model::balance::LeaveBalance;
use crate::model::leave::{
    Decision, HoldToken, LeaveDays, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest,
};

pub mod memory;
pub mod mysql;

pub use memory::{MemoryLedger, MemoryRequestStore};
pub use mysql::{MySqlLedger, MySqlRequestStore};

/// Authoritative count of entitlement, consumption and in-flight holds per
/// `(employee, leave type)`.
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    /// Create the balance row for a newly provisioned employee/category.
    async fn provision(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        total: LeaveDays,
    ) -> Result<LeaveBalance, LeaveError>;

    /// Reserve `days` against the balance. Requires
    /// `total - consumed - pending_hold >= days`; no partial holds.
    async fn place_hold(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        days: LeaveDays,
    ) -> Result<HoldToken, LeaveError>;

    /// Move the held days into `consumed`. A token resolves at most once
    /// across commit and release; a second resolution fails `UnknownHold`.
    async fn commit_hold(&self, token: HoldToken) -> Result<(), LeaveError>;

    /// Drop the hold without consuming. Not idempotent: a second release
    /// on the same token fails `UnknownHold`.
    async fn release_hold(&self, token: HoldToken) -> Result<(), LeaveError>;

    /// Administrative entitlement override; must not reduce `total` below
    /// `consumed + pending_hold`.
    async fn adjust(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        new_total: LeaveDays,
    ) -> Result<LeaveBalance, LeaveError>;

    async fn balances_for(&self, employee_id: u64) -> Result<Vec<LeaveBalance>, LeaveError>;
}

/// Durable record of requests and their one-way status transitions.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Persist a validated submission as `Pending`, assigning id and
    /// submission timestamp, with its ledger hold token alongside.
    ///
    /// The overlap gate lives here so it is atomic with the insert: if the
    /// employee already has a live (pending or approved) request whose
    /// range intersects the new one, nothing is written and the call fails
    /// `OverlappingRequest`. Of two concurrent overlapping submissions at
    /// most one can land.
    async fn create(
        &self,
        new: NewLeaveRequest,
        hold: HoldToken,
    ) -> Result<LeaveRequest, LeaveError>;

    /// Atomic conditional transition out of `Pending`. The status must be
    /// `Pending` at the moment of the update; concurrent decisions on one
    /// id serialize so exactly one succeeds and the rest see
    /// `AlreadyDecided`.
    async fn decide(
        &self,
        id: u64,
        decision: Decision,
        decider_id: u64,
    ) -> Result<LeaveRequest, LeaveError>;

    async fn get(&self, id: u64) -> Result<LeaveRequest, LeaveError>;

    /// Newest first (submission timestamp descending).
    async fn list_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveRequest>, LeaveError>;

    /// Newest first (submission timestamp descending).
    async fn list_by_status(&self, status: LeaveStatus) -> Result<Vec<LeaveRequest>, LeaveError>;

    /// Newest first; every request regardless of status.
    async fn list_all(&self) -> Result<Vec<LeaveRequest>, LeaveError>;
}
