//! Read-side projections: pure functions over store snapshots, recomputed
//! on every call. No cache, no side effects, never a source of truth.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::balance::LeaveBalance;
use crate::model::leave::{LeaveDays, LeaveRequest, LeaveStatus, LeaveType};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[schema(example = json!({"pending": 2, "approved": 5, "rejected": 1}))]
pub struct StatusCounts {
    #[schema(example = 2)]
    pub pending: u64,
    #[schema(example = 5)]
    pub approved: u64,
    #[schema(example = 1)]
    pub rejected: u64,
}

/// Balance row as dashboards see it, day numbers instead of half-day units.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "leave_type": "annual",
    "total": 20.0,
    "consumed": 3.0,
    "pending_hold": 1.5,
    "remaining": 15.5
}))]
pub struct BalanceView {
    pub leave_type: LeaveType,
    #[schema(value_type = f64, example = 20.0)]
    pub total: LeaveDays,
    #[schema(value_type = f64, example = 3.0)]
    pub consumed: LeaveDays,
    #[schema(value_type = f64, example = 1.5)]
    pub pending_hold: LeaveDays,
    #[schema(value_type = f64, example = 15.5)]
    pub remaining: LeaveDays,
}

impl From<&LeaveBalance> for BalanceView {
    fn from(balance: &LeaveBalance) -> Self {
        BalanceView {
            leave_type: balance.leave_type,
            total: balance.total,
            consumed: balance.consumed,
            pending_hold: balance.pending_hold,
            remaining: balance.available(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeSummary {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub counts: StatusCounts,
    pub balances: Vec<BalanceView>,
}

pub fn count_by_status(requests: &[LeaveRequest]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for request in requests {
        match request.status {
            LeaveStatus::Pending => counts.pending += 1,
            LeaveStatus::Approved => counts.approved += 1,
            LeaveStatus::Rejected => counts.rejected += 1,
        }
    }
    counts
}

pub fn balance_views(balances: &[LeaveBalance]) -> Vec<BalanceView> {
    balances.iter().map(BalanceView::from).collect()
}

pub fn employee_summary(
    employee_id: u64,
    balances: &[LeaveBalance],
    requests: &[LeaveRequest],
) -> EmployeeSummary {
    EmployeeSummary {
        employee_id,
        counts: count_by_status(requests),
        balances: balance_views(balances),
    }
}
