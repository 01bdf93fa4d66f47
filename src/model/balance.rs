use crate::model::leave::{LeaveDays, LeaveType};

/// Ledger row for one employee and one leave category.
///
/// Invariant, held at all times: `consumed + pending_hold <= total`.
/// Mutated only through the [`BalanceLedger`](crate::store::BalanceLedger)
/// operations; never deleted while the employee exists.
#[derive(Debug, Clone)]
pub struct LeaveBalance {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub total: LeaveDays,
    pub consumed: LeaveDays,
    pub pending_hold: LeaveDays,
}

impl LeaveBalance {
    pub fn new(employee_id: u64, leave_type: LeaveType, total: LeaveDays) -> Self {
        LeaveBalance {
            employee_id,
            leave_type,
            total,
            consumed: LeaveDays::ZERO,
            pending_hold: LeaveDays::ZERO,
        }
    }

    /// Days still free to hold against.
    pub fn available(&self) -> LeaveDays {
        self.total
            .saturating_sub(self.consumed)
            .saturating_sub(self.pending_hold)
    }

    pub fn can_hold(&self, days: LeaveDays) -> bool {
        self.available() >= days
    }
}
