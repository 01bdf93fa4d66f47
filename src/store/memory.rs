//! In-memory adapters. Back every unit and integration test, and mirror
//! the contracts of the MySQL adapters exactly: one mutex per store makes
//! each operation atomic, holds are consumed on resolution so a second
//! commit/release fails `UnknownHold`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::LeaveError;
use crate::model::balance::LeaveBalance;
use crate::model::leave::{
    Decision, HoldToken, LeaveDays, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest,
};
use crate::store::{BalanceLedger, RequestStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A poisoned lock only means another test assertion panicked mid-op;
    // the data itself is still usable.
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone)]
struct Hold {
    employee_id: u64,
    leave_type: LeaveType,
    days: LeaveDays,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<(u64, LeaveType), LeaveBalance>,
    holds: HashMap<HoldToken, Hold>,
}

#[derive(Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BalanceLedger for MemoryLedger {
    async fn provision(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        total: LeaveDays,
    ) -> Result<LeaveBalance, LeaveError> {
        let mut state = lock(&self.state);
        if state.balances.contains_key(&(employee_id, leave_type)) {
            return Err(LeaveError::AlreadyProvisioned);
        }
        let balance = LeaveBalance::new(employee_id, leave_type, total);
        state
            .balances
            .insert((employee_id, leave_type), balance.clone());
        Ok(balance)
    }

    async fn place_hold(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        days: LeaveDays,
    ) -> Result<HoldToken, LeaveError> {
        let mut state = lock(&self.state);
        let balance = state
            .balances
            .get_mut(&(employee_id, leave_type))
            .ok_or(LeaveError::NotFound)?;
        if !balance.can_hold(days) {
            return Err(LeaveError::InsufficientBalance);
        }
        balance.pending_hold = balance
            .pending_hold
            .checked_add(days)
            .ok_or(LeaveError::InsufficientBalance)?;
        let token = HoldToken::new();
        state.holds.insert(
            token,
            Hold {
                employee_id,
                leave_type,
                days,
            },
        );
        Ok(token)
    }

    async fn commit_hold(&self, token: HoldToken) -> Result<(), LeaveError> {
        let mut state = lock(&self.state);
        let hold = state
            .holds
            .remove(&token)
            .ok_or(LeaveError::UnknownHold(token))?;
        let balance = state
            .balances
            .get_mut(&(hold.employee_id, hold.leave_type))
            .ok_or(LeaveError::UnknownHold(token))?;
        balance.pending_hold = balance
            .pending_hold
            .checked_sub(hold.days)
            .ok_or(LeaveError::UnknownHold(token))?;
        balance.consumed = balance
            .consumed
            .checked_add(hold.days)
            .ok_or(LeaveError::UnknownHold(token))?;
        Ok(())
    }

    async fn release_hold(&self, token: HoldToken) -> Result<(), LeaveError> {
        let mut state = lock(&self.state);
        let hold = state
            .holds
            .remove(&token)
            .ok_or(LeaveError::UnknownHold(token))?;
        let balance = state
            .balances
            .get_mut(&(hold.employee_id, hold.leave_type))
            .ok_or(LeaveError::UnknownHold(token))?;
        balance.pending_hold = balance
            .pending_hold
            .checked_sub(hold.days)
            .ok_or(LeaveError::UnknownHold(token))?;
        Ok(())
    }

    async fn adjust(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        new_total: LeaveDays,
    ) -> Result<LeaveBalance, LeaveError> {
        let mut state = lock(&self.state);
        let balance = state
            .balances
            .get_mut(&(employee_id, leave_type))
            .ok_or(LeaveError::NotFound)?;
        let committed = balance
            .consumed
            .checked_add(balance.pending_hold)
            .ok_or(LeaveError::InvalidAdjustment)?;
        if new_total < committed {
            return Err(LeaveError::InvalidAdjustment);
        }
        balance.total = new_total;
        Ok(balance.clone())
    }

    async fn balances_for(&self, employee_id: u64) -> Result<Vec<LeaveBalance>, LeaveError> {
        let state = lock(&self.state);
        let mut balances: Vec<LeaveBalance> = state
            .balances
            .values()
            .filter(|b| b.employee_id == employee_id)
            .cloned()
            .collect();
        balances.sort_by_key(|b| b.leave_type);
        Ok(balances)
    }
}

#[derive(Default)]
pub struct MemoryRequestStore {
    requests: Mutex<HashMap<u64, LeaveRequest>>,
    next_id: AtomicU64,
}

impl MemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_desc(mut requests: Vec<LeaveRequest>) -> Vec<LeaveRequest> {
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        requests
    }
}

#[async_trait]
impl RequestStore for MemoryRequestStore {
    async fn create(
        &self,
        new: NewLeaveRequest,
        hold: HoldToken,
    ) -> Result<LeaveRequest, LeaveError> {
        // Overlap check and insert under one guard, so two concurrent
        // overlapping submissions cannot both pass the gate.
        let mut requests = lock(&self.requests);
        let overlapping = requests.values().any(|r| {
            r.employee_id == new.employee_id
                && matches!(r.status, LeaveStatus::Pending | LeaveStatus::Approved)
                && r.overlaps(new.start_date, new.end_date)
        });
        if overlapping {
            return Err(LeaveError::OverlappingRequest);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let request = LeaveRequest {
            id,
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            days: new.days,
            reason: new.reason,
            status: LeaveStatus::Pending,
            hold_token: hold,
            created_at: Utc::now(),
            decided_at: None,
            decided_by: None,
        };
        requests.insert(id, request.clone());
        Ok(request)
    }

    async fn decide(
        &self,
        id: u64,
        decision: Decision,
        decider_id: u64,
    ) -> Result<LeaveRequest, LeaveError> {
        let mut requests = lock(&self.requests);
        let request = requests.get_mut(&id).ok_or(LeaveError::NotFound)?;
        if request.status != LeaveStatus::Pending {
            return Err(LeaveError::AlreadyDecided);
        }
        request.status = decision.status();
        request.decided_at = Some(Utc::now());
        request.decided_by = Some(decider_id);
        Ok(request.clone())
    }

    async fn get(&self, id: u64) -> Result<LeaveRequest, LeaveError> {
        lock(&self.requests)
            .get(&id)
            .cloned()
            .ok_or(LeaveError::NotFound)
    }

    async fn list_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveRequest>, LeaveError> {
        let requests = lock(&self.requests)
            .values()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        Ok(Self::sorted_desc(requests))
    }

    async fn list_by_status(&self, status: LeaveStatus) -> Result<Vec<LeaveRequest>, LeaveError> {
        let requests = lock(&self.requests)
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        Ok(Self::sorted_desc(requests))
    }

    async fn list_all(&self) -> Result<Vec<LeaveRequest>, LeaveError> {
        let requests = lock(&self.requests).values().cloned().collect();
        Ok(Self::sorted_desc(requests))
    }
}
