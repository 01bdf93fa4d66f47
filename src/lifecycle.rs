//! The lifecycle engine: the only place where request-store mutation is
//! coupled with ledger mutation.
//!
//! Protocol:
//! - `submit` holds first, creates second, and releases the hold if the
//!   create fails; a hold failure means no request record ever exists.
//!   The overlap gate is the store's, atomic with the insert, so an
//!   overlapping create fails like any other and its hold is released.
//! - `approve`/`reject` decide first (the store's conditional update is
//!   the linearization point) and resolve the hold second; a ledger
//!   failure after a successful decision means the stores diverged and is
//!   surfaced as a fatal error, never masked.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::LeaveError;
use crate::model::leave::{Decision, LeaveDuration, LeaveRequest, LeaveType, NewLeaveRequest};
use crate::store::{BalanceLedger, RequestStore};

#[derive(Clone)]
pub struct LifecycleEngine {
    ledger: Arc<dyn BalanceLedger>,
    requests: Arc<dyn RequestStore>,
}

impl LifecycleEngine {
    pub fn new(ledger: Arc<dyn BalanceLedger>, requests: Arc<dyn RequestStore>) -> Self {
        Self { ledger, requests }
    }

    /// Submit a leave request: validate, place the ledger hold, then
    /// persist the request. The store rejects overlapping live requests
    /// atomically with the insert.
    pub async fn submit(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        start_date: NaiveDate,
        end_date: NaiveDate,
        duration: LeaveDuration,
        reason: Option<String>,
    ) -> Result<LeaveRequest, LeaveError> {
        let new = NewLeaveRequest::new(
            employee_id,
            leave_type,
            start_date,
            end_date,
            duration,
            reason,
        )?;

        let token = self
            .ledger
            .place_hold(employee_id, leave_type, new.days)
            .await?;

        match self.requests.create(new, token).await {
            Ok(request) => {
                tracing::info!(
                    request_id = request.id,
                    employee_id,
                    days = %request.days,
                    "leave request submitted"
                );
                Ok(request)
            }
            Err(create_err) => {
                // Compensate: the hold must not outlive a failed create.
                if let Err(release_err) = self.ledger.release_hold(token).await {
                    tracing::error!(
                        employee_id,
                        %token,
                        error = %release_err,
                        "failed to release hold after create failure; hold leaked"
                    );
                }
                Err(create_err)
            }
        }
    }

    pub async fn approve(
        &self,
        request_id: u64,
        decider_id: u64,
    ) -> Result<LeaveRequest, LeaveError> {
        let request = self
            .requests
            .decide(request_id, Decision::Approved, decider_id)
            .await?;
        if let Err(e) = self.ledger.commit_hold(request.hold_token).await {
            tracing::error!(
                request_id,
                token = %request.hold_token,
                error = %e,
                "ledger commit failed after approval; request store and ledger diverged"
            );
            return Err(e);
        }
        tracing::info!(request_id, decider_id, "leave request approved");
        Ok(request)
    }

    pub async fn reject(
        &self,
        request_id: u64,
        decider_id: u64,
    ) -> Result<LeaveRequest, LeaveError> {
        let request = self
            .requests
            .decide(request_id, Decision::Rejected, decider_id)
            .await?;
        if let Err(e) = self.ledger.release_hold(request.hold_token).await {
            tracing::error!(
                request_id,
                token = %request.hold_token,
                error = %e,
                "hold release failed after rejection; request store and ledger diverged"
            );
            return Err(e);
        }
        tracing::info!(request_id, decider_id, "leave request rejected");
        Ok(request)
    }
}

/// Shared handler state: the engine plus direct read/admin access to the
/// stores it was built from. Constructed explicitly and injected; there
/// are no module-level singletons.
#[derive(Clone)]
pub struct AppState {
    pub engine: LifecycleEngine,
    pub ledger: Arc<dyn BalanceLedger>,
    pub requests: Arc<dyn RequestStore>,
}

impl AppState {
    pub fn new(ledger: Arc<dyn BalanceLedger>, requests: Arc<dyn RequestStore>) -> Self {
        AppState {
            engine: LifecycleEngine::new(ledger.clone(), requests.clone()),
            ledger,
            requests,
        }
    }
}
