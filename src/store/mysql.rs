//! MySQL adapters (see `schema.sql` for the DDL).
//!
//! Atomicity discipline: conditional `UPDATE ... WHERE` statements carry
//! the compare-and-swap (`status = 'pending'` for decisions, the balance
//! precondition for holds), and hold resolution runs in a transaction that
//! locks the hold row. `rows_affected() == 0` is how a lost race reports
//! itself.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::MySqlPool;

use crate::error::LeaveError;
use crate::model::balance::LeaveBalance;
use crate::model::leave::{
    Decision, HoldToken, LeaveDays, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest,
};
use crate::store::{BalanceLedger, RequestStore};

fn decode_err(e: impl std::error::Error + Send + Sync + 'static) -> LeaveError {
    LeaveError::Storage(sqlx::Error::Decode(Box::new(e)))
}

#[derive(sqlx::FromRow)]
struct BalanceRow {
    employee_id: u64,
    leave_type: String,
    total: u32,
    consumed: u32,
    pending_hold: u32,
}

impl TryFrom<BalanceRow> for LeaveBalance {
    type Error = LeaveError;

    fn try_from(row: BalanceRow) -> Result<Self, Self::Error> {
        Ok(LeaveBalance {
            employee_id: row.employee_id,
            leave_type: row.leave_type.parse::<LeaveType>().map_err(decode_err)?,
            total: LeaveDays::from_half_days(row.total),
            consumed: LeaveDays::from_half_days(row.consumed),
            pending_hold: LeaveDays::from_half_days(row.pending_hold),
        })
    }
}

#[derive(sqlx::FromRow)]
struct LeaveRequestRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    half_days: u32,
    reason: Option<String>,
    status: String,
    hold_token: String,
    created_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
    decided_by: Option<u64>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = LeaveError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: row.leave_type.parse::<LeaveType>().map_err(decode_err)?,
            start_date: row.start_date,
            end_date: row.end_date,
            days: LeaveDays::from_half_days(row.half_days),
            reason: row.reason,
            status: row.status.parse::<LeaveStatus>().map_err(decode_err)?,
            hold_token: HoldToken::parse(&row.hold_token).map_err(decode_err)?,
            created_at: row.created_at,
            decided_at: row.decided_at,
            decided_by: row.decided_by,
        })
    }
}

const REQUEST_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, half_days, \
                               reason, status, hold_token, created_at, decided_at, decided_by";

pub struct MySqlLedger {
    pool: MySqlPool,
}

impl MySqlLedger {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceLedger for MySqlLedger {
    async fn provision(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        total: LeaveDays,
    ) -> Result<LeaveBalance, LeaveError> {
        let result = sqlx::query(
            "INSERT INTO leave_balances (employee_id, leave_type, total, consumed, pending_hold) \
             VALUES (?, ?, ?, 0, 0)",
        )
        .bind(employee_id)
        .bind(leave_type.to_string())
        .bind(total.half_days())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(LeaveBalance::new(employee_id, leave_type, total)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(LeaveError::AlreadyProvisioned)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn place_hold(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        days: LeaveDays,
    ) -> Result<HoldToken, LeaveError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE leave_balances SET pending_hold = pending_hold + ? \
             WHERE employee_id = ? AND leave_type = ? \
             AND total >= consumed + pending_hold + ?",
        )
        .bind(days.half_days())
        .bind(employee_id)
        .bind(leave_type.to_string())
        .bind(days.half_days())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let exists: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM leave_balances WHERE employee_id = ? AND leave_type = ?",
            )
            .bind(employee_id)
            .bind(leave_type.to_string())
            .fetch_one(&mut *tx)
            .await?;
            return if exists == 0 {
                Err(LeaveError::NotFound)
            } else {
                Err(LeaveError::InsufficientBalance)
            };
        }

        let token = HoldToken::new();
        sqlx::query(
            "INSERT INTO ledger_holds (token, employee_id, leave_type, half_days, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(token.to_string())
        .bind(employee_id)
        .bind(leave_type.to_string())
        .bind(days.half_days())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(token)
    }

    async fn commit_hold(&self, token: HoldToken) -> Result<(), LeaveError> {
        self.resolve_hold(token, true).await
    }

    async fn release_hold(&self, token: HoldToken) -> Result<(), LeaveError> {
        self.resolve_hold(token, false).await
    }

    async fn adjust(
        &self,
        employee_id: u64,
        leave_type: LeaveType,
        new_total: LeaveDays,
    ) -> Result<LeaveBalance, LeaveError> {
        let updated = sqlx::query(
            "UPDATE leave_balances SET total = ? \
             WHERE employee_id = ? AND leave_type = ? AND consumed + pending_hold <= ?",
        )
        .bind(new_total.half_days())
        .bind(employee_id)
        .bind(leave_type.to_string())
        .bind(new_total.half_days())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            let exists: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM leave_balances WHERE employee_id = ? AND leave_type = ?",
            )
            .bind(employee_id)
            .bind(leave_type.to_string())
            .fetch_one(&self.pool)
            .await?;
            return if exists == 0 {
                Err(LeaveError::NotFound)
            } else {
                Err(LeaveError::InvalidAdjustment)
            };
        }

        let row: BalanceRow = sqlx::query_as(
            "SELECT employee_id, leave_type, total, consumed, pending_hold \
             FROM leave_balances WHERE employee_id = ? AND leave_type = ?",
        )
        .bind(employee_id)
        .bind(leave_type.to_string())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn balances_for(&self, employee_id: u64) -> Result<Vec<LeaveBalance>, LeaveError> {
        let rows: Vec<BalanceRow> = sqlx::query_as(
            "SELECT employee_id, leave_type, total, consumed, pending_hold \
             FROM leave_balances WHERE employee_id = ? ORDER BY leave_type",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

impl MySqlLedger {
    /// Shared path for commit/release: lock the hold row, delete it, then
    /// apply the balance arithmetic. A missing hold row means the token
    /// was already resolved.
    async fn resolve_hold(&self, token: HoldToken, consume: bool) -> Result<(), LeaveError> {
        let mut tx = self.pool.begin().await?;

        let hold: Option<(u64, String, u32)> = sqlx::query_as(
            "SELECT employee_id, leave_type, half_days FROM ledger_holds \
             WHERE token = ? FOR UPDATE",
        )
        .bind(token.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let (employee_id, leave_type, half_days) = hold.ok_or(LeaveError::UnknownHold(token))?;

        sqlx::query("DELETE FROM ledger_holds WHERE token = ?")
            .bind(token.to_string())
            .execute(&mut *tx)
            .await?;

        let sql = if consume {
            "UPDATE leave_balances \
             SET consumed = consumed + ?, pending_hold = pending_hold - ? \
             WHERE employee_id = ? AND leave_type = ? AND pending_hold >= ?"
        } else {
            "UPDATE leave_balances \
             SET pending_hold = pending_hold - ? \
             WHERE employee_id = ? AND leave_type = ? AND pending_hold >= ?"
        };
        let mut query = sqlx::query(sql).bind(half_days);
        if consume {
            query = query.bind(half_days);
        }
        let updated = query
            .bind(employee_id)
            .bind(leave_type.as_str())
            .bind(half_days)
            .execute(&mut *tx)
            .await?;

        // A hold row without matching held days means the ledger diverged.
        if updated.rows_affected() == 0 {
            return Err(LeaveError::UnknownHold(token));
        }

        tx.commit().await?;
        Ok(())
    }
}

pub struct MySqlRequestStore {
    pool: MySqlPool,
}

impl MySqlRequestStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError> {
        let row: Option<LeaveRequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }
}

#[async_trait]
impl RequestStore for MySqlRequestStore {
    async fn create(
        &self,
        new: NewLeaveRequest,
        hold: HoldToken,
    ) -> Result<LeaveRequest, LeaveError> {
        // Conditional insert: the NOT EXISTS guard runs in the same
        // statement as the write, so the overlap gate cannot be raced by
        // a concurrent submission. Zero rows affected means an
        // overlapping live request already holds the range.
        let result = sqlx::query(
            "INSERT INTO leave_requests \
             (employee_id, leave_type, start_date, end_date, half_days, reason, status, \
              hold_token, created_at) \
             SELECT ?, ?, ?, ?, ?, ?, 'pending', ?, ? FROM DUAL \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM leave_requests \
                 WHERE employee_id = ? AND status IN ('pending', 'approved') \
                 AND start_date <= ? AND end_date >= ? \
             )",
        )
        .bind(new.employee_id)
        .bind(new.leave_type.to_string())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.days.half_days())
        .bind(new.reason.as_deref())
        .bind(hold.to_string())
        .bind(Utc::now())
        .bind(new.employee_id)
        .bind(new.end_date)
        .bind(new.start_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LeaveError::OverlappingRequest);
        }
        self.fetch(result.last_insert_id())
            .await?
            .ok_or(LeaveError::NotFound)
    }

    async fn decide(
        &self,
        id: u64,
        decision: Decision,
        decider_id: u64,
    ) -> Result<LeaveRequest, LeaveError> {
        // The `status = 'pending'` predicate is the linearization point:
        // of two concurrent decisions exactly one row update wins.
        let updated = sqlx::query(
            "UPDATE leave_requests SET status = ?, decided_at = ?, decided_by = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(decision.status().to_string())
        .bind(Utc::now())
        .bind(decider_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return match self.fetch(id).await? {
                Some(_) => Err(LeaveError::AlreadyDecided),
                None => Err(LeaveError::NotFound),
            };
        }

        self.fetch(id).await?.ok_or(LeaveError::NotFound)
    }

    async fn get(&self, id: u64) -> Result<LeaveRequest, LeaveError> {
        self.fetch(id).await?.ok_or(LeaveError::NotFound)
    }

    async fn list_by_employee(&self, employee_id: u64) -> Result<Vec<LeaveRequest>, LeaveError> {
        let rows: Vec<LeaveRequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE employee_id = ? \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_by_status(&self, status: LeaveStatus) -> Result<Vec<LeaveRequest>, LeaveError> {
        let rows: Vec<LeaveRequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE status = ? \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_all(&self) -> Result<Vec<LeaveRequest>, LeaveError> {
        let rows: Vec<LeaveRequestRow> = sqlx::query_as(&format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
