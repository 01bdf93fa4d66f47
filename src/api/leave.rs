use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::identity::Caller;
use crate::lifecycle::AppState;
use crate::model::leave::{LeaveDays, LeaveDuration, LeaveRequest, LeaveStatus, LeaveType};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    /// `full` charges every calendar day in the range; `half` charges 0.5.
    #[serde(default)]
    #[schema(example = "full")]
    pub duration: LeaveDuration,
    /// Required for sick and unpaid leave.
    #[schema(example = "family visit", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = 3.0, value_type = f64)]
    pub days: LeaveDays,
    #[schema(example = "family visit", nullable = true)]
    pub reason: Option<String>,
    #[schema(example = "pending")]
    pub status: LeaveStatus,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(example = "2026-01-02T00:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub decided_at: Option<DateTime<Utc>>,
    #[schema(example = 2000, nullable = true)]
    pub decided_by: Option<u64>,
}

// The hold token stays behind this boundary.
impl From<LeaveRequest> for LeaveResponse {
    fn from(request: LeaveRequest) -> Self {
        LeaveResponse {
            id: request.id,
            employee_id: request.employee_id,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            days: request.days,
            reason: request.reason,
            status: request.status,
            created_at: request.created_at,
            decided_at: request.decided_at,
            decided_by: request.decided_by,
        }
    }
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee (reviewers only; employees are always scoped to
    /// themselves)
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    /// Filter by status
    #[schema(example = "pending", value_type = String)]
    pub status: Option<LeaveStatus>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub total: usize,
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted", body = LeaveResponse),
        (status = 400, description = "Invalid dates or missing reason"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Overlaps an existing pending or approved request"),
        (status = 422, description = "Insufficient balance")
    ),
    security(("identity" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    caller: Caller,
    state: web::Data<AppState>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    let request = state
        .engine
        .submit(
            caller.employee_id,
            payload.leave_type,
            payload.start_date,
            payload.end_date,
            payload.duration,
            payload.reason,
        )
        .await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(request)))
}

/* =========================
Approve leave (HR/Boss)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already decided")
    ),
    security(("identity" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    caller.require_reviewer()?;
    let leave_id = path.into_inner();
    let request = state.engine.approve(leave_id, caller.employee_id).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(request)))
}

/* =========================
Reject leave (HR/Boss)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already decided")
    ),
    security(("identity" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    caller.require_reviewer()?;
    let leave_id = path.into_inner();
    let request = state.engine.reject(leave_id, caller.employee_id).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(request)))
}

/* =========================
Fetch one leave request
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found")
    ),
    security(("identity" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let request = state.requests.get(leave_id).await?;
    if !caller.can_view(request.employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your leave request"));
    }
    Ok(HttpResponse::Ok().json(LeaveResponse::from(request)))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("identity" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    caller: Caller,
    state: web::Data<AppState>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    // Employees only ever see their own requests.
    let employee_scope = if caller.role.is_reviewer() {
        query.employee_id
    } else {
        Some(caller.employee_id)
    };

    let mut requests = match (employee_scope, query.status) {
        (Some(employee_id), _) => state.requests.list_by_employee(employee_id).await?,
        (None, Some(status)) => state.requests.list_by_status(status).await?,
        (None, None) => state.requests.list_all().await?,
    };
    if let Some(status) = query.status {
        requests.retain(|r| r.status == status);
    }

    let data: Vec<LeaveResponse> = requests.into_iter().map(LeaveResponse::from).collect();
    let total = data.len();
    Ok(HttpResponse::Ok().json(LeaveListResponse { data, total }))
}
