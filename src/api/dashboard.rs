use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::leave::LeaveResponse;
use crate::identity::Caller;
use crate::lifecycle::AppState;
use crate::query::{BalanceView, StatusCounts, count_by_status, employee_summary};

#[derive(Serialize, ToSchema)]
pub struct EmployeeDashboard {
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub counts: StatusCounts,
    pub balances: Vec<BalanceView>,
    /// Request history, newest first.
    pub requests: Vec<LeaveResponse>,
}

/* =========================
Company-wide status counts (HR/Boss)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/summary",
    responses(
        (status = 200, description = "Request counts by status", body = StatusCounts),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("identity" = [])),
    tag = "Dashboard"
)]
pub async fn status_summary(
    caller: Caller,
    state: web::Data<AppState>,
) -> actix_web::Result<impl Responder> {
    caller.require_reviewer()?;
    let requests = state.requests.list_all().await?;
    Ok(HttpResponse::Ok().json(count_by_status(&requests)))
}

/* =========================
Per-employee dashboard
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee to summarize")
    ),
    responses(
        (status = 200, description = "Employee leave summary", body = EmployeeDashboard),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("identity" = [])),
    tag = "Dashboard"
)]
pub async fn employee_dashboard(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    if !caller.can_view(employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your dashboard"));
    }

    let balances = state.ledger.balances_for(employee_id).await?;
    let requests = state.requests.list_by_employee(employee_id).await?;
    let summary = employee_summary(employee_id, &balances, &requests);

    Ok(HttpResponse::Ok().json(EmployeeDashboard {
        employee_id: summary.employee_id,
        counts: summary.counts,
        balances: summary.balances,
        requests: requests.into_iter().map(LeaveResponse::from).collect(),
    }))
}
