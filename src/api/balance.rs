use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::identity::Caller;
use crate::lifecycle::AppState;
use crate::model::leave::{LeaveDays, LeaveType};
use crate::query::{BalanceView, balance_views};

#[derive(Deserialize, ToSchema)]
pub struct ProvisionBalance {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
    /// Entitlement in days; half days allowed.
    #[schema(example = 20.0, value_type = f64)]
    pub total: LeaveDays,
}

#[derive(Deserialize, ToSchema)]
pub struct AdjustBalance {
    /// New entitlement in days; must cover consumed plus held days.
    #[schema(example = 25.0, value_type = f64)]
    pub total: LeaveDays,
}

/* =========================
Provision a balance (HR)
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/balance",
    request_body(
        content = ProvisionBalance,
        description = "Balance provisioning payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Balance provisioned", body = BalanceView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Already provisioned")
    ),
    security(("identity" = [])),
    tag = "Balance"
)]
pub async fn provision_balance(
    caller: Caller,
    state: web::Data<AppState>,
    payload: web::Json<ProvisionBalance>,
) -> actix_web::Result<impl Responder> {
    caller.require_hr()?;
    let balance = state
        .ledger
        .provision(payload.employee_id, payload.leave_type, payload.total)
        .await?;
    Ok(HttpResponse::Ok().json(BalanceView::from(&balance)))
}

/* =========================
Adjust an entitlement (HR)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/balance/{employee_id}/{leave_type}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose balance to adjust"),
        ("leave_type" = String, Path, description = "Leave category", example = "annual")
    ),
    request_body(
        content = AdjustBalance,
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Entitlement adjusted", body = BalanceView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No balance for this employee and leave type"),
        (status = 422, description = "New total below consumed plus held days")
    ),
    security(("identity" = [])),
    tag = "Balance"
)]
pub async fn adjust_balance(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<(u64, LeaveType)>,
    payload: web::Json<AdjustBalance>,
) -> actix_web::Result<impl Responder> {
    caller.require_hr()?;
    let (employee_id, leave_type) = path.into_inner();
    let balance = state
        .ledger
        .adjust(employee_id, leave_type, payload.total)
        .await?;
    Ok(HttpResponse::Ok().json(BalanceView::from(&balance)))
}

/* =========================
View balances
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose balances to fetch")
    ),
    responses(
        (status = 200, description = "Balance rows", body = [BalanceView]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("identity" = [])),
    tag = "Balance"
)]
pub async fn get_balances(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    if !caller.can_view(employee_id) {
        return Err(actix_web::error::ErrorForbidden("Not your balance"));
    }
    let balances = state.ledger.balances_for(employee_id).await?;
    Ok(HttpResponse::Ok().json(balance_views(&balances)))
}
