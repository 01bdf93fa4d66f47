use crate::api::balance::{AdjustBalance, ProvisionBalance};
use crate::api::dashboard::EmployeeDashboard;
use crate::api::leave::{
    CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse,
};
use crate::model::leave::{LeaveDuration, LeaveStatus, LeaveType};
use crate::query::{BalanceView, EmployeeSummary, StatusCounts};
use utoipa::Modify;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Lifecycle API",
        version = "1.0.0",
        description = r#"
## Leave Lifecycle Service

Role-based leave management: employees submit time-off requests, HR and
the boss approve or reject them, dashboards summarize balances and
history.

### 🔹 Key Features
- **Leave Requests**
  - Submit, approve, reject, and browse leave requests
- **Balance Ledger**
  - Hold-based accounting: submission reserves days, approval consumes
    them, rejection releases them. A request can never be approved past
    the remaining entitlement
- **Dashboards**
  - Status counts and per-employee summaries

### 🔐 Identity
Callers are identified by the `X-Employee-Id` and `X-Role` headers set by
the identity provider fronting this service. Approval and rejection
require the **hr** or **boss** role; ledger administration requires
**hr**.

### 📦 Response Format
- JSON-based RESTful responses
- Errors are returned as `{"message": "..."}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::create_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,

        crate::api::balance::provision_balance,
        crate::api::balance::adjust_balance,
        crate::api::balance::get_balances,

        crate::api::dashboard::status_summary,
        crate::api::dashboard::employee_dashboard
    ),
    components(
        schemas(
            LeaveType,
            LeaveStatus,
            LeaveDuration,
            CreateLeave,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            ProvisionBalance,
            AdjustBalance,
            BalanceView,
            StatusCounts,
            EmployeeSummary,
            EmployeeDashboard
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request lifecycle APIs"),
        (name = "Balance", description = "Balance ledger administration APIs"),
        (name = "Dashboard", description = "Read-only dashboard projections"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "identity",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "X-Employee-Id",
                    "Employee id forwarded by the identity provider \
                     (together with X-Role)",
                ))),
            );
        }
    }
}
