use crate::api::leave_balance::AdjustBalance;
use crate::api::leave_request::{CreateLeave, LeaveListResponse};
use crate::model::{
    Holiday, LeaveBalance, LeaveFilter, LeavePolicy, LeaveRequest, LeaveStatus, LeaveTypePolicy,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave API",
        version = "1.0.0",
        description = r#"
## Leave Accounting

Leave requests, balances and policy for the HRM system.

### Key Features
- **Requests**: apply for leave, approve or reject, browse history with filters
- **Balances**: per-type balances, manual adjustments, monthly accrual and year-end carry-over
- **Policy**: leave types, holidays and the working week used to count chargeable days

### Security
All endpoints require a **JWT Bearer** access token.
Approvals, adjustments and policy changes are limited to **HR** and **Admin**.

### Response Format
- JSON bodies; errors carry a `message`
- Notification problems are reported in a `warning` field without undoing the action
"#,
    ),
    paths(
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::leave_duration,

        crate::api::leave_balance::my_balances,
        crate::api::leave_balance::employee_balances,
        crate::api::leave_balance::adjust_balance,
        crate::api::leave_balance::accrue_month,
        crate::api::leave_balance::close_fiscal_year,

        crate::api::leave_policy::get_policy,
        crate::api::leave_policy::update_policy
    ),
    components(
        schemas(
            CreateLeave,
            LeaveListResponse,
            LeaveFilter,
            LeaveRequest,
            LeaveStatus,
            LeaveBalance,
            AdjustBalance,
            LeavePolicy,
            LeaveTypePolicy,
            Holiday
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Leave Balance", description = "Leave balance ledger APIs"),
        (name = "Leave Policy", description = "Leave policy APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
