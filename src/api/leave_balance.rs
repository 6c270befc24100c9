use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::leave::LeaveService;
use crate::model::LeaveBalance;

#[derive(Deserialize, ToSchema)]
pub struct AdjustBalance {
    #[serde(alias = "type")]
    #[schema(example = "annual")]
    pub leave_type: String,
    /// Days to add (positive) or remove (negative)
    #[schema(example = -2.5)]
    pub delta: f64,
}

/// Balances of the calling employee.
#[utoipa::path(
    get,
    path = "/api/leave/balances",
    responses(
        (status = 200, description = "One entry per policy leave type", body = Vec<LeaveBalance>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn my_balances(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let balances = service.get_balances(employee_id).await?;

    Ok(HttpResponse::Ok().json(balances))
}

#[utoipa::path(
    get,
    path = "/api/leave/balances/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose balances to fetch")
    ),
    responses(
        (status = 200, description = "One entry per policy leave type", body = Vec<LeaveBalance>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn employee_balances(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    auth.require_self_or_hr(employee_id)?;

    let balances = service.get_balances(employee_id).await?;
    Ok(HttpResponse::Ok().json(balances))
}

/* =========================
Manual adjustment (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/balances/{employee_id}/adjust",
    params(
        ("employee_id" = u64, Path, description = "Employee whose balance to adjust")
    ),
    request_body(
        content = AdjustBalance,
        description = "Signed change in days",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Balance adjusted", body = Object, example = json!({
            "message": "Balance adjusted",
            "type": "annual",
            "balance": 9.5
        })),
        (status = 400, description = "Unknown leave type or invalid delta"),
        (status = 409, description = "Adjustment would make the balance negative"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn adjust_balance(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<AdjustBalance>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();
    let balance = service
        .adjust_balance(employee_id, &payload.leave_type, payload.delta)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Balance adjusted",
        "type": payload.leave_type.trim(),
        "balance": balance,
    })))
}

#[utoipa::path(
    post,
    path = "/api/leave/balances/{employee_id}/accrue",
    params(
        ("employee_id" = u64, Path, description = "Employee to credit")
    ),
    responses(
        (status = 200, description = "One month accrued, capped at each type's maximum", body = Vec<LeaveBalance>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn accrue_month(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let balances = service.accrue_month(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(balances))
}

#[utoipa::path(
    post,
    path = "/api/leave/balances/{employee_id}/close-year",
    params(
        ("employee_id" = u64, Path, description = "Employee whose year to close")
    ),
    responses(
        (status = 200, description = "Balances clamped to carry-over limits", body = Vec<LeaveBalance>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Balance"
)]
pub async fn close_fiscal_year(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let balances = service.close_fiscal_year(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(balances))
}
