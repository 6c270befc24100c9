use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::leave::{LeaveService, NotifierError};
use crate::model::{LeaveFilter, LeaveRequest, NewLeaveRequest};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[serde(alias = "type")]
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = "2023-09-20", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2023-09-25", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Between 10 and 500 characters
    #[schema(example = "Family vacation abroad")]
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: u64,
}

#[derive(Deserialize, IntoParams)]
pub struct DurationQuery {
    #[param(value_type = String, format = "date", example = "2023-06-01")]
    pub start_date: NaiveDate,
    #[param(value_type = String, format = "date", example = "2023-06-05")]
    pub end_date: NaiveDate,
}

fn warning_text(warning: &Option<NotifierError>) -> Option<String> {
    warning.as_ref().map(ToString::to_string)
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = Object,
         example = json!({
            "message": "Leave request submitted",
            "data": { "id": 1, "type": "annual", "status": "pending" },
            "points": 25
         })
        ),
        (status = 400, description = "Invalid dates, reason or leave type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let submission = service
        .submit_request(
            NewLeaveRequest {
                employee_id,
                employee_name: auth.username.clone(),
                employee_email: auth.notification_address(),
                leave_type: payload.leave_type,
                start_date: payload.start_date,
                end_date: payload.end_date,
                reason: payload.reason,
            },
            Utc::now().date_naive(),
        )
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request submitted",
        "data": submission.request,
        "points": submission.points,
        "warning": warning_text(&submission.warning),
    })))
}

/* =========================
Approve leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved and balance debited", body = Object, example = json!({
            "message": "Leave approved",
            "duration": 5,
            "balance": { "type": "annual", "balance": 7.0, "unit": "days" }
        })),
        (status = 400, description = "Leave request already processed or type not in policy"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Insufficient balance", body = Object, example = json!({
            "message": "insufficient annual balance: requested 5 day(s), available 3, short by 2",
            "shortfall": 2.0
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();
    let transition = service.approve_request(leave_id).await?;

    tracing::info!(leave_id, approver = auth.user_id, "Approval recorded");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave approved",
        "data": transition.request,
        "duration": transition.duration,
        "balance": transition.balance,
        "warning": warning_text(&transition.warning),
    })))
}

/* =========================
Reject leave (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave rejected"
        })),
        (status = 400, description = "Leave request already processed"),
        (status = 404, description = "Leave request not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();
    let transition = service.reject_request(leave_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Leave rejected",
        "data": transition.request,
        "warning": warning_text(&transition.warning),
    })))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "leave request 7 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave = service.get_request(path.into_inner()).await?;
    auth.require_self_or_hr(leave.employee_id)?;

    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let filter = query.into_inner();
    let (data, total) = service.list_requests(&filter).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: filter.page(),
        per_page: filter.per_page(),
        total,
    }))
}

/// Chargeable days between two dates under the current policy.
#[utoipa::path(
    get,
    path = "/api/leave/duration",
    params(DurationQuery),
    responses(
        (status = 200, description = "Working days in range", body = Object, example = json!({
            "start_date": "2023-06-01",
            "end_date": "2023-06-05",
            "days": 2
        })),
        (status = 400, description = "end_date before start_date"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_duration(
    _auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<DurationQuery>,
) -> actix_web::Result<impl Responder> {
    let days = service
        .calculate_duration(query.start_date, query.end_date)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "start_date": query.start_date,
        "end_date": query.end_date,
        "days": days,
    })))
}
