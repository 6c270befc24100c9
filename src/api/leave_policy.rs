use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::AuthUser;
use crate::leave::LeaveService;
use crate::model::LeavePolicy;

#[utoipa::path(
    get,
    path = "/api/leave/policy",
    responses(
        (status = 200, description = "Current leave policy", body = LeavePolicy),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Policy"
)]
pub async fn get_policy(
    _auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<impl Responder> {
    let policy = service.policy().await?;
    Ok(HttpResponse::Ok().json(policy.as_ref()))
}

/// Replaces the whole policy. Takes effect for every later calculation.
#[utoipa::path(
    put,
    path = "/api/leave/policy",
    request_body(
        content = LeavePolicy,
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Policy saved", body = LeavePolicy),
        (status = 400, description = "Invalid policy"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave Policy"
)]
pub async fn update_policy(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<LeavePolicy>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let policy = service.update_policy(payload.into_inner()).await?;
    tracing::info!(user_id = auth.user_id, "Leave policy replaced");

    Ok(HttpResponse::Ok().json(policy.as_ref()))
}
