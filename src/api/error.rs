use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::leave::LeaveError;
use crate::repository::RepositoryError;

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_)
            | LeaveError::UnknownLeaveType(_)
            | LeaveError::PolicyNotFound(_)
            | LeaveError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            LeaveError::InsufficientBalance { .. } | LeaveError::NegativeBalance { .. } => {
                StatusCode::CONFLICT
            }
            LeaveError::RequestNotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::Repository(RepositoryError::NotFound(_)) => StatusCode::NOT_FOUND,
            LeaveError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            LeaveError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Leave operation failed");
            return HttpResponse::build(status).json(json!({
                "message": "Internal Server Error"
            }));
        }

        let body = match self {
            LeaveError::InsufficientBalance {
                leave_type,
                requested,
                available,
                shortfall,
            } => json!({
                "message": self.to_string(),
                "type": leave_type,
                "requested": requested,
                "available": available,
                "shortfall": shortfall,
            }),
            _ => json!({ "message": self.to_string() }),
        };
        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        let cases = [
            (LeaveError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (LeaveError::PolicyNotFound("unpaid".into()), StatusCode::BAD_REQUEST),
            (
                LeaveError::InvalidTransition {
                    id: 1,
                    status: "approved".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                LeaveError::InsufficientBalance {
                    leave_type: "annual".into(),
                    requested: 5.0,
                    available: 3.0,
                    shortfall: 2.0,
                },
                StatusCode::CONFLICT,
            ),
            (LeaveError::RequestNotFound(9), StatusCode::NOT_FOUND),
            (
                LeaveError::Repository(RepositoryError::Corrupt("status".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{error}");
        }
    }

    #[test]
    fn server_errors_hide_details() {
        let response =
            LeaveError::Repository(RepositoryError::Unavailable("pool closed".into())).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
