use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest,
    dev::Payload,
    error::{ErrorForbidden, ErrorInternalServerError, ErrorUnauthorized},
    web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    pub email: Option<String>,
}

impl AuthUser {
    pub fn from_token(token: &str, secret: &str) -> Result<Self, String> {
        let claims = verify_token(token, secret)?;
        let role = Role::from_id(claims.role).ok_or_else(|| "Invalid role".to_string())?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
            email: claims.email,
        })
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already resolved by auth_middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ErrorInternalServerError("Config missing"))),
        };

        ready(AuthUser::from_token(token, &config.jwt_secret).map_err(ErrorUnauthorized))
    }
}

impl AuthUser {
    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if self.role.is_hr_or_admin() {
            Ok(())
        } else {
            Err(ErrorForbidden("HR/Admin only"))
        }
    }

    /// The caller's own employee id; leave is always filed for an employee.
    pub fn require_employee(&self) -> actix_web::Result<u64> {
        self.employee_id
            .ok_or_else(|| ErrorForbidden("No employee profile"))
    }

    /// HR/Admin may act on anyone; other users only on their own records.
    pub fn require_self_or_hr(&self, employee_id: u64) -> actix_web::Result<()> {
        if self.role.is_hr_or_admin() || self.employee_id == Some(employee_id) {
            Ok(())
        } else {
            Err(ErrorForbidden("Not allowed to access another employee's leave"))
        }
    }

    /// Address for leave notifications, falling back to the username.
    pub fn notification_address(&self) -> String {
        self.email.clone().unwrap_or_else(|| self.username.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "jane.smith".to_string(),
            role,
            employee_id,
            email: None,
        }
    }

    #[test]
    fn employees_only_reach_their_own_records() {
        let employee = user(Role::Employee, Some(7));
        assert!(employee.require_self_or_hr(7).is_ok());
        assert!(employee.require_self_or_hr(8).is_err());
        assert!(employee.require_hr_or_admin().is_err());
        assert_eq!(employee.require_employee().ok(), Some(7));

        let hr = user(Role::Hr, None);
        assert!(hr.require_self_or_hr(8).is_ok());
        assert!(hr.require_employee().is_err());
        assert!(hr.require_hr_or_admin().is_ok());
    }

    #[test]
    fn notification_address_falls_back_to_username() {
        let mut employee = user(Role::Employee, Some(7));
        assert_eq!(employee.notification_address(), "jane.smith");

        employee.email = Some("jane@company.com".to_string());
        assert_eq!(employee.notification_address(), "jane@company.com");
    }
}
