use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;

/// Authenticated caller, decoded from the bearer token on each request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
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
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        let role = match Role::from_id(claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// Reimbursement resolution is restricted to managers and admins.
    pub fn require_manager_or_admin(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Manager) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Manager/Admin only"))
        }
    }

    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "asmith".into(),
            role,
        }
    }

    #[test]
    fn admin_gate() {
        assert!(user_with(Role::Admin).require_admin().is_ok());
        assert!(user_with(Role::Manager).require_admin().is_err());
        assert!(user_with(Role::Employee).require_admin().is_err());
    }

    #[test]
    fn resolver_gate_admits_managers_and_admins() {
        assert!(user_with(Role::Admin).require_manager_or_admin().is_ok());
        assert!(user_with(Role::Manager).require_manager_or_admin().is_ok());
        assert!(user_with(Role::Employee).require_manager_or_admin().is_err());
    }
}
