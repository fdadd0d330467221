//! Request guards. Handlers that take an [`AuthUser`] argument reject the
//! request with 401 before running unless a valid bearer token is present.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

use crate::error::AppError;
use crate::models::user::Role;
use crate::services::auth_service;
use crate::state::AppState;

/// The caller, as asserted by the JWT. No database round-trip is made;
/// handlers that need the full profile load it themselves.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role != role {
            return Err(AppError::forbidden(format!(
                "Only {}s can perform this action",
                role.as_str()
            )));
        }
        Ok(())
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role != Role::Admin {
            return Err(AppError::forbidden("Admin access required"));
        }
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::Internal("application state is not registered".into()))?;

    let token = bearer_token(req)
        .ok_or_else(|| AppError::Unauthorized("Not authorized, no token".into()))?;

    let claims = auth_service::verify_jwt_token(token, &state.config.jwt_secret).map_err(|e| {
        log::debug!("rejected bearer token: {}", e);
        AppError::Unauthorized("Not authorized, token failed".into())
    })?;

    Ok(AuthUser {
        id: claims.sub,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn bearer_prefix_is_required() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Token abc"))
            .to_http_request();
        assert!(bearer_token(&req).is_none());

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req), Some("abc.def"));
    }

    #[test]
    fn role_checks() {
        let user = AuthUser {
            id: "u".into(),
            role: Role::Provider,
        };
        assert!(user.require_role(Role::Provider).is_ok());
        assert!(user.require_role(Role::Client).is_err());
        assert!(user.require_admin().is_err());
    }
}
