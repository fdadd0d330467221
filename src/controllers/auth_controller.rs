// src/controllers/auth_controller.rs

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::user::{Role, UserModel, UserProfile, Verification};
use crate::models::{new_id, timestamp};
use crate::services::{auth_service, email_service};
use crate::state::AppState;

const MIN_PASSWORD_CHARS: usize = 6;

/// Request structure for the registration endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub area: Option<String>,
}

impl RegisterForm {
    fn validate(&self) -> AppResult<()> {
        if self.full_name.trim().is_empty() {
            return Err(AppError::bad_request("Full name is required"));
        }
        let email = self.email.trim();
        if email.len() < 3 || !email.contains('@') {
            return Err(AppError::bad_request("Please provide a valid email"));
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::bad_request(
                "Password must be at least 6 characters",
            ));
        }
        if self.role == Role::Admin {
            return Err(AppError::forbidden("Admin accounts cannot self-register"));
        }
        Ok(())
    }
}

/// Request structure for the login endpoint.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Request structure for the verify-email endpoint.
#[derive(Debug, Deserialize)]
pub struct VerifyEmailForm {
    pub email: String,
    pub code: String,
}

/// Request structure for the resend-verification endpoint.
#[derive(Debug, Deserialize)]
pub struct ResendVerificationForm {
    pub email: String,
}

/// Issues a verification code and mails it in a background task.
async fn dispatch_verification_code(data: &AppState, email: &str) -> AppResult<()> {
    let code = auth_service::issue_verification_code(&data.users_collection, email).await?;
    let smtp = data.config.smtp.clone();
    let to = email.to_string();
    actix_web::rt::spawn(async move {
        if let Err(e) = email_service::send_verification_email(smtp, to, code).await {
            log::error!("verification email failed: {}", e);
        }
    });
    Ok(())
}

fn token_for(data: &AppState, user: &UserModel) -> AppResult<String> {
    auth_service::create_access_token(&user.id, user.role, None, &data.config.jwt_secret)
        .map_err(|e| AppError::Internal(format!("could not sign token: {e}")))
}

/// POST /auth/register
/// Creates the account, mails a verification code and returns a token.
#[post("/register")]
pub async fn register(
    form: web::Json<RegisterForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    form.validate()?;

    if auth_service::get_user(&data.users_collection, &form.email)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request("User already exists with this email"));
    }

    let now = timestamp::now();
    let new_user = UserModel {
        id: new_id(),
        full_name: form.full_name.trim().to_string(),
        email: form.email,
        // The service hashes this before inserting.
        hashed_password: form.password,
        role: form.role,
        phone: form.phone,
        city: form.city,
        area: form.area,
        profile_picture: None,
        verification: Verification::default(),
        email_verified: false,
        verification_code: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    let user = auth_service::create_user(&data.users_collection, new_user).await?;
    log::info!("registered {} as {}", user.id, user.role.as_str());

    dispatch_verification_code(&data, &user.email).await?;
    let token = token_for(&data, &user)?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Registration successful. Please check your email for the verification code.",
        "data": { "user": UserProfile::from(&user), "token": token },
    })))
}

/// POST /auth/login
#[post("/login")]
pub async fn login(
    form: web::Json<LoginForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let user = auth_service::get_user(&data.users_collection, &form.email)
        .await?
        .filter(|u| auth_service::verify_password(&form.password, &u.hashed_password))
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

    if !user.is_active {
        return Err(AppError::forbidden("Your account has been deactivated"));
    }

    let token = token_for(&data, &user)?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful",
        "data": { "user": UserProfile::from(&user), "token": token },
    })))
}

/// GET /auth/me
#[get("/me")]
pub async fn me(auth: AuthUser, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let user = auth_service::require_user(&data.users_collection, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "user": UserProfile::from(&user) },
    })))
}

/// POST /auth/verify-email
#[post("/verify-email")]
pub async fn verify_email(
    form: web::Json<VerifyEmailForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let verified =
        auth_service::verify_email_code(&data.users_collection, &form.email, &form.code).await?;
    if !verified {
        return Err(AppError::bad_request("Invalid verification code"));
    }
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Email verified successfully",
    })))
}

/// POST /auth/resend-verification
#[post("/resend-verification")]
pub async fn resend_verification(
    form: web::Json<ResendVerificationForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let user = auth_service::get_user(&data.users_collection, &form.email)
        .await?
        .ok_or_else(|| AppError::not_found("Email not registered"))?;
    if user.email_verified {
        return Err(AppError::bad_request("Email is already verified"));
    }

    dispatch_verification_code(&data, &user.email).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Verification email resent successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(role: Role, password: &str) -> RegisterForm {
        RegisterForm {
            full_name: "Ravi Kumar".into(),
            email: "ravi@example.com".into(),
            password: password.into(),
            role,
            phone: None,
            city: None,
            area: None,
        }
    }

    #[test]
    fn registration_rules() {
        assert!(form(Role::Client, "secret1").validate().is_ok());
        assert!(form(Role::Client, "short").validate().is_err());
        assert!(matches!(
            form(Role::Admin, "secret1").validate(),
            Err(AppError::Forbidden(_))
        ));
    }
}
