// src/services/auth_service.rs

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::Error as JwtError, DecodingKey, EncodingKey, Header, Validation,
};
use mongodb::bson::doc;
use mongodb::Collection;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::timestamp;
use crate::models::user::{Role, UserModel};

pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 1440;

/// JWT claims. `sub` is the user's id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    /// Expiration time (as UTC timestamp)
    pub exp: usize,
}

/// Verifies a plain password against a hashed password.
pub fn verify_password(plain_password: &str, hashed_password: &str) -> bool {
    verify(plain_password, hashed_password).unwrap_or(false)
}

/// Hashes a password using bcrypt.
pub fn get_password_hash(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Signs an access token for `user_id`. Without an explicit lifetime the
/// token is valid for 24 hours.
pub fn create_access_token(
    user_id: &str,
    role: Role,
    expires_delta: Option<Duration>,
    secret: &str,
) -> Result<String, JwtError> {
    let expire = Utc::now() + expires_delta.unwrap_or_else(|| Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES));
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expire.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Verifies a JWT token and returns the decoded claims if valid.
pub fn verify_jwt_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Six uppercase alphanumeric characters.
pub fn generate_verification_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

/// Retrieves a user by email. Emails are stored lowercased.
pub async fn get_user(
    collection: &Collection<UserModel>,
    email: &str,
) -> mongodb::error::Result<Option<UserModel>> {
    collection
        .find_one(doc! { "email": email.trim().to_lowercase() }, None)
        .await
}

pub async fn get_user_by_id(
    collection: &Collection<UserModel>,
    id: &str,
) -> mongodb::error::Result<Option<UserModel>> {
    collection.find_one(doc! { "_id": id }, None).await
}

/// Like [`get_user_by_id`] but a missing user is a 404.
pub async fn require_user(collection: &Collection<UserModel>, id: &str) -> AppResult<UserModel> {
    get_user_by_id(collection, id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

/// Hashes the plain password held in `user.hashed_password` and inserts the
/// user with `email_verified = false`.
pub async fn create_user(
    collection: &Collection<UserModel>,
    mut user: UserModel,
) -> AppResult<UserModel> {
    user.hashed_password = get_password_hash(&user.hashed_password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
    user.email = user.email.trim().to_lowercase();
    user.email_verified = false;

    collection.insert_one(&user, None).await?;
    Ok(user)
}

/// Stores a fresh verification code on the user and returns it.
pub async fn issue_verification_code(
    collection: &Collection<UserModel>,
    email: &str,
) -> mongodb::error::Result<String> {
    let code = generate_verification_code();
    collection
        .update_one(
            doc! { "email": email },
            doc! { "$set": {
                "verificationCode": code.as_str(),
                "updatedAt": timestamp::format(&timestamp::now()),
            } },
            None,
        )
        .await?;
    Ok(code)
}

/// Marks the email verified when `code` matches the stored one. The code is
/// single-use.
pub async fn verify_email_code(
    collection: &Collection<UserModel>,
    email: &str,
    code: &str,
) -> mongodb::error::Result<bool> {
    let filter = doc! {
        "email": email.trim().to_lowercase(),
        "verificationCode": code.trim().to_uppercase(),
    };
    let update = doc! {
        "$set": {
            "emailVerified": true,
            "updatedAt": timestamp::format(&timestamp::now()),
        },
        "$unset": { "verificationCode": "" }
    };

    let update_result = collection.update_one(filter, update, None).await?;
    Ok(update_result.modified_count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn tokens_round_trip_with_the_same_secret() {
        let token = create_access_token("65f0c2a9e4b0a1b2c3d4e5f6", Role::Client, None, SECRET)
            .unwrap();
        let claims = verify_jwt_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "65f0c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(claims.role, Role::Client);
        assert!(verify_jwt_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token =
            create_access_token("u", Role::Admin, Some(Duration::minutes(-10)), SECRET).unwrap();
        assert!(verify_jwt_token(&token, SECRET).is_err());
    }

    #[test]
    fn verification_codes_are_six_uppercase_chars() {
        let code = generate_verification_code();
        assert_eq!(code.len(), 6);
        assert_eq!(code, code.to_uppercase());
    }
}
