use std::env;
use std::time::Duration;

use crate::error::AppError;

pub const DEFAULT_MISTRAL_API_URL: &str = "https://api.mistral.ai/v1/chat/completions";
pub const DEFAULT_MISTRAL_MODEL: &str = "mistral-small-latest";

/// Outbound mail settings. Absent when `SMTP_SERVER` is not set, in which
/// case verification codes are only logged.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub mongo_uri: String,
    pub mongo_db_name: String,
    pub jwt_secret: String,
    pub mistral_api_key: Option<String>,
    pub mistral_api_url: String,
    pub mistral_model: String,
    pub mistral_timeout: Duration,
    pub upload_dir: String,
    pub frontend_url: Option<String>,
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let jwt_secret = env::var("SECRET_KEY")
            .map_err(|_| AppError::Config("SECRET_KEY must be set".into()))?;

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
            mongo_uri: env::var("MONGO_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME").unwrap_or_else(|_| "connecto".to_string()),
            jwt_secret,
            mistral_api_key: non_empty_var("MISTRAL_API_KEY"),
            mistral_api_url: env::var("MISTRAL_API_URL")
                .unwrap_or_else(|_| DEFAULT_MISTRAL_API_URL.to_string()),
            mistral_model: env::var("MISTRAL_MODEL")
                .unwrap_or_else(|_| DEFAULT_MISTRAL_MODEL.to_string()),
            mistral_timeout: Duration::from_secs(10),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            frontend_url: non_empty_var("FRONTEND_URL"),
            smtp: SmtpConfig::from_env()?,
        })
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Option<Self>, AppError> {
        let server = match non_empty_var("SMTP_SERVER") {
            Some(server) => server,
            None => return Ok(None),
        };
        let port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse()
            .map_err(|_| AppError::Config("SMTP_PORT must be a port number".into()))?;
        let required = |key: &str| {
            env::var(key).map_err(|_| AppError::Config(format!("{key} must be set when SMTP_SERVER is")))
        };

        Ok(Some(Self {
            server,
            port,
            username: required("SMTP_USERNAME")?,
            password: required("SMTP_PASSWORD")?,
            from: required("EMAIL_FROM")?,
        }))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
