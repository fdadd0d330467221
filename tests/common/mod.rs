#![allow(dead_code)]

pub mod fake;

use std::time::Duration;

use connecto::config::{Config, DEFAULT_MISTRAL_MODEL};
use connecto::models::user::Role;
use connecto::services::auth_service;
use connecto::state::AppState;

pub const SECRET: &str = "test-secret";
pub const USER_ID: &str = "65f0c2a9e4b0a1b2c3d4e5f1";

pub fn config(mistral_api_url: &str, mistral_api_key: Option<&str>) -> Config {
    Config {
        server_host: "127.0.0.1".into(),
        server_port: 0,
        mongo_uri: "mongodb://127.0.0.1:27017".into(),
        mongo_db_name: "connecto_test".into(),
        jwt_secret: SECRET.into(),
        mistral_api_key: mistral_api_key.map(str::to_string),
        mistral_api_url: mistral_api_url.into(),
        mistral_model: DEFAULT_MISTRAL_MODEL.into(),
        mistral_timeout: Duration::from_secs(2),
        upload_dir: std::env::temp_dir()
            .join("connecto-tests")
            .to_string_lossy()
            .into_owned(),
        frontend_url: None,
        smtp: None,
    }
}

/// The driver connects lazily, so no database is needed as long as the
/// request never reaches a query.
pub async fn state(config: Config) -> AppState {
    let client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .unwrap();
    let db = client.database(&config.mongo_db_name);
    AppState::new(db, config)
}

pub fn bearer() -> String {
    bearer_as(Role::Client)
}

pub fn bearer_as(role: Role) -> String {
    let token = auth_service::create_access_token(USER_ID, role, None, SECRET).unwrap();
    format!("Bearer {token}")
}
