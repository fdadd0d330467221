//! Turns a spoken command into a navigation intent using the Mistral chat
//! completions API. The model's answer is treated as untrusted input and
//! always normalised to one of the known intents.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub const FALLBACK_FEEDBACK: &str = "I did not understand that command. Please try again.";
pub const DEFAULT_FEEDBACK: &str = "Command processed";

const TEMPERATURE: f64 = 0.3;
const MAX_TOKENS: u32 = 200;

const SYSTEM_PROMPT: &str = r#"You are a voice assistant for ConnectO, a freelance marketplace platform.
Your job is to interpret user voice commands and return structured JSON responses.

Available intents:
- "navigate": User wants to go to a specific page (profile, dashboard, messages, etc.)
- "search": User wants to search for providers, jobs, or services
- "switch_role": User wants to switch between client and provider modes
- "action": User wants to perform a specific action (post job, send message, etc.)
- "unknown": Command cannot be understood

Available routes:
- /profile - User's profile page
- /dashboard - Main dashboard
- /messages - Messages/chat page
- /jobs - Browse jobs
- /browse-providers - Browse service providers
- /post-job - Post a new job
- /my-orders - View orders
- /ongoing-jobs - View ongoing jobs
- /wishlist - View wishlist
- /notifications - View notifications
- /settings - Settings page
- /wallet - Wallet page
- /referrals - Referrals page
- /leaderboard - Leaderboard page
- /community - Community page
- /collaboration - Collaboration page
- /verification - Verification page

Return ONLY valid JSON in this exact format (no markdown, no code blocks):
{
  "intent": "navigate|search|switch_role|action|unknown",
  "route": "/path/to/page",
  "query": "optional search keywords",
  "action": "optional action type",
  "feedback": "brief confirmation message for voice feedback"
}

Examples:
User: "Go to my profile"
Response: {"intent":"navigate","route":"/profile","feedback":"Opening your profile"}

User: "Find React developers in Hyderabad"
Response: {"intent":"search","route":"/browse-providers","query":"React developers Hyderabad","feedback":"Searching for React developers in Hyderabad"}

User: "Switch to client mode"
Response: {"intent":"switch_role","route":"/dashboard","feedback":"Switching to client mode"}

User: "Post a new job"
Response: {"intent":"action","route":"/post-job","action":"post_job","feedback":"Opening job posting form"}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Navigate,
    Search,
    SwitchRole,
    Action,
    Unknown,
}

impl Intent {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "navigate" => Some(Intent::Navigate),
            "search" => Some(Intent::Search),
            "switch_role" => Some(Intent::SwitchRole),
            "action" => Some(Intent::Action),
            "unknown" => Some(Intent::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceIntent {
    pub command: String,
    pub intent: Intent,
    pub route: Option<String>,
    pub query: Option<String>,
    pub action: Option<String>,
    pub feedback: String,
}

fn non_empty(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalises the model's raw answer. Anything that is not a JSON object
/// becomes `unknown` with the fallback feedback.
pub fn normalize(command: &str, raw: &str) -> VoiceIntent {
    let parsed = serde_json::from_str::<Value>(raw)
        .ok()
        .filter(Value::is_object);

    let parsed = match parsed {
        Some(parsed) => parsed,
        None => {
            log::warn!("unparseable intent from model: {}", raw);
            return VoiceIntent {
                command: command.to_string(),
                intent: Intent::Unknown,
                route: None,
                query: None,
                action: None,
                feedback: FALLBACK_FEEDBACK.to_string(),
            };
        }
    };

    let intent = parsed
        .get("intent")
        .and_then(Value::as_str)
        .and_then(Intent::parse)
        .unwrap_or(Intent::Unknown);

    VoiceIntent {
        command: command.to_string(),
        intent,
        route: non_empty(&parsed, "route"),
        query: non_empty(&parsed, "query"),
        action: non_empty(&parsed, "action"),
        feedback: non_empty(&parsed, "feedback").unwrap_or_else(|| DEFAULT_FEEDBACK.to_string()),
    }
}

fn request_body(model: &str, command: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": format!("User command: \"{command}\"") },
        ],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
        "response_format": { "type": "json_object" },
    })
}

/// Validates the command, calls the model and normalises its answer.
pub async fn interpret(
    http: &reqwest::Client,
    config: &Config,
    command: Option<&str>,
) -> AppResult<VoiceIntent> {
    let command = command
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("Command is required and must be a non-empty string"))?;

    let api_key = config.mistral_api_key.as_deref().ok_or_else(|| {
        log::error!("MISTRAL_API_KEY not configured");
        AppError::Misconfigured("Voice assistant is not configured. Please contact support.".into())
    })?;

    log::info!("processing voice command: {}", command);
    let response = http
        .post(&config.mistral_api_url)
        .bearer_auth(api_key)
        .timeout(config.mistral_timeout)
        .json(&request_body(&config.mistral_model, command))
        .send()
        .await
        .map_err(|e| {
            log::error!("voice assistant unreachable: {}", e);
            AppError::ServiceUnavailable {
                message: "Could not connect to AI assistant. Please check your connection.".into(),
                detail: "Network error".into(),
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        let body: Value = response.json().await.unwrap_or(Value::Null);
        log::error!("voice assistant answered {}: {}", status, body);
        return Err(AppError::Upstream {
            status: status.as_u16(),
            message: "AI assistant is temporarily unavailable. Please try again.".into(),
            detail: non_empty(&body, "message").unwrap_or_else(|| "AI service error".into()),
        });
    }

    let body: Value = response.json().await.map_err(|e| {
        AppError::Internal(format!(
            "An error occurred while processing your command: {e}"
        ))
    })?;
    let content = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::Internal(
                "An error occurred while processing your command: empty completion".into(),
            )
        })?;

    let intent = normalize(command, content);
    log::info!(
        "intent processed: {:?} route={:?} query={:?}",
        intent.intent,
        intent.route,
        intent.query
    );
    Ok(intent)
}
