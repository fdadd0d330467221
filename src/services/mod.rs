// src/services/mod.rs

pub mod auth_service;
pub mod call_service;
pub mod community_service;
pub mod email_service;
pub mod job_service;
pub mod message_service;
pub mod notification_service;
pub mod order_service;
pub mod presence;
pub mod proposal_service;
pub mod upload_service;
pub mod verification_service;
pub mod voice_intent;
pub mod wallet_service;
