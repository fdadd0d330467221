// src/controllers/mod.rs

pub mod auth_controller;
pub mod communication_controller;
pub mod community_controller;
pub mod health_controller;
pub mod job_controller;
pub mod message_controller;
pub mod notification_controller;
pub mod order_controller;
pub mod proposal_controller;
pub mod verification_controller;
pub mod voice_controller;
pub mod wallet_controller;
