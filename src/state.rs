// src/state.rs

use std::sync::Arc;

use mongodb::{Collection, Database};

use crate::config::Config;
use crate::models::community::CommunityPost;
use crate::models::conversation::Conversation;
use crate::models::job::Job;
use crate::models::message::Message;
use crate::models::notification::Notification;
use crate::models::order::Order;
use crate::models::proposal::Proposal;
use crate::models::user::UserModel;
use crate::models::wallet::{Transaction, Wallet};
use crate::services::presence::PresenceRegistry;

#[derive(Clone)]
pub struct AppState {
    pub users_collection: Collection<UserModel>,
    pub jobs_collection: Collection<Job>,
    pub proposals_collection: Collection<Proposal>,
    pub orders_collection: Collection<Order>,
    pub conversations_collection: Collection<Conversation>,
    pub messages_collection: Collection<Message>,
    pub wallets_collection: Collection<Wallet>,
    pub transactions_collection: Collection<Transaction>,
    pub posts_collection: Collection<CommunityPost>,
    pub notifications_collection: Collection<Notification>,
    pub db: Database,
    pub config: Arc<Config>,
    pub presence: Arc<PresenceRegistry>,
    /// Shared outbound client (connection pool) for third-party APIs.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        Self {
            users_collection: db.collection("users"),
            jobs_collection: db.collection("jobs"),
            proposals_collection: db.collection("proposals"),
            orders_collection: db.collection("orders"),
            conversations_collection: db.collection("conversations"),
            messages_collection: db.collection("messages"),
            wallets_collection: db.collection("wallets"),
            transactions_collection: db.collection("transactions"),
            posts_collection: db.collection("community_posts"),
            notifications_collection: db.collection("notifications"),
            db,
            config: Arc::new(config),
            presence: Arc::new(PresenceRegistry::default()),
            http: reqwest::Client::new(),
        }
    }
}
