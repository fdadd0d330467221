//! In-process presence. Clients heartbeat `PUT /messages/status` and
//! `PUT /messages/typing`; readers derive a [`UserStatus`] from how recent
//! those heartbeats are. Nothing here is persisted, so a restart simply
//! shows everyone offline until their next heartbeat.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::models::presence::UserStatus;
use crate::models::timestamp;

pub const ONLINE_TTL: Duration = Duration::from_secs(30);
pub const TYPING_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct Entry {
    online: bool,
    heartbeat: Instant,
    last_seen: DateTime<Utc>,
    typing: Option<Typing>,
}

#[derive(Debug, Clone)]
struct Typing {
    to: String,
    at: Instant,
}

#[derive(Debug)]
pub struct PresenceRegistry {
    entries: RwLock<HashMap<String, Entry>>,
    online_ttl: Duration,
    typing_ttl: Duration,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::with_ttls(ONLINE_TTL, TYPING_TTL)
    }
}

impl PresenceRegistry {
    pub fn with_ttls(online_ttl: Duration, typing_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            online_ttl,
            typing_ttl,
        }
    }

    pub fn set_online(&self, user_id: &str, online: bool) {
        self.set_online_at(user_id, online, Instant::now(), timestamp::now());
    }

    pub fn set_typing(&self, user_id: &str, receiver_id: &str, typing: bool) {
        self.set_typing_at(user_id, receiver_id, typing, Instant::now(), timestamp::now());
    }

    pub fn status(&self, user_id: &str, viewer_id: &str) -> UserStatus {
        self.status_at(user_id, viewer_id, Instant::now())
    }

    pub fn set_online_at(&self, user_id: &str, online: bool, now: Instant, wall: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(user_id.to_string()).or_insert_with(|| Entry {
            online,
            heartbeat: now,
            last_seen: wall,
            typing: None,
        });
        entry.online = online;
        entry.heartbeat = now;
        entry.last_seen = wall;
        if !online {
            entry.typing = None;
        }
    }

    /// Typing implies online, so it refreshes the heartbeat too.
    pub fn set_typing_at(
        &self,
        user_id: &str,
        receiver_id: &str,
        typing: bool,
        now: Instant,
        wall: DateTime<Utc>,
    ) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(user_id.to_string()).or_insert_with(|| Entry {
            online: true,
            heartbeat: now,
            last_seen: wall,
            typing: None,
        });
        entry.online = true;
        entry.heartbeat = now;
        entry.last_seen = wall;
        entry.typing = typing.then(|| Typing {
            to: receiver_id.to_string(),
            at: now,
        });
    }

    /// How `user_id` looks to `viewer_id`. Typing is only reported to the
    /// peer being typed to.
    pub fn status_at(&self, user_id: &str, viewer_id: &str, now: Instant) -> UserStatus {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = match entries.get(user_id) {
            Some(entry) => entry,
            None => return UserStatus::offline(user_id),
        };

        let is_online =
            entry.online && now.saturating_duration_since(entry.heartbeat) < self.online_ttl;
        let is_typing = is_online
            && entry.typing.as_ref().map_or(false, |t| {
                t.to == viewer_id && now.saturating_duration_since(t.at) < self.typing_ttl
            });

        UserStatus {
            user_id: user_id.to_string(),
            is_online,
            is_typing,
            last_seen: Some(entry.last_seen),
        }
    }

    /// Drops entries that have been silent for longer than the online TTL.
    /// Returns how many were removed.
    pub fn prune(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, e| now.saturating_duration_since(e.heartbeat) < self.online_ttl);
        before - entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_users_are_offline() {
        let registry = PresenceRegistry::default();
        let status = registry.status("ghost", "me");
        assert!(!status.is_online);
        assert!(status.last_seen.is_none());
    }

    #[test]
    fn online_expires_without_heartbeat() {
        let registry = PresenceRegistry::default();
        let t0 = Instant::now();
        registry.set_online_at("alice", true, t0, timestamp::now());

        assert!(registry.status_at("alice", "bob", t0 + Duration::from_secs(29)).is_online);
        let stale = registry.status_at("alice", "bob", t0 + Duration::from_secs(31));
        assert!(!stale.is_online);
        assert!(stale.last_seen.is_some());
    }

    #[test]
    fn typing_is_visible_only_to_its_peer_and_expires() {
        let registry = PresenceRegistry::default();
        let t0 = Instant::now();
        registry.set_typing_at("alice", "bob", true, t0, timestamp::now());

        assert!(registry.status_at("alice", "bob", t0).is_typing);
        assert!(!registry.status_at("alice", "carol", t0).is_typing);
        assert!(!registry.status_at("alice", "bob", t0 + Duration::from_secs(6)).is_typing);
        assert!(registry.status_at("alice", "bob", t0 + Duration::from_secs(6)).is_online);
    }

    #[test]
    fn going_offline_clears_typing() {
        let registry = PresenceRegistry::default();
        let t0 = Instant::now();
        registry.set_typing_at("alice", "bob", true, t0, timestamp::now());
        registry.set_online_at("alice", false, t0, timestamp::now());
        let status = registry.status_at("alice", "bob", t0);
        assert!(!status.is_online);
        assert!(!status.is_typing);
    }

    #[test]
    fn prune_forgets_silent_users() {
        let registry = PresenceRegistry::default();
        let t0 = Instant::now();
        registry.set_online_at("alice", true, t0, timestamp::now());
        registry.set_online_at("bob", true, t0 + Duration::from_secs(20), timestamp::now());
        assert_eq!(registry.prune(t0 + Duration::from_secs(35)), 1);
    }
}
