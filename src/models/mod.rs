// src/models/mod.rs

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub mod call;
pub mod community;
pub mod conversation;
pub mod job;
pub mod message;
pub mod notification;
pub mod order;
pub mod presence;
pub mod proposal;
pub mod timestamp;
pub mod user;
pub mod wallet;

/// Returns a new ObjectId as a hex string. Used as the default `_id`.
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

/// Ids travel as hex strings; anything else is rejected before it reaches a
/// query or a dotted update path.
pub fn parse_id(raw: &str, what: &str) -> Result<String, AppError> {
    ObjectId::parse_str(raw)
        .map(|oid| oid.to_hex())
        .map_err(|_| AppError::bad_request(format!("Invalid {what} id")))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl PageQuery {
    pub fn resolve(&self, default_limit: u64) -> Page {
        Page::new(self.page.unwrap_or(1), self.limit.unwrap_or(default_limit))
    }
}

/// Pages past this are clamped; deeper offsets are never useful and would
/// overflow the skip.
pub const MAX_PAGE: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            limit: limit.clamp(1, 100),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn pagination(&self, total: u64) -> Pagination {
        Pagination {
            total,
            page: self.page,
            limit: self.limit,
            pages: (total + self.limit - 1) / self.limit,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_math() {
        let page = Page::new(3, 20);
        assert_eq!(page.skip(), 40);
        assert_eq!(page.pagination(41).pages, 3);
        assert_eq!(Page::new(0, 0), Page::new(1, 1));
    }

    #[test]
    fn huge_page_numbers_are_clamped() {
        let query = PageQuery {
            page: Some(u64::MAX),
            limit: Some(100),
        };
        let page = query.resolve(20);
        assert_eq!(page.page, MAX_PAGE);
        assert_eq!(page.skip(), (MAX_PAGE - 1) * 100);
        assert!(i64::try_from(page.skip()).is_ok());
    }

    #[test]
    fn ids_must_be_object_ids() {
        assert!(parse_id("65f0c2a9e4b0a1b2c3d4e5f6", "user").is_ok());
        assert!(parse_id("unreadCount.$", "user").is_err());
    }
}
