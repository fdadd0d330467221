use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserSummary;
use super::{new_id, timestamp};
use crate::error::AppError;

pub const MAX_POST_CHARS: usize = 2000;
pub const MAX_COMMENT_CHARS: usize = 500;

pub const POST_CATEGORIES: &[&str] = &[
    "General",
    "Technical",
    "Non-Technical",
    "Business Tips",
    "Client Advice",
    "Success Stories",
    "Help & Support",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Discussion,
    Tip,
    Question,
    Showcase,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub user: String,
    #[serde(with = "timestamp")]
    pub liked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    pub user: String,
    pub content: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    #[serde(rename = "_id", default = "new_id")]
    pub id: String,
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub post_type: PostType,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub likes: Vec<Like>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default = "default_approved")]
    pub is_approved: bool,
    #[serde(default)]
    pub view_count: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn default_category() -> String {
    "General".to_string()
}

fn default_approved() -> bool {
    true
}

impl CommunityPost {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|l| l.user == user_id)
    }

    pub fn engagement_score(&self) -> i64 {
        self.likes.len() as i64 * 2 + self.comments.len() as i64 * 3 + self.view_count
    }

    pub fn view(self, viewer: &str, author: Option<UserSummary>) -> PostView {
        PostView {
            like_count: self.likes.len(),
            comment_count: self.comments.len(),
            is_liked_by_user: self.is_liked_by(viewer),
            engagement_score: self.engagement_score(),
            author_profile: author,
            post: self,
        }
    }
}

/// Posts as listed to clients, with derived counters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: CommunityPost,
    pub author_profile: Option<UserSummary>,
    pub like_count: usize,
    pub comment_count: usize,
    pub is_liked_by_user: bool,
    pub engagement_score: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub content: Option<String>,
    pub post_type: Option<PostType>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
}

impl PostInput {
    pub fn validate(&self, creating: bool) -> Result<(), AppError> {
        match self.content.as_deref().map(str::trim) {
            Some(c) if c.is_empty() => return Err(AppError::bad_request("Content is required")),
            Some(c) if c.chars().count() > MAX_POST_CHARS => {
                return Err(AppError::bad_request("Content must be at most 2000 characters"))
            }
            None if creating => return Err(AppError::bad_request("Content is required")),
            _ => {}
        }
        if let Some(category) = &self.category {
            if !POST_CATEGORIES.contains(&category.as_str()) {
                return Err(AppError::bad_request(format!("Unknown category '{category}'")));
            }
        }
        Ok(())
    }
}

pub fn validate_comment(content: &str) -> Result<String, AppError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request("Comment content is required"));
    }
    if trimmed.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::bad_request("Comment must be at most 500 characters"));
    }
    Ok(trimmed.to_string())
}

/// Highest engagement first; ties go to the newer post.
pub fn rank_trending(mut posts: Vec<CommunityPost>, limit: usize) -> Vec<CommunityPost> {
    posts.sort_by(|a, b| {
        b.engagement_score()
            .cmp(&a.engagement_score())
            .then(b.created_at.cmp(&a.created_at))
    });
    posts.truncate(limit);
    posts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(likes: usize, comments: usize, views: i64) -> CommunityPost {
        let now = timestamp::now();
        CommunityPost {
            id: new_id(),
            author: "author".into(),
            content: "hello".into(),
            post_type: PostType::Discussion,
            category: default_category(),
            tags: vec![],
            images: vec![],
            likes: (0..likes)
                .map(|i| Like {
                    user: format!("u{i}"),
                    liked_at: now,
                })
                .collect(),
            comments: (0..comments)
                .map(|i| Comment {
                    id: new_id(),
                    user: format!("c{i}"),
                    content: "nice".into(),
                    created_at: now,
                })
                .collect(),
            is_pinned: false,
            is_approved: true,
            view_count: views,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn view_derives_counters_for_the_viewer() {
        let view = post(2, 1, 4).view("u1", None);
        assert_eq!(view.like_count, 2);
        assert_eq!(view.comment_count, 1);
        assert!(view.is_liked_by_user);
        assert_eq!(view.engagement_score, 11);
        assert!(!post(2, 1, 4).view("stranger", None).is_liked_by_user);
    }

    #[test]
    fn trending_weights_comments_over_likes() {
        let liked = post(3, 0, 0); // 6
        let discussed = post(0, 3, 0); // 9
        let viewed = post(0, 0, 7); // 7
        let ranked = rank_trending(vec![liked, viewed, discussed], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].engagement_score(), 9);
        assert_eq!(ranked[1].engagement_score(), 7);
    }

    #[test]
    fn blank_content_is_rejected() {
        let input = PostInput {
            content: Some("   ".into()),
            post_type: None,
            category: None,
            tags: None,
            images: None,
        };
        assert!(input.validate(true).is_err());
        assert!(validate_comment(&"x".repeat(501)).is_err());
    }
}
