use std::collections::HashMap;

use chrono::Duration;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::community::{
    rank_trending, validate_comment, Comment, CommunityPost, PostInput, PostType, PostView,
};
use crate::models::user::{UserModel, UserSummary};
use crate::models::{new_id, timestamp, Page, Pagination};
use crate::services::job_service::escape_regex;
use crate::state::AppState;

pub const TRENDING_WINDOW_DAYS: i64 = 7;
pub const TRENDING_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    #[default]
    Recent,
    Popular,
    Discussed,
}

impl PostSort {
    fn document(&self) -> Document {
        match self {
            PostSort::Recent => doc! { "isPinned": -1, "createdAt": -1 },
            PostSort::Popular => doc! { "likeCount": -1, "createdAt": -1 },
            PostSort::Discussed => doc! { "commentCount": -1, "createdAt": -1 },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilters {
    pub post_type: Option<PostType>,
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub sort: PostSort,
}

pub fn list_filter(filters: &PostFilters) -> AppResult<Document> {
    let mut filter = doc! { "isApproved": true };
    if let Some(post_type) = filters.post_type {
        filter.insert("postType", bson::to_bson(&post_type)?);
    }
    if let Some(category) = filters.category.as_deref().filter(|c| !c.is_empty()) {
        filter.insert("category", category);
    }
    if let Some(search) = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = escape_regex(search);
        filter.insert(
            "$or",
            vec![
                doc! { "content": { "$regex": pattern.as_str(), "$options": "i" } },
                doc! { "tags": { "$regex": pattern.as_str(), "$options": "i" } },
            ],
        );
    }
    Ok(filter)
}

/// Counter fields are derived in the pipeline so sorting by them happens in
/// the database.
pub fn list_pipeline(filter: Document, sort: PostSort, page: Page) -> Vec<Document> {
    vec![
        doc! { "$match": filter },
        doc! { "$addFields": {
            "likeCount": { "$size": { "$ifNull": ["$likes", []] } },
            "commentCount": { "$size": { "$ifNull": ["$comments", []] } },
        } },
        doc! { "$sort": sort.document() },
        doc! { "$skip": page.skip() as i64 },
        doc! { "$limit": page.limit as i64 },
    ]
}

async fn authors(state: &AppState, posts: &[CommunityPost]) -> AppResult<HashMap<String, UserSummary>> {
    let mut ids: Vec<String> = posts.iter().map(|p| p.author.clone()).collect();
    ids.sort();
    ids.dedup();
    let users: Vec<UserModel> = state
        .users_collection
        .find(doc! { "_id": { "$in": ids } }, None)
        .await?
        .try_collect()
        .await?;
    Ok(users
        .iter()
        .map(|u| (u.id.clone(), UserSummary::from(u)))
        .collect())
}

async fn views(state: &AppState, posts: Vec<CommunityPost>, viewer: &str) -> AppResult<Vec<PostView>> {
    let authors = authors(state, &posts).await?;
    Ok(posts
        .into_iter()
        .map(|p| {
            let author = authors.get(&p.author).cloned();
            p.view(viewer, author)
        })
        .collect())
}

pub async fn list(
    state: &AppState,
    filters: &PostFilters,
    page: Page,
    viewer: &str,
) -> AppResult<(Vec<PostView>, Pagination)> {
    let filter = list_filter(filters)?;
    let docs: Vec<Document> = state
        .posts_collection
        .clone_with_type::<Document>()
        .aggregate(list_pipeline(filter.clone(), filters.sort, page), None)
        .await?
        .try_collect()
        .await?;
    let posts = docs
        .into_iter()
        .map(bson::from_document::<CommunityPost>)
        .collect::<Result<Vec<_>, _>>()?;
    let total = state.posts_collection.count_documents(filter, None).await?;
    Ok((views(state, posts, viewer).await?, page.pagination(total)))
}

pub async fn trending(state: &AppState, viewer: &str) -> AppResult<Vec<PostView>> {
    let since = timestamp::now() - Duration::days(TRENDING_WINDOW_DAYS);
    let recent: Vec<CommunityPost> = state
        .posts_collection
        .find(
            doc! { "isApproved": true, "createdAt": { "$gte": timestamp::format(&since) } },
            None,
        )
        .await?
        .try_collect()
        .await?;
    views(state, rank_trending(recent, TRENDING_LIMIT), viewer).await
}

pub async fn by_author(state: &AppState, author: &str, page: Page) -> AppResult<(Vec<PostView>, Pagination)> {
    let options = mongodb::options::FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .skip(page.skip())
        .limit(page.limit as i64)
        .build();
    let posts: Vec<CommunityPost> = state
        .posts_collection
        .find(doc! { "author": author }, options)
        .await?
        .try_collect()
        .await?;
    let total = state
        .posts_collection
        .count_documents(doc! { "author": author }, None)
        .await?;
    Ok((views(state, posts, author).await?, page.pagination(total)))
}

fn after() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

pub async fn find(state: &AppState, id: &str) -> AppResult<CommunityPost> {
    state
        .posts_collection
        .find_one(doc! { "_id": id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))
}

/// Fetching a single post counts as a view.
pub async fn view_post(state: &AppState, id: &str, viewer: &str) -> AppResult<PostView> {
    let post = state
        .posts_collection
        .find_one_and_update(
            doc! { "_id": id, "isApproved": true },
            doc! { "$inc": { "viewCount": 1_i64 } },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    Ok(views(state, vec![post], viewer).await?.remove(0))
}

pub async fn create(state: &AppState, author: &str, input: PostInput) -> AppResult<CommunityPost> {
    input.validate(true)?;
    let now = timestamp::now();
    let post = CommunityPost {
        id: new_id(),
        author: author.to_string(),
        content: input.content.unwrap_or_default().trim().to_string(),
        post_type: input.post_type.unwrap_or_default(),
        category: input.category.unwrap_or_else(|| "General".to_string()),
        tags: input.tags.unwrap_or_default(),
        images: input.images.unwrap_or_default(),
        likes: Vec::new(),
        comments: Vec::new(),
        is_pinned: false,
        is_approved: true,
        view_count: 0,
        created_at: now,
        updated_at: now,
    };
    state.posts_collection.insert_one(&post, None).await?;
    Ok(post)
}

pub async fn update(state: &AppState, post: &CommunityPost, input: PostInput) -> AppResult<CommunityPost> {
    input.validate(false)?;
    let mut set = doc! { "updatedAt": timestamp::format(&timestamp::now()) };
    if let Some(content) = &input.content {
        set.insert("content", content.trim());
    }
    if let Some(post_type) = input.post_type {
        set.insert("postType", bson::to_bson(&post_type)?);
    }
    if let Some(category) = &input.category {
        set.insert("category", category.as_str());
    }
    if let Some(tags) = input.tags {
        set.insert("tags", tags);
    }
    if let Some(images) = input.images {
        set.insert("images", images);
    }
    state
        .posts_collection
        .find_one_and_update(doc! { "_id": post.id.as_str() }, doc! { "$set": set }, after())
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))
}

pub async fn delete(state: &AppState, id: &str) -> AppResult<()> {
    state.posts_collection.delete_one(doc! { "_id": id }, None).await?;
    Ok(())
}

/// Toggles the user's like with two guarded single-document updates, so a
/// double tap cannot leave two likes from the same user. Returns the post
/// and whether it is now liked.
pub async fn toggle_like(state: &AppState, id: &str, user_id: &str) -> AppResult<(CommunityPost, bool)> {
    let liked_at = timestamp::format(&timestamp::now());
    let liked = state
        .posts_collection
        .find_one_and_update(
            doc! { "_id": id, "likes.user": { "$ne": user_id } },
            doc! { "$push": { "likes": { "user": user_id, "likedAt": liked_at } } },
            after(),
        )
        .await?;
    if let Some(post) = liked {
        return Ok((post, true));
    }

    let unliked = state
        .posts_collection
        .find_one_and_update(
            doc! { "_id": id, "likes.user": user_id },
            doc! { "$pull": { "likes": { "user": user_id } } },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    Ok((unliked, false))
}

pub async fn add_comment(
    state: &AppState,
    id: &str,
    user_id: &str,
    content: &str,
) -> AppResult<(CommunityPost, Comment)> {
    let comment = Comment {
        id: new_id(),
        user: user_id.to_string(),
        content: validate_comment(content)?,
        created_at: timestamp::now(),
    };
    let post = state
        .posts_collection
        .find_one_and_update(
            doc! { "_id": id },
            doc! { "$push": { "comments": bson::to_bson(&comment)? } },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))?;
    Ok((post, comment))
}

pub async fn delete_comment(state: &AppState, post_id: &str, comment_id: &str) -> AppResult<CommunityPost> {
    state
        .posts_collection
        .find_one_and_update(
            doc! { "_id": post_id },
            doc! { "$pull": { "comments": { "_id": comment_id } } },
            after(),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Post not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_sorts_on_derived_counters() {
        let pipeline = list_pipeline(doc! {}, PostSort::Discussed, Page::new(2, 10));
        let sort = pipeline[2].get_document("$sort").unwrap();
        assert_eq!(sort.keys().next().map(String::as_str), Some("commentCount"));
        assert_eq!(pipeline[3].get_i64("$skip").unwrap(), 10);
    }

    #[test]
    fn only_approved_posts_are_listed() {
        let filter = list_filter(&PostFilters {
            post_type: Some(PostType::Tip),
            ..Default::default()
        })
        .unwrap();
        assert!(filter.get_bool("isApproved").unwrap());
        assert_eq!(filter.get_str("postType").unwrap(), "tip");
    }
}
