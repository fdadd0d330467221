// src/controllers/community_controller.rs

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::community::{PostInput, POST_CATEGORIES};
use crate::models::{parse_id, PageQuery};
use crate::services::community_service::{self, PostFilters};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
}

/// GET /community/posts?postType&category&search&sort&page&limit
#[get("/posts")]
pub async fn list_posts(
    auth: AuthUser,
    filters: web::Query<PostFilters>,
    page: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let (posts, pagination) =
        community_service::list(&data, &filters, page.resolve(20), &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "posts": posts, "pagination": pagination },
    })))
}

/// GET /community/posts/trending
#[get("/posts/trending")]
pub async fn trending_posts(auth: AuthUser, data: web::Data<AppState>) -> AppResult<HttpResponse> {
    let posts = community_service::trending(&data, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "posts": posts },
    })))
}

/// GET /community/posts/my-posts
#[get("/posts/my-posts")]
pub async fn my_posts(
    auth: AuthUser,
    page: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let (posts, pagination) =
        community_service::by_author(&data, &auth.id, page.resolve(20)).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "posts": posts, "pagination": pagination },
    })))
}

/// GET /community/categories
#[get("/categories")]
pub async fn categories(_auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "categories": POST_CATEGORIES },
    }))
}

/// GET /community/posts/{id}
#[get("/posts/{id}")]
pub async fn get_post(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "post")?;
    let post = community_service::view_post(&data, &id, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": { "post": post },
    })))
}

/// POST /community/posts
#[post("/posts")]
pub async fn create_post(
    auth: AuthUser,
    body: web::Json<PostInput>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let post = community_service::create(&data, &auth.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Post created successfully",
        "data": { "post": post },
    })))
}

/// PUT /community/posts/{id}
/// Authors only.
#[put("/posts/{id}")]
pub async fn update_post(
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<PostInput>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "post")?;
    let post = community_service::find(&data, &id).await?;
    if post.author != auth.id {
        return Err(AppError::forbidden("Not authorized to edit this post"));
    }
    let post = community_service::update(&data, &post, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Post updated successfully",
        "data": { "post": post },
    })))
}

/// DELETE /community/posts/{id}
/// Authors and admins.
#[delete("/posts/{id}")]
pub async fn delete_post(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "post")?;
    let post = community_service::find(&data, &id).await?;
    if post.author != auth.id && !auth.is_admin() {
        return Err(AppError::forbidden("Not authorized to delete this post"));
    }
    community_service::delete(&data, &post.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Post deleted successfully",
    })))
}

/// POST /community/posts/{id}/like
/// Toggles the caller's like.
#[post("/posts/{id}/like")]
pub async fn toggle_like(
    auth: AuthUser,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "post")?;
    let (post, liked) = community_service::toggle_like(&data, &id, &auth.id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": if liked { "Post liked" } else { "Post unliked" },
        "data": { "isLiked": liked, "likeCount": post.likes.len() },
    })))
}

/// POST /community/posts/{id}/comment
#[post("/posts/{id}/comment")]
pub async fn add_comment(
    auth: AuthUser,
    path: web::Path<String>,
    body: web::Json<CommentForm>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path.into_inner(), "post")?;
    let (post, comment) =
        community_service::add_comment(&data, &id, &auth.id, &body.content).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Comment added successfully",
        "data": { "comment": comment, "commentCount": post.comments.len() },
    })))
}

/// DELETE /community/posts/{post_id}/comment/{comment_id}
/// The comment's author, the post's author, or an admin.
#[delete("/posts/{post_id}/comment/{comment_id}")]
pub async fn delete_comment(
    auth: AuthUser,
    path: web::Path<(String, String)>,
    data: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let post_id = parse_id(&post_id, "post")?;
    let comment_id = parse_id(&comment_id, "comment")?;

    let post = community_service::find(&data, &post_id).await?;
    let comment = post
        .comments
        .iter()
        .find(|c| c.id == comment_id)
        .ok_or_else(|| AppError::not_found("Comment not found"))?;
    if comment.user != auth.id && post.author != auth.id && !auth.is_admin() {
        return Err(AppError::forbidden("Not authorized to delete this comment"));
    }

    let post = community_service::delete_comment(&data, &post_id, &comment_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Comment deleted successfully",
        "data": { "commentCount": post.comments.len() },
    })))
}
