// src/routes/community_routes.rs

use actix_web::web;

use crate::controllers::community_controller::{
    add_comment, categories, create_post, delete_comment, delete_post, get_post, list_posts,
    my_posts, toggle_like, trending_posts, update_post,
};

/// Literal `/posts/...` paths are registered before `/posts/{id}`.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/community")
            .service(categories)
            .service(trending_posts)
            .service(my_posts)
            .service(list_posts)
            .service(create_post)
            .service(get_post)
            .service(update_post)
            .service(delete_post)
            .service(toggle_like)
            .service(add_comment)
            .service(delete_comment),
    );
}
