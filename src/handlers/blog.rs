//! Blog post CRUD. Create requires authentication; update and delete are
//! owner-or-admin, checked against the live record.

use std::sync::Arc;

use hyper::{Body, Request, StatusCode};

use crate::auth::middleware::current_user;
use crate::auth::models::{AuthUser, Role};
use crate::database::models::{BlogPost, NewPost, PostUpdate};
use crate::database::repositories::PostFilter;
use crate::errors::ApiError;
use crate::request::{bool_flag, json_body, param, query_pairs, Pagination};
use crate::response::{self, ApiResponse};
use crate::state::AppState;

fn ensure_owner_or_admin(post: &BlogPost, user: &AuthUser, action: &str) -> Result<(), ApiError> {
    if post.author.id != user.id && user.role != Role::Admin {
        return Err(ApiError::Forbidden(format!(
            "Not authorized to {} this post",
            action
        )));
    }
    Ok(())
}

pub async fn list(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let query = query_pairs(&req);
    let pagination = Pagination::from_query(&query);
    let filter = PostFilter {
        category: query.get("category").cloned(),
        published: bool_flag(&query, "published"),
    };

    let (posts, total) = state
        .posts
        .list(filter, i64::from(pagination.limit), pagination.offset())
        .await?;
    Ok(response::list(posts.len(), total, &posts))
}

pub async fn get(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let id = param(&req, "id")?;
    let post = state
        .posts
        .read(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &post))
}

pub async fn create(mut req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let input: NewPost = json_body(&mut req).await?;
    let post = state.posts.create(&user.id, input).await?;
    Ok(response::data(StatusCode::CREATED, &post))
}

pub async fn update(mut req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let id = param(&req, "id")?.to_string();
    let input: PostUpdate = json_body(&mut req).await?;

    let post = state
        .posts
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
    ensure_owner_or_admin(&post, &user, "update")?;

    let post = state
        .posts
        .update(&id, input)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &post))
}

pub async fn delete(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let id = param(&req, "id")?;

    let post = state
        .posts
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
    ensure_owner_or_admin(&post, &user, "delete")?;

    state.posts.delete(id).await?;
    Ok(response::message(StatusCode::OK, "Post deleted successfully"))
}
