//! Photo gallery CRUD. Images are stored as plain URL strings; there is no
//! upload pipeline here.

use std::sync::Arc;

use hyper::{Body, Request, StatusCode};

use crate::auth::middleware::current_user;
use crate::auth::models::{AuthUser, Role};
use crate::database::models::{Gallery, GalleryUpdate, NewGallery};
use crate::errors::ApiError;
use crate::request::{bool_flag, json_body, param, query_pairs, Pagination};
use crate::response::{self, ApiResponse};
use crate::state::AppState;

fn ensure_uploader_or_admin(
    gallery: &Gallery,
    user: &AuthUser,
    action: &str,
) -> Result<(), ApiError> {
    if gallery.uploaded_by.id != user.id && user.role != Role::Admin {
        return Err(ApiError::Forbidden(format!(
            "Not authorized to {} this gallery",
            action
        )));
    }
    Ok(())
}

pub async fn list(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let query = query_pairs(&req);
    let pagination = Pagination::from_query(&query);

    let (galleries, total) = state
        .galleries
        .list(
            bool_flag(&query, "published"),
            i64::from(pagination.limit),
            pagination.offset(),
        )
        .await?;
    Ok(response::list(galleries.len(), total, &galleries))
}

pub async fn get(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let id = param(&req, "id")?;
    let gallery = state
        .galleries
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Gallery not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &gallery))
}

pub async fn create(mut req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let input: NewGallery = json_body(&mut req).await?;
    if input.images.is_empty() {
        return Err(ApiError::Validation(
            "Please provide at least one image".to_string(),
        ));
    }
    let gallery = state.galleries.create(&user.id, input).await?;
    Ok(response::data(StatusCode::CREATED, &gallery))
}

pub async fn update(mut req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let id = param(&req, "id")?.to_string();
    let input: GalleryUpdate = json_body(&mut req).await?;

    let gallery = state
        .galleries
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Gallery not found".to_string()))?;
    ensure_uploader_or_admin(&gallery, &user, "update")?;

    let gallery = state
        .galleries
        .update(&id, input)
        .await?
        .ok_or_else(|| ApiError::NotFound("Gallery not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &gallery))
}

pub async fn delete(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let id = param(&req, "id")?;

    let gallery = state
        .galleries
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Gallery not found".to_string()))?;
    ensure_uploader_or_admin(&gallery, &user, "delete")?;

    state.galleries.delete(id).await?;
    Ok(response::message(
        StatusCode::OK,
        "Gallery deleted successfully",
    ))
}
