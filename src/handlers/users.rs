//! User profile self-service and the admin member listing.

use std::sync::Arc;

use hyper::{Body, Request, StatusCode};

use crate::auth::middleware::current_user;
use crate::auth::models::ProfileUpdateInput;
use crate::errors::ApiError;
use crate::request::json_body;
use crate::response::{self, ApiResponse};
use crate::state::AppState;

pub async fn profile(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?;
    let user = state
        .users
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &user.to_auth_user()))
}

pub async fn update_profile(
    mut req: Request<Body>,
    state: Arc<AppState>,
) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let input: ProfileUpdateInput = json_body(&mut req).await?;

    let updated = state
        .users
        .update_profile(&user.id, input.name, input.phone, input.bio, input.student_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &updated.to_auth_user()))
}

pub async fn list_all(_req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let users = state.users.list_all().await?;
    let sanitized: Vec<_> = users.iter().map(|u| u.to_auth_user()).collect();
    Ok(ApiResponse::new(StatusCode::OK).json(&serde_json::json!({
        "success": true,
        "count": sanitized.len(),
        "data": sanitized,
    })))
}
