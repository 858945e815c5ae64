//! Admin dashboard and member moderation. Every route here sits behind the
//! admin role gate.

use std::sync::Arc;

use hyper::{Body, Request, StatusCode};

use crate::auth::models::{Role, RoleUpdateInput};
use crate::database::models::{
    ContactCounts, CountTotal, DashboardStats, PublishableCounts,
};
use crate::errors::ApiError;
use crate::request::{json_body, param};
use crate::response::{self, ApiResponse};
use crate::state::AppState;

pub async fn stats(_req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let total_users = state.users.count().await?;
    let total_posts = state.posts.count().await?;
    let published_posts = state.posts.count_published().await?;
    let total_events = state.events.count().await?;
    let published_events = state.events.count_published().await?;
    let total_galleries = state.galleries.count().await?;
    let total_contacts = state.contacts.count().await?;
    let pending_contacts = state.contacts.count_pending().await?;

    let stats = DashboardStats {
        users: CountTotal { total: total_users },
        posts: PublishableCounts {
            total: total_posts,
            published: published_posts,
            draft: total_posts - published_posts,
        },
        events: PublishableCounts {
            total: total_events,
            published: published_events,
            draft: total_events - published_events,
        },
        galleries: CountTotal {
            total: total_galleries,
        },
        contacts: ContactCounts {
            total: total_contacts,
            pending: pending_contacts,
        },
    };
    Ok(response::data(StatusCode::OK, &stats))
}

pub async fn update_user_role(
    mut req: Request<Body>,
    state: Arc<AppState>,
) -> Result<ApiResponse, ApiError> {
    let id = param(&req, "id")?.to_string();
    let input: RoleUpdateInput = json_body(&mut req).await?;

    let user = state
        .users
        .update_role(&id, input.role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &user.to_auth_user()))
}

pub async fn delete_user(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let id = param(&req, "id")?;

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // Admin accounts are never deletable through this endpoint, whoever asks.
    if user.role == Role::Admin {
        return Err(ApiError::Conflict("Cannot delete admin user".to_string()));
    }

    state.users.delete(id).await?;
    Ok(response::message(StatusCode::OK, "User deleted successfully"))
}
