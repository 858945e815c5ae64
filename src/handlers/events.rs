//! Event CRUD and registration.

use std::sync::Arc;

use hyper::{Body, Request, StatusCode};

use crate::auth::middleware::current_user;
use crate::auth::models::{AuthUser, Role};
use crate::database::models::{Event, EventUpdate, NewEvent};
use crate::database::repositories::{EventFilter, RegisterOutcome};
use crate::errors::ApiError;
use crate::request::{bool_flag, json_body, param, query_pairs, Pagination};
use crate::response::{self, ApiResponse};
use crate::state::AppState;

fn ensure_organizer_or_admin(
    event: &Event,
    user: &AuthUser,
    action: &str,
) -> Result<(), ApiError> {
    if event.organizer.id != user.id && user.role != Role::Admin {
        return Err(ApiError::Forbidden(format!(
            "Not authorized to {} this event",
            action
        )));
    }
    Ok(())
}

pub async fn list(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let query = query_pairs(&req);
    let pagination = Pagination::from_query(&query);
    let filter = EventFilter {
        published: bool_flag(&query, "published"),
        upcoming: bool_flag(&query, "upcoming").unwrap_or(false),
    };

    let (events, total) = state
        .events
        .list(filter, i64::from(pagination.limit), pagination.offset())
        .await?;
    Ok(response::list(events.len(), total, &events))
}

pub async fn get(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let id = param(&req, "id")?;
    let event = state
        .events
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &event))
}

pub async fn create(mut req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let input: NewEvent = json_body(&mut req).await?;
    if let Some(max) = input.max_participants {
        if max < 1 {
            return Err(ApiError::Validation(
                "maxParticipants must be at least 1".to_string(),
            ));
        }
    }
    let event = state.events.create(&user.id, input).await?;
    Ok(response::data(StatusCode::CREATED, &event))
}

pub async fn update(mut req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let id = param(&req, "id")?.to_string();
    let input: EventUpdate = json_body(&mut req).await?;

    let event = state
        .events
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;
    ensure_organizer_or_admin(&event, &user, "update")?;

    let event = state
        .events
        .update(&id, input)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &event))
}

pub async fn delete(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let id = param(&req, "id")?;

    let event = state
        .events
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;
    ensure_organizer_or_admin(&event, &user, "delete")?;

    state.events.delete(id).await?;
    Ok(response::message(
        StatusCode::OK,
        "Event deleted successfully",
    ))
}

pub async fn register(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let id = param(&req, "id")?;

    match state.events.register(id, &user.id).await? {
        RegisterOutcome::Registered(event) => Ok(response::message_with_data(
            StatusCode::OK,
            "Registered for event successfully",
            &event,
        )),
        RegisterOutcome::NotFound => Err(ApiError::NotFound("Event not found".to_string())),
        RegisterOutcome::NotRequired => Err(ApiError::Conflict(
            "Event does not require registration".to_string(),
        )),
        RegisterOutcome::AlreadyRegistered => Err(ApiError::Conflict(
            "Already registered for this event".to_string(),
        )),
        RegisterOutcome::Full => Err(ApiError::Conflict("Event is full".to_string())),
    }
}
