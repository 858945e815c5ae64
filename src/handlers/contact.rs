//! Contact desk: public submission, admin triage.

use std::sync::Arc;

use hyper::{Body, Request, StatusCode};

use crate::auth::middleware::current_user;
use crate::database::models::{ContactStatus, ContactUpdate, NewContact};
use crate::errors::ApiError;
use crate::request::{json_body, param, query_pairs, Pagination};
use crate::response::{self, ApiResponse};
use crate::state::AppState;

pub async fn create(mut req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let input: NewContact = json_body(&mut req).await?;
    if !input.email.contains('@') {
        return Err(ApiError::Validation(
            "Please provide a valid email".to_string(),
        ));
    }
    let contact = state.contacts.create(input).await?;
    Ok(response::message_with_data(
        StatusCode::CREATED,
        "Contact message sent successfully",
        &contact,
    ))
}

pub async fn list(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let query = query_pairs(&req);
    let pagination = Pagination::from_query(&query);
    let status = query
        .get("status")
        .map(|s| ContactStatus::from_db(s));

    let (contacts, total) = state
        .contacts
        .list(status, i64::from(pagination.limit), pagination.offset())
        .await?;
    Ok(response::list(contacts.len(), total, &contacts))
}

pub async fn get(req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let id = param(&req, "id")?;
    let contact = state
        .contacts
        .find(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Contact message not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &contact))
}

pub async fn update(mut req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?.clone();
    let id = param(&req, "id")?.to_string();
    let input: ContactUpdate = json_body(&mut req).await?;

    let contact = state
        .contacts
        .update(&id, input, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Contact message not found".to_string()))?;
    Ok(response::data(StatusCode::OK, &contact))
}

/// Static association contact block shown on the public contact page.
pub async fn info(_req: Request<Body>, _state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let info = serde_json::json!({
        "email": "bitsaclub@ueab.ac.ke",
        "president": {
            "name": "Alpha Chamba",
            "phone": "0708898899",
        },
        "vicePresident": {
            "name": "Gloria Jebet",
            "phone": "0725486687",
        },
    });
    Ok(response::data(StatusCode::OK, &info))
}
