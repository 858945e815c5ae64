//! Registration, login, logout, and session rehydration.

use std::sync::Arc;

use cookie::time::Duration as CookieDuration;
use cookie::{Cookie, SameSite};
use hyper::{Body, Request, StatusCode};

use crate::auth::middleware::current_user;
use crate::auth::models::{AuthData, LoginInput, RegisterInput};
use crate::auth::SESSION_COOKIE;
use crate::errors::ApiError;
use crate::request::json_body;
use crate::response::{self, ApiResponse};
use crate::state::AppState;

/// Build the HTTP-only session cookie carrying the token.
fn session_cookie(token: &str, expiration_days: i64) -> String {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::days(expiration_days))
        .build()
        .to_string()
}

pub async fn register(
    mut req: Request<Body>,
    state: Arc<AppState>,
) -> Result<ApiResponse, ApiError> {
    let input: RegisterInput = json_body(&mut req).await?;

    if input.name.trim().is_empty() {
        return Err(ApiError::Validation("Please provide a name".to_string()));
    }
    if !input.email.contains('@') {
        return Err(ApiError::Validation(
            "Please provide a valid email".to_string(),
        ));
    }
    if input.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let password_hash = state
        .passwords
        .hash_password(&input.password)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = state
        .users
        .create(
            input.name.trim(),
            &input.email,
            &password_hash,
            input.student_id.as_deref(),
            input.phone.as_deref(),
        )
        .await?
        .ok_or_else(|| ApiError::Conflict("User already exists".to_string()))?;

    let token = state
        .jwt
        .issue(&user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(response::data(
        StatusCode::CREATED,
        &AuthData {
            user: user.to_auth_user(),
            token: token.clone(),
        },
    )
    .header(
        "Set-Cookie",
        &session_cookie(&token, state.config.auth.token_expiration_days),
    ))
}

pub async fn login(mut req: Request<Body>, state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let input: LoginInput = json_body(&mut req).await?;

    let (email, password) = match (input.email, input.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => {
            return Err(ApiError::Validation(
                "Please provide email and password".to_string(),
            ))
        }
    };

    // Unknown email and wrong password produce the same status and message,
    // so login cannot be used to probe which addresses are registered.
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let matches = state
        .passwords
        .verify_password(&password, &user.password_hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !matches {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state
        .jwt
        .issue(&user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(response::data(
        StatusCode::OK,
        &AuthData {
            user: user.to_auth_user(),
            token: token.clone(),
        },
    )
    .header(
        "Set-Cookie",
        &session_cookie(&token, state.config.auth.token_expiration_days),
    ))
}

/// Logout overwrites the cookie client-side. There is no server-side token
/// blacklist, so an already-issued token stays valid until its expiry.
pub async fn logout(_req: Request<Body>, _state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let cookie = Cookie::build((SESSION_COOKIE, "none"))
        .http_only(true)
        .path("/")
        .max_age(CookieDuration::seconds(10))
        .build()
        .to_string();

    Ok(response::message(StatusCode::OK, "Logged out successfully").header("Set-Cookie", &cookie))
}

pub async fn me(req: Request<Body>, _state: Arc<AppState>) -> Result<ApiResponse, ApiError> {
    let user = current_user(&req)?;
    Ok(response::data(StatusCode::OK, user))
}
