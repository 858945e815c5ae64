//! Authentication middleware for protecting routes.
//!
//! [`AuthMiddleware`] recovers the identity from the bearer header or the
//! session cookie, then loads the live user record — so a deleted user loses
//! access immediately and a role change applies without re-login.
//! [`RequireRole`] gates a route on the authenticated identity's role.

use std::pin::Pin;
use std::sync::Arc;

use hyper::header::{AUTHORIZATION, COOKIE};
use hyper::{Body, HeaderMap, Request, Response, StatusCode};

use crate::auth::models::{AuthUser, Role};
use crate::errors::ApiError;
use crate::middleware::{Middleware, MiddlewareResult};
use crate::state::AppState;

const UNAUTHORIZED_MESSAGE: &str = "Not authorized to access this route";

/// Authentication middleware: verifies the session token and attaches the
/// live user to the request extensions.
pub struct AuthMiddleware {
    state: Arc<AppState>,
}

impl AuthMiddleware {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Extract the token from the Authorization header.
    fn extract_bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    }

    /// Extract the token from the session cookie.
    fn extract_cookie(headers: &HeaderMap) -> Option<String> {
        headers
            .get(COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|cookie_str| {
                cookie_str.split(';').find_map(|raw| {
                    let parsed = cookie::Cookie::parse(raw.trim()).ok()?;
                    if parsed.name() == crate::auth::SESSION_COOKIE {
                        Some(parsed.value().to_string())
                    } else {
                        None
                    }
                })
            })
    }

    async fn authenticate(&self, headers: &HeaderMap) -> Option<AuthUser> {
        let token = Self::extract_bearer(headers).or_else(|| Self::extract_cookie(headers))?;
        let claims = self.state.jwt.validate(&token).ok()?;
        // Live lookup: the token proves identity only; role and existence
        // come from the store on every request.
        let user = self.state.users.find_by_id(&claims.sub).await.ok()??;
        Some(user.to_auth_user())
    }

    fn unauthorized() -> Response<Body> {
        crate::response::error(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE).into()
    }
}

impl Middleware for AuthMiddleware {
    fn before(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn std::future::Future<Output = MiddlewareResult<Request<Body>>> + Send + '_>>
    {
        Box::pin(async move {
            match self.authenticate(req.headers()).await {
                Some(user) => {
                    let mut req = req;
                    req.extensions_mut().insert(user);
                    Ok(req)
                }
                None => Err(Self::unauthorized()),
            }
        })
    }
}

/// Role gate. Expects `AuthMiddleware` to have run first on the route.
pub struct RequireRole {
    required: Role,
}

impl RequireRole {
    pub fn new(required: Role) -> Self {
        Self { required }
    }

    pub fn admin() -> Self {
        Self::new(Role::Admin)
    }
}

impl Middleware for RequireRole {
    fn before(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn std::future::Future<Output = MiddlewareResult<Request<Body>>> + Send + '_>>
    {
        Box::pin(async move {
            match req.extensions().get::<AuthUser>() {
                Some(user) if user.role == self.required => Ok(req),
                Some(user) => Err(crate::response::error(
                    StatusCode::FORBIDDEN,
                    &format!(
                        "Role '{}' is not authorized to access this route",
                        user.role
                    ),
                )
                .into()),
                None => Err(AuthMiddleware::unauthorized()),
            }
        })
    }
}

/// Helper to get the authenticated user from a request.
pub fn current_user(req: &Request<Body>) -> Result<&AuthUser, ApiError> {
    req.extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()))
}
