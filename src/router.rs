//! Router module - Handles routing logic.
//!
//! Matches incoming requests to handlers by method and path. Path segments of
//! the form `:name` capture the corresponding request segment into
//! [`RouteParams`], which the handler reads from the request extensions.

use std::collections::HashMap;
use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};

use crate::errors::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Path parameters captured while matching a route.
#[derive(Debug, Default, Clone)]
pub struct RouteParams(HashMap<String, String>);

impl RouteParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

type HandlerFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<ApiResponse, ApiError>> + Send>>;

/// Represents a route with method, path, handler, and middleware.
pub struct Route {
    method: String,
    path: String,
    handler: Arc<dyn Fn(Request<Body>, Arc<AppState>) -> HandlerFuture + Send + Sync>,
    middleware: Vec<Box<dyn crate::middleware::Middleware>>,
}

impl Route {
    /// Create a new route.
    pub fn new<F, Fut>(method: &str, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Body>, Arc<AppState>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<ApiResponse, ApiError>> + Send + 'static,
    {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            handler: Arc::new(move |req, state| Box::pin(handler(req, state))),
            middleware: Vec::new(),
        }
    }

    /// Add middleware to this route.
    pub fn with_middleware(mut self, middleware: Box<dyn crate::middleware::Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }
}

/// Router that holds all routes.
pub struct Router {
    routes: HashMap<String, Vec<Route>>,
}

impl Router {
    /// Create a new router.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Add a route to the router.
    pub fn add_route(&mut self, route: Route) {
        self.routes
            .entry(route.method.clone())
            .or_insert_with(Vec::new)
            .push(route);
    }

    /// Handle an incoming request.
    pub async fn handle(&self, mut req: Request<Body>, state: Arc<AppState>) -> Response<Body> {
        let method = req.method().as_str();
        if let Some(routes) = self.routes.get(method) {
            for route in routes {
                if let Some(params) = matches(&route.path, req.uri().path()) {
                    req.extensions_mut().insert(params);

                    // Apply route-specific middleware (short-circuit on Err)
                    for middleware in &route.middleware {
                        match middleware.before(req).await {
                            Ok(r) => req = r,
                            Err(resp) => return resp,
                        }
                    }

                    // Handle the request
                    let mut resp = match (route.handler)(req, state).await {
                        Ok(resp) => resp.into(),
                        Err(err) => err.into_response().into(),
                    };

                    // Apply route-specific middleware in reverse order
                    for middleware in route.middleware.iter().rev() {
                        resp = middleware.after(resp).await;
                    }

                    return resp;
                }
            }
        }
        crate::response::error(StatusCode::NOT_FOUND, "Not Found").into()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Match a route pattern against a request path, capturing `:name` segments.
fn matches(route_path: &str, req_path: &str) -> Option<RouteParams> {
    let route_segments: Vec<&str> = route_path.trim_matches('/').split('/').collect();
    let req_segments: Vec<&str> = req_path.trim_matches('/').split('/').collect();

    if route_segments.len() != req_segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (pattern, actual) in route_segments.iter().zip(req_segments.iter()) {
        if let Some(name) = pattern.strip_prefix(':') {
            if actual.is_empty() {
                return None;
            }
            params.insert(name.to_string(), (*actual).to_string());
        } else if pattern != actual {
            return None;
        }
    }

    Some(RouteParams(params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches("/events", "/events").is_some());
        assert!(matches("/events", "/blog").is_none());
        assert!(matches("/", "/").is_some());
    }

    #[test]
    fn test_param_capture() {
        let params = matches("/events/:id/register", "/events/abc-123/register").unwrap();
        assert_eq!(params.get("id"), Some("abc-123"));
    }

    #[test]
    fn test_segment_count_mismatch() {
        assert!(matches("/events/:id", "/events").is_none());
        assert!(matches("/events", "/events/abc").is_none());
    }

    #[test]
    fn test_trailing_slash() {
        assert!(matches("/events", "/events/").is_some());
    }

    #[test]
    fn test_empty_param_segment_rejected() {
        assert!(matches("/events/:id", "/events//").is_none());
    }
}
