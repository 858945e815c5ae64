//! Middleware module - Support for before/after request processing.

use std::future::Future;
use std::pin::Pin;

use hyper::{Body, Request, Response};

/// Type alias for middleware results
pub type MiddlewareResult<T> = Result<T, Response<Body>>;

/// Trait for middleware.
pub trait Middleware: Send + Sync {
    /// Process before the request is handled.
    /// Return Ok(req) to continue, or Err(response) to short-circuit.
    fn before(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn Future<Output = MiddlewareResult<Request<Body>>> + Send + '_>> {
        Box::pin(async move { Ok(req) })
    }

    /// Process after the response is generated.
    fn after(
        &self,
        resp: Response<Body>,
    ) -> Pin<Box<dyn Future<Output = Response<Body>> + Send + '_>> {
        Box::pin(async move { resp })
    }
}

/// Stack of middleware.
pub struct MiddlewareStack {
    middlewares: Vec<Box<dyn Middleware>>,
}

impl MiddlewareStack {
    /// Create a new middleware stack.
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    /// Add middleware to the stack.
    pub fn add(&mut self, middleware: Box<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// Apply before middleware.
    pub async fn before(&self, mut req: Request<Body>) -> MiddlewareResult<Request<Body>> {
        for middleware in &self.middlewares {
            match middleware.before(req).await {
                Ok(r) => req = r,
                Err(resp) => return Err(resp),
            }
        }
        Ok(req)
    }

    /// Apply after middleware.
    pub async fn after(&self, mut resp: Response<Body>) -> Response<Body> {
        for middleware in &self.middlewares {
            resp = middleware.after(resp).await;
        }
        resp
    }
}

impl Default for MiddlewareStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Request logging through the `log` facade.
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn before(
        &self,
        req: Request<Body>,
    ) -> Pin<Box<dyn Future<Output = MiddlewareResult<Request<Body>>> + Send>> {
        Box::pin(async move {
            log::info!("{} {}", req.method(), req.uri());
            Ok(req)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::{Method, StatusCode};

    struct MockBeforeMiddleware;
    impl Middleware for MockBeforeMiddleware {
        fn before(
            &self,
            mut req: Request<Body>,
        ) -> Pin<Box<dyn Future<Output = MiddlewareResult<Request<Body>>> + Send>> {
            Box::pin(async move {
                req.headers_mut()
                    .insert("x-mock", "before".parse().unwrap());
                Ok(req)
            })
        }
    }

    struct MockShortCircuitMiddleware;
    impl Middleware for MockShortCircuitMiddleware {
        fn before(
            &self,
            _req: Request<Body>,
        ) -> Pin<Box<dyn Future<Output = MiddlewareResult<Request<Body>>> + Send>> {
            Box::pin(async move {
                Err(Response::builder()
                    .status(StatusCode::BAD_REQUEST)
                    .body(Body::from("Short-circuited"))
                    .unwrap())
            })
        }
    }

    #[tokio::test]
    async fn test_middleware_stack_before_success() {
        let mut stack = MiddlewareStack::new();
        stack.add(Box::new(MockBeforeMiddleware));

        let req = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let result = stack.before(req).await;
        assert!(result.is_ok());
        let req = result.unwrap();
        assert_eq!(req.headers().get("x-mock").unwrap(), "before");
    }

    #[tokio::test]
    async fn test_middleware_stack_before_short_circuit() {
        let mut stack = MiddlewareStack::new();
        stack.add(Box::new(MockShortCircuitMiddleware));

        let req = Request::builder()
            .method(Method::GET)
            .uri("/test")
            .body(Body::empty())
            .unwrap();

        let result = stack.before(req).await;
        assert!(result.is_err());
        let resp = result.unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
