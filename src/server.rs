//! Server module - ties together router, middleware, and shared state.

use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response as HyperResponse, Server, StatusCode};

use crate::metrics;
use crate::middleware::MiddlewareStack;
use crate::router::Router;
use crate::state::AppState;

/// Main server struct.
pub struct BitsaServer {
    router: Router,
    middleware: MiddlewareStack,
    state: Arc<AppState>,
}

impl BitsaServer {
    /// Create a new server.
    pub fn new(router: Router, state: Arc<AppState>) -> Self {
        Self {
            router,
            middleware: MiddlewareStack::new(),
            state,
        }
    }

    /// Add global middleware.
    pub fn with_middleware(mut self, middleware: Box<dyn crate::middleware::Middleware>) -> Self {
        self.middleware.add(middleware);
        self
    }

    /// Run the server.
    pub async fn run(self, addr: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let router = Arc::new(self.router);
        let middleware = Arc::new(self.middleware);
        let state = self.state;

        let make_svc = make_service_fn(move |_| {
            let router = router.clone();
            let middleware = middleware.clone();
            let state = state.clone();

            async move {
                Ok::<_, hyper::Error>(service_fn(move |req: Request<Body>| {
                    let router = router.clone();
                    let middleware = middleware.clone();
                    let state = state.clone();
                    async move {
                        metrics::REQUEST_COUNTER.inc();

                        // Liveness endpoint
                        if req.uri().path() == "/health" && req.method() == hyper::Method::GET {
                            let resp = HyperResponse::builder()
                                .status(StatusCode::OK)
                                .header("content-type", "text/plain")
                                .body(Body::from("ok"))
                                .unwrap();
                            return Ok::<_, hyper::Error>(resp);
                        }

                        // Readiness endpoint: the store must answer
                        if req.uri().path() == "/ready" && req.method() == hyper::Method::GET {
                            let ready = state.db.ping().await.unwrap_or(false);
                            let status = if ready {
                                StatusCode::OK
                            } else {
                                StatusCode::SERVICE_UNAVAILABLE
                            };
                            let body =
                                serde_json::to_string(&serde_json::json!({ "ready": ready }))
                                    .unwrap();
                            let resp = HyperResponse::builder()
                                .status(status)
                                .header("content-type", "application/json")
                                .body(Body::from(body))
                                .unwrap();
                            return Ok::<_, hyper::Error>(resp);
                        }

                        if req.uri().path() == "/metrics" && req.method() == hyper::Method::GET {
                            let body = metrics::gather_metrics();
                            let resp = HyperResponse::builder()
                                .status(StatusCode::OK)
                                .header("content-type", "text/plain; version=0.0.4")
                                .body(Body::from(body))
                                .unwrap();
                            return Ok::<_, hyper::Error>(resp);
                        }

                        // Apply global middleware (short-circuit if one returns Err)
                        match middleware.before(req).await {
                            Ok(req) => {
                                let resp = router.handle(req, state).await;
                                let resp = middleware.after(resp).await;
                                Ok::<_, hyper::Error>(resp)
                            }
                            Err(resp) => Ok::<_, hyper::Error>(resp),
                        }
                    }
                }))
            }
        });

        let addr = addr.parse()?;
        log::info!("listening on http://{}", addr);
        Server::bind(&addr).serve(make_svc).await?;
        Ok(())
    }
}
