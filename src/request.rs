//! Request module - Helpers for reading request data.
//!
//! Body decoding goes through explicit input structs (all of them marked
//! `deny_unknown_fields`), so malformed or unexpected payloads are rejected
//! before any domain logic runs.

use std::collections::HashMap;

use hyper::{Body, Request};
use serde::de::DeserializeOwned;

use crate::errors::ApiError;
use crate::router::RouteParams;

// Type alias for convenience
pub type ApiRequest = Request<Body>;

/// Decode the request body as JSON into a typed input struct.
pub async fn json_body<T: DeserializeOwned>(req: &mut Request<Body>) -> Result<T, ApiError> {
    let bytes = hyper::body::to_bytes(req.body_mut())
        .await
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::Validation(format!("Invalid request body: {}", e)))
}

/// Parse the query string into a key/value map. Repeated keys keep the last
/// occurrence.
pub fn query_pairs(req: &Request<Body>) -> HashMap<String, String> {
    match req.uri().query() {
        Some(query) => url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect(),
        None => HashMap::new(),
    }
}

/// Extract a path parameter captured by the router.
pub fn param<'a>(req: &'a Request<Body>, name: &str) -> Result<&'a str, ApiError> {
    req.extensions()
        .get::<RouteParams>()
        .and_then(|params| params.get(name))
        .ok_or_else(|| ApiError::Internal(format!("missing route parameter '{}'", name)))
}

/// `page`/`limit` pagination parameters with the defaults the client relies on.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let page = query
            .get("page")
            .and_then(|v| v.parse().ok())
            .filter(|&p| p >= 1)
            .unwrap_or(1);
        let limit = query
            .get("limit")
            .and_then(|v| v.parse().ok())
            .filter(|&l| l >= 1)
            .unwrap_or(10);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

/// Parse an optional boolean query flag (`published=true`).
pub fn bool_flag(query: &HashMap<String, String>, name: &str) -> Option<bool> {
    query.get(name).map(|v| v == "true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Method;

    fn request_with_uri(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_query_pairs() {
        let req = request_with_uri("/blog?category=article&published=true");
        let query = query_pairs(&req);
        assert_eq!(query.get("category").unwrap(), "article");
        assert_eq!(query.get("published").unwrap(), "true");
    }

    #[test]
    fn test_pagination_defaults() {
        let req = request_with_uri("/blog");
        let pagination = Pagination::from_query(&query_pairs(&req));
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 10);
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn test_pagination_explicit() {
        let req = request_with_uri("/blog?page=3&limit=5");
        let pagination = Pagination::from_query(&query_pairs(&req));
        assert_eq!(pagination.offset(), 10);
    }

    #[test]
    fn test_pagination_rejects_garbage() {
        let req = request_with_uri("/blog?page=0&limit=banana");
        let pagination = Pagination::from_query(&query_pairs(&req));
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 10);
    }

    #[tokio::test]
    async fn test_json_body_rejects_unknown_fields() {
        #[derive(serde::Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Input {
            #[allow(dead_code)]
            name: String,
        }

        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/test")
            .body(Body::from(r#"{"name":"a","role":"admin"}"#))
            .unwrap();

        let result: Result<Input, _> = json_body(&mut req).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
