//! Response module - Helpers for creating responses.
//!
//! Every handler answer goes through the `{success, ...}` JSON envelope the
//! web client expects; this module owns both the response builder and the
//! envelope constructors.

use hyper::{Body, Response as HyperResponse, StatusCode};
use serde::Serialize;

/// Response wrapper with helpers.
pub struct ApiResponse {
    status: StatusCode,
    body: Body,
    headers: Vec<(String, String)>,
}

impl ApiResponse {
    /// Create a new response.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: Body::empty(),
            headers: Vec::new(),
        }
    }

    /// Set the response body.
    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Set JSON response.
    pub fn json<T: Serialize>(mut self, data: &T) -> Self {
        let json = serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string());
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        self.body = Body::from(json);
        self
    }

    /// Add a header.
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }
}

impl From<ApiResponse> for HyperResponse<Body> {
    fn from(resp: ApiResponse) -> Self {
        let mut builder = HyperResponse::builder().status(resp.status);
        for (key, value) in resp.headers {
            builder = builder.header(key, value);
        }
        builder.body(resp.body).unwrap()
    }
}

/// `{"success": true, "data": ...}`
pub fn data<T: Serialize>(status: StatusCode, value: &T) -> ApiResponse {
    ApiResponse::new(status).json(&serde_json::json!({
        "success": true,
        "data": value,
    }))
}

/// `{"success": true, "message": ...}`
pub fn message(status: StatusCode, msg: &str) -> ApiResponse {
    ApiResponse::new(status).json(&serde_json::json!({
        "success": true,
        "message": msg,
    }))
}

/// `{"success": true, "message": ..., "data": ...}`
pub fn message_with_data<T: Serialize>(status: StatusCode, msg: &str, value: &T) -> ApiResponse {
    ApiResponse::new(status).json(&serde_json::json!({
        "success": true,
        "message": msg,
        "data": value,
    }))
}

/// Paginated listing: `count` is the page size actually returned, `total` the
/// number of matching rows overall.
pub fn list<T: Serialize>(count: usize, total: i64, value: &T) -> ApiResponse {
    ApiResponse::new(StatusCode::OK).json(&serde_json::json!({
        "success": true,
        "count": count,
        "total": total,
        "data": value,
    }))
}

/// `{"success": false, "message": ...}`
pub fn error(status: StatusCode, msg: &str) -> ApiResponse {
    ApiResponse::new(status).json(&serde_json::json!({
        "success": false,
        "message": msg,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_response() {
        let resp = data(StatusCode::OK, &serde_json::json!({"id": 1}));
        let hyper_resp: HyperResponse<Body> = resp.into();
        assert_eq!(hyper_resp.status(), StatusCode::OK);
        assert_eq!(
            hyper_resp.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let resp = error(StatusCode::BAD_REQUEST, "Please provide a title");
        let hyper_resp: HyperResponse<Body> = resp.into();
        assert_eq!(hyper_resp.status(), StatusCode::BAD_REQUEST);
        let bytes = hyper::body::to_bytes(hyper_resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Please provide a title");
    }

    #[tokio::test]
    async fn test_list_envelope() {
        let resp = list(2, 14, &serde_json::json!([1, 2]));
        let hyper_resp: HyperResponse<Body> = resp.into();
        let bytes = hyper::body::to_bytes(hyper_resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["total"], 14);
    }

    #[test]
    fn test_custom_headers() {
        let resp = ApiResponse::new(StatusCode::OK)
            .header("Set-Cookie", "token=abc")
            .body(Body::from("ok"));
        let hyper_resp: HyperResponse<Body> = resp.into();
        assert_eq!(hyper_resp.headers().get("set-cookie").unwrap(), "token=abc");
    }
}
