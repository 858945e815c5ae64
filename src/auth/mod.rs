//! Authentication and Authorization module.
//!
//! - JWT token-based authentication (signed, 7-day expiry)
//! - Password hashing and verification
//! - Request authentication middleware with live user lookup
//! - Per-route role gate

/// Name of the HTTP-only session cookie.
pub const SESSION_COOKIE: &str = "token";

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

// Re-export commonly used types
pub use jwt::{Claims, JwtService};
pub use middleware::{current_user, AuthMiddleware, RequireRole};
pub use models::{AuthUser, Role};
pub use password::PasswordService;
