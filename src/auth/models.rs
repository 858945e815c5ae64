//! User-facing auth models: roles, the sanitized request identity, and the
//! input structs for the auth endpoints.

use serde::{Deserialize, Serialize};

/// User roles. Authorization is a plain equality check against the role
/// required by a route; everything finer-grained is an ownership check inside
/// the resource handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    /// Stored roles are constrained at write time; anything unexpected read
    /// back from the store falls back to the least-privileged role.
    pub fn from_db(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            _ => Role::Student,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity attached to a request, and the user shape
/// returned to clients. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Registration payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub student_id: Option<String>,
    pub phone: Option<String>,
}

/// Login payload. Fields are optional so a missing one produces the
/// client-facing "Please provide email and password" message rather than a
/// decode error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Profile self-service update: only these four fields are user-mutable.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdateInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub student_id: Option<String>,
}

/// Admin role change payload.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleUpdateInput {
    pub role: Role,
}

/// Body returned by register/login: the sanitized user plus the token for
/// bearer-header clients (browsers get the cookie as well).
#[derive(Debug, Serialize)]
pub struct AuthData {
    pub user: AuthUser,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from_db("admin"), Role::Admin);
        assert_eq!(Role::from_db("student"), Role::Student);
        assert_eq!(Role::from_db("garbage"), Role::Student);
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn test_role_serde() {
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn test_auth_user_never_leaks_credentials() {
        let user = AuthUser {
            id: "u1".into(),
            name: "Test".into(),
            email: "t@example.com".into(),
            role: Role::Student,
            student_id: None,
            phone: None,
            bio: None,
            avatar: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("\"studentId\""));
    }

    #[test]
    fn test_register_input_rejects_role_injection() {
        let result: Result<RegisterInput, _> =
            serde_json::from_str(r#"{"name":"a","email":"a@b.c","password":"x","role":"admin"}"#);
        assert!(result.is_err());
    }
}
