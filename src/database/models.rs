//! Entity structs, row mapping, and the typed request payloads for each
//! resource. The payload structs all reject unknown fields, so a client
//! cannot smuggle extra columns (like `role`) into a write.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::models::{AuthUser, Role};

/// Timestamps are stored as RFC 3339 TEXT in UTC with whole seconds, so
/// lexicographic comparison in SQL matches chronological order.
pub(crate) fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_ts(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Full user row. Only ever serialized through [`AuthUser`]; the hash stays
/// inside the crate.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            student_id: self.student_id.clone(),
            phone: self.phone.clone(),
            bio: self.bio.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// Owner projection embedded in resource responses.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// Attendee projection embedded in event responses.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostCategory {
    Article,
    Announcement,
    Update,
}

impl PostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostCategory::Article => "article",
            PostCategory::Announcement => "announcement",
            PostCategory::Update => "update",
        }
    }

    pub fn from_db(s: &str) -> PostCategory {
        match s {
            "announcement" => PostCategory::Announcement,
            "update" => PostCategory::Update,
            _ => PostCategory::Article,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Pending,
    Read,
    Replied,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Pending => "pending",
            ContactStatus::Read => "read",
            ContactStatus::Replied => "replied",
        }
    }

    pub fn from_db(s: &str) -> ContactStatus {
        match s {
            "read" => ContactStatus::Read,
            "replied" => ContactStatus::Replied,
            _ => ContactStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: PublicUser,
    pub category: PostCategory,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub organizer: PublicUser,
    pub image: Option<String>,
    pub category: String,
    pub registration_required: bool,
    pub max_participants: Option<i64>,
    pub registered_users: Vec<RegisteredUser>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Gallery {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    /// Optional link to the event the photos were taken at.
    pub event: Option<String>,
    pub uploaded_by: PublicUser,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub replied_by: Option<PublicUser>,
    pub reply: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---- request payloads -------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: PostCategory,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<PostCategory>,
    pub tags: Option<Vec<String>>,
    pub featured_image: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub image: Option<String>,
    pub category: String,
    pub registration_required: Option<bool>,
    pub max_participants: Option<i64>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub registration_required: Option<bool>,
    pub max_participants: Option<i64>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewGallery {
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub event: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GalleryUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub event: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContactUpdate {
    pub status: Option<ContactStatus>,
    pub reply: Option<String>,
}

// ---- dashboard --------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CountTotal {
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct PublishableCounts {
    pub total: i64,
    pub published: i64,
    /// Computed, never stored.
    pub draft: i64,
}

#[derive(Debug, Serialize)]
pub struct ContactCounts {
    pub total: i64,
    pub pending: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub users: CountTotal,
    pub posts: PublishableCounts,
    pub events: PublishableCounts,
    pub galleries: CountTotal,
    pub contacts: ContactCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_round_trip() {
        let now = now_ts();
        let parsed = parse_ts(0, now.clone()).unwrap();
        assert_eq!(format_ts(parsed), now);
    }

    #[test]
    fn test_timestamp_ordering_is_lexicographic() {
        let earlier = format_ts("2025-01-01T00:00:00Z".parse().unwrap());
        let later = format_ts("2025-06-30T12:00:00Z".parse().unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn test_category_serde() {
        let cat: PostCategory = serde_json::from_str("\"announcement\"").unwrap();
        assert_eq!(cat, PostCategory::Announcement);
        assert!(serde_json::from_str::<PostCategory>("\"poetry\"").is_err());
    }

    #[test]
    fn test_new_post_rejects_unknown_fields() {
        let result: Result<NewPost, _> = serde_json::from_str(
            r#"{"title":"t","content":"c","category":"article","views":9000}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_contact_status_from_db() {
        assert_eq!(ContactStatus::from_db("replied"), ContactStatus::Replied);
        assert_eq!(ContactStatus::from_db("bogus"), ContactStatus::Pending);
    }
}
