//! Typed repositories over the SQLite store.
//!
//! Every method runs its SQL inside a single `call` closure on the
//! connection's worker thread. `EventRepository::register` leans on this: the
//! whole check-then-append sequence executes as one closure inside a
//! transaction, so two concurrent registrations for the last slot cannot both
//! observe the event as open.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};
use uuid::Uuid;

use crate::auth::models::Role;
use crate::database::models::{
    format_ts, now_ts, parse_ts, BlogPost, Contact, ContactStatus, ContactUpdate, Event,
    EventUpdate, Gallery, GalleryUpdate, NewContact, NewEvent, NewGallery, NewPost, PostCategory,
    PostUpdate, PublicUser, RegisteredUser, User,
};
use crate::database::{Database, DatabaseError};

fn where_sql(clauses: &[&str]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

// ---- users ------------------------------------------------------------------

const USER_SELECT: &str = "SELECT id, name, email, password_hash, role, student_id, phone, \
     bio, avatar, created_at, updated_at FROM users";

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::from_db(&row.get::<_, String>(4)?),
        student_id: row.get(5)?,
        phone: row.get(6)?,
        bio: row.get(7)?,
        avatar: row.get(8)?,
        created_at: parse_ts(9, row.get(9)?)?,
        updated_at: parse_ts(10, row.get(10)?)?,
    })
}

#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a new student account. Returns `Ok(None)` when the email is
    /// already taken (UNIQUE constraint), which the handler surfaces as the
    /// duplicate-email conflict.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        student_id: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<User>, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let row_id = id.clone();
        let name = name.to_string();
        let email = email.to_string();
        let password_hash = password_hash.to_string();
        let student_id = student_id.map(str::to_string);
        let phone = phone.map(str::to_string);
        let now = now_ts();

        let inserted = self
            .db
            .call(move |conn| {
                match conn.execute(
                    "INSERT INTO users (id, name, email, password_hash, role, student_id, phone, \
                     created_at, updated_at) VALUES (?, ?, ?, ?, 'student', ?, ?, ?, ?)",
                    params![row_id, name, email, password_hash, student_id, phone, now, now],
                ) {
                    Ok(_) => Ok(true),
                    Err(rusqlite::Error::SqliteFailure(e, _))
                        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                    {
                        Ok(false)
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .await?;

        if !inserted {
            return Ok(None);
        }
        self.find_by_id(&id).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let id = id.to_string();
        self.db
            .call(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("{} WHERE id = ?", USER_SELECT),
                        params![id],
                        user_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let email = email.to_string();
        self.db
            .call(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("{} WHERE email = ?", USER_SELECT),
                        params![email],
                        user_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    /// Partial self-service update; absent fields are left untouched.
    pub async fn update_profile(
        &self,
        id: &str,
        name: Option<String>,
        phone: Option<String>,
        bio: Option<String>,
        student_id: Option<String>,
    ) -> Result<Option<User>, DatabaseError> {
        let row_id = id.to_string();
        let now = now_ts();
        self.db
            .call(move |conn| {
                conn.execute(
                    "UPDATE users SET name = COALESCE(?, name), phone = COALESCE(?, phone), \
                     bio = COALESCE(?, bio), student_id = COALESCE(?, student_id), \
                     updated_at = ? WHERE id = ?",
                    params![name, phone, bio, student_id, now, row_id],
                )?;
                Ok(())
            })
            .await?;
        self.find_by_id(id).await
    }

    pub async fn update_role(&self, id: &str, role: Role) -> Result<Option<User>, DatabaseError> {
        let row_id = id.to_string();
        let now = now_ts();
        let affected = self
            .db
            .call(move |conn| {
                Ok(conn.execute(
                    "UPDATE users SET role = ?, updated_at = ? WHERE id = ?",
                    params![role.as_str(), now, row_id],
                )?)
            })
            .await?;
        if affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let id = id.to_string();
        self.db
            .call(move |conn| {
                Ok(conn.execute("DELETE FROM users WHERE id = ?", params![id])? > 0)
            })
            .await
    }

    pub async fn list_all(&self) -> Result<Vec<User>, DatabaseError> {
        self.db
            .call(|conn| {
                let mut stmt =
                    conn.prepare(&format!("{} ORDER BY created_at DESC", USER_SELECT))?;
                let users = stmt
                    .query_map([], user_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(users)
            })
            .await
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        self.db
            .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?))
            .await
    }
}

// ---- blog posts -------------------------------------------------------------

const POST_SELECT: &str = "SELECT p.id, p.title, p.content, p.category, p.featured_image, \
     p.tags, p.published, p.views, p.created_at, p.updated_at, u.id, u.name, u.email, u.avatar \
     FROM blog_posts p JOIN users u ON u.id = p.author_id";

fn post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlogPost> {
    let tags: Vec<String> =
        serde_json::from_str(&row.get::<_, String>(5)?).unwrap_or_default();
    Ok(BlogPost {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: PostCategory::from_db(&row.get::<_, String>(3)?),
        featured_image: row.get(4)?,
        tags,
        published: row.get::<_, i64>(6)? != 0,
        views: row.get(7)?,
        created_at: parse_ts(8, row.get(8)?)?,
        updated_at: parse_ts(9, row.get(9)?)?,
        author: PublicUser {
            id: row.get(10)?,
            name: row.get(11)?,
            email: row.get(12)?,
            avatar: row.get(13)?,
        },
    })
}

fn load_post(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<BlogPost>> {
    conn.query_row(
        &format!("{} WHERE p.id = ?", POST_SELECT),
        params![id],
        post_from_row,
    )
    .optional()
}

#[derive(Debug, Default, Clone)]
pub struct PostFilter {
    pub category: Option<String>,
    pub published: Option<bool>,
}

#[derive(Clone)]
pub struct BlogRepository {
    db: Database,
}

impl BlogRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<BlogPost>, i64), DatabaseError> {
        self.db
            .call(move |conn| {
                let mut clauses = Vec::new();
                let mut values: Vec<Value> = Vec::new();
                if let Some(category) = filter.category {
                    clauses.push("p.category = ?");
                    values.push(Value::Text(category));
                }
                if let Some(published) = filter.published {
                    clauses.push("p.published = ?");
                    values.push(Value::Integer(i64::from(published)));
                }
                let where_clause = where_sql(&clauses);

                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM blog_posts p{}", where_clause),
                    params_from_iter(values.clone()),
                    |row| row.get(0),
                )?;

                values.push(Value::Integer(limit));
                values.push(Value::Integer(offset));
                let mut stmt = conn.prepare(&format!(
                    "{}{} ORDER BY p.created_at DESC LIMIT ? OFFSET ?",
                    POST_SELECT, where_clause
                ))?;
                let posts = stmt
                    .query_map(params_from_iter(values), post_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((posts, total))
            })
            .await
    }

    pub async fn find(&self, id: &str) -> Result<Option<BlogPost>, DatabaseError> {
        let id = id.to_string();
        self.db.call(move |conn| Ok(load_post(conn, &id)?)).await
    }

    /// Fetch a post for display, bumping its view counter.
    pub async fn read(&self, id: &str) -> Result<Option<BlogPost>, DatabaseError> {
        let id = id.to_string();
        self.db
            .call(move |conn| {
                let affected = conn.execute(
                    "UPDATE blog_posts SET views = views + 1 WHERE id = ?",
                    params![id],
                )?;
                if affected == 0 {
                    return Ok(None);
                }
                Ok(load_post(conn, &id)?)
            })
            .await
    }

    pub async fn create(
        &self,
        author_id: &str,
        input: NewPost,
    ) -> Result<BlogPost, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let author_id = author_id.to_string();
        let tags = serde_json::to_string(&input.tags.unwrap_or_default())
            .unwrap_or_else(|_| "[]".to_string());
        let now = now_ts();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO blog_posts (id, title, content, author_id, category, \
                     featured_image, tags, published, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        id,
                        input.title,
                        input.content,
                        author_id,
                        input.category.as_str(),
                        input.featured_image,
                        tags,
                        i64::from(input.published.unwrap_or(false)),
                        now,
                        now
                    ],
                )?;
                let post = load_post(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
                Ok(post)
            })
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        input: PostUpdate,
    ) -> Result<Option<BlogPost>, DatabaseError> {
        let id = id.to_string();
        let tags = input
            .tags
            .map(|t| serde_json::to_string(&t).unwrap_or_else(|_| "[]".to_string()));
        let category = input.category.map(|c| c.as_str());
        let published = input.published.map(i64::from);
        let now = now_ts();
        self.db
            .call(move |conn| {
                let affected = conn.execute(
                    "UPDATE blog_posts SET title = COALESCE(?, title), \
                     content = COALESCE(?, content), category = COALESCE(?, category), \
                     featured_image = COALESCE(?, featured_image), tags = COALESCE(?, tags), \
                     published = COALESCE(?, published), updated_at = ? WHERE id = ?",
                    params![
                        input.title,
                        input.content,
                        category,
                        input.featured_image,
                        tags,
                        published,
                        now,
                        id
                    ],
                )?;
                if affected == 0 {
                    return Ok(None);
                }
                Ok(load_post(conn, &id)?)
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let id = id.to_string();
        self.db
            .call(move |conn| {
                Ok(conn.execute("DELETE FROM blog_posts WHERE id = ?", params![id])? > 0)
            })
            .await
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        self.db
            .call(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM blog_posts", [], |row| row.get(0))?)
            })
            .await
    }

    pub async fn count_published(&self) -> Result<i64, DatabaseError> {
        self.db
            .call(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM blog_posts WHERE published = 1",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
    }
}

// ---- events -----------------------------------------------------------------

const EVENT_SELECT: &str = "SELECT e.id, e.title, e.description, e.date, e.location, e.image, \
     e.category, e.registration_required, e.max_participants, e.published, e.created_at, \
     e.updated_at, u.id, u.name, u.email, u.avatar \
     FROM events e JOIN users u ON u.id = e.organizer_id";

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        date: parse_ts(3, row.get(3)?)?,
        location: row.get(4)?,
        image: row.get(5)?,
        category: row.get(6)?,
        registration_required: row.get::<_, i64>(7)? != 0,
        max_participants: row.get(8)?,
        published: row.get::<_, i64>(9)? != 0,
        created_at: parse_ts(10, row.get(10)?)?,
        updated_at: parse_ts(11, row.get(11)?)?,
        organizer: PublicUser {
            id: row.get(12)?,
            name: row.get(13)?,
            email: row.get(14)?,
            avatar: row.get(15)?,
        },
        registered_users: Vec::new(),
    })
}

fn load_registrations(
    conn: &rusqlite::Connection,
    event_id: &str,
) -> rusqlite::Result<Vec<RegisteredUser>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.name, u.email FROM event_registrations r \
         JOIN users u ON u.id = r.user_id WHERE r.event_id = ? ORDER BY r.registered_at",
    )?;
    let users = stmt
        .query_map(params![event_id], |row| {
            Ok(RegisteredUser {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

fn load_event(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Event>> {
    let event = conn
        .query_row(
            &format!("{} WHERE e.id = ?", EVENT_SELECT),
            params![id],
            event_from_row,
        )
        .optional()?;
    match event {
        Some(mut event) => {
            event.registered_users = load_registrations(conn, id)?;
            Ok(Some(event))
        }
        None => Ok(None),
    }
}

#[derive(Debug, Default, Clone)]
pub struct EventFilter {
    pub published: Option<bool>,
    pub upcoming: bool,
}

/// Result of a registration attempt. The handler maps each rejection to the
/// client-facing message.
#[derive(Debug)]
pub enum RegisterOutcome {
    Registered(Event),
    NotFound,
    NotRequired,
    AlreadyRegistered,
    Full,
}

#[derive(Clone)]
pub struct EventRepository {
    db: Database,
}

impl EventRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        filter: EventFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Event>, i64), DatabaseError> {
        self.db
            .call(move |conn| {
                let mut clauses = Vec::new();
                let mut values: Vec<Value> = Vec::new();
                if let Some(published) = filter.published {
                    clauses.push("e.published = ?");
                    values.push(Value::Integer(i64::from(published)));
                }
                if filter.upcoming {
                    clauses.push("e.date >= ?");
                    values.push(Value::Text(now_ts()));
                }
                let where_clause = where_sql(&clauses);

                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM events e{}", where_clause),
                    params_from_iter(values.clone()),
                    |row| row.get(0),
                )?;

                values.push(Value::Integer(limit));
                values.push(Value::Integer(offset));
                let mut events: Vec<Event> = {
                    let mut stmt = conn.prepare(&format!(
                        "{}{} ORDER BY e.date ASC LIMIT ? OFFSET ?",
                        EVENT_SELECT, where_clause
                    ))?;
                    let rows = stmt
                        .query_map(params_from_iter(values), event_from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    rows
                };
                for event in &mut events {
                    event.registered_users = load_registrations(conn, &event.id)?;
                }
                Ok((events, total))
            })
            .await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Event>, DatabaseError> {
        let id = id.to_string();
        self.db.call(move |conn| Ok(load_event(conn, &id)?)).await
    }

    pub async fn create(
        &self,
        organizer_id: &str,
        input: NewEvent,
    ) -> Result<Event, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let organizer_id = organizer_id.to_string();
        let date = format_ts(input.date);
        let now = now_ts();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO events (id, title, description, date, location, organizer_id, \
                     image, category, registration_required, max_participants, published, \
                     created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        id,
                        input.title,
                        input.description,
                        date,
                        input.location,
                        organizer_id,
                        input.image,
                        input.category,
                        i64::from(input.registration_required.unwrap_or(false)),
                        input.max_participants,
                        i64::from(input.published.unwrap_or(false)),
                        now,
                        now
                    ],
                )?;
                let event = load_event(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
                Ok(event)
            })
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        input: EventUpdate,
    ) -> Result<Option<Event>, DatabaseError> {
        let id = id.to_string();
        let date = input.date.map(format_ts);
        let registration_required = input.registration_required.map(i64::from);
        let published = input.published.map(i64::from);
        let now = now_ts();
        self.db
            .call(move |conn| {
                let affected = conn.execute(
                    "UPDATE events SET title = COALESCE(?, title), \
                     description = COALESCE(?, description), date = COALESCE(?, date), \
                     location = COALESCE(?, location), image = COALESCE(?, image), \
                     category = COALESCE(?, category), \
                     registration_required = COALESCE(?, registration_required), \
                     max_participants = COALESCE(?, max_participants), \
                     published = COALESCE(?, published), updated_at = ? WHERE id = ?",
                    params![
                        input.title,
                        input.description,
                        date,
                        input.location,
                        input.image,
                        input.category,
                        registration_required,
                        input.max_participants,
                        published,
                        now,
                        id
                    ],
                )?;
                if affected == 0 {
                    return Ok(None);
                }
                Ok(load_event(conn, &id)?)
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let id = id.to_string();
        self.db
            .call(move |conn| {
                Ok(conn.execute("DELETE FROM events WHERE id = ?", params![id])? > 0)
            })
            .await
    }

    /// Register a user for an event, enforcing the capacity and
    /// single-registration rules.
    ///
    /// The checks and the insert run in one closure inside a transaction.
    /// The connection's worker thread executes closures one at a time, so the
    /// count observed here cannot go stale before the insert commits; the
    /// junction table's primary key additionally makes duplicate rows
    /// unrepresentable.
    pub async fn register(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<RegisterOutcome, DatabaseError> {
        let event_id = event_id.to_string();
        let user_id = user_id.to_string();
        let now = now_ts();
        self.db
            .call(move |conn| {
                let tx = conn.transaction()?;

                let meta = tx
                    .query_row(
                        "SELECT registration_required, max_participants FROM events WHERE id = ?",
                        params![event_id],
                        |row| {
                            Ok((
                                row.get::<_, i64>(0)? != 0,
                                row.get::<_, Option<i64>>(1)?,
                            ))
                        },
                    )
                    .optional()?;
                let (required, max_participants) = match meta {
                    Some(meta) => meta,
                    None => return Ok(RegisterOutcome::NotFound),
                };

                if !required {
                    return Ok(RegisterOutcome::NotRequired);
                }

                let already: i64 = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM event_registrations \
                     WHERE event_id = ? AND user_id = ?)",
                    params![event_id, user_id],
                    |row| row.get(0),
                )?;
                if already != 0 {
                    return Ok(RegisterOutcome::AlreadyRegistered);
                }

                if let Some(max) = max_participants {
                    let count: i64 = tx.query_row(
                        "SELECT COUNT(*) FROM event_registrations WHERE event_id = ?",
                        params![event_id],
                        |row| row.get(0),
                    )?;
                    if count >= max {
                        return Ok(RegisterOutcome::Full);
                    }
                }

                tx.execute(
                    "INSERT INTO event_registrations (event_id, user_id, registered_at) \
                     VALUES (?, ?, ?)",
                    params![event_id, user_id, now],
                )?;
                let event =
                    load_event(&tx, &event_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
                tx.commit()?;
                Ok(RegisterOutcome::Registered(event))
            })
            .await
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        self.db
            .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?))
            .await
    }

    pub async fn count_published(&self) -> Result<i64, DatabaseError> {
        self.db
            .call(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM events WHERE published = 1",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
    }
}

// ---- galleries --------------------------------------------------------------

const GALLERY_SELECT: &str = "SELECT g.id, g.title, g.description, g.images, g.event_id, \
     g.published, g.created_at, g.updated_at, u.id, u.name, u.email, u.avatar \
     FROM galleries g JOIN users u ON u.id = g.uploaded_by";

fn gallery_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Gallery> {
    let images: Vec<String> =
        serde_json::from_str(&row.get::<_, String>(3)?).unwrap_or_default();
    Ok(Gallery {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        images,
        event: row.get(4)?,
        published: row.get::<_, i64>(5)? != 0,
        created_at: parse_ts(6, row.get(6)?)?,
        updated_at: parse_ts(7, row.get(7)?)?,
        uploaded_by: PublicUser {
            id: row.get(8)?,
            name: row.get(9)?,
            email: row.get(10)?,
            avatar: row.get(11)?,
        },
    })
}

fn load_gallery(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Gallery>> {
    conn.query_row(
        &format!("{} WHERE g.id = ?", GALLERY_SELECT),
        params![id],
        gallery_from_row,
    )
    .optional()
}

#[derive(Clone)]
pub struct GalleryRepository {
    db: Database,
}

impl GalleryRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        published: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Gallery>, i64), DatabaseError> {
        self.db
            .call(move |conn| {
                let mut clauses = Vec::new();
                let mut values: Vec<Value> = Vec::new();
                if let Some(published) = published {
                    clauses.push("g.published = ?");
                    values.push(Value::Integer(i64::from(published)));
                }
                let where_clause = where_sql(&clauses);

                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM galleries g{}", where_clause),
                    params_from_iter(values.clone()),
                    |row| row.get(0),
                )?;

                values.push(Value::Integer(limit));
                values.push(Value::Integer(offset));
                let mut stmt = conn.prepare(&format!(
                    "{}{} ORDER BY g.created_at DESC LIMIT ? OFFSET ?",
                    GALLERY_SELECT, where_clause
                ))?;
                let galleries = stmt
                    .query_map(params_from_iter(values), gallery_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((galleries, total))
            })
            .await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Gallery>, DatabaseError> {
        let id = id.to_string();
        self.db
            .call(move |conn| Ok(load_gallery(conn, &id)?))
            .await
    }

    pub async fn create(
        &self,
        uploaded_by: &str,
        input: NewGallery,
    ) -> Result<Gallery, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let uploaded_by = uploaded_by.to_string();
        let images =
            serde_json::to_string(&input.images).unwrap_or_else(|_| "[]".to_string());
        let now = now_ts();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO galleries (id, title, description, images, event_id, \
                     uploaded_by, published, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        id,
                        input.title,
                        input.description,
                        images,
                        input.event,
                        uploaded_by,
                        i64::from(input.published.unwrap_or(false)),
                        now,
                        now
                    ],
                )?;
                let gallery =
                    load_gallery(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
                Ok(gallery)
            })
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        input: GalleryUpdate,
    ) -> Result<Option<Gallery>, DatabaseError> {
        let id = id.to_string();
        let images = input
            .images
            .map(|i| serde_json::to_string(&i).unwrap_or_else(|_| "[]".to_string()));
        let published = input.published.map(i64::from);
        let now = now_ts();
        self.db
            .call(move |conn| {
                let affected = conn.execute(
                    "UPDATE galleries SET title = COALESCE(?, title), \
                     description = COALESCE(?, description), images = COALESCE(?, images), \
                     event_id = COALESCE(?, event_id), published = COALESCE(?, published), \
                     updated_at = ? WHERE id = ?",
                    params![
                        input.title,
                        input.description,
                        images,
                        input.event,
                        published,
                        now,
                        id
                    ],
                )?;
                if affected == 0 {
                    return Ok(None);
                }
                Ok(load_gallery(conn, &id)?)
            })
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, DatabaseError> {
        let id = id.to_string();
        self.db
            .call(move |conn| {
                Ok(conn.execute("DELETE FROM galleries WHERE id = ?", params![id])? > 0)
            })
            .await
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        self.db
            .call(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM galleries", [], |row| row.get(0))?)
            })
            .await
    }
}

// ---- contacts ---------------------------------------------------------------

const CONTACT_SELECT: &str = "SELECT c.id, c.name, c.email, c.phone, c.subject, c.message, \
     c.status, c.reply, c.created_at, c.updated_at, u.id, u.name, u.email, u.avatar \
     FROM contacts c LEFT JOIN users u ON u.id = c.replied_by";

fn contact_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
    let replied_by = match row.get::<_, Option<String>>(10)? {
        Some(id) => Some(PublicUser {
            id,
            name: row.get(11)?,
            email: row.get(12)?,
            avatar: row.get(13)?,
        }),
        None => None,
    };
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        subject: row.get(4)?,
        message: row.get(5)?,
        status: ContactStatus::from_db(&row.get::<_, String>(6)?),
        reply: row.get(7)?,
        created_at: parse_ts(8, row.get(8)?)?,
        updated_at: parse_ts(9, row.get(9)?)?,
        replied_by,
    })
}

fn load_contact(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<Contact>> {
    conn.query_row(
        &format!("{} WHERE c.id = ?", CONTACT_SELECT),
        params![id],
        contact_from_row,
    )
    .optional()
}

#[derive(Clone)]
pub struct ContactRepository {
    db: Database,
}

impl ContactRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, input: NewContact) -> Result<Contact, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let now = now_ts();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO contacts (id, name, email, phone, subject, message, status, \
                     created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?)",
                    params![
                        id,
                        input.name,
                        input.email,
                        input.phone,
                        input.subject,
                        input.message,
                        now,
                        now
                    ],
                )?;
                let contact =
                    load_contact(conn, &id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
                Ok(contact)
            })
            .await
    }

    pub async fn list(
        &self,
        status: Option<ContactStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Contact>, i64), DatabaseError> {
        self.db
            .call(move |conn| {
                let mut clauses = Vec::new();
                let mut values: Vec<Value> = Vec::new();
                if let Some(status) = status {
                    clauses.push("c.status = ?");
                    values.push(Value::Text(status.as_str().to_string()));
                }
                let where_clause = where_sql(&clauses);

                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM contacts c{}", where_clause),
                    params_from_iter(values.clone()),
                    |row| row.get(0),
                )?;

                values.push(Value::Integer(limit));
                values.push(Value::Integer(offset));
                let mut stmt = conn.prepare(&format!(
                    "{}{} ORDER BY c.created_at DESC LIMIT ? OFFSET ?",
                    CONTACT_SELECT, where_clause
                ))?;
                let contacts = stmt
                    .query_map(params_from_iter(values), contact_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((contacts, total))
            })
            .await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Contact>, DatabaseError> {
        let id = id.to_string();
        self.db
            .call(move |conn| Ok(load_contact(conn, &id)?))
            .await
    }

    /// Admin reply/triage. The caller is always recorded as the replying
    /// admin, mirroring the desk workflow.
    pub async fn update(
        &self,
        id: &str,
        input: ContactUpdate,
        replied_by: &str,
    ) -> Result<Option<Contact>, DatabaseError> {
        let id = id.to_string();
        let replied_by = replied_by.to_string();
        let status = input.status.map(|s| s.as_str());
        let now = now_ts();
        self.db
            .call(move |conn| {
                let affected = conn.execute(
                    "UPDATE contacts SET status = COALESCE(?, status), \
                     reply = COALESCE(?, reply), replied_by = ?, updated_at = ? WHERE id = ?",
                    params![status, input.reply, replied_by, now, id],
                )?;
                if affected == 0 {
                    return Ok(None);
                }
                Ok(load_contact(conn, &id)?)
            })
            .await
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        self.db
            .call(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?)
            })
            .await
    }

    pub async fn count_pending(&self) -> Result<i64, DatabaseError> {
        self.db
            .call(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM contacts WHERE status = 'pending'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewEvent, NewPost};
    use chrono::Utc;

    async fn setup() -> (Database, UserRepository) {
        let db = Database::new().await.unwrap();
        let users = UserRepository::new(db.clone());
        (db, users)
    }

    async fn make_user(users: &UserRepository, email: &str) -> User {
        users
            .create("Test User", email, "hash", None, None)
            .await
            .unwrap()
            .unwrap()
    }

    fn career_fair(max: Option<i64>) -> NewEvent {
        NewEvent {
            title: "Career Fair".to_string(),
            description: "Annual fair".to_string(),
            date: Utc::now(),
            location: "Main Hall".to_string(),
            image: None,
            category: "career".to_string(),
            registration_required: Some(true),
            max_participants: max,
            published: Some(true),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_refused() {
        let (_db, users) = setup().await;
        make_user(&users, "dup@example.com").await;
        let second = users
            .create("Other", "dup@example.com", "hash", None, None)
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_role_update_and_delete() {
        let (_db, users) = setup().await;
        let user = make_user(&users, "role@example.com").await;
        assert_eq!(user.role, Role::Student);

        let promoted = users
            .update_role(&user.id, Role::Admin)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);

        assert!(users.delete(&user.id).await.unwrap());
        assert!(users.find_by_id(&user.id).await.unwrap().is_none());
        assert!(!users.delete(&user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_post_views_and_filters() {
        let (db, users) = setup().await;
        let author = make_user(&users, "author@example.com").await;
        let posts = BlogRepository::new(db);

        let post = posts
            .create(
                &author.id,
                NewPost {
                    title: "Hello".to_string(),
                    content: "World".to_string(),
                    category: PostCategory::Article,
                    tags: Some(vec!["intro".to_string()]),
                    featured_image: None,
                    published: Some(true),
                },
            )
            .await
            .unwrap();
        assert_eq!(post.views, 0);
        assert_eq!(post.author.id, author.id);

        let read = posts.read(&post.id).await.unwrap().unwrap();
        assert_eq!(read.views, 1);

        let (published, total) = posts
            .list(
                PostFilter {
                    category: None,
                    published: Some(true),
                },
                10,
                0,
            )
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(published.len(), 1);

        let (drafts, total) = posts
            .list(
                PostFilter {
                    category: None,
                    published: Some(false),
                },
                10,
                0,
            )
            .await
            .unwrap();
        assert_eq!(total, 0);
        assert!(drafts.is_empty());
    }

    #[tokio::test]
    async fn test_registration_scenario() {
        let (db, users) = setup().await;
        let organizer = make_user(&users, "organizer@example.com").await;
        let a = make_user(&users, "a@example.com").await;
        let b = make_user(&users, "b@example.com").await;
        let c = make_user(&users, "c@example.com").await;
        let events = EventRepository::new(db);

        let event = events
            .create(&organizer.id, career_fair(Some(2)))
            .await
            .unwrap();

        let outcome = events.register(&event.id, &a.id).await.unwrap();
        let after_a = match outcome {
            RegisterOutcome::Registered(e) => e,
            other => panic!("expected success, got {:?}", other),
        };
        assert_eq!(after_a.registered_users.len(), 1);
        assert_eq!(after_a.registered_users[0].id, a.id);

        assert!(matches!(
            events.register(&event.id, &a.id).await.unwrap(),
            RegisterOutcome::AlreadyRegistered
        ));

        let after_b = match events.register(&event.id, &b.id).await.unwrap() {
            RegisterOutcome::Registered(e) => e,
            other => panic!("expected success, got {:?}", other),
        };
        assert_eq!(after_b.registered_users.len(), 2);

        assert!(matches!(
            events.register(&event.id, &c.id).await.unwrap(),
            RegisterOutcome::Full
        ));

        let final_state = events.find(&event.id).await.unwrap().unwrap();
        assert_eq!(final_state.registered_users.len(), 2);
    }

    #[tokio::test]
    async fn test_registration_not_required() {
        let (db, users) = setup().await;
        let organizer = make_user(&users, "organizer@example.com").await;
        let events = EventRepository::new(db);

        let mut input = career_fair(None);
        input.registration_required = Some(false);
        let event = events.create(&organizer.id, input).await.unwrap();

        assert!(matches!(
            events.register(&event.id, &organizer.id).await.unwrap(),
            RegisterOutcome::NotRequired
        ));
        assert!(matches!(
            events.register("missing-id", &organizer.id).await.unwrap(),
            RegisterOutcome::NotFound
        ));
    }

    #[tokio::test]
    async fn test_concurrent_registrations_never_overshoot() {
        let (db, users) = setup().await;
        let organizer = make_user(&users, "organizer@example.com").await;
        let events = EventRepository::new(db);
        let event = events
            .create(&organizer.id, career_fair(Some(5)))
            .await
            .unwrap();

        let mut attendees = Vec::new();
        for i in 0..12 {
            attendees.push(make_user(&users, &format!("attendee{}@example.com", i)).await);
        }

        let mut handles = Vec::new();
        for attendee in attendees {
            let events = events.clone();
            let event_id = event.id.clone();
            handles.push(tokio::spawn(async move {
                events.register(&event_id, &attendee.id).await.unwrap()
            }));
        }

        let mut succeeded = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                RegisterOutcome::Registered(_) => succeeded += 1,
                RegisterOutcome::Full => full += 1,
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(succeeded, 5);
        assert_eq!(full, 7);

        let final_state = events.find(&event.id).await.unwrap().unwrap();
        assert_eq!(final_state.registered_users.len(), 5);
    }

    #[tokio::test]
    async fn test_contact_triage() {
        let (db, users) = setup().await;
        let admin = make_user(&users, "admin@example.com").await;
        let contacts = ContactRepository::new(db);

        let contact = contacts
            .create(NewContact {
                name: "Visitor".to_string(),
                email: "visitor@example.com".to_string(),
                phone: None,
                subject: "Membership".to_string(),
                message: "How do I join?".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(contact.status, ContactStatus::Pending);
        assert_eq!(contacts.count_pending().await.unwrap(), 1);

        let replied = contacts
            .update(
                &contact.id,
                ContactUpdate {
                    status: Some(ContactStatus::Replied),
                    reply: Some("Come to the next meeting".to_string()),
                },
                &admin.id,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replied.status, ContactStatus::Replied);
        assert_eq!(replied.replied_by.unwrap().id, admin.id);
        assert_eq!(contacts.count_pending().await.unwrap(), 0);
    }
}
