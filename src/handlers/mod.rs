//! Route handlers, one module per resource.

pub mod admin;
pub mod auth;
pub mod blog;
pub mod contact;
pub mod events;
pub mod gallery;
pub mod users;
