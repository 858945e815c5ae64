//! Shared application state handed to every handler and middleware.

use crate::auth::jwt::{JwtConfig, JwtService};
use crate::auth::password::PasswordService;
use crate::config::AppConfig;
use crate::database::repositories::{
    BlogRepository, ContactRepository, EventRepository, GalleryRepository, UserRepository,
};
use crate::database::Database;

pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub users: UserRepository,
    pub posts: BlogRepository,
    pub events: EventRepository,
    pub galleries: GalleryRepository,
    pub contacts: ContactRepository,
    pub jwt: JwtService,
    pub passwords: PasswordService,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database) -> Self {
        let jwt = JwtService::new(JwtConfig::new(
            &config.auth.jwt_secret,
            config.auth.token_expiration_days,
        ));
        Self {
            users: UserRepository::new(db.clone()),
            posts: BlogRepository::new(db.clone()),
            events: EventRepository::new(db.clone()),
            galleries: GalleryRepository::new(db.clone()),
            contacts: ContactRepository::new(db.clone()),
            jwt,
            passwords: PasswordService::new(),
            config,
            db,
        }
    }
}
