//! Route table: wires every endpoint to its handler and access control.

use std::sync::Arc;

use crate::auth::middleware::{AuthMiddleware, RequireRole};
use crate::handlers;
use crate::middleware::Middleware;
use crate::router::{Route, Router};
use crate::state::AppState;

fn protect(state: &Arc<AppState>) -> Box<dyn Middleware> {
    Box::new(AuthMiddleware::new(state.clone()))
}

fn admin_only() -> Box<dyn Middleware> {
    Box::new(RequireRole::admin())
}

/// Build the full application router. Shared between the binary and the
/// integration tests.
pub fn build_router(state: &Arc<AppState>) -> Router {
    let mut router = Router::new();

    // auth
    router.add_route(Route::new("POST", "/auth/register", handlers::auth::register));
    router.add_route(Route::new("POST", "/auth/login", handlers::auth::login));
    router.add_route(Route::new("GET", "/auth/logout", handlers::auth::logout));
    router.add_route(
        Route::new("GET", "/auth/me", handlers::auth::me).with_middleware(protect(state)),
    );

    // blog
    router.add_route(Route::new("GET", "/blog", handlers::blog::list));
    router.add_route(Route::new("GET", "/blog/:id", handlers::blog::get));
    router.add_route(
        Route::new("POST", "/blog", handlers::blog::create).with_middleware(protect(state)),
    );
    router.add_route(
        Route::new("PUT", "/blog/:id", handlers::blog::update).with_middleware(protect(state)),
    );
    router.add_route(
        Route::new("DELETE", "/blog/:id", handlers::blog::delete).with_middleware(protect(state)),
    );

    // events
    router.add_route(Route::new("GET", "/events", handlers::events::list));
    router.add_route(Route::new("GET", "/events/:id", handlers::events::get));
    router.add_route(
        Route::new("POST", "/events", handlers::events::create).with_middleware(protect(state)),
    );
    router.add_route(
        Route::new("PUT", "/events/:id", handlers::events::update)
            .with_middleware(protect(state)),
    );
    router.add_route(
        Route::new("DELETE", "/events/:id", handlers::events::delete)
            .with_middleware(protect(state)),
    );
    router.add_route(
        Route::new("POST", "/events/:id/register", handlers::events::register)
            .with_middleware(protect(state)),
    );

    // gallery
    router.add_route(Route::new("GET", "/gallery", handlers::gallery::list));
    router.add_route(Route::new("GET", "/gallery/:id", handlers::gallery::get));
    router.add_route(
        Route::new("POST", "/gallery", handlers::gallery::create).with_middleware(protect(state)),
    );
    router.add_route(
        Route::new("PUT", "/gallery/:id", handlers::gallery::update)
            .with_middleware(protect(state)),
    );
    router.add_route(
        Route::new("DELETE", "/gallery/:id", handlers::gallery::delete)
            .with_middleware(protect(state)),
    );

    // contact desk; /contact/info must precede /contact/:id
    router.add_route(Route::new("GET", "/contact/info", handlers::contact::info));
    router.add_route(Route::new("POST", "/contact", handlers::contact::create));
    router.add_route(
        Route::new("GET", "/contact", handlers::contact::list)
            .with_middleware(protect(state))
            .with_middleware(admin_only()),
    );
    router.add_route(
        Route::new("GET", "/contact/:id", handlers::contact::get)
            .with_middleware(protect(state))
            .with_middleware(admin_only()),
    );
    router.add_route(
        Route::new("PUT", "/contact/:id", handlers::contact::update)
            .with_middleware(protect(state))
            .with_middleware(admin_only()),
    );

    // users
    router.add_route(
        Route::new("GET", "/users/profile", handlers::users::profile)
            .with_middleware(protect(state)),
    );
    router.add_route(
        Route::new("PUT", "/users/profile", handlers::users::update_profile)
            .with_middleware(protect(state)),
    );
    router.add_route(
        Route::new("GET", "/users/all", handlers::users::list_all)
            .with_middleware(protect(state))
            .with_middleware(admin_only()),
    );

    // admin
    router.add_route(
        Route::new("GET", "/admin/stats", handlers::admin::stats)
            .with_middleware(protect(state))
            .with_middleware(admin_only()),
    );
    router.add_route(
        Route::new("PUT", "/admin/users/:id/role", handlers::admin::update_user_role)
            .with_middleware(protect(state))
            .with_middleware(admin_only()),
    );
    router.add_route(
        Route::new("DELETE", "/admin/users/:id", handlers::admin::delete_user)
            .with_middleware(protect(state))
            .with_middleware(admin_only()),
    );

    router
}
