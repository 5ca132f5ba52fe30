pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};

use crate::auth::AppState;

/// Assemble the full API router. The server binary and the integration
/// tests both go through here so they exercise the same routes and
/// middleware stack.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/messages/{id}", get(messages::get_message))
        .route("/messages", post(messages::create_message))
        .route("/messages/{id}/read", post(messages::mark_read))
        .layer(from_fn(middleware::require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
