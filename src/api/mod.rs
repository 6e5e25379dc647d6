// Start of file: /src/api/mod.rs

/*
* HTTP surface: person routes (users and their friends) plus the status route.
*/

pub mod extract;
pub mod friends;
pub mod middleware;
pub mod status;
pub mod users;

use axum::{middleware::from_fn, Router};

use crate::config::state::AppState;

/// All person routes; every one of them requires a client that accepts JSON
pub fn person_routes() -> Router<AppState> {
    Router::new()
        .merge(users::user_routes())
        .merge(friends::friend_routes())
        .route_layer(from_fn(middleware::require_json))
}

// End of file: /src/api/mod.rs
