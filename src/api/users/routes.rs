// User route definitions

use axum::{
    routing::{get, post},
    Router,
};

use crate::config::state::AppState;
use super::handler;

/// Creates router with all user endpoints
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            post(handler::create_user_handler).get(handler::read_all_users_handler),
        )
        .route(
            "/users/{user_id}",
            get(handler::read_user_handler)
                .put(handler::update_user_handler)
                .delete(handler::delete_user_handler),
        )
}
