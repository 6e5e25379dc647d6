// Friend route definitions, nested under a user

use axum::{
    routing::{get, post},
    Router,
};

use crate::config::state::AppState;
use super::handler;

/// Creates router with all friends-of-user endpoints
pub fn friend_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/friends",
            post(handler::create_friend_handler).get(handler::read_all_friends_handler),
        )
        .route(
            "/users/{user_id}/friends/{friend_id}",
            get(handler::read_friend_handler).delete(handler::delete_friend_handler),
        )
}
