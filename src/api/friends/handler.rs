// Handlers for the friends of a user

use serde_json::json;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::LOCATION, StatusCode},
    Json,
};
use tracing::{instrument, info};

use crate::api::extract::{json_body, path_id};
use crate::config::state::AppState;
use crate::models::{FriendRequest, PersonDto, PersonEntity};
use crate::utils::response_handler::HandlerResponse;

type HandlerResult = Result<HandlerResponse, HandlerResponse>;

/// Makes the person named in the body a friend of the user, both ways
#[instrument(name = "create_friend_of_user", skip(state, payload))]
pub async fn create_friend_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<FriendRequest>, JsonRejection>,
) -> HandlerResult {
    let user_id: u64 = path_id("userId", &user_id)?;
    let request: FriendRequest = json_body(payload)?;

    let Some(friend_id) = request.id else {
        return Err(HandlerResponse::new(StatusCode::NOT_FOUND)
            .message("Friend id is missing from the request body"));
    };

    let Some(friend_id) = state.friends.create_friend_of_user(user_id, friend_id).await? else {
        return Err(HandlerResponse::new(StatusCode::NOT_FOUND)
            .message(format!("Cannot link user {user_id} with {friend_id}")));
    };

    info!("Users {} and {} are now friends", user_id, friend_id);
    Ok(HandlerResponse::new(StatusCode::CREATED)
        .header(LOCATION, format!("/users/{user_id}/friends/{friend_id}"))
        .data(json!({ "id": friend_id }))
        .message("Friend added successfully"))
}

/// Lists the friends of a user; an unknown user simply has none
#[instrument(name = "read_all_friends_of_user", skip(state))]
pub async fn read_all_friends_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> HandlerResult {
    let user_id: u64 = path_id("userId", &user_id)?;
    let friends: Vec<(u64, PersonEntity)> = state.friends.read_all_friends_of_user(user_id).await?;

    let dtos: Vec<PersonDto> = friends
        .iter()
        .map(|(id, friend)| PersonDto::from_entity(*id, friend))
        .collect();

    Ok(HandlerResponse::new(StatusCode::OK)
        .data(json!(dtos))
        .message("Friends retrieved successfully"))
}

#[instrument(name = "read_friend_of_user", skip(state))]
pub async fn read_friend_handler(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(String, String)>,
) -> HandlerResult {
    let user_id: u64 = path_id("userId", &user_id)?;
    let friend_id: u64 = path_id("friendId", &friend_id)?;

    let (id, friend) = state.friends.read_friend_of_user_by_id(user_id, friend_id).await?
        .ok_or_else(|| {
            HandlerResponse::new(StatusCode::NOT_FOUND)
                .message(format!("User {friend_id} is not a friend of user {user_id}"))
        })?;

    Ok(HandlerResponse::new(StatusCode::OK)
        .data(json!(PersonDto::from_entity(id, &friend)))
        .message("Friend retrieved successfully"))
}

/// Ends a friendship; answers 204 whether or not it existed
#[instrument(name = "delete_friend_of_user", skip(state))]
pub async fn delete_friend_handler(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(String, String)>,
) -> HandlerResult {
    let user_id: u64 = path_id("userId", &user_id)?;
    let friend_id: u64 = path_id("friendId", &friend_id)?;

    let unlinked: bool = state.friends.delete_friend_of_user(user_id, friend_id).await?;

    info!("Unfriend {} and {}: removed = {}", user_id, friend_id, unlinked);
    Ok(HandlerResponse::new(StatusCode::NO_CONTENT))
}
