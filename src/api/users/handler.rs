// User management handlers

use serde_json::json;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header::LOCATION, StatusCode},
    Json,
};
use tracing::{instrument, info};

use crate::api::extract::{json_body, path_id, query_params};
use crate::config::state::AppState;
use crate::grid::GridResult;
use crate::models::{PersonDto, PersonEntity, PersonQuery};
use crate::utils::response_handler::HandlerResponse;

type HandlerResult = Result<HandlerResponse, HandlerResponse>;

fn user_not_found(id: u64) -> HandlerResponse {
    HandlerResponse::new(StatusCode::NOT_FOUND)
        .message(format!("User {id} not found"))
}

/// Resolves the friends of `person` one level deep
async fn user_with_friends(state: &AppState, id: u64, person: &PersonEntity) -> GridResult<PersonDto> {
    let friends: Vec<(u64, PersonEntity)> = state.users.read_users_by_ids(&person.friend_ids).await?;
    Ok(PersonDto::with_friends(id, person, &friends))
}

/// Stores a new user and points the client to it
#[instrument(name = "create_user", skip(state, payload))]
pub async fn create_user_handler(
    State(state): State<AppState>,
    payload: Result<Json<PersonDto>, JsonRejection>,
) -> HandlerResult {
    let dto: PersonDto = json_body(payload)?;
    let id: u64 = state.users.create_user(dto.into_profile()).await?;

    info!("Created user {}", id);
    Ok(HandlerResponse::new(StatusCode::CREATED)
        .header(LOCATION, format!("/users/{id}"))
        .data(json!({ "id": id }))
        .message("User created successfully"))
}

/// Lists users whose names contain the given fragments
#[instrument(name = "read_all_users", skip(state))]
pub async fn read_all_users_handler(
    State(state): State<AppState>,
    query: Result<Query<PersonQuery>, QueryRejection>,
) -> HandlerResult {
    let query: PersonQuery = query_params(query)?;
    let users: Vec<(u64, PersonEntity)> = state.users.read_all_users_by_query(&query).await?;

    let mut dtos: Vec<PersonDto> = Vec::with_capacity(users.len());
    for (id, person) in &users {
        dtos.push(user_with_friends(&state, *id, person).await?);
    }

    info!("Found {} user(s)", dtos.len());
    Ok(HandlerResponse::new(StatusCode::OK)
        .data(json!(dtos))
        .message("Users retrieved successfully"))
}

#[instrument(name = "read_user", skip(state))]
pub async fn read_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> HandlerResult {
    let id: u64 = path_id("userId", &user_id)?;

    let (id, person) = state.users.read_user_by_id(id).await?
        .ok_or_else(|| user_not_found(id))?;
    let dto: PersonDto = user_with_friends(&state, id, &person).await?;

    Ok(HandlerResponse::new(StatusCode::OK)
        .data(json!(dto))
        .message("User retrieved successfully"))
}

/// Replaces the profile of an existing user; friendships are kept as they are
#[instrument(name = "update_user", skip(state, payload))]
pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<PersonDto>, JsonRejection>,
) -> HandlerResult {
    let id: u64 = path_id("userId", &user_id)?;
    let dto: PersonDto = json_body(payload)?;

    let (id, person) = state.users.update_user(id, dto.into_profile()).await?
        .ok_or_else(|| user_not_found(id))?;

    info!("Updated user {}", id);
    Ok(HandlerResponse::new(StatusCode::OK)
        .data(json!(PersonDto::from_entity(id, &person)))
        .message("User updated successfully"))
}

/// Deletes a user; answers 204 whether or not it existed
#[instrument(name = "delete_user", skip(state))]
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> HandlerResult {
    let id: u64 = path_id("userId", &user_id)?;
    let removed: bool = state.users.delete_user(id).await?;

    info!("Delete user {}: removed = {}", id, removed);
    Ok(HandlerResponse::new(StatusCode::NO_CONTENT))
}
