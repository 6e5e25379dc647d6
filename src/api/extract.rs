// Request decoding shared by the person handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query,
    },
    http::StatusCode,
    Json,
};

use crate::utils::response_handler::HandlerResponse;

/// Parses a numeric path variable, answering 400 with its name when it is not one
pub fn path_id(name: &str, raw: &str) -> Result<u64, HandlerResponse> {
    raw.parse::<u64>().map_err(|_| {
        HandlerResponse::new(StatusCode::BAD_REQUEST)
            .message(format!("Path variable with name \"{name}\" is not valid"))
    })
}

/// Unwraps a JSON body; malformed or mistyped payloads become 400
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HandlerResponse> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::JsonDataError(e)) => Err(HandlerResponse::new(StatusCode::BAD_REQUEST)
            .message(e.body_text())),
        Err(JsonRejection::JsonSyntaxError(e)) => Err(HandlerResponse::new(StatusCode::BAD_REQUEST)
            .message(e.body_text())),
        Err(rejection) => Err(HandlerResponse::new(rejection.status())
            .message(rejection.body_text())),
    }
}

/// Unwraps query parameters, keeping axum's explanation on failure
pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, HandlerResponse> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection: QueryRejection| {
            HandlerResponse::new(rejection.status()).message(rejection.body_text())
        })
}
