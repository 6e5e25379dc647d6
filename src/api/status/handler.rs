// Health information about the service and its grid

use serde_json::json;
use axum::{extract::State, http::StatusCode};
use tracing::{instrument, info};

use crate::config::state::AppState;
use crate::utils::response_handler::HandlerResponse;

/// Returns API status and grid information
#[instrument(skip(state))]
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<HandlerResponse, HandlerResponse> {
    info!("Status endpoint called");

    let persons: usize = state.grid.size().await?;

    Ok(HandlerResponse::new(StatusCode::OK)
        .data(json!({
            "version": env!("CARGO_PKG_VERSION"),
            "status": "healthy",
            "environment": state.environment.environment.as_ref(),
            "grid": {
                "backend": state.grid.backend(),
                "node": state.environment.grid_node_name.as_ref(),
                "cache": state.environment.grid_cache_name.as_ref(),
                "persons": persons,
            }
        }))
        .message("API is running successfully"))
}
