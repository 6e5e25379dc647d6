// Start of file: src/main.rs

use axum::{Router, serve};
use tokio::net::TcpListener;

use social_grid_api::core::{logging, server};
use social_grid_api::{AppState, EnvironmentVariables};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let env: EnvironmentVariables = EnvironmentVariables::instance()?.clone();
    let state: AppState = AppState::initialize(env).await?;

    let listener: TcpListener = server::setup_listener(&state.environment).await?;
    let app: Router = server::create_app(state.clone());

    tracing::info!("Server listening on: {}", listener.local_addr()?);

    serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal(state))
        .await?;

    Ok(())
}

// End of file: src/main.rs
