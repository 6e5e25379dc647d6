// Application state shared by every handler

use std::sync::Arc;

use crate::config::environment::EnvironmentVariables;
use crate::grid::{self, PersonGrid};
use crate::services::{FriendsOfUserService, UserService};

#[derive(Debug, Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentVariables>,
    pub grid: Arc<dyn PersonGrid>,
    pub users: UserService,
    pub friends: FriendsOfUserService,
}

impl AppState {
    /// Wires the services onto an already opened grid
    pub fn new(environment: EnvironmentVariables, grid: Arc<dyn PersonGrid>) -> Self {
        Self {
            environment: Arc::new(environment),
            users: UserService::new(grid.clone()),
            friends: FriendsOfUserService::new(grid.clone()),
            grid,
        }
    }

    /// Opens the configured grid and builds the state around it
    pub async fn initialize(environment: EnvironmentVariables) -> anyhow::Result<Self> {
        let grid: Arc<dyn PersonGrid> = grid::connect(&environment).await?;
        tracing::info!("Services initialized on the {} grid", grid.backend());
        Ok(Self::new(environment, grid))
    }

    /// Releases the grid client
    pub async fn shutdown(&self) {
        self.grid.shutdown().await;
    }
}
