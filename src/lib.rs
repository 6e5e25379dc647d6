// Library root for the persons-and-friends API backed by a data grid

pub mod api;
pub mod config;
pub mod core;
pub mod grid;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::config::environment::EnvironmentVariables;
pub use crate::config::state::AppState;
pub use crate::core::server::create_app;
pub use crate::grid::{GridError, MemoryGrid, PersonGrid};
