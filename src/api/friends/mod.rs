pub mod handler;
pub mod routes;

pub use routes::friend_routes;
