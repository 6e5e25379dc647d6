// Start of file: /src/services/mod.rs

pub mod friends_service;
pub mod user_service;

pub use friends_service::FriendsOfUserService;
pub use user_service::UserService;

// End of file: /src/services/mod.rs
