/*
* User endpoints: create, search, read, update and delete persons.
*/

pub mod handler;
pub mod routes;

pub use routes::user_routes;
