pub mod json_negotiation;

pub use json_negotiation::require_json;
