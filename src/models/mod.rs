// Start of file: /src/models/mod.rs

/*
* Person records stored in the grid and their HTTP representations.
*/

pub mod dto;
pub mod person;

pub use dto::{FriendRequest, PersonDto};
pub use person::{Gender, PersonEntity, PersonProfile, PersonQuery};

// End of file: /src/models/mod.rs
