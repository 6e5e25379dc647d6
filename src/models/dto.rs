// Wire representations of persons and friendship requests

use serde::{Deserialize, Serialize};

use crate::models::person::{null_as_default, Gender, PersonEntity, PersonProfile};

/// Person as exchanged over HTTP. Friends are expanded one level deep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDto {
    #[serde(default)]
    pub id: Option<u64>,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: Gender,
    #[serde(default, deserialize_with = "null_as_default")]
    pub friends: Vec<PersonDto>,
}

impl PersonDto {
    /// Converts a stored person without resolving its friends
    pub fn from_entity(id: u64, entity: &PersonEntity) -> Self {
        let profile: &PersonProfile = &entity.profile;

        Self {
            id: Some(id),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            age: profile.age,
            gender: profile.gender,
            friends: Vec::new(),
        }
    }

    /// Converts a stored person together with its already resolved friends
    pub fn with_friends(id: u64, entity: &PersonEntity, friends: &[(u64, PersonEntity)]) -> Self {
        let mut dto: PersonDto = Self::from_entity(id, entity);
        dto.friends = friends
            .iter()
            .map(|(friend_id, friend)| Self::from_entity(*friend_id, friend))
            .collect();
        dto
    }

    /// Profile part of the payload; `id` and `friends` are never written from here
    pub fn into_profile(self) -> PersonProfile {
        PersonProfile {
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            gender: self.gender,
        }
    }
}

/// Body of `POST /users/{userId}/friends`. Only the id is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FriendRequest {
    #[serde(default)]
    pub id: Option<u64>,
}
