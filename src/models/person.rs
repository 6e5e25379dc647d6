// Person records as they live in the grid

use std::collections::BTreeSet;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// Profile fields of a person, without relations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonProfile {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gender: Gender,
}

/// Value stored in the `persons` cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonEntity {
    #[serde(flatten)]
    pub profile: PersonProfile,
    #[serde(default)]
    pub friend_ids: BTreeSet<u64>,
}

impl PersonEntity {
    pub fn new(profile: PersonProfile) -> Self {
        Self { profile, friend_ids: BTreeSet::new() }
    }
}

/// Name filter for scanning the cache. Absent fragments match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl PersonQuery {
    pub fn matches(&self, profile: &PersonProfile) -> bool {
        let first_ok: bool = self
            .first_name
            .as_deref()
            .is_none_or(|fragment: &str| profile.first_name.contains(fragment));
        let last_ok: bool = self
            .last_name
            .as_deref()
            .is_none_or(|fragment: &str| profile.last_name.contains(fragment));

        first_ok && last_ok
    }
}

/// Treats an explicit JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
