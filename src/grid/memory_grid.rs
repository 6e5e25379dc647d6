// In-process grid: one cache map plus an atomic sequence

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{GridResult, PersonGrid};
use crate::models::{PersonEntity, PersonProfile, PersonQuery};

/// Every operation touching more than one entry holds the write lock for its
/// whole duration, which makes it atomic.
#[derive(Debug, Default)]
pub struct MemoryGrid {
    sequence: AtomicU64,
    persons: RwLock<BTreeMap<u64, PersonEntity>>,
}

impl MemoryGrid {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonGrid for MemoryGrid {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn next_id(&self) -> GridResult<u64> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn insert(&self, id: u64, profile: PersonProfile) -> GridResult<()> {
        self.persons.write().await.insert(id, PersonEntity::new(profile));
        Ok(())
    }

    async fn get(&self, id: u64) -> GridResult<Option<PersonEntity>> {
        Ok(self.persons.read().await.get(&id).cloned())
    }

    async fn get_all(&self, ids: &BTreeSet<u64>) -> GridResult<Vec<(u64, PersonEntity)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let persons = self.persons.read().await;
        Ok(ids
            .iter()
            .filter_map(|id: &u64| persons.get(id).map(|person| (*id, person.clone())))
            .collect())
    }

    async fn scan(&self, query: &PersonQuery) -> GridResult<Vec<(u64, PersonEntity)>> {
        let persons = self.persons.read().await;
        Ok(persons
            .iter()
            .filter(|(_, person)| query.matches(&person.profile))
            .map(|(id, person)| (*id, person.clone()))
            .collect())
    }

    async fn replace(&self, id: u64, profile: PersonProfile) -> GridResult<Option<PersonEntity>> {
        let mut persons = self.persons.write().await;
        Ok(persons.get_mut(&id).map(|person: &mut PersonEntity| {
            person.profile = profile;
            person.clone()
        }))
    }

    async fn remove(&self, id: u64) -> GridResult<bool> {
        let mut persons = self.persons.write().await;

        let Some(removed) = persons.remove(&id) else {
            return Ok(false);
        };

        for friend_id in &removed.friend_ids {
            if let Some(friend) = persons.get_mut(friend_id) {
                friend.friend_ids.remove(&id);
            }
        }

        debug!("Removed person {} and {} friendship(s)", id, removed.friend_ids.len());
        Ok(true)
    }

    async fn link(&self, a: u64, b: u64) -> GridResult<bool> {
        if a == b {
            return Ok(false);
        }

        let mut persons = self.persons.write().await;

        let can_link: bool = match (persons.get(&a), persons.get(&b)) {
            (Some(first), Some(second)) => {
                !first.friend_ids.contains(&b) && !second.friend_ids.contains(&a)
            }
            _ => false,
        };

        if !can_link {
            return Ok(false);
        }

        if let Some(first) = persons.get_mut(&a) {
            first.friend_ids.insert(b);
        }
        if let Some(second) = persons.get_mut(&b) {
            second.friend_ids.insert(a);
        }

        Ok(true)
    }

    async fn unlink(&self, a: u64, b: u64) -> GridResult<bool> {
        if a == b {
            return Ok(false);
        }

        let mut persons = self.persons.write().await;

        let can_unlink: bool = match (persons.get(&a), persons.get(&b)) {
            (Some(first), Some(second)) => {
                first.friend_ids.contains(&b) && second.friend_ids.contains(&a)
            }
            _ => false,
        };

        if !can_unlink {
            return Ok(false);
        }

        if let Some(first) = persons.get_mut(&a) {
            first.friend_ids.remove(&b);
        }
        if let Some(second) = persons.get_mut(&b) {
            second.friend_ids.remove(&a);
        }

        Ok(true)
    }

    async fn friend_ids(&self, id: u64) -> GridResult<BTreeSet<u64>> {
        Ok(self
            .persons
            .read()
            .await
            .get(&id)
            .map(|person: &PersonEntity| person.friend_ids.clone())
            .unwrap_or_default())
    }

    async fn contains_friend(&self, id: u64, friend_id: u64) -> GridResult<bool> {
        Ok(self
            .persons
            .read()
            .await
            .get(&id)
            .is_some_and(|person: &PersonEntity| person.friend_ids.contains(&friend_id)))
    }

    async fn size(&self) -> GridResult<usize> {
        Ok(self.persons.read().await.len())
    }

    async fn shutdown(&self) {
        info!("Memory grid shutdown, dropping {} person(s)", self.persons.read().await.len());
    }
}
