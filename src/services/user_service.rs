// Person lifecycle on top of the grid

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::grid::{GridResult, PersonGrid};
use crate::models::{PersonEntity, PersonProfile, PersonQuery};

#[derive(Debug, Clone)]
pub struct UserService {
    grid: Arc<dyn PersonGrid>,
}

impl UserService {
    pub fn new(grid: Arc<dyn PersonGrid>) -> Self {
        Self { grid }
    }

    /// Allocates an id from the sequence and stores the person under it
    pub async fn create_user(&self, profile: PersonProfile) -> GridResult<u64> {
        let id: u64 = self.grid.next_id().await?;
        self.grid.insert(id, profile).await?;
        debug!("Created user {}", id);
        Ok(id)
    }

    pub async fn read_all_users_by_query(&self, query: &PersonQuery) -> GridResult<Vec<(u64, PersonEntity)>> {
        self.grid.scan(query).await
    }

    pub async fn read_user_by_id(&self, id: u64) -> GridResult<Option<(u64, PersonEntity)>> {
        Ok(self.grid.get(id).await?.map(|person: PersonEntity| (id, person)))
    }

    pub async fn read_users_by_ids(&self, ids: &BTreeSet<u64>) -> GridResult<Vec<(u64, PersonEntity)>> {
        self.grid.get_all(ids).await
    }

    /// `None` when the user does not exist; friendships are left untouched
    pub async fn update_user(&self, id: u64, profile: PersonProfile) -> GridResult<Option<(u64, PersonEntity)>> {
        Ok(self.grid.replace(id, profile).await?.map(|person: PersonEntity| (id, person)))
    }

    pub async fn delete_user(&self, id: u64) -> GridResult<bool> {
        self.grid.remove(id).await
    }
}
