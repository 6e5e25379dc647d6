// Mutual friendships between persons

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::grid::{GridResult, PersonGrid};
use crate::models::PersonEntity;

#[derive(Debug, Clone)]
pub struct FriendsOfUserService {
    grid: Arc<dyn PersonGrid>,
}

impl FriendsOfUserService {
    pub fn new(grid: Arc<dyn PersonGrid>) -> Self {
        Self { grid }
    }

    /// Links both directions at once. Returns the friend id when the link was made.
    pub async fn create_friend_of_user(&self, user_id: u64, friend_id: u64) -> GridResult<Option<u64>> {
        let linked: bool = self.grid.link(user_id, friend_id).await?;
        debug!("Link {} <-> {}: {}", user_id, friend_id, linked);
        Ok(linked.then_some(friend_id))
    }

    pub async fn read_all_friends_of_user(&self, user_id: u64) -> GridResult<Vec<(u64, PersonEntity)>> {
        let friend_ids: BTreeSet<u64> = self.grid.friend_ids(user_id).await?;
        self.grid.get_all(&friend_ids).await
    }

    /// The friend, provided `user_id` actually holds it as a friend
    pub async fn read_friend_of_user_by_id(
        &self,
        user_id: u64,
        friend_id: u64,
    ) -> GridResult<Option<(u64, PersonEntity)>> {
        if !self.grid.contains_friend(user_id, friend_id).await? {
            return Ok(None);
        }

        Ok(self.grid.get(friend_id).await?.map(|friend: PersonEntity| (friend_id, friend)))
    }

    pub async fn delete_friend_of_user(&self, user_id: u64, friend_id: u64) -> GridResult<bool> {
        let unlinked: bool = self.grid.unlink(user_id, friend_id).await?;
        debug!("Unlink {} <-> {}: {}", user_id, friend_id, unlinked);
        Ok(unlinked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MemoryGrid;
    use crate::models::{Gender, PersonProfile};
    use crate::services::UserService;

    fn profile(first: &str) -> PersonProfile {
        PersonProfile {
            first_name: first.into(),
            last_name: "Ray".into(),
            age: 33,
            gender: Gender::Female,
        }
    }

    #[tokio::test]
    async fn friends_are_read_through_the_relation() {
        let grid: Arc<dyn PersonGrid> = Arc::new(MemoryGrid::new());
        let users: UserService = UserService::new(grid.clone());
        let friends: FriendsOfUserService = FriendsOfUserService::new(grid);

        let ann: u64 = users.create_user(profile("Ann")).await.unwrap();
        let bea: u64 = users.create_user(profile("Bea")).await.unwrap();
        let cat: u64 = users.create_user(profile("Cat")).await.unwrap();

        assert_eq!(friends.create_friend_of_user(ann, bea).await.unwrap(), Some(bea));
        assert_eq!(friends.create_friend_of_user(bea, ann).await.unwrap(), None);

        let of_bea: Vec<u64> = friends
            .read_all_friends_of_user(bea)
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(of_bea, vec![ann]);

        assert!(friends.read_friend_of_user_by_id(ann, bea).await.unwrap().is_some());
        assert!(friends.read_friend_of_user_by_id(ann, cat).await.unwrap().is_none());

        assert!(friends.delete_friend_of_user(bea, ann).await.unwrap());
        assert!(!friends.delete_friend_of_user(bea, ann).await.unwrap());
        assert!(friends.read_all_friends_of_user(ann).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_user_disappears_from_friend_lists() {
        let grid: Arc<dyn PersonGrid> = Arc::new(MemoryGrid::new());
        let users: UserService = UserService::new(grid.clone());
        let friends: FriendsOfUserService = FriendsOfUserService::new(grid);

        let ann: u64 = users.create_user(profile("Ann")).await.unwrap();
        let bea: u64 = users.create_user(profile("Bea")).await.unwrap();
        friends.create_friend_of_user(ann, bea).await.unwrap();

        assert!(users.delete_user(bea).await.unwrap());
        assert!(friends.read_all_friends_of_user(ann).await.unwrap().is_empty());
        assert!(users.read_user_by_id(bea).await.unwrap().is_none());
    }
}
