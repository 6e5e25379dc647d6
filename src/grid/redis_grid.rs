// Grid backed by remote Redis nodes
//
// Layout per cache `c`:
//   c:{id}          profile JSON
//   c:{id}:friends  set of friend ids
//   c:ids           set of every stored id
//   {sequence}      id counter

use std::{collections::BTreeSet, time::Duration};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    Client, Script,
};
use tracing::{info, warn};

use super::{GridError, GridResult, PersonGrid};
use crate::config::environment::{EnvironmentVariables, GridNode};
use crate::models::{PersonEntity, PersonProfile, PersonQuery};

// KEYS: profile a, profile b, friends a, friends b; ARGV: a, b
static LINK_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 or redis.call('EXISTS', KEYS[2]) == 0 then
            return 0
        end
        if redis.call('SISMEMBER', KEYS[3], ARGV[2]) == 1 or redis.call('SISMEMBER', KEYS[4], ARGV[1]) == 1 then
            return 0
        end
        redis.call('SADD', KEYS[3], ARGV[2])
        redis.call('SADD', KEYS[4], ARGV[1])
        return 1
        ",
    )
});

// Same keys and arguments as LINK_SCRIPT
static UNLINK_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 or redis.call('EXISTS', KEYS[2]) == 0 then
            return 0
        end
        if redis.call('SISMEMBER', KEYS[3], ARGV[2]) == 0 or redis.call('SISMEMBER', KEYS[4], ARGV[1]) == 0 then
            return 0
        end
        redis.call('SREM', KEYS[3], ARGV[2])
        redis.call('SREM', KEYS[4], ARGV[1])
        return 1
        ",
    )
});

// KEYS: profile, friends; ARGV: profile JSON
// Returns nil when the person is absent, else the friend ids read with the write
static REPLACE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return false
        end
        redis.call('SET', KEYS[1], ARGV[1])
        return redis.call('SMEMBERS', KEYS[2])
        ",
    )
});

// KEYS: profile, friends, id index; ARGV: id, cache name
static REMOVE_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return 0
        end
        local friends = redis.call('SMEMBERS', KEYS[2])
        for _, friend in ipairs(friends) do
            redis.call('SREM', ARGV[2] .. ':' .. friend .. ':friends', ARGV[1])
        end
        redis.call('DEL', KEYS[1], KEYS[2])
        redis.call('SREM', KEYS[3], ARGV[1])
        return 1
        ",
    )
});

const NODE_CONNECT_RETRIES: usize = 1;
const NODE_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct RedisGrid {
    connection: ConnectionManager,
    node: GridNode,
    cache_name: String,
    sequence_name: String,
}

impl std::fmt::Debug for RedisGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisGrid")
            .field("node", &self.node)
            .field("cache_name", &self.cache_name)
            .field("sequence_name", &self.sequence_name)
            .finish()
    }
}

impl RedisGrid {
    /// Connects to the first configured node that answers `PING`
    pub async fn connect(env: &EnvironmentVariables) -> GridResult<Self> {
        for node in &env.grid_remote_nodes {
            match Self::connect_node(node, &env.grid_node_name).await {
                Ok(connection) => {
                    info!("Connected to grid node {} as '{}'", node, env.grid_node_name);
                    return Ok(Self {
                        connection,
                        node: node.clone(),
                        cache_name: env.grid_cache_name.to_string(),
                        sequence_name: env.grid_sequence_name.to_string(),
                    });
                }
                Err(e) => warn!("Grid node {} is not reachable: {}", node, e),
            }
        }

        let tried: Vec<String> = env.grid_remote_nodes.iter().map(GridNode::to_string).collect();
        Err(GridError::Unreachable(tried.join(", ")))
    }

    async fn connect_node(node: &GridNode, client_name: &str) -> GridResult<ConnectionManager> {
        let client: Client = Client::open(format!("redis://{}:{}/", node.host, node.port))?;
        // Give up on a node quickly so the next one gets its turn
        let config: ConnectionManagerConfig = ConnectionManagerConfig::new()
            .set_number_of_retries(NODE_CONNECT_RETRIES)
            .set_connection_timeout(NODE_CONNECT_TIMEOUT);
        let mut connection: ConnectionManager =
            ConnectionManager::new_with_config(client, config).await?;

        let _: () = redis::cmd("PING").query_async(&mut connection).await?;
        let _: () = redis::cmd("CLIENT")
            .arg("SETNAME")
            .arg(client_name)
            .query_async(&mut connection)
            .await?;

        Ok(connection)
    }

    fn profile_key(&self, id: u64) -> String {
        format!("{}:{}", self.cache_name, id)
    }

    fn friends_key(&self, id: u64) -> String {
        format!("{}:{}:friends", self.cache_name, id)
    }

    fn index_key(&self) -> String {
        format!("{}:ids", self.cache_name)
    }

    /// Loads entities for `ids`, skipping ids whose profile is gone
    async fn load_many(&self, ids: &[u64]) -> GridResult<Vec<(u64, PersonEntity)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn: ConnectionManager = self.connection.clone();

        let profile_keys: Vec<String> = ids.iter().map(|id: &u64| self.profile_key(*id)).collect();
        let profiles: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&profile_keys)
            .query_async(&mut conn)
            .await?;

        let mut pipe: redis::Pipeline = redis::pipe();
        for id in ids {
            pipe.cmd("SMEMBERS").arg(self.friends_key(*id));
        }
        let friend_sets: Vec<BTreeSet<u64>> = pipe.query_async(&mut conn).await?;

        let mut result: Vec<(u64, PersonEntity)> = Vec::with_capacity(ids.len());
        for ((id, profile), friend_ids) in ids.iter().zip(profiles).zip(friend_sets) {
            if let Some(raw) = profile {
                let profile: PersonProfile = serde_json::from_str(&raw)?;
                result.push((*id, PersonEntity { profile, friend_ids }));
            }
        }

        Ok(result)
    }

    async fn run_pair_script(&self, script: &Script, a: u64, b: u64) -> GridResult<bool> {
        if a == b {
            return Ok(false);
        }

        let mut conn: ConnectionManager = self.connection.clone();
        let applied: i64 = script
            .key(self.profile_key(a))
            .key(self.profile_key(b))
            .key(self.friends_key(a))
            .key(self.friends_key(b))
            .arg(a)
            .arg(b)
            .invoke_async(&mut conn)
            .await?;

        Ok(applied == 1)
    }
}

#[async_trait]
impl PersonGrid for RedisGrid {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn next_id(&self) -> GridResult<u64> {
        let mut conn: ConnectionManager = self.connection.clone();
        let id: u64 = redis::cmd("INCR")
            .arg(&self.sequence_name)
            .query_async(&mut conn)
            .await?;
        Ok(id)
    }

    async fn insert(&self, id: u64, profile: PersonProfile) -> GridResult<()> {
        let payload: String = serde_json::to_string(&profile)?;
        let mut conn: ConnectionManager = self.connection.clone();

        let _: () = redis::pipe()
            .atomic()
            .cmd("SET").arg(self.profile_key(id)).arg(payload).ignore()
            .cmd("DEL").arg(self.friends_key(id)).ignore()
            .cmd("SADD").arg(self.index_key()).arg(id).ignore()
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn get(&self, id: u64) -> GridResult<Option<PersonEntity>> {
        Ok(self.load_many(&[id]).await?.pop().map(|(_, person)| person))
    }

    async fn get_all(&self, ids: &BTreeSet<u64>) -> GridResult<Vec<(u64, PersonEntity)>> {
        let ids: Vec<u64> = ids.iter().copied().collect();
        self.load_many(&ids).await
    }

    async fn scan(&self, query: &PersonQuery) -> GridResult<Vec<(u64, PersonEntity)>> {
        let mut conn: ConnectionManager = self.connection.clone();
        let ids: BTreeSet<u64> = redis::cmd("SMEMBERS")
            .arg(self.index_key())
            .query_async(&mut conn)
            .await?;

        let ids: Vec<u64> = ids.into_iter().collect();
        let mut persons: Vec<(u64, PersonEntity)> = self.load_many(&ids).await?;
        persons.retain(|(_, person)| query.matches(&person.profile));

        Ok(persons)
    }

    async fn replace(&self, id: u64, profile: PersonProfile) -> GridResult<Option<PersonEntity>> {
        let payload: String = serde_json::to_string(&profile)?;
        let mut conn: ConnectionManager = self.connection.clone();

        let friend_ids: Option<BTreeSet<u64>> = REPLACE_SCRIPT
            .key(self.profile_key(id))
            .key(self.friends_key(id))
            .arg(payload)
            .invoke_async(&mut conn)
            .await?;

        Ok(friend_ids.map(|friend_ids: BTreeSet<u64>| PersonEntity { profile, friend_ids }))
    }

    async fn remove(&self, id: u64) -> GridResult<bool> {
        let mut conn: ConnectionManager = self.connection.clone();
        let removed: i64 = REMOVE_SCRIPT
            .key(self.profile_key(id))
            .key(self.friends_key(id))
            .key(self.index_key())
            .arg(id)
            .arg(&self.cache_name)
            .invoke_async(&mut conn)
            .await?;

        Ok(removed == 1)
    }

    async fn link(&self, a: u64, b: u64) -> GridResult<bool> {
        self.run_pair_script(&LINK_SCRIPT, a, b).await
    }

    async fn unlink(&self, a: u64, b: u64) -> GridResult<bool> {
        self.run_pair_script(&UNLINK_SCRIPT, a, b).await
    }

    async fn friend_ids(&self, id: u64) -> GridResult<BTreeSet<u64>> {
        let mut conn: ConnectionManager = self.connection.clone();
        let friend_ids: BTreeSet<u64> = redis::cmd("SMEMBERS")
            .arg(self.friends_key(id))
            .query_async(&mut conn)
            .await?;
        Ok(friend_ids)
    }

    async fn contains_friend(&self, id: u64, friend_id: u64) -> GridResult<bool> {
        let mut conn: ConnectionManager = self.connection.clone();
        let contains: bool = redis::cmd("SISMEMBER")
            .arg(self.friends_key(id))
            .arg(friend_id)
            .query_async(&mut conn)
            .await?;
        Ok(contains)
    }

    async fn size(&self) -> GridResult<usize> {
        let mut conn: ConnectionManager = self.connection.clone();
        let size: usize = redis::cmd("SCARD")
            .arg(self.index_key())
            .query_async(&mut conn)
            .await?;
        Ok(size)
    }

    async fn shutdown(&self) {
        // ConnectionManager closes its socket when the last clone is dropped
        info!("Redis grid client for node {} shutting down", self.node);
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::{SystemTime, UNIX_EPOCH}};

    use super::*;
    use crate::models::Gender;

    fn env_with(pairs: &[(&str, &str)]) -> EnvironmentVariables {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        EnvironmentVariables::from_vars(&vars).unwrap()
    }

    fn profile(first: &str) -> PersonProfile {
        PersonProfile {
            first_name: first.into(),
            last_name: "Smith".into(),
            age: 25,
            gender: Gender::Female,
        }
    }

    /// Connects to `TEST_REDIS_NODES` (default `127.0.0.1:6379`) with a cache
    /// and sequence of its own, then stores one person per name
    async fn live_grid(names: &[&str]) -> RedisGrid {
        let nodes: String =
            std::env::var("TEST_REDIS_NODES").unwrap_or_else(|_| "127.0.0.1:6379".to_string());
        let nanos: u128 = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let cache: String = format!("test-persons-{}-{}", std::process::id(), nanos);
        let sequence: String = format!("{cache}-sequence");

        let grid: RedisGrid = RedisGrid::connect(&env_with(&[
            ("GRID_BACKEND", "redis"),
            ("GRID_REMOTE_NODES", &nodes),
            ("GRID_CACHE_NAME", &cache),
            ("GRID_SEQUENCE_NAME", &sequence),
        ]))
        .await
        .unwrap();

        for name in names {
            let id: u64 = grid.next_id().await.unwrap();
            grid.insert(id, profile(name)).await.unwrap();
        }
        grid
    }

    #[tokio::test]
    async fn connect_fails_over_and_reports_every_node() {
        let env: EnvironmentVariables = env_with(&[
            ("GRID_BACKEND", "redis"),
            ("GRID_REMOTE_NODES", "127.0.0.1:1,127.0.0.1:2"),
        ]);

        match RedisGrid::connect(&env).await {
            Err(GridError::Unreachable(tried)) => assert_eq!(tried, "127.0.0.1:1, 127.0.0.1:2"),
            other => panic!("expected an unreachable grid, got {other:?}"),
        }
    }

    #[tokio::test]
    #[ignore = "needs a Redis node, see TEST_REDIS_NODES"]
    async fn live_link_is_symmetric_and_all_or_nothing() {
        let grid: RedisGrid = live_grid(&["Ann", "Bob"]).await;

        assert!(grid.link(1, 2).await.unwrap());
        assert!(grid.contains_friend(1, 2).await.unwrap());
        assert!(grid.contains_friend(2, 1).await.unwrap());
        assert!(!grid.link(2, 1).await.unwrap());

        assert!(!grid.link(1, 99).await.unwrap());
        assert!(!grid.link(1, 1).await.unwrap());
        assert_eq!(grid.friend_ids(1).await.unwrap(), BTreeSet::from([2]));
    }

    #[tokio::test]
    #[ignore = "needs a Redis node, see TEST_REDIS_NODES"]
    async fn live_unlink_requires_both_sides() {
        let grid: RedisGrid = live_grid(&["Ann", "Bob", "Cid"]).await;
        grid.link(1, 2).await.unwrap();

        assert!(!grid.unlink(1, 3).await.unwrap());
        assert!(grid.unlink(2, 1).await.unwrap());
        assert!(grid.friend_ids(1).await.unwrap().is_empty());
        assert!(grid.friend_ids(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "needs a Redis node, see TEST_REDIS_NODES"]
    async fn live_remove_drops_person_from_friend_sets() {
        let grid: RedisGrid = live_grid(&["Ann", "Bob", "Cid"]).await;
        grid.link(1, 2).await.unwrap();
        grid.link(3, 2).await.unwrap();

        assert!(grid.remove(2).await.unwrap());
        assert!(!grid.remove(2).await.unwrap());
        assert!(grid.get(2).await.unwrap().is_none());
        assert!(grid.friend_ids(1).await.unwrap().is_empty());
        assert!(grid.friend_ids(3).await.unwrap().is_empty());
        assert_eq!(grid.size().await.unwrap(), 2);
    }

    #[tokio::test]
    #[ignore = "needs a Redis node, see TEST_REDIS_NODES"]
    async fn live_replace_keeps_friendships() {
        let grid: RedisGrid = live_grid(&["Ann", "Bob"]).await;
        grid.link(1, 2).await.unwrap();

        let replaced: PersonEntity = grid.replace(1, profile("Anna")).await.unwrap().unwrap();
        assert_eq!(replaced.profile.first_name, "Anna");
        assert_eq!(replaced.friend_ids, BTreeSet::from([2]));

        let bob: PersonEntity = grid.replace(2, profile("Bobby")).await.unwrap().unwrap();
        assert_eq!(bob.friend_ids, BTreeSet::from([1]));

        assert!(grid.replace(42, profile("Nobody")).await.unwrap().is_none());
        assert!(grid.get(42).await.unwrap().is_none());
        assert_eq!(grid.get(1).await.unwrap().unwrap().profile.first_name, "Anna");
    }

    #[tokio::test]
    #[ignore = "needs a Redis node, see TEST_REDIS_NODES"]
    async fn live_scan_and_get_all_are_ordered_by_id() {
        let grid: RedisGrid = live_grid(&["Ann", "Bob", "Annette"]).await;

        let query: PersonQuery = PersonQuery { first_name: Some("Ann".into()), last_name: None };
        let ids: Vec<u64> = grid.scan(&query).await.unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 3]);

        let wanted: BTreeSet<u64> = [3, 1, 77].into_iter().collect();
        let found: Vec<u64> = grid.get_all(&wanted).await.unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(found, vec![1, 3]);
    }
}
