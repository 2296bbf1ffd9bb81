use super::{DirectoryStore, RecordKind};
use crate::error::DutyResult;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client as RedisClient};
use tracing::info;
use uuid::Uuid;

/// Redis keys
mod keys {
    use super::RecordKind;

    pub const PREFIX: &str = "efimeries";
    /// Monotonic counter that orders records by creation
    pub const SEQUENCE: &str = "efimeries:sequence";

    /// Hash of id -> JSON payload
    pub fn records(kind: RecordKind) -> String {
        format!("{}:{}", PREFIX, kind.key())
    }

    /// Sorted set of ids scored by creation sequence
    pub fn order(kind: RecordKind) -> String {
        format!("{}:{}:order", PREFIX, kind.key())
    }
}

/// Overwrites a record only while its id is still in the order set
const REPLACE_IF_PRESENT: &str = r"
if redis.call('ZSCORE', KEYS[2], ARGV[1]) then
    redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
    return 1
end
return 0
";

/// Redis-backed directory store.
///
/// Each single-record write is atomic on the server (a MULTI/EXEC pipeline
/// or a Lua script); nothing spans several records.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis at the given URL
    pub async fn connect(redis_url: &str) -> DutyResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = RedisClient::open(redis_url)?;
        let conn = client.get_connection_manager().await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl DirectoryStore for RedisStore {
    async fn list(&self, kind: RecordKind) -> DutyResult<Vec<String>> {
        let mut conn = self.conn.clone();

        let ids: Vec<String> = conn.zrange(keys::order(kind), 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // HMGET always answers with an array, even for a single field
        let payloads: Vec<Option<String>> = redis::cmd("HMGET")
            .arg(keys::records(kind))
            .arg(&ids)
            .query_async(&mut conn)
            .await?;

        Ok(payloads.into_iter().flatten().collect())
    }

    async fn get(&self, kind: RecordKind, id: Uuid) -> DutyResult<Option<String>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.hget(keys::records(kind), id.to_string()).await?;
        Ok(payload)
    }

    async fn insert(&self, kind: RecordKind, id: Uuid, payload: String) -> DutyResult<()> {
        let mut conn = self.conn.clone();
        let seq: i64 = conn.incr(keys::SEQUENCE, 1).await?;
        let field = id.to_string();

        let _: () = redis::pipe()
            .atomic()
            .hset(keys::records(kind), &field, payload)
            .ignore()
            .zadd(keys::order(kind), &field, seq)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn replace(&self, kind: RecordKind, id: Uuid, payload: String) -> DutyResult<bool> {
        let mut conn = self.conn.clone();

        // A concurrent remove must not be resurrected by this write
        let replaced: i64 = redis::Script::new(REPLACE_IF_PRESENT)
            .key(keys::records(kind))
            .key(keys::order(kind))
            .arg(id.to_string())
            .arg(payload)
            .invoke_async(&mut conn)
            .await?;

        Ok(replaced == 1)
    }

    async fn remove(&self, kind: RecordKind, id: Uuid) -> DutyResult<bool> {
        let mut conn = self.conn.clone();
        let field = id.to_string();

        let (removed, _): (i64, i64) = redis::pipe()
            .atomic()
            .hdel(keys::records(kind), &field)
            .zrem(keys::order(kind), &field)
            .query_async(&mut conn)
            .await?;

        Ok(removed > 0)
    }
}
