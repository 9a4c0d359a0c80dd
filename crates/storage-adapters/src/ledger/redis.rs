//! Redis-backed ledger store.
//!
//! Reads are a plain `GET`. Writes `EVAL` a Lua script that compares the
//! stored value with the expected version and sets the new value only on a
//! match. Redis runs a script atomically, so two stations can never both win
//! against the same version.

use async_trait::async_trait;
use deadpool_redis::redis::{self, Cmd};
use deadpool_redis::{Config, Connection, Pool, Runtime};
use domains::{
    DomainError, LedgerSnapshot, LedgerVersion, PickupRecord, PickupStore, Result, SwapOutcome,
};
use tracing::debug;

use super::{decode, encode};

const COMPARE_AND_SET: &str = r#"
local current = redis.call('GET', KEYS[1])
if ARGV[1] == '1' then
  if current ~= ARGV[2] then
    return 0
  end
elseif current then
  return 0
end
redis.call('SET', KEYS[1], ARGV[3])
return 1
"#;

/// `EVAL` of the compare-and-set script. ARGV is the presence flag, the
/// expected value and the new value.
fn compare_and_set(key: &str, expected: &LedgerVersion, encoded: &str) -> Cmd {
    let mut cmd = redis::cmd("EVAL");
    cmd.arg(COMPARE_AND_SET)
        .arg(1)
        .arg(key)
        .arg(if expected.0.is_some() { "1" } else { "0" })
        .arg(expected.0.as_deref().unwrap_or_default())
        .arg(encoded);
    cmd
}

pub struct RedisPickupStore {
    pool: Pool,
    key: String,
}

impl RedisPickupStore {
    pub fn new(redis_url: &str, key: impl Into<String>) -> Result<Self> {
        let pool = Config::from_url(redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| DomainError::Storage(format!("failed to create Redis pool: {e}")))?;

        Ok(Self {
            pool,
            key: key.into(),
        })
    }

    async fn connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| DomainError::Storage(format!("Redis connection error: {e}")))
    }
}

#[async_trait]
impl PickupStore for RedisPickupStore {
    async fn load(&self) -> Result<LedgerSnapshot> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(&self.key)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::Storage(format!("Redis GET error: {e}")))?;

        Ok(LedgerSnapshot {
            records: decode(raw.as_deref())?,
            version: LedgerVersion(raw),
        })
    }

    async fn compare_and_swap(
        &self,
        expected: &LedgerVersion,
        records: &[PickupRecord],
    ) -> Result<SwapOutcome> {
        let encoded = encode(records)?;
        let mut conn = self.connection().await?;

        let swapped: i64 = compare_and_set(&self.key, expected, &encoded)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::Storage(format!("Redis compare-and-set error: {e}")))?;

        debug!(key = %self.key, swapped, "ledger compare-and-set");
        Ok(if swapped == 1 {
            SwapOutcome::Swapped
        } else {
            SwapOutcome::Conflict
        })
    }
}
