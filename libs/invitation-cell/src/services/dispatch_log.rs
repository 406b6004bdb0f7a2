// libs/invitation-cell/src/services/dispatch_log.rs
use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::{InvitationDispatchRecord, InvitationError};

const DEFAULT_KEY_PREFIX: &str = "invitation_dispatch";

/// Append-only invitation history, grouped by meeting id.
#[async_trait]
pub trait DispatchLog: Send + Sync {
    async fn append(&self, record: &InvitationDispatchRecord) -> Result<(), InvitationError>;

    /// Records of one meeting in append order.
    async fn list_for_meeting(
        &self,
        meeting_id: &str,
    ) -> Result<Vec<InvitationDispatchRecord>, InvitationError>;
}

#[derive(Debug, Default)]
pub struct InMemoryDispatchLog {
    records: RwLock<HashMap<String, Vec<InvitationDispatchRecord>>>,
}

impl InMemoryDispatchLog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DispatchLog for InMemoryDispatchLog {
    async fn append(&self, record: &InvitationDispatchRecord) -> Result<(), InvitationError> {
        self.records
            .write()
            .await
            .entry(record.meeting_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn list_for_meeting(
        &self,
        meeting_id: &str,
    ) -> Result<Vec<InvitationDispatchRecord>, InvitationError> {
        Ok(self
            .records
            .read()
            .await
            .get(meeting_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Keeps each meeting's history as a Redis list of JSON entries under
/// `<prefix>:<meeting_id>`.
pub struct RedisDispatchLog {
    pool: Pool,
    key_prefix: String,
}

impl RedisDispatchLog {
    pub async fn new(redis_url: &str) -> Result<Self, InvitationError> {
        let pool = Config::from_url(redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| InvitationError::Storage(format!("Failed to create Redis pool: {}", e)))?;

        let log = Self {
            pool,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        };

        let mut conn = log.get_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis dispatch log initialized");

        Ok(log)
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    fn key(&self, meeting_id: &str) -> String {
        format!("{}:{}", self.key_prefix, meeting_id)
    }

    async fn get_connection(&self) -> Result<Connection, InvitationError> {
        self.pool
            .get()
            .await
            .map_err(|e| InvitationError::Storage(format!("Failed to connect to Redis: {}", e)))
    }
}

#[async_trait]
impl DispatchLog for RedisDispatchLog {
    async fn append(&self, record: &InvitationDispatchRecord) -> Result<(), InvitationError> {
        let mut conn = self.get_connection().await?;
        let entry = serde_json::to_string(record)?;

        let _: () = conn.rpush(self.key(&record.meeting_id), entry).await?;
        debug!("Appended {:?} dispatch record for {}", record.outcome, record.meeting_id);
        Ok(())
    }

    async fn list_for_meeting(
        &self,
        meeting_id: &str,
    ) -> Result<Vec<InvitationDispatchRecord>, InvitationError> {
        let mut conn = self.get_connection().await?;
        let entries: Vec<String> = conn.lrange(self.key(meeting_id), 0, -1).await?;

        entries
            .iter()
            .map(|entry| serde_json::from_str(entry).map_err(InvitationError::from))
            .collect()
    }
}
