// libs/consultation-cell/src/services/store.rs
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{ConsultationError, Meeting};

/// Persistence for consultation records, keyed by meeting id.
#[async_trait]
pub trait MeetingStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Meeting>, ConsultationError>;

    /// Inserts or overwrites the record with the same id.
    async fn put(&self, meeting: &Meeting) -> Result<(), ConsultationError>;

    /// Meetings of one provider, ordered by scheduled time.
    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Meeting>, ConsultationError>;

    async fn list_all(&self) -> Result<Vec<Meeting>, ConsultationError>;

    async fn delete(&self, id: &str) -> Result<bool, ConsultationError>;

    async fn find_by_id_suffix(&self, suffix: &str) -> Result<Vec<Meeting>, ConsultationError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|m| m.id.ends_with(suffix))
            .collect())
    }
}

/// Process-local store used for demos, development and tests.
#[derive(Debug, Default)]
pub struct InMemoryMeetingStore {
    meetings: RwLock<HashMap<String, Meeting>>,
}

impl InMemoryMeetingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MeetingStore for InMemoryMeetingStore {
    async fn get(&self, id: &str) -> Result<Option<Meeting>, ConsultationError> {
        Ok(self.meetings.read().await.get(id).cloned())
    }

    async fn put(&self, meeting: &Meeting) -> Result<(), ConsultationError> {
        self.meetings
            .write()
            .await
            .insert(meeting.id.clone(), meeting.clone());
        Ok(())
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Meeting>, ConsultationError> {
        let mut meetings: Vec<Meeting> = self
            .meetings
            .read()
            .await
            .values()
            .filter(|m| m.doctor_id == provider_id)
            .cloned()
            .collect();
        meetings.sort_by_key(|m| m.scheduled_time);
        Ok(meetings)
    }

    async fn list_all(&self) -> Result<Vec<Meeting>, ConsultationError> {
        let mut meetings: Vec<Meeting> = self.meetings.read().await.values().cloned().collect();
        meetings.sort_by_key(|m| m.scheduled_time);
        Ok(meetings)
    }

    async fn delete(&self, id: &str) -> Result<bool, ConsultationError> {
        Ok(self.meetings.write().await.remove(id).is_some())
    }
}
