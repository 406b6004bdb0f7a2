// libs/consultation-cell/src/services/supabase_store.rs
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{ConsultationError, Meeting};
use crate::services::store::MeetingStore;

const CONSULTATIONS_PATH: &str = "/rest/v1/consultations";

/// Meeting store backed by the `consultations` table through PostgREST.
/// Writes are single-row upserts keyed by id.
pub struct SupabaseMeetingStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseMeetingStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Arc::new(SupabaseClient::new(config)))
    }

    fn representation_headers(prefer: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static(prefer));
        headers
    }

    async fn query(&self, path: &str) -> Result<Vec<Meeting>, ConsultationError> {
        let rows: Vec<Value> = self.supabase.request(Method::GET, path, None).await?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(ConsultationError::from))
            .collect()
    }
}

#[async_trait]
impl MeetingStore for SupabaseMeetingStore {
    async fn get(&self, id: &str) -> Result<Option<Meeting>, ConsultationError> {
        let path = format!("{}?id=eq.{}", CONSULTATIONS_PATH, urlencoding::encode(id));
        Ok(self.query(&path).await?.into_iter().next())
    }

    async fn put(&self, meeting: &Meeting) -> Result<(), ConsultationError> {
        debug!("Upserting consultation {}", meeting.id);

        let body = serde_json::to_value(meeting)?;
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                CONSULTATIONS_PATH,
                Some(body),
                Some(Self::representation_headers(
                    "resolution=merge-duplicates,return=representation",
                )),
            )
            .await?;

        if rows.is_empty() {
            return Err(ConsultationError::Storage(format!(
                "Upsert of consultation {} returned no rows",
                meeting.id
            )));
        }

        Ok(())
    }

    async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Meeting>, ConsultationError> {
        let path = format!(
            "{}?doctor_id=eq.{}&order=scheduled_time.asc",
            CONSULTATIONS_PATH,
            urlencoding::encode(provider_id)
        );
        self.query(&path).await
    }

    async fn list_all(&self) -> Result<Vec<Meeting>, ConsultationError> {
        let path = format!("{}?order=scheduled_time.asc", CONSULTATIONS_PATH);
        self.query(&path).await
    }

    async fn delete(&self, id: &str) -> Result<bool, ConsultationError> {
        let path = format!("{}?id=eq.{}", CONSULTATIONS_PATH, urlencoding::encode(id));
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                Some(Self::representation_headers("return=representation")),
            )
            .await?;

        Ok(!rows.is_empty())
    }

    async fn find_by_id_suffix(&self, suffix: &str) -> Result<Vec<Meeting>, ConsultationError> {
        let path = format!(
            "{}?id=like.*{}",
            CONSULTATIONS_PATH,
            urlencoding::encode(suffix)
        );
        self.query(&path).await
    }
}
