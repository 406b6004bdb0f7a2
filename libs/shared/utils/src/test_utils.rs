use std::sync::Arc;
use chrono::{DateTime, TimeZone, Utc};

use shared_config::AppConfig;

use crate::clock::FixedClock;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub join_base_url: String,
    pub mail_api_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            join_base_url: "https://clinic.test".to_string(),
            mail_api_url: String::new(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(mut self, url: &str) -> Self {
        self.supabase_url = url.to_string();
        self
    }

    pub fn with_mail_api_url(mut self, url: &str) -> Self {
        self.mail_api_url = url.to_string();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            join_base_url: self.join_base_url.clone(),
            mail_api_url: self.mail_api_url.clone(),
            mail_api_token: "test-mail-token".to_string(),
            mail_from: "clinic@clinic.test".to_string(),
            ..AppConfig::default()
        }
    }
}

/// Monday 2026-03-02 08:00 UTC, one hour before the default working window opens.
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(reference_now()))
}
