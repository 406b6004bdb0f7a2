#![allow(dead_code)]

use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};

use consultation_cell::models::{ConsultationType, CreateMeetingRequest};
use consultation_cell::services::{InMemoryMeetingStore, MeetingRegistry};
use shared_config::AppConfig;
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::{fixed_clock, reference_now, TestConfig};

pub struct TestRegistry {
    pub registry: Arc<MeetingRegistry>,
    pub store: Arc<InMemoryMeetingStore>,
    pub clock: Arc<FixedClock>,
}

pub fn test_registry() -> TestRegistry {
    test_registry_with(&TestConfig::default().to_app_config())
}

pub fn test_registry_with(config: &AppConfig) -> TestRegistry {
    let store = Arc::new(InMemoryMeetingStore::new());
    let clock = fixed_clock();
    let registry = Arc::new(MeetingRegistry::new(store.clone(), clock.clone(), config));

    TestRegistry { registry, store, clock }
}

pub fn now() -> DateTime<Utc> {
    reference_now()
}

pub fn jane_doe_request(scheduled_time: DateTime<Utc>, duration_minutes: i32) -> CreateMeetingRequest {
    CreateMeetingRequest {
        patient_id: "pat-jane".to_string(),
        patient_name: "Jane Doe".to_string(),
        patient_email: "jane.doe@example.com".to_string(),
        patient_phone: Some("+15551234567".to_string()),
        doctor_id: "doc-smith".to_string(),
        doctor_name: "Dr. Alex Smith".to_string(),
        scheduled_time,
        duration_minutes,
        consultation_type: ConsultationType::General,
        notes: Some("Recurring headaches".to_string()),
    }
}

pub fn request_for(doctor_id: &str, offset: Duration, duration_minutes: i32) -> CreateMeetingRequest {
    CreateMeetingRequest {
        doctor_id: doctor_id.to_string(),
        ..jane_doe_request(now() + offset, duration_minutes)
    }
}
