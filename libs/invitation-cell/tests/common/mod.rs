#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Duration as ChronoDuration;

use consultation_cell::models::{ConsultationType, CreateMeetingRequest, Meeting};
use consultation_cell::services::{InMemoryMeetingStore, MeetingRegistry};
use invitation_cell::models::MailMessage;
use invitation_cell::services::{InMemoryDispatchLog, InvitationDispatcher, MailTransport};
use shared_config::AppConfig;
use shared_utils::clock::FixedClock;
use shared_utils::test_utils::{fixed_clock, reference_now, TestConfig};

/// Scripted transport: fails the first `failures` calls, optionally stalls
/// every call, and keeps what it delivered.
#[derive(Default)]
pub struct MockTransport {
    pub calls: AtomicU32,
    failures: u32,
    delay: Option<Duration>,
    pub delivered: Mutex<Vec<MailMessage>>,
}

impl MockTransport {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(failures: u32) -> Arc<Self> {
        Arc::new(Self { failures, ..Self::default() })
    }

    pub fn stalling(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay: Some(delay), ..Self::default() })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<MailMessage> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if call <= self.failures {
            return Err(anyhow!("mail api returned 503"));
        }

        self.delivered.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

pub struct Harness {
    pub registry: Arc<MeetingRegistry>,
    pub clock: Arc<FixedClock>,
    pub log: Arc<InMemoryDispatchLog>,
    pub transport: Arc<MockTransport>,
    pub dispatcher: Arc<InvitationDispatcher>,
}

pub fn harness(transport: Arc<MockTransport>) -> Harness {
    harness_with_timeout(transport, Duration::from_secs(5))
}

pub fn harness_with_timeout(transport: Arc<MockTransport>, attempt_timeout: Duration) -> Harness {
    let config = TestConfig::default().to_app_config();
    let mut h = harness_with_config(transport.clone(), &config);
    h.dispatcher = Arc::new(
        InvitationDispatcher::new(h.registry.clone(), transport, h.log.clone(), &config)
            .with_attempt_timeout(attempt_timeout)
            .with_retry_delay(Duration::from_millis(1)),
    );
    h
}

/// Dispatcher built from `config` alone, without test overrides.
pub fn harness_with_config(transport: Arc<MockTransport>, config: &AppConfig) -> Harness {
    let clock = fixed_clock();
    let registry = Arc::new(MeetingRegistry::new(
        Arc::new(InMemoryMeetingStore::new()),
        clock.clone(),
        config,
    ));
    let log = Arc::new(InMemoryDispatchLog::new());
    let dispatcher = Arc::new(InvitationDispatcher::new(
        registry.clone(),
        transport.clone(),
        log.clone(),
        config,
    ));

    Harness { registry, clock, log, transport, dispatcher }
}

pub async fn book(registry: &MeetingRegistry, hours_ahead: i64) -> Meeting {
    registry
        .create(CreateMeetingRequest {
            patient_id: "pat-jane".to_string(),
            patient_name: "Jane Doe".to_string(),
            patient_email: "jane.doe@example.com".to_string(),
            patient_phone: None,
            doctor_id: "doc-smith".to_string(),
            doctor_name: "Dr. Alex Smith".to_string(),
            scheduled_time: reference_now() + ChronoDuration::hours(hours_ahead),
            duration_minutes: 30,
            consultation_type: ConsultationType::General,
            notes: None,
        })
        .await
        .unwrap()
}
