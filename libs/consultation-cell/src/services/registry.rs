// libs/consultation-cell/src/services/registry.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, instrument, warn};

use shared_config::{AppConfig, MAX_LINK_VALIDITY_HOURS};
use shared_utils::clock::{Clock, SystemClock};

use crate::models::{
    ConsultationError, CreateMeetingRequest, Meeting, MeetingStatus, MeetingView,
    RescheduleMeetingRequest, ShortLinkTarget, SlotAvailability, validate_schedule,
};
use crate::services::calendar::{CalendarSettings, SlotCalendar};
use crate::services::links::{JoinLinkBuilder, SHORT_CODE_LEN};
use crate::services::locks::KeyedLocks;
use crate::services::status::StatusResolver;
use crate::services::store::{InMemoryMeetingStore, MeetingStore};
use crate::services::supabase_store::SupabaseMeetingStore;
use crate::services::token::TokenGenerator;

const MAX_ID_ATTEMPTS: usize = 3;

/// Authoritative create/read/update operations over consultation records.
///
/// Slot validation and insert run under a per-provider lock, so concurrent
/// bookings cannot double-book a doctor. Mutations of an existing meeting run
/// under a per-meeting lock; when both are needed the provider lock is taken
/// first. Every mutation is written to the store before returning.
pub struct MeetingRegistry {
    store: Arc<dyn MeetingStore>,
    clock: Arc<dyn Clock>,
    tokens: TokenGenerator,
    calendar: SlotCalendar,
    links: JoinLinkBuilder,
    link_validity: Duration,
    provider_locks: KeyedLocks,
    meeting_locks: KeyedLocks,
}

impl MeetingRegistry {
    pub fn new(store: Arc<dyn MeetingStore>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        Self {
            store,
            clock,
            tokens: TokenGenerator::new(),
            calendar: SlotCalendar::new(CalendarSettings::from_config(config)),
            links: JoinLinkBuilder::new(&config.join_base_url),
            link_validity: link_validity(config),
            provider_locks: KeyedLocks::new(),
            meeting_locks: KeyedLocks::new(),
        }
    }

    /// Picks the PostgREST store when configured, the in-memory store otherwise.
    pub fn from_config(config: &AppConfig) -> Self {
        let store: Arc<dyn MeetingStore> = if config.is_store_configured() {
            info!("Using Supabase consultation store at {}", config.supabase_url);
            Arc::new(SupabaseMeetingStore::from_config(config))
        } else {
            warn!("Using in-memory consultation store; records are lost on restart");
            Arc::new(InMemoryMeetingStore::new())
        };

        Self::new(store, Arc::new(SystemClock), config)
    }

    pub fn links(&self) -> &JoinLinkBuilder {
        &self.links
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn resolve_status(&self, meeting: &Meeting) -> MeetingStatus {
        StatusResolver::resolve(meeting, self.clock.now())
    }

    pub fn view(&self, meeting: Meeting) -> MeetingView {
        MeetingView {
            status: self.resolve_status(&meeting),
            links: self.links.links(&meeting),
            meeting,
        }
    }

    /// Takes the lock that serializes mutations of one meeting. `cancel`,
    /// `complete`, `reschedule` and the other mutations of `id` wait until the
    /// guard is dropped.
    pub async fn lock_meeting(&self, id: &str) -> OwnedMutexGuard<()> {
        self.meeting_locks.lock(id).await
    }

    #[instrument(skip(self, request), fields(doctor_id = %request.doctor_id))]
    pub async fn create(&self, request: CreateMeetingRequest) -> Result<Meeting, ConsultationError> {
        request.validate(self.clock.now())?;

        let _provider_guard = self.provider_locks.lock(&request.doctor_id).await;
        let now = self.clock.now();

        let existing = self.store.list_by_provider(&request.doctor_id).await?;
        self.calendar.validate_new_slot(
            &request.doctor_id,
            request.scheduled_time,
            request.duration_minutes,
            &existing,
            now,
            None,
        )?;

        let id = self.allocate_id().await?;
        let meeting = Meeting {
            id,
            access_token: self.tokens.new_access_token(),
            patient_id: request.patient_id,
            patient_name: request.patient_name.trim().to_string(),
            patient_email: request.patient_email.trim().to_string(),
            patient_phone: request.patient_phone,
            doctor_id: request.doctor_id,
            doctor_name: request.doctor_name,
            scheduled_time: request.scheduled_time,
            duration_minutes: request.duration_minutes,
            consultation_type: request.consultation_type,
            notes: request.notes,
            created_at: now,
            expires_at: now + self.link_validity,
            status: MeetingStatus::Scheduled,
            patient_joined: false,
            updated_at: now,
        };

        self.store.put(&meeting).await?;

        info!(
            "Created consultation {} for doctor {} at {}",
            meeting.id, meeting.doctor_id, meeting.scheduled_time
        );

        Ok(meeting)
    }

    pub async fn get(&self, id: &str) -> Result<Meeting, ConsultationError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ConsultationError::NotFound(id.to_string()))
    }

    /// Idempotent: cancelling an already-cancelled meeting returns it unchanged.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: &str) -> Result<Meeting, ConsultationError> {
        let _guard = self.meeting_locks.lock(id).await;
        let mut meeting = self.get(id).await?;

        match meeting.status {
            MeetingStatus::Cancelled => {
                debug!("Consultation {} already cancelled", id);
                return Ok(meeting);
            }
            MeetingStatus::Completed => {
                return Err(ConsultationError::InvalidState {
                    id: id.to_string(),
                    action: "cancelled".to_string(),
                    status: MeetingStatus::Completed,
                });
            }
            _ => {}
        }

        meeting.status = MeetingStatus::Cancelled;
        meeting.updated_at = self.clock.now();
        self.store.put(&meeting).await?;

        info!("Cancelled consultation {}", id);
        Ok(meeting)
    }

    /// Records the terminal `completed` state. Idempotent.
    #[instrument(skip(self))]
    pub async fn complete(&self, id: &str) -> Result<Meeting, ConsultationError> {
        let _guard = self.meeting_locks.lock(id).await;
        let mut meeting = self.get(id).await?;

        match meeting.status {
            MeetingStatus::Completed => return Ok(meeting),
            MeetingStatus::Cancelled => {
                return Err(ConsultationError::MeetingCancelled(id.to_string()));
            }
            _ => {}
        }

        meeting.status = MeetingStatus::Completed;
        meeting.updated_at = self.clock.now();
        self.store.put(&meeting).await?;

        info!("Completed consultation {}", id);
        Ok(meeting)
    }

    /// Sets `patient_joined` once the patient has entered the session.
    #[instrument(skip(self))]
    pub async fn mark_patient_joined(&self, id: &str) -> Result<Meeting, ConsultationError> {
        let _guard = self.meeting_locks.lock(id).await;
        let mut meeting = self.get(id).await?;

        match self.resolve_status(&meeting) {
            MeetingStatus::Cancelled => return Err(ConsultationError::MeetingCancelled(id.to_string())),
            MeetingStatus::Expired => return Err(ConsultationError::MeetingExpired(id.to_string())),
            MeetingStatus::Completed => {
                return Err(ConsultationError::InvalidState {
                    id: id.to_string(),
                    action: "joined".to_string(),
                    status: MeetingStatus::Completed,
                });
            }
            _ => {}
        }

        if !meeting.patient_joined {
            meeting.patient_joined = true;
            meeting.updated_at = self.clock.now();
            self.store.put(&meeting).await?;
            info!("Patient joined consultation {}", id);
        }

        Ok(meeting)
    }

    /// Records that the provider opened the session. Only possible inside the
    /// ready window; repeated calls while in consultation are no-ops.
    #[instrument(skip(self))]
    pub async fn start_consultation(&self, id: &str) -> Result<Meeting, ConsultationError> {
        let _guard = self.meeting_locks.lock(id).await;
        let mut meeting = self.get(id).await?;

        match self.resolve_status(&meeting) {
            MeetingStatus::Ready => {}
            MeetingStatus::InConsultation => return Ok(meeting),
            MeetingStatus::Cancelled => return Err(ConsultationError::MeetingCancelled(id.to_string())),
            MeetingStatus::Expired => return Err(ConsultationError::MeetingExpired(id.to_string())),
            status => {
                return Err(ConsultationError::InvalidState {
                    id: id.to_string(),
                    action: "started".to_string(),
                    status,
                });
            }
        }

        meeting.status = MeetingStatus::InConsultation;
        meeting.updated_at = self.clock.now();
        self.store.put(&meeting).await?;

        info!("Consultation {} in progress", id);
        Ok(meeting)
    }

    /// Moves a meeting in place. Id, token, creation and expiry are preserved;
    /// the patient has to confirm the new time again.
    #[instrument(skip(self, request))]
    pub async fn reschedule(
        &self,
        id: &str,
        request: RescheduleMeetingRequest,
    ) -> Result<Meeting, ConsultationError> {
        let provider_id = self.get(id).await?.doctor_id;
        let _provider_guard = self.provider_locks.lock(&provider_id).await;
        let _guard = self.meeting_locks.lock(id).await;

        let mut meeting = self.get(id).await?;
        let now = self.clock.now();
        let duration_minutes = request.duration_minutes.unwrap_or(meeting.duration_minutes);

        let errors = validate_schedule(request.scheduled_time, duration_minutes, now);
        if !errors.is_empty() {
            return Err(ConsultationError::Validation(errors));
        }

        match StatusResolver::resolve(&meeting, now) {
            MeetingStatus::Cancelled => return Err(ConsultationError::MeetingCancelled(id.to_string())),
            MeetingStatus::Expired => return Err(ConsultationError::MeetingExpired(id.to_string())),
            status @ (MeetingStatus::Completed | MeetingStatus::InConsultation) => {
                return Err(ConsultationError::InvalidState {
                    id: id.to_string(),
                    action: "rescheduled".to_string(),
                    status,
                });
            }
            _ => {}
        }

        let existing = self.store.list_by_provider(&meeting.doctor_id).await?;
        self.calendar.validate_new_slot(
            &meeting.doctor_id,
            request.scheduled_time,
            duration_minutes,
            &existing,
            now,
            Some(id),
        )?;

        let previous = meeting.scheduled_time;
        meeting.scheduled_time = request.scheduled_time;
        meeting.duration_minutes = duration_minutes;
        meeting.patient_joined = false;
        meeting.updated_at = now;
        self.store.put(&meeting).await?;

        info!("Rescheduled consultation {} from {} to {}", id, previous, meeting.scheduled_time);
        Ok(meeting)
    }

    /// A provider's meetings ordered by scheduled time.
    pub async fn list_by_provider(&self, provider_id: &str) -> Result<Vec<Meeting>, ConsultationError> {
        let mut meetings = self.store.list_by_provider(provider_id).await?;
        meetings.sort_by_key(|m| m.scheduled_time);
        Ok(meetings)
    }

    pub async fn available_slots(
        &self,
        provider_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<SlotAvailability>, ConsultationError> {
        let existing = self.store.list_by_provider(provider_id).await?;
        self.calendar
            .available_slots(provider_id, date, &existing, self.clock.now())
    }

    /// Resolves the trailing-characters form used by short links. The full id
    /// stays canonical; a code that matches several meetings is refused.
    pub async fn find_by_short_code(&self, code: &str) -> Result<Meeting, ConsultationError> {
        if code.len() != SHORT_CODE_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConsultationError::NotFound(code.to_string()));
        }

        let mut matches = self.store.find_by_id_suffix(code).await?;
        match matches.len() {
            0 => Err(ConsultationError::NotFound(code.to_string())),
            1 => Ok(matches.remove(0)),
            n => {
                warn!("Short code {} matches {} consultations", code, n);
                Err(ConsultationError::AmbiguousShortCode(code.to_string()))
            }
        }
    }

    pub async fn short_link_target(&self, code: &str) -> Result<ShortLinkTarget, ConsultationError> {
        let meeting = self.find_by_short_code(code).await?;

        Ok(ShortLinkTarget {
            status: self.resolve_status(&meeting),
            canonical_url: self.links.canonical(&meeting),
            meeting_id: meeting.id,
            doctor_name: meeting.doctor_name,
            scheduled_time: meeting.scheduled_time,
            duration_minutes: meeting.duration_minutes,
        })
    }

    /// Checks a join attempt: the token must match and the meeting must still
    /// be joinable.
    #[instrument(skip(self, token))]
    pub async fn authorize_join(&self, id: &str, token: &str) -> Result<MeetingView, ConsultationError> {
        let meeting = self.get(id).await?;

        if meeting.access_token.as_bytes().ct_eq(token.as_bytes()).unwrap_u8() == 0 {
            warn!("Rejected join attempt for consultation {}", id);
            return Err(ConsultationError::Unauthorized(id.to_string()));
        }

        match self.resolve_status(&meeting) {
            MeetingStatus::Cancelled => Err(ConsultationError::MeetingCancelled(id.to_string())),
            MeetingStatus::Expired => Err(ConsultationError::MeetingExpired(id.to_string())),
            MeetingStatus::Completed => Err(ConsultationError::InvalidState {
                id: id.to_string(),
                action: "joined".to_string(),
                status: MeetingStatus::Completed,
            }),
            _ => Ok(self.view(meeting)),
        }
    }

    async fn allocate_id(&self) -> Result<String, ConsultationError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.tokens.new_meeting_id();
            if self.store.get(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            warn!("Generated consultation id {} already exists, retrying", candidate);
        }

        Err(ConsultationError::Storage(
            "could not allocate a unique consultation id".to_string(),
        ))
    }
}

/// `expires_at - created_at`. Values outside `1..=MAX_LINK_VALIDITY_HOURS`
/// fall back to the default so `expires_at` never precedes `created_at`.
fn link_validity(config: &AppConfig) -> Duration {
    let hours = config.link_validity_hours;
    if (1..=MAX_LINK_VALIDITY_HOURS).contains(&hours) {
        Duration::hours(hours)
    } else {
        let fallback = AppConfig::default().link_validity_hours;
        warn!("Link validity of {}h is out of range, using {}h", hours, fallback);
        Duration::hours(fallback)
    }
}
