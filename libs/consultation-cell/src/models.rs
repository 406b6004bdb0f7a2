// libs/consultation-cell/src/models.rs
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

pub use shared_models::validation::FieldError;
use shared_models::validation::describe_field_errors;

/// Consultation lengths offered by the booking form.
pub const ALLOWED_DURATIONS: [i32; 5] = [15, 30, 45, 60, 90];

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

// ==============================================================================
// CORE CONSULTATION MODELS
// ==============================================================================

/// A scheduled telehealth consultation.
///
/// Patient and doctor details are a snapshot taken at creation time. `status`
/// only carries what was explicitly recorded (`scheduled` at creation, then
/// `in-consultation`, `completed` or `cancelled`); the status shown to users is
/// always derived by [`crate::services::StatusResolver`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meeting {
    pub id: String,
    pub access_token: String,
    pub patient_id: String,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub doctor_id: String,
    pub doctor_name: String,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub consultation_type: ConsultationType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: MeetingStatus,
    pub patient_joined: bool,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn scheduled_end_time(&self) -> DateTime<Utc> {
        self.scheduled_time + Duration::minutes(self.duration_minutes as i64)
    }

    /// Half-open interval overlap against `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.scheduled_end_time() && self.scheduled_time < end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MeetingStatus {
    Scheduled,
    Pending,
    Ready,
    Confirmed,
    #[serde(alias = "in_consultation")]
    InConsultation,
    Completed,
    Cancelled,
    Expired,
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeetingStatus::Scheduled => write!(f, "scheduled"),
            MeetingStatus::Pending => write!(f, "pending"),
            MeetingStatus::Ready => write!(f, "ready"),
            MeetingStatus::Confirmed => write!(f, "confirmed"),
            MeetingStatus::InConsultation => write!(f, "in-consultation"),
            MeetingStatus::Completed => write!(f, "completed"),
            MeetingStatus::Cancelled => write!(f, "cancelled"),
            MeetingStatus::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ConsultationType {
    #[serde(alias = "general_consultation", alias = "consultation")]
    General,
    #[serde(alias = "follow_up", alias = "followup")]
    FollowUp,
    #[serde(alias = "specialist_consult")]
    Specialist,
    #[serde(alias = "urgent")]
    Emergency,
    #[serde(alias = "mental_health")]
    Therapy,
}

impl ConsultationType {
    /// Wire value used in join links.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationType::General => "general",
            ConsultationType::FollowUp => "follow-up",
            ConsultationType::Specialist => "specialist",
            ConsultationType::Emergency => "emergency",
            ConsultationType::Therapy => "therapy",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConsultationType::General => "General Consultation",
            ConsultationType::FollowUp => "Follow-up Consultation",
            ConsultationType::Specialist => "Specialist Consultation",
            ConsultationType::Emergency => "Emergency Consultation",
            ConsultationType::Therapy => "Therapy Session",
        }
    }
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMeetingRequest {
    pub patient_id: String,
    pub patient_name: String,
    pub patient_email: String,
    pub patient_phone: Option<String>,
    pub doctor_id: String,
    pub doctor_name: String,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub consultation_type: ConsultationType,
    pub notes: Option<String>,
}

impl CreateMeetingRequest {
    /// Checks every field and reports all violations together.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ConsultationError> {
        let mut errors = Vec::new();

        if self.patient_name.trim().is_empty() {
            errors.push(FieldError::new("patient_name", "is required"));
        }
        if !is_valid_email(&self.patient_email) {
            errors.push(FieldError::new("patient_email", "must be a valid email address"));
        }
        if self.doctor_id.trim().is_empty() {
            errors.push(FieldError::new("doctor_id", "is required"));
        }
        errors.extend(validate_schedule(self.scheduled_time, self.duration_minutes, now));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConsultationError::Validation(errors))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleMeetingRequest {
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub room: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotAvailability {
    pub time: DateTime<Utc>,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinLinks {
    pub canonical_url: String,
    pub invitation_url: String,
    pub short_url: String,
}

/// A meeting together with the status resolved at the time of the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingView {
    pub meeting: Meeting,
    pub status: MeetingStatus,
    pub links: JoinLinks,
}

/// Public summary returned when a short link is opened; carries no secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortLinkTarget {
    pub meeting_id: String,
    pub doctor_name: String,
    pub scheduled_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: MeetingStatus,
    pub canonical_url: String,
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && EMAIL_PATTERN.is_match(email)
}

pub fn validate_schedule(
    scheduled_time: DateTime<Utc>,
    duration_minutes: i32,
    now: DateTime<Utc>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if scheduled_time <= now {
        errors.push(FieldError::new("scheduled_time", "must be in the future"));
    }
    if !ALLOWED_DURATIONS.contains(&duration_minutes) {
        errors.push(FieldError::new(
            "duration_minutes",
            "must be one of 15, 30, 45, 60 or 90",
        ));
    }

    errors
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum ConsultationError {
    #[error("Validation failed: {}", describe_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Slot conflict: {reason}")]
    SlotConflict {
        reason: String,
        conflicting_id: Option<String>,
    },

    #[error("Consultation not found: {0}")]
    NotFound(String),

    #[error("Consultation {0} has expired")]
    MeetingExpired(String),

    #[error("Consultation {0} has been cancelled")]
    MeetingCancelled(String),

    #[error("Consultation {id} cannot be {action} while {status}")]
    InvalidState {
        id: String,
        action: String,
        status: MeetingStatus,
    },

    #[error("Short code {0} matches more than one consultation")]
    AmbiguousShortCode(String),

    #[error("Access token rejected for consultation {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for ConsultationError {
    fn from(err: anyhow::Error) -> Self {
        ConsultationError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ConsultationError {
    fn from(err: serde_json::Error) -> Self {
        ConsultationError::Storage(format!("Malformed consultation record: {}", err))
    }
}
