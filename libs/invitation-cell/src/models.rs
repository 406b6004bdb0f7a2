// libs/invitation-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use consultation_cell::models::ConsultationError;

// ==============================================================================
// DISPATCH RECORDS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DispatchChannel {
    Email,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOutcome {
    Sent,
    Failed,
}

/// One entry of a meeting's append-only invitation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvitationDispatchRecord {
    pub meeting_id: String,
    pub recipient: String,
    pub dispatched_at: DateTime<Utc>,
    pub channel: DispatchChannel,
    pub outcome: DispatchOutcome,
    pub attempts: u32,
    pub error: Option<String>,
}

/// Returned to the caller of a successful send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchResult {
    pub meeting_id: String,
    pub recipient: String,
    pub subject: String,
    pub dispatched_at: DateTime<Utc>,
    pub attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationHistory {
    pub meeting_id: String,
    pub total_sent: usize,
    pub total_failed: usize,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub records: Vec<InvitationDispatchRecord>,
}

impl InvitationHistory {
    pub fn from_records(meeting_id: &str, records: Vec<InvitationDispatchRecord>) -> Self {
        let sent: Vec<&InvitationDispatchRecord> = records
            .iter()
            .filter(|r| r.outcome == DispatchOutcome::Sent)
            .collect();

        Self {
            meeting_id: meeting_id.to_string(),
            total_sent: sent.len(),
            total_failed: records.len() - sent.len(),
            last_sent_at: sent.iter().map(|r| r.dispatched_at).max(),
            records,
        }
    }
}

// ==============================================================================
// MAIL MODELS
// ==============================================================================

/// A fully rendered email, ready for a transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// Wire body accepted by the HTTP mail API.
#[derive(Debug, Serialize)]
pub struct MailApiRequest<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub subject: &'a str,
    pub text: &'a str,
    pub html: &'a str,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum InvitationError {
    #[error("Consultation not found: {0}")]
    MeetingNotFound(String),

    #[error("Consultation {meeting_id} is no longer active ({status})")]
    MeetingExpired { meeting_id: String, status: String },

    #[error("Mail transport failed after {attempts} attempt(s): {message}")]
    Transport { message: String, attempts: u32 },

    #[error("Mail transport timed out after {attempts} attempt(s) of {timeout_seconds}s")]
    Timeout { attempts: u32, timeout_seconds: u64 },

    #[error("Mail transport not configured")]
    NotConfigured,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InvitationError {
    /// Errors after which calling `send` again for the same meeting may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            InvitationError::Transport { .. } | InvitationError::Timeout { .. }
        )
    }
}

impl From<ConsultationError> for InvitationError {
    fn from(err: ConsultationError) -> Self {
        match err {
            ConsultationError::NotFound(id) => InvitationError::MeetingNotFound(id),
            ConsultationError::MeetingExpired(id) => InvitationError::MeetingExpired {
                meeting_id: id,
                status: "expired".to_string(),
            },
            ConsultationError::MeetingCancelled(id) => InvitationError::MeetingExpired {
                meeting_id: id,
                status: "cancelled".to_string(),
            },
            ConsultationError::Storage(msg) => InvitationError::Storage(msg),
            other => InvitationError::Internal(other.to_string()),
        }
    }
}

impl From<redis::RedisError> for InvitationError {
    fn from(err: redis::RedisError) -> Self {
        InvitationError::Storage(format!("Redis error: {}", err))
    }
}

impl From<serde_json::Error> for InvitationError {
    fn from(err: serde_json::Error) -> Self {
        InvitationError::Storage(format!("Serialization error: {}", err))
    }
}
