// libs/consultation-cell/src/services/links.rs
use chrono::SecondsFormat;

use crate::models::{JoinLinks, Meeting};

/// Number of trailing id characters used by short links.
pub const SHORT_CODE_LEN: usize = 8;

/// Builds the canonical, invitation and short join links for a meeting.
#[derive(Debug, Clone)]
pub struct JoinLinkBuilder {
    base_url: String,
}

impl JoinLinkBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `<base>/join?room=..&patient=..&doctor=..&scheduled=..&type=..`
    pub fn canonical(&self, meeting: &Meeting) -> String {
        format!(
            "{}/join?room={}&patient={}&doctor={}&scheduled={}&type={}",
            self.base_url,
            urlencoding::encode(&meeting.id),
            urlencoding::encode(&meeting.patient_id),
            urlencoding::encode(&meeting.doctor_id),
            urlencoding::encode(&meeting.scheduled_time.to_rfc3339_opts(SecondsFormat::Millis, true)),
            meeting.consultation_type.as_str(),
        )
    }

    /// The canonical link carrying the access token, sent to the patient.
    pub fn invitation(&self, meeting: &Meeting) -> String {
        format!(
            "{}&token={}",
            self.canonical(meeting),
            urlencoding::encode(&meeting.access_token)
        )
    }

    pub fn short(&self, meeting: &Meeting) -> String {
        format!("{}/join/{}", self.base_url, short_code(&meeting.id))
    }

    pub fn links(&self, meeting: &Meeting) -> JoinLinks {
        JoinLinks {
            canonical_url: self.canonical(meeting),
            invitation_url: self.invitation(meeting),
            short_url: self.short(meeting),
        }
    }
}

/// Last [`SHORT_CODE_LEN`] characters of a meeting id.
pub fn short_code(id: &str) -> &str {
    let start = id.len().saturating_sub(SHORT_CODE_LEN);
    id.get(start..).unwrap_or(id)
}
