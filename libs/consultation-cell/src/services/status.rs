// libs/consultation-cell/src/services/status.rs
use chrono::{DateTime, Duration, Utc};

use crate::models::{Meeting, MeetingStatus};

/// Minutes before the start at which a consultation becomes joinable.
pub const READY_WINDOW_MINUTES: i64 = 15;
/// Hours before the start at which a consultation is shown as pending.
pub const PENDING_WINDOW_HOURS: i64 = 24;

/// Derives the status shown to users from a meeting's recorded state and the
/// current time. Every list, detail and join view goes through here; the
/// result depends on the clock, so it is never stored.
pub struct StatusResolver;

impl StatusResolver {
    pub fn resolve(meeting: &Meeting, now: DateTime<Utc>) -> MeetingStatus {
        if meeting.status == MeetingStatus::Cancelled {
            return MeetingStatus::Cancelled;
        }
        if now > meeting.expires_at {
            return MeetingStatus::Expired;
        }
        if meeting.status == MeetingStatus::InConsultation && now < meeting.scheduled_end_time() {
            return MeetingStatus::InConsultation;
        }
        if meeting.status == MeetingStatus::Completed || now > meeting.scheduled_time {
            return MeetingStatus::Completed;
        }

        let until_start = meeting.scheduled_time - now;
        if until_start < Duration::minutes(READY_WINDOW_MINUTES) {
            MeetingStatus::Ready
        } else if meeting.patient_joined {
            MeetingStatus::Confirmed
        } else if until_start < Duration::hours(PENDING_WINDOW_HOURS) {
            MeetingStatus::Pending
        } else {
            MeetingStatus::Scheduled
        }
    }

    /// Whether the meeting still occupies its provider's calendar.
    pub fn blocks_slot(meeting: &Meeting, now: DateTime<Utc>) -> bool {
        !matches!(
            Self::resolve(meeting, now),
            MeetingStatus::Cancelled | MeetingStatus::Expired
        )
    }
}
