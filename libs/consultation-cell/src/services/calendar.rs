// libs/consultation-cell/src/services/calendar.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, warn};

use shared_config::AppConfig;

use crate::models::{ConsultationError, FieldError, Meeting, SlotAvailability};
use crate::services::status::StatusResolver;

/// Working window and slot size of a provider's day. Hours are UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarSettings {
    pub granularity_minutes: i64,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            granularity_minutes: 30,
            day_start_hour: 9,
            day_end_hour: 18,
        }
    }
}

impl CalendarSettings {
    /// Settings from config; an invalid working day falls back to the defaults.
    pub fn from_config(config: &AppConfig) -> Self {
        let settings = Self {
            granularity_minutes: config.slot_granularity_minutes,
            day_start_hour: config.day_start_hour,
            day_end_hour: config.day_end_hour,
        };

        match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                warn!("Ignoring calendar configuration: {}", e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), ConsultationError> {
        let mut errors = Vec::new();

        if self.granularity_minutes <= 0 {
            errors.push(FieldError::new("granularity_minutes", "must be positive"));
        }
        if self.day_end_hour > 24 {
            errors.push(FieldError::new("day_end_hour", "must be at most 24"));
        }
        if self.day_start_hour >= self.day_end_hour {
            errors.push(FieldError::new("day_start_hour", "must be before day_end_hour"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConsultationError::Validation(errors))
        }
    }
}

/// Computes bookable slots and guards against double-booking a provider.
#[derive(Debug, Clone, Default)]
pub struct SlotCalendar {
    settings: CalendarSettings,
}

impl SlotCalendar {
    pub fn new(settings: CalendarSettings) -> Self {
        Self { settings }
    }

    /// Enumerates the fixed-size slots of `date` with the calendar's settings.
    pub fn available_slots(
        &self,
        provider_id: &str,
        date: NaiveDate,
        existing: &[Meeting],
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotAvailability>, ConsultationError> {
        self.available_slots_with(provider_id, date, self.settings, existing, now)
    }

    /// A slot is unavailable iff an active meeting of the provider starts
    /// exactly at the slot time. Overlaps that do not share a start time are
    /// caught by [`SlotCalendar::validate_new_slot`], not here.
    pub fn available_slots_with(
        &self,
        provider_id: &str,
        date: NaiveDate,
        settings: CalendarSettings,
        existing: &[Meeting],
        now: DateTime<Utc>,
    ) -> Result<Vec<SlotAvailability>, ConsultationError> {
        settings.validate()?;

        let day_start = date.and_hms_opt(0, 0, 0).map(|t| t.and_utc()).ok_or_else(|| {
            ConsultationError::Validation(vec![FieldError::new("date", "is not a valid day")])
        })?;
        let window_start = day_start + Duration::hours(settings.day_start_hour as i64);
        let window_end = day_start + Duration::hours(settings.day_end_hour as i64);
        let step = Duration::minutes(settings.granularity_minutes);

        let booked_starts: Vec<DateTime<Utc>> = existing
            .iter()
            .filter(|m| m.doctor_id == provider_id && StatusResolver::blocks_slot(m, now))
            .map(|m| m.scheduled_time)
            .collect();

        let mut slots = Vec::new();
        let mut slot = window_start;
        while slot + step <= window_end {
            slots.push(SlotAvailability {
                time: slot,
                available: !booked_starts.contains(&slot),
            });
            slot += step;
        }

        debug!(
            "Computed {} slots for provider {} on {} ({} booked)",
            slots.len(),
            provider_id,
            date,
            slots.iter().filter(|s| !s.available).count()
        );

        Ok(slots)
    }

    /// Rejects a requested start that is not strictly in the future or whose
    /// `[start, start + duration)` interval overlaps any active meeting of the
    /// same provider. `exclude_id` skips the meeting being rescheduled.
    pub fn validate_new_slot(
        &self,
        provider_id: &str,
        requested_time: DateTime<Utc>,
        duration_minutes: i32,
        existing: &[Meeting],
        now: DateTime<Utc>,
        exclude_id: Option<&str>,
    ) -> Result<(), ConsultationError> {
        if requested_time <= now {
            return Err(ConsultationError::SlotConflict {
                reason: "requested time must be strictly after the current time".to_string(),
                conflicting_id: None,
            });
        }

        let requested_end = requested_time + Duration::minutes(duration_minutes as i64);

        let conflict = existing.iter().find(|m| {
            m.doctor_id == provider_id
                && Some(m.id.as_str()) != exclude_id
                && StatusResolver::blocks_slot(m, now)
                && m.overlaps(requested_time, requested_end)
        });

        if let Some(existing) = conflict {
            warn!(
                "Slot conflict for provider {}: {} overlaps consultation {}",
                provider_id, requested_time, existing.id
            );
            return Err(ConsultationError::SlotConflict {
                reason: format!(
                    "provider is booked from {} to {}",
                    existing.scheduled_time.format("%Y-%m-%d %H:%M"),
                    existing.scheduled_end_time().format("%H:%M")
                ),
                conflicting_id: Some(existing.id.clone()),
            });
        }

        Ok(())
    }
}
