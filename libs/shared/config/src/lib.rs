use std::env;
use std::str::FromStr;
use tracing::warn;

/// Upper bound for `LINK_VALIDITY_HOURS` (one year).
pub const MAX_LINK_VALIDITY_HOURS: i64 = 24 * 365;
/// Upper bound for `SLOT_GRANULARITY_MINUTES` (one day).
pub const MAX_SLOT_GRANULARITY_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub join_base_url: String,
    pub link_validity_hours: i64,
    pub slot_granularity_minutes: i64,
    pub day_start_hour: u32,
    pub day_end_hour: u32,
    pub mail_api_url: String,
    pub mail_api_token: String,
    pub mail_from: String,
    pub mail_timeout_seconds: u64,
    pub redis_url: Option<String>,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            join_base_url: "https://localhost:3000".to_string(),
            link_validity_hours: 24,
            slot_granularity_minutes: 30,
            day_start_hour: 9,
            day_end_hour: 18,
            mail_api_url: String::new(),
            mail_api_token: String::new(),
            mail_from: "no-reply@localhost".to_string(),
            mail_timeout_seconds: 10,
            redis_url: None,
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, consultations will be kept in memory");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            join_base_url: env::var("JOIN_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("JOIN_BASE_URL not set, using default");
                    defaults.join_base_url.clone()
                }),
            link_validity_hours: parse_or("LINK_VALIDITY_HOURS", defaults.link_validity_hours),
            slot_granularity_minutes: parse_or("SLOT_GRANULARITY_MINUTES", defaults.slot_granularity_minutes),
            day_start_hour: parse_or("DAY_START_HOUR", defaults.day_start_hour),
            day_end_hour: parse_or("DAY_END_HOUR", defaults.day_end_hour),
            mail_api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| {
                    warn!("MAIL_API_URL not set, invitations will only be logged");
                    String::new()
                }),
            mail_api_token: env::var("MAIL_API_TOKEN").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM").unwrap_or(defaults.mail_from),
            mail_timeout_seconds: parse_or("MAIL_TIMEOUT_SECONDS", defaults.mail_timeout_seconds),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            port: parse_or("PORT", defaults.port),
        };

        if !config.is_store_configured() {
            warn!("Persistent store not configured - running with in-memory consultations");
        }

        config.validated()
    }

    /// Replaces out-of-range numeric settings with their defaults.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        if !(1..=MAX_LINK_VALIDITY_HOURS).contains(&self.link_validity_hours) {
            warn!(
                "LINK_VALIDITY_HOURS={} is outside 1..={}, using {}",
                self.link_validity_hours, MAX_LINK_VALIDITY_HOURS, defaults.link_validity_hours
            );
            self.link_validity_hours = defaults.link_validity_hours;
        }

        if self.mail_timeout_seconds == 0 {
            warn!(
                "MAIL_TIMEOUT_SECONDS must be positive, using {}",
                defaults.mail_timeout_seconds
            );
            self.mail_timeout_seconds = defaults.mail_timeout_seconds;
        }

        let granularity_ok =
            (1..=MAX_SLOT_GRANULARITY_MINUTES).contains(&self.slot_granularity_minutes);
        let hours_ok = self.day_end_hour <= 24 && self.day_start_hour < self.day_end_hour;
        if !granularity_ok || !hours_ok {
            warn!(
                "Invalid working day (granularity {}m, hours {}-{}), using {}m {}-{}",
                self.slot_granularity_minutes,
                self.day_start_hour,
                self.day_end_hour,
                defaults.slot_granularity_minutes,
                defaults.day_start_hour,
                defaults.day_end_hour
            );
            self.slot_granularity_minutes = defaults.slot_granularity_minutes;
            self.day_start_hour = defaults.day_start_hour;
            self.day_end_hour = defaults.day_end_hour;
        }

        self
    }

    pub fn is_store_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn is_mail_configured(&self) -> bool {
        !self.mail_api_url.is_empty()
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
