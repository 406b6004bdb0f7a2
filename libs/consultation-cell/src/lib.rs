// libs/consultation-cell/src/lib.rs
//! # Consultation Cell
//!
//! Scheduling and link lifecycle for telehealth consultations.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                 Consultation Cell                   |
//! +-----------------------------------------------------+
//! |  handlers.rs     |  HTTP endpoint handlers          |
//! |  router.rs       |  Route definitions               |
//! |  models.rs       |  Records, requests, errors       |
//! |  services/       |  Business logic layer            |
//! |    token.rs      |  Meeting ids and access tokens   |
//! |    calendar.rs   |  Slot listing, overlap checks    |
//! |    status.rs     |  Time-derived display status     |
//! |    registry.rs   |  Create / read / cancel / ...    |
//! |    links.rs      |  Canonical and short join links  |
//! |    store.rs      |  Store trait, in-memory store    |
//! |    supabase_store.rs | PostgREST-backed store       |
//! +-----------------------------------------------------+
//! ```
//!
//! ```rust,no_run
//! use consultation_cell::{consultation_routes, MeetingRegistry};
//! use shared_config::AppConfig;
//! use std::sync::Arc;
//!
//! let config = AppConfig::from_env();
//! let registry = Arc::new(MeetingRegistry::from_config(&config));
//! let routes = consultation_routes(registry);
//! ```

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    ConsultationError, ConsultationType, CreateMeetingRequest, Meeting, MeetingStatus,
    MeetingView, RescheduleMeetingRequest, SlotAvailability,
};

pub use services::{
    InMemoryMeetingStore, JoinLinkBuilder, MeetingRegistry, MeetingStore, SlotCalendar,
    StatusResolver, SupabaseMeetingStore, TokenGenerator,
};

pub use router::consultation_routes;
