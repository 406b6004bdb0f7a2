// libs/consultation-cell/src/services/mod.rs

pub mod calendar;
pub mod links;
pub mod locks;
pub mod registry;
pub mod status;
pub mod store;
pub mod supabase_store;
pub mod token;

pub use calendar::{CalendarSettings, SlotCalendar};
pub use links::JoinLinkBuilder;
pub use registry::MeetingRegistry;
pub use status::StatusResolver;
pub use store::{InMemoryMeetingStore, MeetingStore};
pub use supabase_store::SupabaseMeetingStore;
pub use token::TokenGenerator;
