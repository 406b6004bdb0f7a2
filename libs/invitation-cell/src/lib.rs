//! Invitation delivery for scheduled consultations.
//!
//! The [`services::InvitationDispatcher`] composes a typed invitation for an
//! active consultation, hands it to a [`services::MailTransport`] with a
//! bounded timeout and one retry, and appends an
//! [`models::InvitationDispatchRecord`] to a [`services::DispatchLog`] for
//! every send, successful or not.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::invitation_routes;
