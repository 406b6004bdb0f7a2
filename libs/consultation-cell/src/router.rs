// libs/consultation-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::services::MeetingRegistry;

/// Creates the consultation routes
pub fn consultation_routes(registry: Arc<MeetingRegistry>) -> Router {
    Router::new()
        // Consultation lifecycle
        .route("/consultations", post(create_consultation))
        .route("/consultations/{consultation_id}", get(get_consultation))
        .route("/consultations/{consultation_id}/cancel", post(cancel_consultation))
        .route("/consultations/{consultation_id}/complete", post(complete_consultation))
        .route("/consultations/{consultation_id}/joined", post(mark_patient_joined))
        .route("/consultations/{consultation_id}/start", post(start_consultation))
        .route("/consultations/{consultation_id}/reschedule", post(reschedule_consultation))

        // Provider dashboards
        .route("/providers/{provider_id}/consultations", get(list_provider_consultations))
        .route("/providers/{provider_id}/slots", get(get_available_slots))

        // Join flow
        .route("/join", get(authorize_join))
        .route("/join/{code}", get(resolve_short_link))

        .with_state(registry)
}
