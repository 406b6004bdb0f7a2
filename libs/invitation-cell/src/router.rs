// libs/invitation-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::post,
    Router,
};

use crate::handlers::*;
use crate::services::InvitationDispatcher;

/// Creates the invitation routes
pub fn invitation_routes(dispatcher: Arc<InvitationDispatcher>) -> Router {
    Router::new()
        .route(
            "/consultations/{consultation_id}/invitations",
            post(send_invitation).get(get_invitation_history),
        )
        .with_state(dispatcher)
}
