use std::sync::Arc;

use axum::{
    Json, Router,
    routing::get,
};
use serde_json::{json, Value};

use consultation_cell::router::consultation_routes;
use consultation_cell::services::MeetingRegistry;
use invitation_cell::router::invitation_routes;
use invitation_cell::services::InvitationDispatcher;

pub fn create_router(
    registry: Arc<MeetingRegistry>,
    dispatcher: Arc<InvitationDispatcher>,
) -> Router {
    Router::new()
        .route("/", get(|| async { "Teleconsultation API is running!" }))
        .route("/health", get(health))
        .merge(consultation_routes(registry))
        .merge(invitation_routes(dispatcher))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "teleconsult-api"
    }))
}
