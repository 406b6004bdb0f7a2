// libs/invitation-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::InvitationError;
use crate::services::InvitationDispatcher;

impl From<InvitationError> for AppError {
    fn from(err: InvitationError) -> Self {
        match err {
            InvitationError::MeetingNotFound(_) => AppError::NotFound(err.to_string()),
            InvitationError::MeetingExpired { .. } => AppError::Gone(err.to_string()),
            InvitationError::Transport { .. } | InvitationError::Timeout { .. } => {
                AppError::ExternalService(err.to_string())
            }
            InvitationError::NotConfigured => AppError::Internal(err.to_string()),
            InvitationError::Storage(msg) => AppError::Database(msg),
            InvitationError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Send (or resend) the invitation email for a consultation
pub async fn send_invitation(
    State(dispatcher): State<Arc<InvitationDispatcher>>,
    Path(consultation_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let result = dispatcher.send(&consultation_id).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "success": true,
            "dispatch": result,
            "message": "Invitation sent"
        })),
    ))
}

pub async fn get_invitation_history(
    State(dispatcher): State<Arc<InvitationDispatcher>>,
    Path(consultation_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let history = dispatcher.history(&consultation_id).await?;
    Ok(Json(json!({ "invitations": history })))
}
