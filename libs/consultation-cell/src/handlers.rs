// libs/consultation-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{
    ConsultationError, CreateMeetingRequest, JoinRequest, RescheduleMeetingRequest,
};
use crate::services::MeetingRegistry;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

impl From<ConsultationError> for AppError {
    fn from(err: ConsultationError) -> Self {
        match err {
            ConsultationError::Validation(fields) => AppError::ValidationError(fields),
            ConsultationError::SlotConflict { .. } => AppError::Conflict(err.to_string()),
            ConsultationError::NotFound(_) | ConsultationError::AmbiguousShortCode(_) => {
                AppError::NotFound(err.to_string())
            }
            ConsultationError::MeetingExpired(_) | ConsultationError::MeetingCancelled(_) => {
                AppError::Gone(err.to_string())
            }
            ConsultationError::InvalidState { .. } => AppError::Conflict(err.to_string()),
            ConsultationError::Unauthorized(_) => AppError::Auth(err.to_string()),
            ConsultationError::Storage(msg) => AppError::Database(msg),
        }
    }
}

// ==============================================================================
// CONSULTATION LIFECYCLE HANDLERS
// ==============================================================================

/// Book a consultation for a patient with a provider
pub async fn create_consultation(
    State(registry): State<Arc<MeetingRegistry>>,
    Json(request): Json<CreateMeetingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let meeting = registry.create(request).await?;
    let view = registry.view(meeting);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "consultation": view,
            "message": "Consultation scheduled successfully"
        })),
    ))
}

pub async fn get_consultation(
    State(registry): State<Arc<MeetingRegistry>>,
    Path(consultation_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let meeting = registry.get(&consultation_id).await?;
    Ok(Json(json!({ "consultation": registry.view(meeting) })))
}

pub async fn cancel_consultation(
    State(registry): State<Arc<MeetingRegistry>>,
    Path(consultation_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let meeting = registry.cancel(&consultation_id).await?;
    Ok(Json(json!({
        "success": true,
        "consultation": registry.view(meeting)
    })))
}

pub async fn complete_consultation(
    State(registry): State<Arc<MeetingRegistry>>,
    Path(consultation_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let meeting = registry.complete(&consultation_id).await?;
    Ok(Json(json!({
        "success": true,
        "consultation": registry.view(meeting)
    })))
}

pub async fn mark_patient_joined(
    State(registry): State<Arc<MeetingRegistry>>,
    Path(consultation_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let meeting = registry.mark_patient_joined(&consultation_id).await?;
    Ok(Json(json!({
        "success": true,
        "consultation": registry.view(meeting)
    })))
}

pub async fn start_consultation(
    State(registry): State<Arc<MeetingRegistry>>,
    Path(consultation_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let meeting = registry.start_consultation(&consultation_id).await?;
    Ok(Json(json!({
        "success": true,
        "consultation": registry.view(meeting)
    })))
}

pub async fn reschedule_consultation(
    State(registry): State<Arc<MeetingRegistry>>,
    Path(consultation_id): Path<String>,
    Json(request): Json<RescheduleMeetingRequest>,
) -> Result<Json<Value>, AppError> {
    let meeting = registry.reschedule(&consultation_id, request).await?;
    Ok(Json(json!({
        "success": true,
        "consultation": registry.view(meeting)
    })))
}

// ==============================================================================
// PROVIDER DASHBOARD HANDLERS
// ==============================================================================

pub async fn list_provider_consultations(
    State(registry): State<Arc<MeetingRegistry>>,
    Path(provider_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let consultations: Vec<_> = registry
        .list_by_provider(&provider_id)
        .await?
        .into_iter()
        .map(|m| registry.view(m))
        .collect();

    Ok(Json(json!({
        "provider_id": provider_id,
        "total": consultations.len(),
        "consultations": consultations
    })))
}

pub async fn get_available_slots(
    State(registry): State<Arc<MeetingRegistry>>,
    Path(provider_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = registry.available_slots(&provider_id, query.date).await?;

    Ok(Json(json!({
        "provider_id": provider_id,
        "date": query.date,
        "slots": slots
    })))
}

// ==============================================================================
// JOIN FLOW HANDLERS
// ==============================================================================

/// Validate a join link (`room` + `token`) and return the joinable consultation
pub async fn authorize_join(
    State(registry): State<Arc<MeetingRegistry>>,
    Query(request): Query<JoinRequest>,
) -> Result<Json<Value>, AppError> {
    let view = registry.authorize_join(&request.room, &request.token).await?;
    Ok(Json(json!({
        "authorized": true,
        "consultation_id": view.meeting.id,
        "status": view.status,
        "scheduled_time": view.meeting.scheduled_time,
        "doctor_name": view.meeting.doctor_name
    })))
}

pub async fn resolve_short_link(
    State(registry): State<Arc<MeetingRegistry>>,
    Path(code): Path<String>,
) -> Result<Json<Value>, AppError> {
    let target = registry.short_link_target(&code).await?;
    Ok(Json(json!({ "consultation": target })))
}
