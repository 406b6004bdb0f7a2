mod common;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate};

use consultation_cell::models::{ConsultationError, MeetingStatus, RescheduleMeetingRequest};
use consultation_cell::services::MeetingStore;
use consultation_cell::services::links::short_code;

use shared_utils::test_utils::TestConfig;

use common::{jane_doe_request, now, request_for, test_registry, test_registry_with};

#[tokio::test]
async fn test_create_persists_full_record() {
    let t = test_registry();
    let meeting = t.registry.create(jane_doe_request(now() + Duration::hours(2), 30)).await.unwrap();

    assert!(meeting.id.starts_with("cons_"));
    assert_ne!(meeting.id, meeting.access_token);
    assert_eq!(meeting.created_at, now());
    assert_eq!(meeting.expires_at, now() + Duration::hours(24));
    assert_eq!(meeting.status, MeetingStatus::Scheduled);
    assert!(!meeting.patient_joined);

    let stored = t.store.get(&meeting.id).await.unwrap().unwrap();
    assert_eq!(stored, meeting);
}

#[tokio::test]
async fn test_get_round_trips_every_field() {
    let t = test_registry();
    let created = t.registry.create(jane_doe_request(now() + Duration::hours(2), 30)).await.unwrap();

    let fetched = t.registry.get(&created.id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.patient_phone.as_deref(), Some("+15551234567"));
    assert_eq!(fetched.notes.as_deref(), Some("Recurring headaches"));
}

#[tokio::test]
async fn test_create_in_the_past_names_scheduled_time() {
    let t = test_registry();
    let result = t.registry.create(jane_doe_request(now() - Duration::minutes(5), 30)).await;

    assert_matches!(result, Err(ConsultationError::Validation(errors)) => {
        assert!(errors.iter().any(|e| e.field == "scheduled_time"));
    });
    assert!(t.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_reports_all_invalid_fields_at_once() {
    let t = test_registry();
    let mut request = jane_doe_request(now() - Duration::hours(1), 25);
    request.patient_name = String::new();
    request.patient_email = "not-an-email".to_string();

    let result = t.registry.create(request).await;
    assert_matches!(result, Err(ConsultationError::Validation(errors)) => {
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["patient_name", "patient_email", "scheduled_time", "duration_minutes"]);
    });
}

#[tokio::test]
async fn test_create_rejects_overlapping_booking() {
    let t = test_registry();
    let first = t.registry.create(request_for("doc-smith", Duration::hours(2), 30)).await.unwrap();

    let result = t
        .registry
        .create(request_for("doc-smith", Duration::hours(2) + Duration::minutes(15), 45))
        .await;
    assert_matches!(
        result,
        Err(ConsultationError::SlotConflict { conflicting_id: Some(id), .. }) if id == first.id
    );

    let other_doctor = t
        .registry
        .create(request_for("doc-jones", Duration::hours(2), 30))
        .await;
    assert!(other_doctor.is_ok());
}

#[tokio::test]
async fn test_cancelled_meeting_frees_its_slot() {
    let t = test_registry();
    let first = t.registry.create(request_for("doc-smith", Duration::hours(2), 30)).await.unwrap();
    t.registry.cancel(&first.id).await.unwrap();

    let replacement = t.registry.create(request_for("doc-smith", Duration::hours(2), 30)).await;
    assert!(replacement.is_ok());
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let t = test_registry();
    assert_matches!(
        t.registry.get("cons_missing").await,
        Err(ConsultationError::NotFound(id)) if id == "cons_missing"
    );
    assert_matches!(t.registry.cancel("cons_missing").await, Err(ConsultationError::NotFound(_)));
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let t = test_registry();
    let meeting = t.registry.create(jane_doe_request(now() + Duration::hours(2), 30)).await.unwrap();

    let first = t.registry.cancel(&meeting.id).await.unwrap();
    t.clock.advance(Duration::minutes(5));
    let second = t.registry.cancel(&meeting.id).await.unwrap();

    assert_eq!(first.status, MeetingStatus::Cancelled);
    assert_eq!(first, second);
    assert_eq!(t.registry.resolve_status(&second), MeetingStatus::Cancelled);
}

#[tokio::test]
async fn test_cancelled_and_completed_are_exclusive() {
    let t = test_registry();
    let cancelled = t.registry.create(request_for("doc-smith", Duration::hours(2), 30)).await.unwrap();
    t.registry.cancel(&cancelled.id).await.unwrap();
    assert_matches!(
        t.registry.complete(&cancelled.id).await,
        Err(ConsultationError::MeetingCancelled(_))
    );

    let completed = t.registry.create(request_for("doc-smith", Duration::hours(4), 30)).await.unwrap();
    t.registry.complete(&completed.id).await.unwrap();
    assert_matches!(
        t.registry.cancel(&completed.id).await,
        Err(ConsultationError::InvalidState { status: MeetingStatus::Completed, .. })
    );
    assert_eq!(
        t.registry.complete(&completed.id).await.unwrap().status,
        MeetingStatus::Completed
    );
}

#[tokio::test]
async fn test_list_by_provider_orders_by_time() {
    let t = test_registry();
    let late = t.registry.create(request_for("doc-smith", Duration::hours(6), 30)).await.unwrap();
    let early = t.registry.create(request_for("doc-smith", Duration::hours(2), 30)).await.unwrap();
    t.registry.create(request_for("doc-jones", Duration::hours(1), 30)).await.unwrap();

    let ids: Vec<_> = t
        .registry
        .list_by_provider("doc-smith")
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![early.id, late.id]);
}

#[tokio::test]
async fn test_available_slots_reflect_bookings() {
    let t = test_registry();
    // reference time is 08:00, so +3h lands on the 11:00 slot
    t.registry.create(request_for("doc-smith", Duration::hours(3), 30)).await.unwrap();

    let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    let slots = t.registry.available_slots("doc-smith", day).await.unwrap();

    assert_eq!(slots.len(), 18);
    let booked: Vec<_> = slots.iter().filter(|s| !s.available).map(|s| s.time).collect();
    assert_eq!(booked, vec![now() + Duration::hours(3)]);
}

#[tokio::test]
async fn test_patient_join_flow() {
    let t = test_registry();
    let meeting = t.registry.create(jane_doe_request(now() + Duration::hours(2), 30)).await.unwrap();

    let joined = t.registry.mark_patient_joined(&meeting.id).await.unwrap();
    assert!(joined.patient_joined);
    assert_eq!(t.registry.resolve_status(&joined), MeetingStatus::Confirmed);

    t.clock.advance(Duration::hours(3));
    assert_matches!(
        t.registry.mark_patient_joined(&meeting.id).await,
        Err(ConsultationError::InvalidState { status: MeetingStatus::Completed, .. })
    );
}

#[tokio::test]
async fn test_start_consultation_only_inside_ready_window() {
    let t = test_registry();
    let meeting = t.registry.create(jane_doe_request(now() + Duration::hours(2), 30)).await.unwrap();

    assert_matches!(
        t.registry.start_consultation(&meeting.id).await,
        Err(ConsultationError::InvalidState { status: MeetingStatus::Pending, .. })
    );

    t.clock.set(meeting.scheduled_time - Duration::minutes(5));
    let started = t.registry.start_consultation(&meeting.id).await.unwrap();
    assert_eq!(started.status, MeetingStatus::InConsultation);

    t.clock.set(meeting.scheduled_time + Duration::minutes(10));
    assert_eq!(t.registry.resolve_status(&started), MeetingStatus::InConsultation);

    t.clock.set(meeting.scheduled_end_time() + Duration::minutes(1));
    assert_eq!(t.registry.resolve_status(&started), MeetingStatus::Completed);
}

#[tokio::test]
async fn test_reschedule_preserves_identity() {
    let t = test_registry();
    let meeting = t.registry.create(jane_doe_request(now() + Duration::hours(2), 30)).await.unwrap();
    t.registry.mark_patient_joined(&meeting.id).await.unwrap();

    let moved = t
        .registry
        .reschedule(
            &meeting.id,
            RescheduleMeetingRequest {
                scheduled_time: now() + Duration::hours(5),
                duration_minutes: Some(60),
            },
        )
        .await
        .unwrap();

    assert_eq!(moved.id, meeting.id);
    assert_eq!(moved.access_token, meeting.access_token);
    assert_eq!(moved.created_at, meeting.created_at);
    assert_eq!(moved.expires_at, meeting.expires_at);
    assert_eq!(moved.scheduled_time, now() + Duration::hours(5));
    assert_eq!(moved.duration_minutes, 60);
    assert!(!moved.patient_joined);
}

#[tokio::test]
async fn test_reschedule_checks_conflicts_but_ignores_itself() {
    let t = test_registry();
    let blocker = t.registry.create(request_for("doc-smith", Duration::hours(4), 30)).await.unwrap();
    let meeting = t.registry.create(request_for("doc-smith", Duration::hours(2), 30)).await.unwrap();

    let nudged = t
        .registry
        .reschedule(
            &meeting.id,
            RescheduleMeetingRequest {
                scheduled_time: now() + Duration::hours(2) + Duration::minutes(15),
                duration_minutes: None,
            },
        )
        .await;
    assert!(nudged.is_ok());

    let clash = t
        .registry
        .reschedule(
            &meeting.id,
            RescheduleMeetingRequest {
                scheduled_time: now() + Duration::hours(4) - Duration::minutes(15),
                duration_minutes: Some(30),
            },
        )
        .await;
    assert_matches!(
        clash,
        Err(ConsultationError::SlotConflict { conflicting_id: Some(id), .. }) if id == blocker.id
    );

    let invalid = t
        .registry
        .reschedule(
            &meeting.id,
            RescheduleMeetingRequest {
                scheduled_time: now() - Duration::hours(1),
                duration_minutes: Some(20),
            },
        )
        .await;
    assert_matches!(invalid, Err(ConsultationError::Validation(errors)) if errors.len() == 2);
}

#[tokio::test]
async fn test_short_code_resolves_to_same_meeting() {
    let t = test_registry();
    let meeting = t.registry.create(jane_doe_request(now() + Duration::hours(2), 30)).await.unwrap();

    let found = t.registry.find_by_short_code(short_code(&meeting.id)).await.unwrap();
    assert_eq!(found.id, meeting.id);

    let target = t.registry.short_link_target(short_code(&meeting.id)).await.unwrap();
    assert_eq!(target.meeting_id, meeting.id);
    assert_eq!(target.status, MeetingStatus::Pending);

    assert_matches!(
        t.registry.find_by_short_code("zzzzzzzz").await,
        Err(ConsultationError::NotFound(_))
    );
    assert_matches!(
        t.registry.find_by_short_code("short").await,
        Err(ConsultationError::NotFound(_))
    );
}

#[tokio::test]
async fn test_ambiguous_short_code_is_refused() {
    let t = test_registry();
    let meeting = t.registry.create(jane_doe_request(now() + Duration::hours(2), 30)).await.unwrap();

    let mut twin = meeting.clone();
    twin.id = format!("cons_ffffffffffffffffffffffff{}", short_code(&meeting.id));
    t.store.put(&twin).await.unwrap();

    assert_matches!(
        t.registry.find_by_short_code(short_code(&meeting.id)).await,
        Err(ConsultationError::AmbiguousShortCode(_))
    );
}

#[tokio::test]
async fn test_authorize_join() {
    let t = test_registry();
    let meeting = t.registry.create(jane_doe_request(now() + Duration::hours(2), 30)).await.unwrap();

    assert_matches!(
        t.registry.authorize_join(&meeting.id, "wrong-token").await,
        Err(ConsultationError::Unauthorized(_))
    );

    t.clock.set(meeting.scheduled_time - Duration::minutes(10));
    let view = t.registry.authorize_join(&meeting.id, &meeting.access_token).await.unwrap();
    assert_eq!(view.status, MeetingStatus::Ready);
    assert!(view.links.invitation_url.contains(&meeting.access_token));

    t.clock.set(meeting.expires_at + Duration::seconds(1));
    assert_matches!(
        t.registry.authorize_join(&meeting.id, &meeting.access_token).await,
        Err(ConsultationError::MeetingExpired(_))
    );
}

#[tokio::test]
async fn test_out_of_range_link_validity_never_expires_at_creation() {
    for hours in [-1, 0, i64::MAX / 1000] {
        let mut config = TestConfig::default().to_app_config();
        config.link_validity_hours = hours;
        let t = test_registry_with(&config);

        let meeting = t
            .registry
            .create(jane_doe_request(now() + Duration::hours(2), 30))
            .await
            .unwrap();

        assert_eq!(meeting.expires_at, meeting.created_at + Duration::hours(24), "hours = {}", hours);
        assert_eq!(t.registry.resolve_status(&meeting), MeetingStatus::Pending);
    }
}

#[tokio::test]
async fn test_configured_link_validity_is_applied() {
    let mut config = TestConfig::default().to_app_config();
    config.link_validity_hours = 72;
    let t = test_registry_with(&config);

    let meeting = t
        .registry
        .create(jane_doe_request(now() + Duration::hours(30), 30))
        .await
        .unwrap();
    assert_eq!(meeting.expires_at, now() + Duration::hours(72));
}
