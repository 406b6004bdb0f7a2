// libs/invitation-cell/src/services/dispatcher.rs
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use shared_config::AppConfig;
use consultation_cell::models::MeetingStatus;
use consultation_cell::services::MeetingRegistry;

use crate::models::{
    DispatchChannel, DispatchOutcome, DispatchResult, InvitationDispatchRecord, InvitationError,
    InvitationHistory, MailMessage,
};
use crate::services::dispatch_log::DispatchLog;
use crate::services::mail::MailTransport;
use crate::services::template::InvitationTemplate;

const MAX_ATTEMPTS: u32 = 2;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Sends and resends invitations for active consultations.
///
/// Each send runs in its own task: the transport call gets a bounded timeout
/// and one retry, and the dispatch record is appended by that task. A caller
/// that stops awaiting `send` therefore never loses the record. The meeting's
/// registry lock is held from the status check until the record is written,
/// so a concurrent cancel either lands before the check or after the send.
pub struct InvitationDispatcher {
    registry: Arc<MeetingRegistry>,
    transport: Arc<dyn MailTransport>,
    log: Arc<dyn DispatchLog>,
    attempt_timeout: Duration,
    max_attempts: u32,
    retry_delay: Duration,
}

impl InvitationDispatcher {
    pub fn new(
        registry: Arc<MeetingRegistry>,
        transport: Arc<dyn MailTransport>,
        log: Arc<dyn DispatchLog>,
        config: &AppConfig,
    ) -> Self {
        Self {
            registry,
            transport,
            log,
            attempt_timeout: attempt_timeout(config),
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Sends the invitation for `meeting_id`. Each call appends one dispatch
    /// record once the meeting is known to be active; resends are unlimited.
    #[instrument(skip(self))]
    pub async fn send(&self, meeting_id: &str) -> Result<DispatchResult, InvitationError> {
        let meeting_guard = self.registry.lock_meeting(meeting_id).await;
        let meeting = self.registry.get(meeting_id).await?;

        let status = self.registry.resolve_status(&meeting);
        if matches!(status, MeetingStatus::Expired | MeetingStatus::Cancelled) {
            warn!("Refusing to send invitation for {} consultation {}", status, meeting_id);
            return Err(InvitationError::MeetingExpired {
                meeting_id: meeting_id.to_string(),
                status: status.to_string(),
            });
        }

        let message =
            InvitationTemplate::for_meeting(&meeting, self.registry.links()).to_message(&meeting.patient_email);

        let attempt = DispatchAttempt {
            meeting_id: meeting.id.clone(),
            message,
            registry: self.registry.clone(),
            transport: self.transport.clone(),
            log: self.log.clone(),
            attempt_timeout: self.attempt_timeout,
            max_attempts: self.max_attempts,
            retry_delay: self.retry_delay,
            _meeting_guard: meeting_guard,
        };

        tokio::spawn(attempt.run())
            .await
            .map_err(|e| InvitationError::Internal(format!("Dispatch task failed: {}", e)))?
    }

    pub async fn history(&self, meeting_id: &str) -> Result<InvitationHistory, InvitationError> {
        self.registry.get(meeting_id).await?;
        let records = self.log.list_for_meeting(meeting_id).await?;
        Ok(InvitationHistory::from_records(meeting_id, records))
    }
}

fn attempt_timeout(config: &AppConfig) -> Duration {
    match config.mail_timeout_seconds {
        0 => {
            let fallback = AppConfig::default().mail_timeout_seconds;
            warn!("Mail timeout of 0s is not usable, using {}s", fallback);
            Duration::from_secs(fallback)
        }
        seconds => Duration::from_secs(seconds),
    }
}

enum AttemptFailure {
    Transport(String),
    TimedOut,
}

impl AttemptFailure {
    fn describe(&self, attempt_timeout: Duration) -> String {
        match self {
            AttemptFailure::Transport(message) => message.clone(),
            AttemptFailure::TimedOut => format!("timed out after {}s", attempt_timeout.as_secs_f64()),
        }
    }
}

/// Owned state of one send, moved into its task.
struct DispatchAttempt {
    meeting_id: String,
    message: MailMessage,
    registry: Arc<MeetingRegistry>,
    transport: Arc<dyn MailTransport>,
    log: Arc<dyn DispatchLog>,
    attempt_timeout: Duration,
    max_attempts: u32,
    retry_delay: Duration,
    _meeting_guard: OwnedMutexGuard<()>,
}

impl DispatchAttempt {
    async fn run(self) -> Result<DispatchResult, InvitationError> {
        let mut attempts = 0;
        let mut last_failure = None;

        while attempts < self.max_attempts {
            attempts += 1;

            match timeout(self.attempt_timeout, self.transport.send(&self.message)).await {
                Ok(Ok(())) => {
                    last_failure = None;
                    break;
                }
                Ok(Err(e)) => {
                    warn!(
                        "Invitation for {} failed on attempt {}/{} via {}: {}",
                        self.meeting_id, attempts, self.max_attempts, self.transport.name(), e
                    );
                    last_failure = Some(AttemptFailure::Transport(e.to_string()));
                }
                Err(_) => {
                    warn!(
                        "Invitation for {} timed out on attempt {}/{}",
                        self.meeting_id, attempts, self.max_attempts
                    );
                    last_failure = Some(AttemptFailure::TimedOut);
                }
            }

            if attempts < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        let dispatched_at = self.registry.now();
        let record = InvitationDispatchRecord {
            meeting_id: self.meeting_id.clone(),
            recipient: self.message.to.clone(),
            dispatched_at,
            channel: DispatchChannel::Email,
            outcome: if last_failure.is_none() {
                DispatchOutcome::Sent
            } else {
                DispatchOutcome::Failed
            },
            attempts,
            error: last_failure.as_ref().map(|f| f.describe(self.attempt_timeout)),
        };

        // a delivered mail is reported as sent even if its record is lost
        if let Err(e) = self.log.append(&record).await {
            error!(
                "Failed to record {:?} invitation dispatch for {}: {}",
                record.outcome, self.meeting_id, e
            );
        }

        match last_failure {
            None => {
                info!("Invitation for {} sent to {} after {} attempt(s)", self.meeting_id, record.recipient, attempts);
                Ok(DispatchResult {
                    meeting_id: self.meeting_id,
                    recipient: record.recipient,
                    subject: self.message.subject,
                    dispatched_at,
                    attempts,
                })
            }
            Some(AttemptFailure::TimedOut) => Err(InvitationError::Timeout {
                attempts,
                timeout_seconds: self.attempt_timeout.as_secs(),
            }),
            Some(AttemptFailure::Transport(message)) => {
                Err(InvitationError::Transport { message, attempts })
            }
        }
    }
}
