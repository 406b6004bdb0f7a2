// libs/invitation-cell/src/services/mail.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;

use crate::models::{InvitationError, MailApiRequest, MailMessage};

/// Delivers a rendered message. Implementations do not retry; the dispatcher
/// owns timeouts and retries.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Client for a JSON mail API (`POST {from,to,subject,text,html}` with a bearer token).
pub struct HttpMailTransport {
    client: Client,
    api_url: String,
    api_token: String,
    from: String,
}

impl HttpMailTransport {
    pub fn new(config: &AppConfig) -> Result<Self, InvitationError> {
        if !config.is_mail_configured() {
            return Err(InvitationError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            api_url: config.mail_api_url.clone(),
            api_token: config.mail_api_token.clone(),
            from: config.mail_from.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        debug!("Sending invitation mail to {} via {}", message.to, self.api_url);

        let body = MailApiRequest {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            text: &message.text_body,
            html: &message.html_body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Mail API rejected message: {} - {}", status, error_text);
            return Err(anyhow!("Mail API error ({}): {}", status, error_text));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        info!(
            "Invitation mail (not delivered) to {}: {}\n{}",
            message.to, message.subject, message.text_body
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// HTTP transport when a mail API is configured, the logging transport otherwise.
pub fn transport_from_config(config: &AppConfig) -> Arc<dyn MailTransport> {
    match HttpMailTransport::new(config) {
        Ok(transport) => {
            info!("Using HTTP mail transport at {}", config.mail_api_url);
            Arc::new(transport)
        }
        Err(_) => {
            warn!("MAIL_API_URL not set, invitations will only be logged");
            Arc::new(LogMailTransport)
        }
    }
}
