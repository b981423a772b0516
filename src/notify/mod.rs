// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Notify Module
//!
//! Transactional email at each onboarding transition. Delivery is
//! fire-and-forget: a failed send is logged and recorded in the audit trail,
//! but it never unwinds the transition that triggered it. The HTTP mailer
//! posts to a provider API configured from the environment; the `Log` and
//! `Memory` variants serve development and tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::audit_log;
use crate::storage::{AuditEvent, AuditEventType, FileStorage, StoredAccount, StoredRegistration};

const MAIL_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivery error type.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Mail configuration missing: {0}")]
    MissingConfig(String),

    #[error("Mail request failed: {0}")]
    Request(String),

    #[error("Mail provider rejected the message: HTTP {0}")]
    Rejected(u16),
}

/// An outbound email.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Optional attachment: (filename, content type, base64 content)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<EmailAttachment>,
}

/// An email attachment.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub content_base64: String,
}

/// HTTP mail-provider client.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    api_url: String,
    api_token: String,
    from: String,
    http: Client,
}

impl HttpMailer {
    /// Check whether the mail provider is configured in the environment.
    pub fn is_configured() -> bool {
        required_env_present("MAIL_API_URL") && required_env_present("MAIL_API_TOKEN")
    }

    /// Build a mailer from `MAIL_API_URL`, `MAIL_API_TOKEN` and `MAIL_FROM`.
    pub fn from_env() -> Result<Self, DeliveryError> {
        let api_url = env_required("MAIL_API_URL")?;
        let api_token = env_required("MAIL_API_TOKEN")?;
        let from = env_or_default("MAIL_FROM", "no-reply@dealer-portal.invalid");

        let http = Client::builder()
            .timeout(MAIL_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_url,
            api_token,
            from,
            http,
        })
    }

    /// Post one message to the provider.
    pub async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        let mut payload = json!({
            "from": self.from,
            "to": message.to,
            "subject": message.subject,
            "text": message.body,
        });

        if let Some(attachment) = &message.attachment {
            payload["attachments"] = json!([{
                "filename": attachment.filename,
                "content_type": attachment.content_type,
                "content": attachment.content_base64,
            }]);
        }

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DeliveryError::Rejected(response.status().as_u16()));
        }

        Ok(())
    }
}

/// Mail transport selection.
#[derive(Debug, Clone)]
pub enum Mailer {
    /// Real delivery through the HTTP provider
    Http(HttpMailer),
    /// Log-only delivery for development
    Log,
    /// Captures messages in memory for tests
    Memory(Arc<Mutex<Vec<EmailMessage>>>),
}

impl Mailer {
    /// Pick a transport from the environment: HTTP when configured, log-only
    /// otherwise.
    pub fn from_env() -> Result<Self, DeliveryError> {
        if HttpMailer::is_configured() {
            Ok(Mailer::Http(HttpMailer::from_env()?))
        } else {
            warn!("Mail provider not configured; notifications are log-only");
            Ok(Mailer::Log)
        }
    }

    /// In-memory transport plus a handle to the captured messages.
    pub fn memory() -> (Self, Arc<Mutex<Vec<EmailMessage>>>) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        (Mailer::Memory(sink.clone()), sink)
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        match self {
            Mailer::Http(mailer) => mailer.send(message).await,
            Mailer::Log => {
                info!(to = %message.to, subject = %message.subject, "Mail (log-only)");
                Ok(())
            }
            Mailer::Memory(sink) => {
                sink.lock()
                    .map_err(|_| DeliveryError::Request("memory sink poisoned".to_string()))?
                    .push(message.clone());
                Ok(())
            }
        }
    }
}

/// Sends onboarding notifications and records the outcome.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    mailer: Mailer,
    storage: FileStorage,
    operator_email: Option<String>,
    portal_base_url: String,
}

impl NotificationDispatcher {
    /// Create a dispatcher over a mail transport.
    pub fn new(mailer: Mailer, storage: FileStorage) -> Self {
        Self {
            mailer,
            storage,
            operator_email: std::env::var("OPERATOR_EMAIL").ok().filter(|v| !v.is_empty()),
            portal_base_url: env_or_default("PORTAL_BASE_URL", "http://localhost:8080"),
        }
    }

    #[cfg(test)]
    pub fn for_tests(mailer: Mailer, storage: FileStorage, operator_email: Option<&str>) -> Self {
        Self {
            mailer,
            storage,
            operator_email: operator_email.map(str::to_string),
            portal_base_url: "http://localhost:8080".to_string(),
        }
    }

    /// Tell the operators a new submission arrived.
    pub async fn notify_submission_received(&self, registration: &StoredRegistration) {
        let Some(operator) = &self.operator_email else {
            return;
        };

        let message = EmailMessage {
            to: operator.clone(),
            subject: format!("New dealer registration: {}", registration.company_name),
            body: format!(
                "{} ({}) submitted a registration for {}.\n\nSubmission ID: {}\n",
                registration.representative_name,
                registration.representative_email,
                registration.company_name,
                registration.id,
            ),
            attachment: None,
        };

        self.dispatch("submission_received", Some(&registration.id), message)
            .await;
    }

    /// Tell the applicant their registration was approved, with the initial
    /// credential and where to log in.
    pub async fn notify_approved(&self, account: &StoredAccount, initial_credential: &str) {
        let message = EmailMessage {
            to: account.email.clone(),
            subject: "Your dealer registration was approved".to_string(),
            body: format!(
                "Hello {},\n\nYour registration for {} was approved.\n\n\
                 Temporary credential: {}\n\n\
                 Log in at {} and set a new credential; the temporary one only\n\
                 works for your first login.\n",
                account.display_name, account.company_name, initial_credential, self.portal_base_url,
            ),
            attachment: None,
        };

        self.dispatch("approved", Some(&account.id), message).await;
    }

    /// Tell the applicant their registration was rejected.
    pub async fn notify_rejected(&self, registration: &StoredRegistration, reason: &str) {
        let message = EmailMessage {
            to: registration.representative_email.clone(),
            subject: "Your dealer registration was not approved".to_string(),
            body: format!(
                "Hello {},\n\nYour registration for {} was not approved.\n\nReason: {}\n",
                registration.representative_name, registration.company_name, reason,
            ),
            attachment: None,
        };

        self.dispatch("rejected", Some(&registration.id), message)
            .await;
    }

    /// Send the signed agreement document to the applicant and notify the
    /// operators of the acceptance.
    ///
    /// The acceptance stands even when no document could be rendered; both
    /// emails still go out, the applicant's without an attachment.
    pub async fn notify_agreement_accepted(
        &self,
        account: &StoredAccount,
        document_id: Option<&str>,
        document_base64: Option<&str>,
    ) {
        let attachment = match (document_id, document_base64) {
            (Some(id), Some(content)) => Some(EmailAttachment {
                filename: format!("{id}.html"),
                content_type: "text/html".to_string(),
                content_base64: content.to_string(),
            }),
            _ => None,
        };

        let mut body = format!(
            "Hello {},\n\nYour agreement acceptance for {} is on record.\n",
            account.display_name, account.company_name,
        );
        if attachment.is_some() {
            body.push_str("A copy of the signed document is attached.\n");
        }

        let message = EmailMessage {
            to: account.email.clone(),
            subject: "Your signed dealer agreement".to_string(),
            body,
            attachment,
        };

        self.dispatch("agreement_accepted", Some(&account.id), message)
            .await;

        if let Some(operator) = &self.operator_email {
            let mut body = format!(
                "{} accepted the dealer agreement for {}.\n",
                account.display_name, account.company_name,
            );
            if let Some(id) = document_id {
                body.push_str(&format!("Document: {id}\n"));
            }
            let message = EmailMessage {
                to: operator.clone(),
                subject: format!("Agreement accepted: {}", account.company_name),
                body,
                attachment: None,
            };
            self.dispatch("agreement_accepted_operator", Some(&account.id), message)
                .await;
        }
    }

    /// Send one message and record the outcome. Never fails.
    async fn dispatch(&self, kind: &str, account_id: Option<&str>, message: EmailMessage) {
        let to = message.to.clone();
        let result = self.mailer.send(&message).await;

        let mut event = match &result {
            Ok(()) => {
                info!(%kind, %to, "Notification sent");
                AuditEvent::new(AuditEventType::NotificationSent)
            }
            Err(e) => {
                error!(%kind, %to, error = %e, "Notification delivery failed");
                AuditEvent::new(AuditEventType::NotificationFailed).failed(e.to_string())
            }
        };
        event = event.with_details(serde_json::json!({ "kind": kind, "to": to }));
        if let Some(account_id) = account_id {
            event = event.with_account(account_id);
        }

        audit_log!(&self.storage, event);
    }
}

fn required_env_present(name: &str) -> bool {
    std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
}

fn env_required(name: &str) -> Result<String, DeliveryError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DeliveryError::MissingConfig(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
