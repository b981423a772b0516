// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for onboarding and access events.
//!
//! Every lifecycle transition (submission, decision, provisioning, rotation,
//! acceptance, publication) and every notable access event is logged to the
//! audit store. Acceptance records carry legal weight; the audit trail is the
//! tamper-evident companion to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{FileStorage, StorageResult};

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Registration events
    RegistrationSubmitted,
    RegistrationApproved,
    RegistrationRejected,

    // Provisioning events
    AccountProvisioned,

    // Credential events
    CredentialRotated,

    // Agreement events
    AgreementAccepted,
    ProfilePublished,
    DocumentRendered,

    // Notification events
    NotificationSent,
    NotificationFailed,

    // Auth events
    AuthSuccess,
    AuthFailure,
    PermissionDenied,

    // Admin events
    AdminAccess,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// Account that triggered the event (if known).
    pub account_id: Option<String>,
    /// Resource affected (registration_id, profile_id, etc.).
    pub resource_id: Option<String>,
    /// Resource type (registration, account, profile, agreement, document).
    pub resource_type: Option<String>,
    /// IP address of the request (if available).
    pub ip_address: Option<String>,
    /// Additional details as JSON.
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            account_id: None,
            resource_id: None,
            resource_type: None,
            ip_address: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the acting account.
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Set the IP address.
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Log an audit event.
    ///
    /// Events are appended to a daily log file in JSONL format. The append is
    /// a single write, so concurrent loggers never clobber each other's
    /// entries.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let path = self.storage.paths().audit_events_file(&date);

        let mut line = serde_json::to_string(event).map_err(|e| {
            super::StorageError::SerializationError(format!(
                "Failed to serialize audit event: {}",
                e
            ))
        })?;
        line.push('\n');

        self.storage.append_raw(&path, line.as_bytes())
    }

    /// Read audit events for a specific date.
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let path = self.storage.paths().audit_events_file(date);
        let content = self.storage.read_raw(&path)?;

        let content_str = String::from_utf8(content).map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid UTF-8 in audit log: {}", e))
        })?;

        let mut events = Vec::new();
        for line in content_str.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let event: AuditEvent = serde_json::from_str(line).map_err(|e| {
                super::StorageError::SerializationError(format!(
                    "Failed to deserialize audit event: {}",
                    e
                ))
            })?;
            events.push(event);
        }

        Ok(events)
    }

    /// Read events for a date range.
    pub fn read_events_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> StorageResult<Vec<AuditEvent>> {
        use chrono::NaiveDate;

        let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid start date: {}", e))
        })?;

        let end = NaiveDate::parse_from_str(end_date, "%Y-%m-%d").map_err(|e| {
            super::StorageError::SerializationError(format!("Invalid end date: {}", e))
        })?;

        let mut all_events = Vec::new();
        let mut current = start;

        while current <= end {
            let date_str = current.format("%Y-%m-%d").to_string();
            if let Ok(events) = self.read_events(&date_str) {
                all_events.extend(events);
            }
            current = current.succ_opt().ok_or_else(|| {
                super::StorageError::SerializationError("Date overflow".to_string())
            })?;
        }

        Ok(all_events)
    }
}

/// Helper macro for logging audit events.
///
/// Audit writes are best-effort; a failed write never aborts the operation
/// being audited.
#[macro_export]
macro_rules! audit_log {
    ($storage:expr, $event:expr) => {{
        let repo = $crate::storage::AuditRepository::new($storage);
        let _ = repo.log(&$event);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, StoragePaths};
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStorage) {
        let temp = TempDir::new().unwrap();
        let paths = StoragePaths::new(temp.path());
        let mut storage = FileStorage::new(paths);
        storage.initialize().unwrap();
        (temp, storage)
    }

    #[test]
    fn create_audit_event() {
        let event = AuditEvent::new(AuditEventType::AgreementAccepted)
            .with_account("acct_123")
            .with_resource("agreement", "acct_123")
            .with_ip("192.168.1.1");

        assert_eq!(event.event_type, AuditEventType::AgreementAccepted);
        assert_eq!(event.account_id, Some("acct_123".to_string()));
        assert_eq!(event.resource_type, Some("agreement".to_string()));
        assert!(event.success);
    }

    #[test]
    fn log_and_read_events() {
        let (_temp, storage) = setup();
        let repo = AuditRepository::new(&storage);

        let event = AuditEvent::new(AuditEventType::RegistrationSubmitted)
            .with_resource("registration", "reg-1");
        repo.log(&event).unwrap();

        let second = AuditEvent::new(AuditEventType::RegistrationApproved)
            .with_account("admin-1")
            .with_resource("registration", "reg-1");
        repo.log(&second).unwrap();

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let events = repo.read_events(&date).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::RegistrationSubmitted);
        assert_eq!(events[1].event_type, AuditEventType::RegistrationApproved);
    }

    #[test]
    fn concurrent_logging_loses_no_events() {
        let (_temp, storage) = setup();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let storage = storage.clone();
                std::thread::spawn(move || {
                    let repo = AuditRepository::new(&storage);
                    for _ in 0..10 {
                        let event = AuditEvent::new(AuditEventType::AuthSuccess)
                            .with_account(format!("acct-{i}"));
                        repo.log(&event).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let events = AuditRepository::new(&storage).read_events(&date).unwrap();
        assert_eq!(events.len(), 80);
    }

    #[test]
    fn failed_event_carries_error() {
        let event = AuditEvent::new(AuditEventType::NotificationFailed)
            .failed("mail provider timeout");
        assert!(!event.success);
        assert_eq!(event.error.as_deref(), Some("mail provider timeout"));
    }

    #[test]
    fn read_events_range_spans_days() {
        let (_temp, storage) = setup();
        let repo = AuditRepository::new(&storage);

        let event = AuditEvent::new(AuditEventType::AuthSuccess).with_account("acct-1");
        repo.log(&event).unwrap();

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let events = repo.read_events_range(&today, &today).unwrap();
        assert_eq!(events.len(), 1);
    }
}
