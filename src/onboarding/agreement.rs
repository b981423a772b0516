// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Agreement acceptance, the last onboarding transition.
//!
//! The acceptance record is written first with an atomic single-use claim;
//! everything that follows (account flag, publication, document render,
//! notifications) builds on a recorded acceptance. Publication and render
//! failures are logged and audited but the acceptance stands; the legal event
//! is never rolled back because a side effect misbehaved.

use base64ct::{Base64, Encoding};
use chrono::Utc;
use tracing::{info, warn};

use crate::audit_log;
use crate::documents::{DocumentGenerator, RenderRequest, StoredDocument};
use crate::notify::NotificationDispatcher;
use crate::storage::{
    AccountRepository, AgreementRepository, AuditEvent, AuditEventType, FileStorage,
    ProfileRepository, StorageError, StoredAcceptance, StoredAccount,
};

use super::OnboardingError;

/// What an acceptance request carries.
#[derive(Debug, Clone)]
pub struct AcceptanceRequest {
    pub representative_name: String,
    pub company_name: String,
    /// Captured signature, base64 PNG. Stored as received; validation only
    /// affects document rendering.
    pub signature_png: Option<String>,
    pub origin_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// The result of a successful acceptance.
#[derive(Debug, Clone)]
pub struct AcceptanceOutcome {
    pub acceptance: StoredAcceptance,
    /// Rendered agreement document; absent when rendering failed.
    pub document: Option<StoredDocument>,
}

/// Accept the agreement for an account.
pub async fn accept_agreement(
    storage: &FileStorage,
    dispatcher: &NotificationDispatcher,
    agreement_text: &str,
    account_id: &str,
    request: AcceptanceRequest,
) -> Result<AcceptanceOutcome, OnboardingError> {
    let representative_name = request.representative_name.trim().to_string();
    let company_name = request.company_name.trim().to_string();
    if representative_name.is_empty() || company_name.is_empty() {
        return Err(OnboardingError::Validation(
            "representative and company names are required".to_string(),
        ));
    }

    let accounts = AccountRepository::new(storage);
    let mut account = accounts.get(account_id)?;

    let mut acceptance = StoredAcceptance {
        account_id: account_id.to_string(),
        representative_name,
        company_name,
        signature_png: request.signature_png,
        accepted_at: Utc::now(),
        origin_ip: request.origin_ip,
        user_agent: request.user_agent,
        document_id: None,
    };

    match AgreementRepository::new(storage).create(&acceptance) {
        Ok(()) => {}
        Err(StorageError::AlreadyExists(_)) => return Err(OnboardingError::AlreadyAccepted),
        Err(e) => return Err(e.into()),
    }

    account.agreement_accepted = true;
    accounts.update(&account)?;

    info!(account_id, "Agreement accepted");
    let mut event = AuditEvent::new(AuditEventType::AgreementAccepted)
        .with_account(account_id)
        .with_resource("agreement", account_id);
    if let Some(ip) = &acceptance.origin_ip {
        event = event.with_ip(ip);
    }
    audit_log!(storage, event);

    let document = render_document(storage, agreement_text, &account, &mut acceptance);
    publish_profile(storage, account_id, document.as_ref());

    // Delivery does not depend on the render outcome; a failed render
    // degrades the applicant email to no attachment.
    let document_base64 = document.as_ref().and_then(|document| {
        match DocumentGenerator::new(storage).read_html(&document.id) {
            Ok(html) => Some(Base64::encode_string(html.as_bytes())),
            Err(e) => {
                warn!(document_id = %document.id, error = %e, "Could not read rendered document for delivery");
                None
            }
        }
    });
    dispatcher
        .notify_agreement_accepted(
            &account,
            document.as_ref().map(|d| d.id.as_str()),
            document_base64.as_deref(),
        )
        .await;

    Ok(AcceptanceOutcome {
        acceptance,
        document,
    })
}

/// Render the agreement document and link it to the acceptance record.
fn render_document(
    storage: &FileStorage,
    agreement_text: &str,
    account: &StoredAccount,
    acceptance: &mut StoredAcceptance,
) -> Option<StoredDocument> {
    let generator = DocumentGenerator::new(storage);
    let request = RenderRequest {
        account_id: &acceptance.account_id,
        representative_name: &acceptance.representative_name,
        representative_email: &account.email,
        company_name: &acceptance.company_name,
        accepted_at: acceptance.accepted_at,
        origin_ip: acceptance.origin_ip.as_deref(),
        signature_png: acceptance.signature_png.as_deref(),
        agreement_text,
    };

    match generator.render(&request) {
        Ok(document) => {
            if let Err(e) =
                AgreementRepository::new(storage).attach_document(&acceptance.account_id, &document.id)
            {
                warn!(error = %e, "Could not link document to acceptance record");
            } else {
                acceptance.document_id = Some(document.id.clone());
            }
            audit_log!(
                storage,
                AuditEvent::new(AuditEventType::DocumentRendered)
                    .with_account(&acceptance.account_id)
                    .with_resource("document", &document.id)
            );
            Some(document)
        }
        Err(e) => {
            warn!(account_id = %acceptance.account_id, error = %e, "Agreement document render failed");
            audit_log!(
                storage,
                AuditEvent::new(AuditEventType::DocumentRendered)
                    .with_account(&acceptance.account_id)
                    .failed(e.to_string())
            );
            None
        }
    }
}

/// Publish the dealer's profile after acceptance.
///
/// A missing draft or an already-published profile degrades to a warning;
/// the acceptance stands either way.
fn publish_profile(storage: &FileStorage, account_id: &str, document: Option<&StoredDocument>) {
    let profiles = ProfileRepository::new(storage);

    let mut profile = match profiles.get_by_account(account_id) {
        Ok(profile) => profile,
        Err(e) => {
            warn!(account_id, error = %e, "No profile to publish after acceptance");
            return;
        }
    };

    if let Some(document) = document {
        profile.document_id = Some(document.id.clone());
        if let Err(e) = profiles.update(&profile) {
            warn!(account_id, error = %e, "Could not link document to profile");
        }
    }

    match profiles.publish(&profile.id) {
        Ok(_) => {
            info!(account_id, profile_id = %profile.id, "Profile published");
            audit_log!(
                storage,
                AuditEvent::new(AuditEventType::ProfilePublished)
                    .with_account(account_id)
                    .with_resource("profile", &profile.id)
            );
        }
        Err(StorageError::AlreadyExists(_)) => {
            warn!(account_id, profile_id = %profile.id, "Profile was already published");
        }
        Err(e) => {
            warn!(account_id, error = %e, "Profile publication failed after acceptance");
        }
    }
}
