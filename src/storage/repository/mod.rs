// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Entity repositories over file-backed storage.

pub mod accounts;
pub mod agreements;
pub mod profiles;
pub mod registrations;

pub use accounts::{AccountRepository, CredentialHash, StoredAccount};
pub use agreements::{AgreementRepository, StoredAcceptance};
pub use profiles::{ProfileRepository, PublicationState, StoredProfile, SubLocation};
pub use registrations::{
    RegistrationRepository, ServiceFlags, StoredRegistration, SubmissionStatus,
};
