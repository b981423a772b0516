// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Dealer profile repository.
//!
//! A profile is created in `Draft` state alongside the account and becomes
//! `Published` exactly once, when the agreement is accepted. Only published
//! profiles are externally visible. The account holder edits company-facing
//! details; publication-state changes happen only through the agreement
//! pipeline (or an elevated operator).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStorage, StorageError, StorageResult};
use super::registrations::ServiceFlags;

/// Publication lifecycle of a dealer profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PublicationState {
    /// Not externally visible
    Draft,
    /// Externally visible
    Published,
}

/// A satellite location under a dealer profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SubLocation {
    /// Location name (e.g. "Portland branch")
    pub name: String,
    /// Street address
    pub address: String,
    /// Location phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A dealer profile as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StoredProfile {
    /// Unique profile identifier (UUID)
    pub id: String,
    /// Owning account
    pub account_id: String,
    /// Company name
    pub company_name: String,
    /// Street address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Website URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Latitude for map placement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    /// Longitude for map placement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Offered service lines
    #[serde(default)]
    pub services: ServiceFlags,
    /// Satellite locations
    #[serde(default)]
    pub sub_locations: Vec<SubLocation>,
    /// Publication state
    pub publication_state: PublicationState,
    /// Generated agreement document, linked after acceptance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
    /// When the profile was published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

/// Repository for dealer profiles.
pub struct ProfileRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new ProfileRepository.
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// Check if a profile exists.
    pub fn exists(&self, profile_id: &str) -> bool {
        self.storage.exists(self.storage.paths().profile(profile_id))
    }

    /// Get a profile by ID.
    pub fn get(&self, profile_id: &str) -> StorageResult<StoredProfile> {
        let path = self.storage.paths().profile(profile_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Profile {profile_id}")));
        }
        self.storage.read_json(path)
    }

    /// Get the profile owned by an account.
    pub fn get_by_account(&self, account_id: &str) -> StorageResult<StoredProfile> {
        let ids = self
            .storage
            .list_files(self.storage.paths().profiles_dir(), "json")?;

        for id in ids {
            if let Ok(profile) = self.get(&id) {
                if profile.account_id == account_id {
                    return Ok(profile);
                }
            }
        }

        Err(StorageError::NotFound(format!(
            "Profile for account {account_id}"
        )))
    }

    /// Create a new profile.
    pub fn create(&self, profile: &StoredProfile) -> StorageResult<()> {
        let profile_id = &profile.id;

        if self.exists(profile_id) {
            return Err(StorageError::AlreadyExists(format!("Profile {profile_id}")));
        }

        self.storage
            .write_json(self.storage.paths().profile(profile_id), profile)
    }

    /// Update an existing profile's details.
    pub fn update(&self, profile: &StoredProfile) -> StorageResult<()> {
        let profile_id = &profile.id;

        if !self.exists(profile_id) {
            return Err(StorageError::NotFound(format!("Profile {profile_id}")));
        }

        self.storage
            .write_json(self.storage.paths().profile(profile_id), profile)
    }

    /// Publish a draft profile.
    ///
    /// The Draft -> Published transition happens exactly once; publishing an
    /// already-published profile returns `AlreadyExists`.
    pub fn publish(&self, profile_id: &str) -> StorageResult<StoredProfile> {
        let mut profile = self.get(profile_id)?;

        if profile.publication_state == PublicationState::Published {
            return Err(StorageError::AlreadyExists(format!(
                "Profile {profile_id} already published"
            )));
        }

        profile.publication_state = PublicationState::Published;
        profile.published_at = Some(Utc::now());

        self.update(&profile)?;
        Ok(profile)
    }

    /// List all profiles (admin view).
    pub fn list_all(&self) -> StorageResult<Vec<StoredProfile>> {
        let ids = self
            .storage
            .list_files(self.storage.paths().profiles_dir(), "json")?;

        let mut profiles = Vec::new();
        for id in ids {
            if let Ok(profile) = self.get(&id) {
                profiles.push(profile);
            }
        }

        Ok(profiles)
    }
}
