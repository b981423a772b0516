// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Dealer Portal - Onboarding & Access Gating Service
//!
//! This crate owns the dealer onboarding lifecycle: registration intake,
//! admin approval, account provisioning with a forced credential rotation,
//! agreement acceptance with a generated signed document, and per-request
//! access gating for the private dealer portal.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `access` - Sessions, roles and the onboarding access gate
//! - `onboarding` - The onboarding state machine
//! - `documents` - Agreement document rendering
//! - `notify` - Transactional email dispatch
//! - `storage` - File-backed record storage and audit trail

pub mod access;
pub mod api;
pub mod config;
pub mod documents;
pub mod error;
pub mod models;
pub mod notify;
pub mod onboarding;
pub mod state;
pub mod storage;
