// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account roles for portal authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account roles.
///
/// ## Role Hierarchy
///
/// - `Elevated` - Operator/administrator; exempt from every onboarding gate
/// - `Dealer` - Approved applicant; subject to rotation and agreement gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Operator account with full access
    Elevated,
    /// Normal dealer account
    Dealer,
}

impl Role {
    /// The single bypass predicate consulted first by the Access Gate.
    ///
    /// Elevated accounts short-circuit to full access; no other gate logic
    /// runs for them.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Elevated)
    }

    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "elevated" => Some(Role::Elevated),
            "dealer" => Some(Role::Dealer),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Default role is Dealer (least privilege).
    fn default() -> Self {
        Role::Dealer
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Elevated => write!(f, "elevated"),
            Role::Dealer => write!(f, "dealer"),
        }
    }
}
