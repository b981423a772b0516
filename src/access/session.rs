// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server-side session management.
//!
//! Sessions are opaque random tokens held in memory and checked against the
//! account's `session_epoch` on every request. Credential rotation bumps the
//! epoch and drops every live session for the account before returning, so a
//! stale session cannot outlive a credential change.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::storage::StoredAccount;

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    /// Account this session belongs to
    pub account_id: String,
    /// Account session epoch at mint time
    pub epoch: u64,
    /// When the session was created
    pub created_at: DateTime<Utc>,
}

/// In-process session store.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    /// Create an empty session manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new session for an account.
    pub async fn create(&self, account: &StoredAccount) -> Session {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            account_id: account.id.clone(),
            epoch: account.session_epoch,
            created_at: Utc::now(),
        };

        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        session
    }

    /// Resolve a bearer token to its session, if any.
    pub async fn resolve(&self, token: &str) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Invalidate a single session (logout).
    pub async fn invalidate(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Invalidate every session belonging to an account.
    ///
    /// Returns the number of sessions dropped. Called synchronously by the
    /// rotation path before a success response is produced.
    pub async fn invalidate_account(&self, account_id: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.account_id != account_id);
        before - sessions.len()
    }
}
