// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::access::SessionManager;
use crate::notify::NotificationDispatcher;
use crate::storage::FileStorage;

const DEFAULT_AGREEMENT_TEXT: &str = "Dealer agreement text not configured.\n\n\
This placeholder is served when AGREEMENT_TEXT_PATH is unset.";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub storage: FileStorage,
    pub sessions: Arc<SessionManager>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub agreement_text: Arc<String>,
}

impl AppState {
    pub fn new(
        storage: FileStorage,
        dispatcher: NotificationDispatcher,
        agreement_text: String,
    ) -> Self {
        Self {
            storage,
            sessions: Arc::new(SessionManager::new()),
            dispatcher: Arc::new(dispatcher),
            agreement_text: Arc::new(agreement_text),
        }
    }

    /// State over a fresh temp-dir storage with an in-memory mailer.
    ///
    /// Test storage is not cleaned up automatically; tests that care use
    /// their own storage fixtures.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::for_tests_with_mail().0
    }

    /// Like [`AppState::for_tests`] but with a handle on the mail sink.
    #[cfg(test)]
    pub fn for_tests_with_mail() -> (
        Self,
        std::sync::Arc<std::sync::Mutex<Vec<crate::notify::EmailMessage>>>,
    ) {
        let test_dir =
            std::env::temp_dir().join(format!("test-app-state-{}", uuid::Uuid::new_v4()));
        let paths = crate::storage::StoragePaths::new(&test_dir);
        let mut storage = FileStorage::new(paths);
        storage.initialize().expect("Failed to initialize");

        let (mailer, sink) = crate::notify::Mailer::memory();
        let dispatcher =
            NotificationDispatcher::for_tests(mailer, storage.clone(), Some("ops@portal.test"));

        (
            Self::new(storage, dispatcher, DEFAULT_AGREEMENT_TEXT.to_string()),
            sink,
        )
    }
}

/// Load the agreement text from `AGREEMENT_TEXT_PATH`, or fall back to the
/// placeholder.
pub fn load_agreement_text() -> String {
    match std::env::var(crate::config::AGREEMENT_TEXT_PATH_ENV) {
        Ok(path) if !path.is_empty() => match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(%path, error = %e, "Could not read agreement text; using placeholder");
                DEFAULT_AGREEMENT_TEXT.to_string()
            }
        },
        _ => DEFAULT_AGREEMENT_TEXT.to_string(),
    }
}
