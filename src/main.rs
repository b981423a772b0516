// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, net::SocketAddr};

use tracing_subscriber::EnvFilter;

use dealer_portal::{
    access::Role,
    api::router,
    config::{
        DATA_DIR_ENV, HOST_ENV, LOG_FORMAT_ENV, PORT_ENV, SEED_ELEVATED_CREDENTIAL_ENV,
        SEED_ELEVATED_EMAIL_ENV,
    },
    notify::{Mailer, NotificationDispatcher},
    onboarding::{canonical_email, email_key, hash_credential},
    state::{load_agreement_text, AppState},
    storage::{AccountRepository, FileStorage, StoragePaths, StoredAccount},
};

#[tokio::main]
async fn main() {
    init_tracing();

    // Storage
    let data_dir = env::var(DATA_DIR_ENV).unwrap_or_else(|_| "/data".to_string());
    let mut storage = FileStorage::new(StoragePaths::new(&data_dir));
    storage
        .initialize()
        .expect("Failed to initialize storage directories");
    tracing::info!(%data_dir, "Storage initialized");

    seed_elevated_account(&storage);

    // Mail + dispatcher
    let mailer = Mailer::from_env().expect("Failed to configure mail transport");
    let dispatcher = NotificationDispatcher::new(mailer, storage.clone());

    let state = AppState::new(storage, dispatcher, load_agreement_text());
    let app = router(state);

    // Parse bind address
    let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var(PORT_ENV)
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("Failed to parse bind address");

    tracing::info!("Dealer portal listening on http://{addr} (docs at /docs)");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server failed");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let format = env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());
    if format == "json" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Create the bootstrap elevated account if configured and absent.
fn seed_elevated_account(storage: &FileStorage) {
    let (Ok(email), Ok(credential)) = (
        env::var(SEED_ELEVATED_EMAIL_ENV),
        env::var(SEED_ELEVATED_CREDENTIAL_ENV),
    ) else {
        return;
    };

    let canonical = canonical_email(&email);
    let key = email_key(&canonical);

    let repo = AccountRepository::new(storage);
    if repo.get_by_email_key(&key).is_ok() {
        tracing::debug!("Elevated account already seeded");
        return;
    }

    let hash = hash_credential(&credential).expect("Failed to hash seed credential");
    let account = StoredAccount {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.clone(),
        canonical_email: canonical,
        display_name: "Operator".to_string(),
        company_name: "Portal Operations".to_string(),
        credential: hash,
        role: Role::Elevated,
        // Elevated accounts bypass the gate; no onboarding requirements
        must_rotate_credential: false,
        agreement_accepted: true,
        session_epoch: 0,
        created_at: chrono::Utc::now(),
        submission_id: None,
    };

    repo.create(&account, &key)
        .expect("Failed to seed elevated account");
    tracing::info!(%email, "Seeded elevated operator account");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
