//! Unit tests for the payment credential service
//!
//! Covers `src/services/credentials.rs`:
//! - create / list / get / update / delete
//! - encryption at rest (ciphertext in the table, plaintext from the API)
//! - legacy plaintext rows passing through reads unchanged
//! - the at-most-one-active invariant across create, update and set_active

mod common;
use common::{build_credential_service, create_test_db};

use payadmin::error::AppError;
use payadmin::models::payment_credential;
use payadmin::models::prelude::PaymentCredential;
use payadmin::services::credentials::{CredentialPatch, NewCredential};
use payadmin::services::crypto::is_ciphertext;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

fn new_credential(name: &str) -> NewCredential {
    NewCredential {
        name: name.to_string(),
        api_key: format!("{}-api-key", name),
        secret_key: format!("{}-secret-key", name),
        base_url: "https://pay.example.com".to_string(),
        installment: false,
        installment_options: vec![],
        is_test_mode: true,
        currency: "EUR".to_string(),
        is_active: false,
    }
}

// ============================================================================
// create
// ============================================================================

#[tokio::test]
async fn create_returns_decrypted_secrets() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let created = service.create(new_credential("stripe")).await.unwrap();

    assert_eq!(created.name, "stripe");
    assert_eq!(created.api_key, "stripe-api-key");
    assert_eq!(created.secret_key, "stripe-secret-key");
    assert!(!created.is_active);
}

#[tokio::test]
async fn create_stores_ciphertext_at_rest() {
    let db = create_test_db().await;
    let service = build_credential_service(db.clone());

    let created = service.create(new_credential("stripe")).await.unwrap();

    // Read the row directly, bypassing the service's decryption
    let row = PaymentCredential::find_by_id(created.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();

    assert!(is_ciphertext(&row.api_key), "api_key must be stored encrypted");
    assert!(
        is_ciphertext(&row.secret_key),
        "secret_key must be stored encrypted"
    );
    assert_ne!(row.api_key, "stripe-api-key");
}

#[tokio::test]
async fn create_rejects_duplicate_name() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    service.create(new_credential("stripe")).await.unwrap();
    let err = service.create(new_credential("stripe")).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn create_active_deactivates_existing_active() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let mut first = new_credential("first");
    first.is_active = true;
    let first = service.create(first).await.unwrap();
    assert!(first.is_active);

    let mut second = new_credential("second");
    second.is_active = true;
    let second = service.create(second).await.unwrap();
    assert!(second.is_active);

    let all = service.list().await.unwrap();
    let active: Vec<_> = all.iter().filter(|c| c.is_active).collect();
    assert_eq!(active.len(), 1, "exactly one credential may be active");
    assert_eq!(active[0].id, second.id);
}

// ============================================================================
// list / get
// ============================================================================

#[tokio::test]
async fn list_returns_credentials_in_id_order_decrypted() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    service.create(new_credential("alpha")).await.unwrap();
    service.create(new_credential("beta")).await.unwrap();

    let all = service.list().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[0].id < all[1].id);
    assert_eq!(all[0].api_key, "alpha-api-key");
    assert_eq!(all[1].api_key, "beta-api-key");
}

#[tokio::test]
async fn get_by_id_unknown_is_not_found() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let err = service.get_by_id(404).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn get_active_without_active_row_is_not_found() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    service.create(new_credential("inactive")).await.unwrap();
    let err = service.get_active().await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn get_active_returns_the_active_row() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let mut data = new_credential("live");
    data.is_active = true;
    let created = service.create(data).await.unwrap();
    service.create(new_credential("spare")).await.unwrap();

    let active = service.get_active().await.unwrap();
    assert_eq!(active.id, created.id);
    assert_eq!(active.api_key, "live-api-key");
}

// ============================================================================
// Legacy plaintext rows
// ============================================================================

#[tokio::test]
async fn legacy_plaintext_row_reads_back_unchanged() {
    let db = create_test_db().await;
    let service = build_credential_service(db.clone());

    // Simulate a pre-encryption row written directly to the table
    let now = chrono::Utc::now();
    let legacy = payment_credential::ActiveModel {
        name: Set("legacy".to_string()),
        api_key: Set("plain-api-key".to_string()),
        secret_key: Set("plain-secret".to_string()),
        base_url: Set("https://old.example.com".to_string()),
        installment: Set(false),
        installment_options: Set(serde_json::json!([])),
        is_test_mode: Set(false),
        currency: Set("USD".to_string()),
        is_active: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let fetched = service.get_by_id(legacy.id).await.unwrap();
    assert_eq!(fetched.api_key, "plain-api-key");
    assert_eq!(fetched.secret_key, "plain-secret");
}

#[tokio::test]
async fn updating_legacy_row_encrypts_new_secret() {
    let db = create_test_db().await;
    let service = build_credential_service(db.clone());

    let now = chrono::Utc::now();
    let legacy = payment_credential::ActiveModel {
        name: Set("legacy".to_string()),
        api_key: Set("plain-api-key".to_string()),
        secret_key: Set("plain-secret".to_string()),
        base_url: Set("https://old.example.com".to_string()),
        installment: Set(false),
        installment_options: Set(serde_json::json!([])),
        is_test_mode: Set(false),
        currency: Set("USD".to_string()),
        is_active: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let patch = CredentialPatch {
        api_key: Some("rotated-api-key".to_string()),
        ..Default::default()
    };
    let updated = service.update(legacy.id, patch).await.unwrap();
    assert_eq!(updated.api_key, "rotated-api-key");

    let row = PaymentCredential::find_by_id(legacy.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(is_ciphertext(&row.api_key));
    // The untouched secret stays as it was
    assert_eq!(row.secret_key, "plain-secret");
}

// ============================================================================
// update
// ============================================================================

#[tokio::test]
async fn update_applies_partial_patch() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let created = service.create(new_credential("stripe")).await.unwrap();

    let patch = CredentialPatch {
        currency: Some("USD".to_string()),
        is_test_mode: Some(false),
        ..Default::default()
    };
    let updated = service.update(created.id, patch).await.unwrap();

    assert_eq!(updated.currency, "USD");
    assert!(!updated.is_test_mode);
    // Unpatched fields survive
    assert_eq!(updated.name, "stripe");
    assert_eq!(updated.api_key, "stripe-api-key");
}

#[tokio::test]
async fn update_with_empty_secret_keeps_stored_value() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let created = service.create(new_credential("stripe")).await.unwrap();

    // Admin UIs send empty strings for untouched secret inputs
    let patch = CredentialPatch {
        api_key: Some(String::new()),
        secret_key: Some(String::new()),
        ..Default::default()
    };
    let updated = service.update(created.id, patch).await.unwrap();

    assert_eq!(updated.api_key, "stripe-api-key");
    assert_eq!(updated.secret_key, "stripe-secret-key");
}

#[tokio::test]
async fn update_activating_deactivates_others() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let mut first = new_credential("first");
    first.is_active = true;
    let first = service.create(first).await.unwrap();
    let second = service.create(new_credential("second")).await.unwrap();

    let patch = CredentialPatch {
        is_active: Some(true),
        ..Default::default()
    };
    service.update(second.id, patch).await.unwrap();

    let refreshed_first = service.get_by_id(first.id).await.unwrap();
    assert!(!refreshed_first.is_active);
    let active = service.get_active().await.unwrap();
    assert_eq!(active.id, second.id);
}

#[tokio::test]
async fn update_renaming_to_taken_name_is_conflict() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    service.create(new_credential("first")).await.unwrap();
    let second = service.create(new_credential("second")).await.unwrap();

    // No pre-check guards renames; the unique index must still surface as
    // a conflict rather than a bare database error
    let patch = CredentialPatch {
        name: Some("first".to_string()),
        ..Default::default()
    };
    let err = service.update(second.id, patch).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got: {:?}", err);
}

#[tokio::test]
async fn update_unknown_is_not_found() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let err = service
        .update(999, CredentialPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ============================================================================
// set_active
// ============================================================================

#[tokio::test]
async fn set_active_is_exclusive() {
    let db = create_test_db().await;
    let service = build_credential_service(db.clone());

    let a = service.create(new_credential("a")).await.unwrap();
    let b = service.create(new_credential("b")).await.unwrap();
    let c = service.create(new_credential("c")).await.unwrap();

    service.set_active(a.id).await.unwrap();
    service.set_active(b.id).await.unwrap();
    let activated = service.set_active(c.id).await.unwrap();
    assert!(activated.is_active);

    let active_rows = PaymentCredential::find()
        .filter(payment_credential::Column::IsActive.eq(true))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(active_rows.len(), 1);
    assert_eq!(active_rows[0].id, c.id);
}

#[tokio::test]
async fn set_active_unknown_is_not_found_and_keeps_current_active() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let mut data = new_credential("live");
    data.is_active = true;
    let created = service.create(data).await.unwrap();

    let err = service.set_active(999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // The failed activation must not have deactivated the current one
    let active = service.get_active().await.unwrap();
    assert_eq!(active.id, created.id);
}

// ============================================================================
// delete
// ============================================================================

#[tokio::test]
async fn delete_removes_the_row() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let created = service.create(new_credential("gone")).await.unwrap();
    service.delete(created.id).await.unwrap();

    let err = service.get_by_id(created.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn delete_unknown_is_not_found() {
    let db = create_test_db().await;
    let service = build_credential_service(db);

    let err = service.delete(12345).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
