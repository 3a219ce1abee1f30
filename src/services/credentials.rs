//! Payment credential persistence.
//!
//! Wraps the `payment_credentials` table behind the active-configuration
//! invariant: at most one record is active at any time. Activation is a
//! deactivate-all + activate-one pass inside a single transaction, so a
//! crash can never leave two active records. Secret fields are encrypted
//! on every write path and decrypted on every read path; callers never
//! observe ciphertext.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::models::payment_credential;
use crate::models::prelude::*;
use crate::services::crypto::FieldCipher;

// ============================================================================
// Request types
// ============================================================================

fn default_test_mode() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewCredential {
    pub name: String,
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
    #[serde(default)]
    pub installment: bool,
    #[serde(default)]
    pub installment_options: Vec<i32>,
    #[serde(default = "default_test_mode")]
    pub is_test_mode: bool,
    pub currency: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Partial update payload. Absent and empty secret fields leave the stored
/// value untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CredentialPatch {
    pub name: Option<String>,
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub base_url: Option<String>,
    pub installment: Option<bool>,
    pub installment_options: Option<Vec<i32>>,
    pub is_test_mode: Option<bool>,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
}

// ============================================================================
// Service
// ============================================================================

#[derive(Clone)]
pub struct CredentialService {
    db: DatabaseConnection,
    cipher: FieldCipher,
}

impl CredentialService {
    pub fn new(db: DatabaseConnection, cipher: FieldCipher) -> Self {
        Self { db, cipher }
    }

    pub fn from_config(db: DatabaseConnection) -> Self {
        Self::new(db, FieldCipher::new(&CONFIG.crypto.credential_secret))
    }

    fn decrypt_model(&self, model: &mut payment_credential::Model) {
        self.cipher
            .decrypt_fields_lossy([&mut model.api_key, &mut model.secret_key]);
    }

    pub async fn create(&self, data: NewCredential) -> Result<payment_credential::Model> {
        let api_key = self.cipher.encrypt_value(&data.api_key)?;
        let secret_key = self.cipher.encrypt_value(&data.secret_key)?;
        let name = data.name.clone();
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let existing = PaymentCredential::find()
            .filter(payment_credential::Column::Name.eq(&data.name))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "Payment credential '{}' already exists",
                data.name
            )));
        }

        if data.is_active {
            deactivate_all(&txn, None).await?;
        }
        let model = payment_credential::ActiveModel {
            name: Set(data.name),
            api_key: Set(api_key),
            secret_key: Set(secret_key),
            base_url: Set(data.base_url),
            installment: Set(data.installment),
            installment_options: Set(serde_json::json!(data.installment_options)),
            is_test_mode: Set(data.is_test_mode),
            currency: Set(data.currency),
            is_active: Set(data.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        // A concurrent create can still win the race to the unique index
        .map_err(|e| name_conflict(e, &name))?;
        txn.commit().await?;

        let mut model = model;
        self.decrypt_model(&mut model);
        Ok(model)
    }

    pub async fn list(&self) -> Result<Vec<payment_credential::Model>> {
        let mut credentials = PaymentCredential::find()
            .order_by_asc(payment_credential::Column::Id)
            .all(&self.db)
            .await?;
        for credential in &mut credentials {
            self.decrypt_model(credential);
        }
        Ok(credentials)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<payment_credential::Model> {
        let mut credential = PaymentCredential::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment credential {} not found", id)))?;
        self.decrypt_model(&mut credential);
        Ok(credential)
    }

    pub async fn get_active(&self) -> Result<payment_credential::Model> {
        let mut credential = PaymentCredential::find()
            .filter(payment_credential::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("No active payment credential configured".to_string())
            })?;
        self.decrypt_model(&mut credential);
        Ok(credential)
    }

    pub async fn update(&self, id: i32, patch: CredentialPatch) -> Result<payment_credential::Model> {
        let txn = self.db.begin().await?;

        let existing = PaymentCredential::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment credential {} not found", id)))?;

        // Activating this record deactivates every other one in the same
        // transaction, a single consistency pass rather than per-record
        // toggling by the caller.
        if patch.is_active == Some(true) {
            deactivate_all(&txn, Some(id)).await?;
        }

        let mut active: payment_credential::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(api_key) = patch.api_key {
            if !api_key.is_empty() {
                active.api_key = Set(self.cipher.encrypt_value(&api_key)?);
            }
        }
        if let Some(secret_key) = patch.secret_key {
            if !secret_key.is_empty() {
                active.secret_key = Set(self.cipher.encrypt_value(&secret_key)?);
            }
        }
        if let Some(base_url) = patch.base_url {
            active.base_url = Set(base_url);
        }
        if let Some(installment) = patch.installment {
            active.installment = Set(installment);
        }
        if let Some(options) = patch.installment_options {
            active.installment_options = Set(serde_json::json!(options));
        }
        if let Some(is_test_mode) = patch.is_test_mode {
            active.is_test_mode = Set(is_test_mode);
        }
        if let Some(currency) = patch.currency {
            active.currency = Set(currency);
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let new_name = match &active.name {
            sea_orm::ActiveValue::Set(name) | sea_orm::ActiveValue::Unchanged(name) => name.clone(),
            sea_orm::ActiveValue::NotSet => String::new(),
        };
        let mut model = active
            .update(&txn)
            .await
            .map_err(|e| name_conflict(e, &new_name))?;
        txn.commit().await?;

        self.decrypt_model(&mut model);
        Ok(model)
    }

    /// Deactivate every record, then activate exactly the given id, in one
    /// transaction.
    pub async fn set_active(&self, id: i32) -> Result<payment_credential::Model> {
        let txn = self.db.begin().await?;

        let existing = PaymentCredential::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment credential {} not found", id)))?;

        deactivate_all(&txn, None).await?;

        let mut active: payment_credential::ActiveModel = existing.into();
        active.is_active = Set(true);
        active.updated_at = Set(Utc::now());
        let mut model = active.update(&txn).await?;

        txn.commit().await?;

        self.decrypt_model(&mut model);
        Ok(model)
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        let existing = PaymentCredential::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Payment credential {} not found", id)))?;
        existing.delete(&self.db).await?;
        Ok(())
    }
}

/// Unique-index violations on `name` surface as a 409 instead of a 500
fn name_conflict(e: DbErr, name: &str) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(format!(
            "Payment credential '{}' already exists",
            name
        )),
        _ => AppError::Database(e),
    }
}

async fn deactivate_all<C: ConnectionTrait>(conn: &C, except: Option<i32>) -> Result<()> {
    let mut query = PaymentCredential::update_many()
        .col_expr(payment_credential::Column::IsActive, Expr::value(false))
        .filter(payment_credential::Column::IsActive.eq(true));
    if let Some(id) = except {
        query = query.filter(payment_credential::Column::Id.ne(id));
    }
    query.exec(conn).await?;
    Ok(())
}
