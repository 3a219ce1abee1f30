use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment-provider configuration. The `api_key` and `secret_key` columns
/// hold either ciphertext (hex, written by the credential service) or legacy
/// plaintext; classification is structural, there is no format column.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_credentials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub api_key: String,
    pub secret_key: String,
    pub base_url: String,
    pub installment: bool,
    pub installment_options: Json,
    pub is_test_mode: bool,
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
